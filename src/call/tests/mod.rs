mod monitor_test;
