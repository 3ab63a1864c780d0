pub mod call;
pub mod config;
pub mod event;

pub use call::{
    classifier::RemoteLegClassifier,
    describe,
    monitor::{CallMonitor, CallMonitorBuilder},
    participant::Participant,
    reconciler::{reconcile, CallStateReconciler, ReconcilerInputs},
    CallLifecycleState, CallProgress, TransportState,
};
pub use config::{ClassifierConfig, MonitorConfig};
pub use event::{CallStateEvent, SignalEvent};

// get timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    let now = std::time::SystemTime::now();
    now.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
