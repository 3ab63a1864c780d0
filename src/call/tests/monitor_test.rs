use crate::{
    call::{monitor::CallMonitorBuilder, CallLifecycleState, Participant, TransportState},
    config::{ClassifierConfig, MonitorConfig},
    event::SignalEvent,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn transport(timestamp: u64, state: TransportState) -> SignalEvent {
    SignalEvent::Transport { timestamp, state }
}

fn roster(timestamp: u64, participants: Vec<Participant>) -> SignalEvent {
    SignalEvent::Roster {
        timestamp,
        participants,
    }
}

fn attributes(timestamp: u64, identity: &str, status: &str) -> SignalEvent {
    SignalEvent::Attributes {
        timestamp,
        identity: identity.to_string(),
        attributes: HashMap::from([("sip.callStatus".to_string(), status.to_string())]),
    }
}

const LEG: &str = "sip_+15551234567";

#[test]
fn test_full_call_flow() {
    let monitor = CallMonitorBuilder::new()
        .with_session_id("call:flow".to_string())
        .build();
    let mut state_rx = monitor.subscribe();

    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Connecting, "Connecting...")
    );

    // transport negotiating, leg joins without progress yet
    monitor.handle_signal(transport(1, TransportState::Connecting));
    monitor.handle_signal(roster(2, vec![Participant::new(LEG)]));
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Connecting, "Connecting...")
    );

    // transport up: leg presence alone reads as ringing
    monitor.handle_signal(transport(3, TransportState::Connected));
    // provider progress walks dialing -> ringing -> active
    monitor.handle_signal(attributes(4, LEG, "dialing"));
    monitor.handle_signal(attributes(5, LEG, "ringing"));
    monitor.handle_signal(attributes(6, LEG, "active"));
    // transport blip during the live call
    monitor.handle_signal(transport(7, TransportState::Reconnecting));
    monitor.handle_signal(transport(8, TransportState::Connected));
    // provider hangs the call up
    monitor.handle_signal(attributes(9, LEG, "hangup"));

    let expected = [
        (3, CallLifecycleState::Ringing, "Ringing..."),
        (4, CallLifecycleState::Ringing, "Dialing..."),
        (5, CallLifecycleState::Ringing, "Ringing..."),
        (6, CallLifecycleState::Connected, "In Call"),
        (7, CallLifecycleState::Reconnecting, "In Call"),
        (8, CallLifecycleState::Connected, "In Call"),
        (9, CallLifecycleState::Disconnected, "Call ended"),
    ];
    for (timestamp, state, display) in expected {
        let event = state_rx.try_recv().expect("missing state event");
        assert_eq!(event.timestamp, timestamp);
        assert_eq!(event.state, state, "at t={}", timestamp);
        assert_eq!(event.display, display, "at t={}", timestamp);
    }
    assert!(state_rx.try_recv().is_err(), "unexpected extra event");
}

#[test]
fn test_emits_only_on_change() {
    let monitor = CallMonitorBuilder::new().build();
    let mut state_rx = monitor.subscribe();

    monitor.handle_signal(transport(1, TransportState::Connecting));
    monitor.handle_signal(transport(2, TransportState::Connecting));
    monitor.handle_signal(roster(3, vec![]));
    assert!(
        state_rx.try_recv().is_err(),
        "identical snapshots must not emit"
    );
}

#[test]
fn test_attributes_before_roster() {
    // the attribute channel can race ahead of the roster channel for the
    // same transition; the snapshot must converge either way
    let monitor = CallMonitorBuilder::new().build();

    monitor.handle_signal(transport(1, TransportState::Connected));
    monitor.handle_signal(attributes(2, LEG, "ringing"));
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Ringing, "Ringing...")
    );

    // the late roster update carries the same leg and changes nothing
    monitor.handle_signal(roster(
        3,
        vec![Participant::new(LEG).with_attribute("sip.callStatus", "ringing")],
    ));
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Ringing, "Ringing...")
    );
}

#[test]
fn test_party_left_without_hangup() {
    let monitor = CallMonitorBuilder::new().build();

    monitor.handle_signal(transport(1, TransportState::Connected));
    monitor.handle_signal(roster(
        2,
        vec![Participant::new(LEG).with_attribute("sip.callStatus", "active")],
    ));
    assert_eq!(monitor.current_state().0, CallLifecycleState::Connected);

    // the leg's roster entry vanishes with no hangup status reported
    monitor.handle_signal(roster(3, vec![]));
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Disconnected, "Call Ended")
    );
}

#[test]
fn test_never_established_drop() {
    let monitor = CallMonitorBuilder::new().build();

    monitor.handle_signal(transport(1, TransportState::Connecting));
    monitor.handle_signal(transport(2, TransportState::Disconnected));
    // no leg was ever observed, so this is not a finished call
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Reconnecting, "Reconnecting...")
    );
}

#[test]
fn test_bystander_does_not_end_call_setup() {
    let monitor = CallMonitorBuilder::new().build();

    monitor.handle_signal(transport(1, TransportState::Connected));
    monitor.handle_signal(roster(2, vec![Participant::new("observer")]));
    // a non-leg participant with the transport up reads as ringing
    assert_eq!(monitor.current_state().0, CallLifecycleState::Ringing);
}

#[test]
fn test_custom_classifier_rules() {
    let config = MonitorConfig {
        classifier: ClassifierConfig {
            identity_prefixes: vec!["pstn:".to_string()],
            attribute_marker: "carrier.".to_string(),
            status_attribute: "carrier.progress".to_string(),
        },
        ..Default::default()
    };
    let monitor = CallMonitorBuilder::new().with_config(config).build();

    monitor.handle_signal(transport(1, TransportState::Connected));
    monitor.handle_signal(SignalEvent::Attributes {
        timestamp: 2,
        identity: "pstn:+15551234567".to_string(),
        attributes: HashMap::from([("carrier.progress".to_string(), "active".to_string())]),
    });
    assert_eq!(
        monitor.current_state(),
        (CallLifecycleState::Connected, "In Call")
    );
}

#[test]
fn test_sessions_do_not_share_history() {
    let first = CallMonitorBuilder::new().build();
    let second = CallMonitorBuilder::new().build();

    // drive the first session through a full call and drop
    first.handle_signal(transport(1, TransportState::Connected));
    first.handle_signal(attributes(2, LEG, "active"));
    first.handle_signal(roster(3, vec![]));
    assert_eq!(first.current_state().0, CallLifecycleState::Disconnected);

    // the second session observes the same late snapshot but has no
    // history, so it is still establishing
    second.handle_signal(transport(1, TransportState::Connected));
    assert_eq!(second.current_state().0, CallLifecycleState::Connecting);
}

#[tokio::test]
async fn test_serve_delivers_state_events() {
    let monitor = Arc::new(
        CallMonitorBuilder::new()
            .with_session_id("call:serve".to_string())
            .build(),
    );
    let signal_tx = monitor.signal_sender();
    let mut state_rx = monitor.subscribe();

    let serve_monitor = monitor.clone();
    let handle = tokio::spawn(async move { serve_monitor.serve().await });

    signal_tx.send(transport(1, TransportState::Connected)).unwrap();
    signal_tx.send(attributes(2, LEG, "ringing")).unwrap();
    signal_tx.send(attributes(3, LEG, "active")).unwrap();

    let mut states = Vec::new();
    for _ in 0..2 {
        let event = timeout(Duration::from_secs(2), state_rx.recv())
            .await
            .expect("timed out waiting for state event")
            .expect("state channel closed");
        states.push(event.state);
    }
    assert_eq!(
        states,
        vec![CallLifecycleState::Ringing, CallLifecycleState::Connected]
    );

    monitor.stop();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("serve did not stop on cancellation")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_serve_twice_fails() {
    let cancel_token = CancellationToken::new();
    let monitor = CallMonitorBuilder::new()
        .with_cancel_token(cancel_token.clone())
        .build();

    // a cancelled token makes serve return right away, with the signal
    // receiver consumed
    cancel_token.cancel();
    assert!(monitor.serve().await.is_ok());
    assert!(monitor.serve().await.is_err());
}
