use super::{CallLifecycleState, CallProgress, TransportState};

/// Combined snapshot of everything known about one call session at the
/// moment of reconciliation. Signals race each other across channels, so
/// the derivation is defined over this snapshot alone and never over
/// which input changed last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerInputs {
    pub transport: TransportState,
    /// The PSTN call leg currently has a roster entry.
    pub remote_leg_present: bool,
    /// Provider-reported progress read from the leg's status attribute.
    pub remote_leg_progress: Option<CallProgress>,
    /// Remote participants other than the call leg are in the roster.
    pub bystanders_present: bool,
}

/// Derive the lifecycle state from one snapshot.
///
/// `ever_had_remote_leg` is the session's sticky flag; the returned flag
/// replaces it and only ever moves false to true. Provider-reported
/// progress outranks raw transport state so a brief transport drop does
/// not flap an active call over to disconnected.
pub fn reconcile(
    inputs: &ReconcilerInputs,
    ever_had_remote_leg: bool,
) -> (CallLifecycleState, bool) {
    let ever_had_remote_leg = ever_had_remote_leg
        || matches!(
            inputs.remote_leg_progress,
            Some(CallProgress::Active) | Some(CallProgress::Ringing) | Some(CallProgress::Dialing)
        );

    let state = match inputs.remote_leg_progress {
        // explicit termination wins over everything else
        Some(CallProgress::Hangup) => CallLifecycleState::Disconnected,
        Some(CallProgress::Active) => {
            if inputs.transport == TransportState::Connected {
                CallLifecycleState::Connected
            } else {
                CallLifecycleState::Reconnecting
            }
        }
        Some(CallProgress::Ringing) | Some(CallProgress::Dialing) => CallLifecycleState::Ringing,
        // leg present but the provider has not reported progress yet
        None if inputs.remote_leg_present => {
            if inputs.transport == TransportState::Connected {
                CallLifecycleState::Ringing
            } else {
                CallLifecycleState::Connecting
            }
        }
        None => match inputs.transport {
            TransportState::Connecting => CallLifecycleState::Connecting,
            TransportState::Disconnected => {
                // a call that was live and dropped, vs. one still trying
                // to establish
                if ever_had_remote_leg {
                    CallLifecycleState::Disconnected
                } else {
                    CallLifecycleState::Reconnecting
                }
            }
            TransportState::Connected => {
                if ever_had_remote_leg {
                    CallLifecycleState::Disconnected
                } else if inputs.bystanders_present {
                    CallLifecycleState::Ringing
                } else {
                    CallLifecycleState::Connecting
                }
            }
            TransportState::Reconnecting => CallLifecycleState::Reconnecting,
        },
    };

    (state, ever_had_remote_leg)
}

/// Owns the one piece of session memory: whether a call leg has ever been
/// observed with progress in {active, ringing, dialing}. One instance per
/// call session; a new session starts from a fresh instance and the flag
/// dies with it.
#[derive(Debug, Default)]
pub struct CallStateReconciler {
    ever_had_remote_leg: bool,
}

impl CallStateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the sticky-flag update synchronously, then derives the
    /// state. Idempotent for repeated identical snapshots.
    pub fn update(&mut self, inputs: &ReconcilerInputs) -> CallLifecycleState {
        let (state, ever_had_remote_leg) = reconcile(inputs, self.ever_had_remote_leg);
        self.ever_had_remote_leg = ever_had_remote_leg;
        state
    }

    pub fn ever_had_remote_leg(&self) -> bool {
        self.ever_had_remote_leg
    }
}
