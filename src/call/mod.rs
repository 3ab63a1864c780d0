use serde::{Deserialize, Serialize};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

pub mod classifier;
pub mod monitor;
pub mod participant;
pub mod reconciler;

pub use classifier::RemoteLegClassifier;
pub use monitor::{CallMonitor, CallMonitorBuilder};
pub use participant::Participant;
pub use reconciler::{CallStateReconciler, ReconcilerInputs};

#[cfg(test)]
mod tests;

/// Discrete lifecycle of one call session, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallLifecycleState {
    Connecting,
    Ringing,
    Connected,
    Reconnecting,
    Disconnected,
}

impl CallLifecycleState {
    pub fn describe(&self) -> &'static str {
        match self {
            CallLifecycleState::Connecting => "Connecting...",
            CallLifecycleState::Ringing => "Ringing...",
            CallLifecycleState::Connected => "In Call",
            CallLifecycleState::Reconnecting => "Reconnecting...",
            CallLifecycleState::Disconnected => "Call Ended",
        }
    }
}

impl std::fmt::Display for CallLifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallLifecycleState::Connecting => "connecting",
            CallLifecycleState::Ringing => "ringing",
            CallLifecycleState::Connected => "connected",
            CallLifecycleState::Reconnecting => "reconnecting",
            CallLifecycleState::Disconnected => "disconnected",
        };
        write!(f, "{}", name)
    }
}

/// Transport-level connectivity of the local media session, distinct from
/// the call's logical lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState::Connecting
    }
}

impl From<RTCPeerConnectionState> for TransportState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::New | RTCPeerConnectionState::Connecting => {
                TransportState::Connecting
            }
            RTCPeerConnectionState::Connected => TransportState::Connected,
            RTCPeerConnectionState::Disconnected => TransportState::Reconnecting,
            RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed => {
                TransportState::Disconnected
            }
            _ => TransportState::Connecting,
        }
    }
}

/// Provider-reported call progress, read from the call leg's status
/// attribute. May lag or race the transport and roster signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallProgress {
    Dialing,
    Ringing,
    Active,
    Hangup,
}

impl CallProgress {
    /// Unrecognized values mean "no status reported", not an error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dialing" => Some(CallProgress::Dialing),
            "ringing" => Some(CallProgress::Ringing),
            "active" => Some(CallProgress::Active),
            "hangup" => Some(CallProgress::Hangup),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            CallProgress::Dialing => "Dialing...",
            CallProgress::Ringing => "Ringing...",
            CallProgress::Active => "In Call",
            CallProgress::Hangup => "Call ended",
        }
    }
}

/// Display wording for the current state. The provider-reported progress
/// takes priority over the per-state fallback when present.
pub fn describe(state: CallLifecycleState, progress: Option<CallProgress>) -> &'static str {
    match progress {
        Some(progress) => progress.describe(),
        None => state.describe(),
    }
}
