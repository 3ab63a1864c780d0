use crate::call::{CallLifecycleState, CallProgress, Participant, TransportState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// SignalEvent carries one observation from a signal source into the call
/// monitor. The sources notify on independent channels, so events of
/// different variants may arrive in any order relative to each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum SignalEvent {
    /// Transport-level connectivity changed.
    Transport { timestamp: u64, state: TransportState },

    /// The set of remote participants changed; replaces the previous
    /// roster wholesale.
    Roster {
        timestamp: u64,
        participants: Vec<Participant>,
    },

    /// Attributes changed for a single participant.
    Attributes {
        timestamp: u64,
        identity: String,
        attributes: HashMap<String, String>,
    },
}

impl SignalEvent {
    pub fn timestamp(&self) -> u64 {
        match self {
            SignalEvent::Transport { timestamp, .. } => *timestamp,
            SignalEvent::Roster { timestamp, .. } => *timestamp,
            SignalEvent::Attributes { timestamp, .. } => *timestamp,
        }
    }
}

/// Emitted to consumers whenever the derived lifecycle state or its
/// display wording changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStateEvent {
    pub timestamp: u64,
    pub state: CallLifecycleState,
    pub display: String,
    pub progress: Option<CallProgress>,
}

/// Type alias for the signal sender
pub type SignalSender = tokio::sync::broadcast::Sender<SignalEvent>;

/// Type alias for the signal receiver
pub type SignalReceiver = tokio::sync::broadcast::Receiver<SignalEvent>;

/// Type alias for the state event sender
pub type StateSender = tokio::sync::broadcast::Sender<CallStateEvent>;

/// Type alias for the state event receiver
pub type StateReceiver = tokio::sync::broadcast::Receiver<CallStateEvent>;
