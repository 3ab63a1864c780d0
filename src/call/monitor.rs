use super::{
    classifier::RemoteLegClassifier,
    describe,
    participant::Participant,
    reconciler::{CallStateReconciler, ReconcilerInputs},
    CallLifecycleState, TransportState,
};
use crate::{
    config::MonitorConfig,
    event::{CallStateEvent, SignalEvent, SignalReceiver, SignalSender, StateReceiver, StateSender},
};
use anyhow::{anyhow, Result};
use std::sync::RwLock;
use tokio::{
    select,
    sync::{broadcast, Mutex},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct MonitorState {
    transport: TransportState,
    roster: Vec<Participant>,
    reconciler: CallStateReconciler,
    last_state: CallLifecycleState,
    last_display: &'static str,
}

/// Merges the transport, roster, and attribute signal streams of one call
/// session into a single lifecycle state, emitting a `CallStateEvent`
/// whenever the derived state or wording changes.
///
/// One monitor per call session: the reconciler's sticky flag lives inside
/// and is torn down with the monitor, so concurrent sessions never share
/// history.
pub struct CallMonitor {
    pub session_id: String,
    classifier: RemoteLegClassifier,
    cancel_token: CancellationToken,
    signal_sender: SignalSender,
    signal_receiver: Mutex<Option<SignalReceiver>>,
    state_sender: StateSender,
    state: RwLock<MonitorState>,
}

pub struct CallMonitorBuilder {
    session_id: Option<String>,
    config: Option<MonitorConfig>,
    cancel_token: Option<CancellationToken>,
}

impl CallMonitorBuilder {
    pub fn new() -> Self {
        Self {
            session_id: None,
            config: None,
            cancel_token: None,
        }
    }

    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    pub fn build(self) -> CallMonitor {
        let config = self.config.unwrap_or_default();
        let session_id = self
            .session_id
            .unwrap_or_else(|| format!("call:{}", uuid::Uuid::new_v4()));
        let cancel_token = self.cancel_token.unwrap_or_else(CancellationToken::new);

        let (signal_sender, signal_receiver) = broadcast::channel(config.event_buf_size);
        let (state_sender, _) = broadcast::channel(config.event_buf_size);

        let initial = CallLifecycleState::Connecting;
        CallMonitor {
            session_id,
            classifier: RemoteLegClassifier::new(&config.classifier),
            cancel_token,
            signal_sender,
            signal_receiver: Mutex::new(Some(signal_receiver)),
            state_sender,
            state: RwLock::new(MonitorState {
                transport: TransportState::default(),
                roster: Vec::new(),
                reconciler: CallStateReconciler::new(),
                last_state: initial,
                last_display: initial.describe(),
            }),
        }
    }
}

impl Default for CallMonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallMonitor {
    /// Handle for signal sources to feed observations in.
    pub fn signal_sender(&self) -> SignalSender {
        self.signal_sender.clone()
    }

    pub fn subscribe(&self) -> StateReceiver {
        self.state_sender.subscribe()
    }

    pub fn stop(&self) {
        self.cancel_token.cancel()
    }

    pub fn current_state(&self) -> (CallLifecycleState, &'static str) {
        let state = self.state.read().unwrap();
        (state.last_state, state.last_display)
    }

    /// Convenience for wiring `on_peer_connection_state_change`: forwards
    /// a transport observation into the signal channel.
    pub fn notify_transport(&self, state: impl Into<TransportState>) {
        self.signal_sender
            .send(SignalEvent::Transport {
                timestamp: crate::get_timestamp(),
                state: state.into(),
            })
            .ok();
    }

    pub async fn serve(&self) -> Result<()> {
        let mut signal_receiver = self
            .signal_receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("monitor already served"))?;

        let signal_loop = async {
            loop {
                match signal_receiver.recv().await {
                    Ok(event) => self.handle_signal(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            session_id = self.session_id,
                            skipped, "signal receiver lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        select! {
            _ = self.cancel_token.cancelled() => {
                info!(session_id = self.session_id, "cancelled");
            }
            _ = signal_loop => {
                info!(session_id = self.session_id, "signal channel closed");
            }
        }
        Ok(())
    }

    pub(crate) fn handle_signal(&self, event: SignalEvent) {
        let timestamp = event.timestamp();
        let mut state = self.state.write().unwrap();
        match event {
            SignalEvent::Transport {
                state: transport, ..
            } => {
                debug!(session_id = self.session_id, ?transport, "transport changed");
                state.transport = transport;
            }
            SignalEvent::Roster { participants, .. } => {
                debug!(
                    session_id = self.session_id,
                    count = participants.len(),
                    "roster changed"
                );
                state.roster = participants;
            }
            SignalEvent::Attributes {
                identity,
                attributes,
                ..
            } => {
                // attribute updates can race ahead of the roster entry for
                // the same participant
                match state.roster.iter().position(|p| p.identity == identity) {
                    Some(index) => state.roster[index].attributes = attributes,
                    None => state.roster.push(Participant {
                        identity,
                        attributes,
                    }),
                }
            }
        }

        let inputs = {
            let remote_leg = self.classifier.find_remote_leg(&state.roster);
            ReconcilerInputs {
                transport: state.transport,
                remote_leg_present: remote_leg.is_some(),
                remote_leg_progress: remote_leg.and_then(|leg| self.classifier.progress_of(leg)),
                bystanders_present: state
                    .roster
                    .iter()
                    .any(|p| !self.classifier.is_remote_leg(p)),
            }
        };

        let lifecycle = state.reconciler.update(&inputs);
        let display_text = describe(lifecycle, inputs.remote_leg_progress);
        if lifecycle == state.last_state && display_text == state.last_display {
            return;
        }

        info!(
            session_id = self.session_id,
            from = %state.last_state,
            to = %lifecycle,
            display = %display_text, "call state changed"
        );
        state.last_state = lifecycle;
        state.last_display = display_text;

        self.state_sender
            .send(CallStateEvent {
                timestamp,
                state: lifecycle,
                display: display_text.to_string(),
                progress: inputs.remote_leg_progress,
            })
            .ok();
    }
}
