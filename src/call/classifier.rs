use super::{participant::Participant, CallProgress};
use crate::config::ClassifierConfig;

/// Decides which roster entry is the PSTN call leg.
///
/// Two-step heuristic: an identity prefix match wins outright, otherwise a
/// participant carrying any attribute key that contains the configured
/// marker is taken as the leg. Both rule sets are injected via
/// `ClassifierConfig` so other call-leg naming schemes can be supported
/// without touching the reconciler.
pub struct RemoteLegClassifier {
    identity_prefixes: Vec<String>,
    attribute_marker: String,
    status_attribute: String,
}

impl RemoteLegClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            identity_prefixes: config.identity_prefixes.clone(),
            attribute_marker: config.attribute_marker.clone(),
            status_attribute: config.status_attribute.clone(),
        }
    }

    pub fn is_remote_leg(&self, participant: &Participant) -> bool {
        if self
            .identity_prefixes
            .iter()
            .any(|prefix| participant.identity.starts_with(prefix.as_str()))
        {
            return true;
        }
        participant
            .attributes
            .keys()
            .any(|key| key.contains(self.attribute_marker.as_str()))
    }

    /// First matching participant, in roster order.
    pub fn find_remote_leg<'a>(&self, participants: &'a [Participant]) -> Option<&'a Participant> {
        participants.iter().find(|p| self.is_remote_leg(p))
    }

    /// Provider-reported progress of the leg, if the status attribute is
    /// present and holds a recognized value.
    pub fn progress_of(&self, participant: &Participant) -> Option<CallProgress> {
        participant
            .attribute(&self.status_attribute)
            .and_then(CallProgress::parse)
    }
}

impl Default for RemoteLegClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
