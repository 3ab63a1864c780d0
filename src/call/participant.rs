use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A remote participant in the media room, as reported by the roster
/// layer. The PSTN call leg is one of these, distinguished by identity
/// or attribute conventions (see `RemoteLegClassifier`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Participant {
    pub identity: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Participant {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }
}
