use anyhow::Error;
use serde::Deserialize;

/// Rules for spotting the PSTN call leg among the room's remote
/// participants. All three knobs are configuration because call-leg
/// naming schemes differ between dialing backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A participant whose identity starts with one of these prefixes is
    /// the call leg.
    pub identity_prefixes: Vec<String>,
    /// Fallback: a participant carrying any attribute key that contains
    /// this marker is the call leg.
    pub attribute_marker: String,
    /// Attribute key holding the provider-reported call progress.
    pub status_attribute: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            identity_prefixes: vec!["sip_".to_string()],
            attribute_marker: "sip.".to_string(),
            status_attribute: "sip.callStatus".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub event_buf_size: usize,
    pub classifier: ClassifierConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            event_buf_size: 16,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}
