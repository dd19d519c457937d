//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for segmenting a cohort and bounding its analysis payload.
///
/// Every field has a default, so a partial YAML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Event name that starts a new flow
    pub session_start_event: String,
    /// Attribute on the session-start event holding the app version
    pub version_attribute: String,
    /// Maximum number of flows embedded in one generation request
    pub target_count: i64,
    /// Maximum size of the encoded flow payload in bytes
    pub max_payload_bytes: usize,
    /// Seed for sampling; `None` draws from OS entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            session_start_event: "App Launched".to_string(),
            version_attribute: "app_version".to_string(),
            target_count: 100,
            max_payload_bytes: 60_000,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn with_target_count(mut self, target_count: i64) -> Self {
        self.target_count = target_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_session_start(mut self, name: impl Into<String>) -> Self {
        self.session_start_event = name.into();
        self
    }
}
