use crate::errors::CliError;
use anyhow::Result;
use layers_flows::AnalysisConfig;
use std::path::{Path, PathBuf};

/// Name of the project configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "layers.yml";

/// Load an [`AnalysisConfig`] from a YAML file.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigLoadError {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    // An empty file is a valid, all-defaults document.
    if content.trim().is_empty() {
        return Ok(AnalysisConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        CliError::ConfigLoadError {
            path: path.to_path_buf(),
            source: e.into(),
        }
        .into()
    })
}

/// Resolve the configuration for a run.
///
/// **Precedence**: explicit `--config` path > `layers.yml` in `dir` > defaults
pub fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<(AnalysisConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }

    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
        return Ok((load_config(&candidate)?, Some(candidate)));
    }

    Ok((AnalysisConfig::default(), None))
}

/// Per-invocation overrides from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub session_start_event: Option<String>,
    pub version_attribute: Option<String>,
    pub target_count: Option<i64>,
    pub max_payload_bytes: Option<usize>,
    pub seed: Option<u64>,
}

impl Overrides {
    /// Apply flags on top of file configuration.
    pub fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(name) = &self.session_start_event {
            config.session_start_event = name.clone();
        }
        if let Some(key) = &self.version_attribute {
            config.version_attribute = key.clone();
        }
        if let Some(target) = self.target_count {
            config.target_count = target;
        }
        if let Some(bytes) = self.max_payload_bytes {
            config.max_payload_bytes = bytes;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}
