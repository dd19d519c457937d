use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load configuration file: {path}\n{source}")]
    ConfigLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Failed to read input file: {path}\n{source}")]
    InputLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Line {line} of {path} is not valid JSON: {source}")]
    InvalidJsonLine {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("No users launched version '{version}'.\nAvailable versions: {}", available.join(", "))]
    UnknownVersion {
        version: String,
        available: Vec<String>,
    },
}
