//! Reading event and flow files.
//!
//! Files hold either one JSON array or one JSON document per line.

use crate::errors::CliError;
use anyhow::Result;
use layers_flows::{EventRecord, Flow};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a JSON array or JSON Lines document.
pub fn parse_items<T: DeserializeOwned>(content: &str, path: &Path) -> Result<Vec<T>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).map_err(|e| {
            CliError::InputLoadError {
                path: path.to_path_buf(),
                source: e.into(),
            }
            .into()
        });
    }

    let mut items = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|source| CliError::InvalidJsonLine {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        items.push(item);
    }
    Ok(items)
}

fn read_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::InputLoadError {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    parse_items(&content, path)
}

/// Read raw event records. Validation happens later, against the whole stream.
pub fn read_records(path: &Path) -> Result<Vec<EventRecord>> {
    read_items(path)
}

/// Read flows in their `{"user_id", "flow"}` wire shape.
pub fn read_flows(path: &Path) -> Result<Vec<Flow>> {
    read_items(path)
}
