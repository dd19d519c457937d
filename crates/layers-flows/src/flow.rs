//! Flows: one user's deduplicated event sequence between session starts.

use crate::event::Event;
use serde::{Deserialize, Serialize};

/// A closed flow owned by a single user.
///
/// Invariants upheld by [`crate::FlowSegmenter`]: `events` is non-empty,
/// ordered as in the source stream, and free of duplicate
/// `(name, timestamp)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// User who owns this flow
    #[serde(rename = "user_id")]
    pub owner_id: String,
    /// Events in the flow, in stream order
    #[serde(rename = "flow")]
    pub events: Vec<Event>,
}

impl Flow {
    pub fn new(owner_id: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            owner_id: owner_id.into(),
            events,
        }
    }

    /// Number of events in the flow.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Name of the first event, normally the session-start event.
    pub fn first_event_name(&self) -> Option<&str> {
        self.events.first().map(|e| e.name.as_str())
    }
}
