//! Analytics events and their wire representation.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended event attributes. The pipeline carries them but never inspects
/// their contents beyond cohort filtering.
pub type Attributes = Map<String, Value>;

/// A validated analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name (e.g. "App Launched")
    #[serde(rename = "event_name")]
    pub name: String,
    /// Additional event attributes
    #[serde(rename = "event_attributes", default)]
    pub attributes: Attributes,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl Event {
    /// Create an event with no attributes.
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            timestamp,
        }
    }

    /// Add an attribute to this event.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The `(name, timestamp)` pair used for duplicate suppression.
    pub fn dedup_key(&self) -> (&str, i64) {
        (self.name.as_str(), self.timestamp)
    }

    /// Look up a string attribute.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// An event row as it arrives from the event store, before validation.
///
/// Every field is loosely typed so that a malformed row surfaces as a
/// [`FlowError::InvalidEvent`] naming the record rather than as an opaque
/// deserialisation failure for the whole stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

impl EventRecord {
    /// Build a well-formed record.
    pub fn new(user_id: impl Into<String>, event: &Event) -> Self {
        Self {
            user_id: Some(Value::String(user_id.into())),
            name: Some(Value::String(event.name.clone())),
            attributes: Some(Value::Object(event.attributes.clone())),
            timestamp: Some(Value::from(event.timestamp)),
        }
    }

    /// Validate this record, returning the owning user id and the event.
    ///
    /// `index` is the record's position in its stream and is reported in the
    /// error. Missing or null attributes are treated as empty.
    pub fn validate(&self, index: usize) -> Result<(String, Event), FlowError> {
        let user_id = match &self.user_id {
            None | Some(Value::Null) => return Err(FlowError::missing_field(index, "user_id")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(FlowError::invalid_field(index, "user_id")),
        };

        let name = match &self.name {
            None | Some(Value::Null) => return Err(FlowError::missing_field(index, "name")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(FlowError::invalid_field(index, "name")),
        };

        let timestamp = match &self.timestamp {
            None | Some(Value::Null) => return Err(FlowError::missing_field(index, "timestamp")),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| FlowError::invalid_field(index, "timestamp"))?,
            Some(_) => return Err(FlowError::invalid_field(index, "timestamp")),
        };

        let attributes = match &self.attributes {
            None | Some(Value::Null) => Attributes::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(FlowError::invalid_field(index, "attributes")),
        };

        Ok((
            user_id,
            Event {
                name,
                attributes,
                timestamp,
            },
        ))
    }
}

/// Validate a whole stream of records.
///
/// The stream is rejected at the first malformed record; nothing is coerced.
pub fn validate_records(records: &[EventRecord]) -> Result<Vec<(String, Event)>, FlowError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.validate(index))
        .collect()
}

/// One user's chronological event list.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEvents {
    pub user_id: String,
    pub events: Vec<Event>,
}

/// Group validated events by user.
///
/// Per-user input order is preserved; users appear in order of their first
/// event.
pub fn group_by_user(events: Vec<(String, Event)>) -> Vec<UserEvents> {
    let mut groups: Vec<UserEvents> = Vec::new();
    let mut positions: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for (user_id, event) in events {
        match positions.get(&user_id) {
            Some(&pos) => groups[pos].events.push(event),
            None => {
                positions.insert(user_id.clone(), groups.len());
                groups.push(UserEvents {
                    user_id,
                    events: vec![event],
                });
            }
        }
    }

    groups
}
