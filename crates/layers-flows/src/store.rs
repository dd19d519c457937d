//! Event store interface and an in-memory implementation.

use crate::error::StoreError;
use crate::event::{group_by_user, validate_records, Event, EventRecord, UserEvents};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Source of per-user event streams for a cohort.
///
/// Query semantics (matching, ordering, pagination) belong to the store.
/// Implementations must return each user's events sorted ascending by
/// timestamp.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Distinct app versions seen on session-start events, sorted.
    async fn app_versions(&self) -> Result<Vec<String>, StoreError>;

    /// Event streams of every user who started a session on `version`.
    async fn cohort_events(&self, version: &str) -> Result<Vec<UserEvents>, StoreError>;
}

/// An [`EventStore`] over records held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryEventStore {
    users: Vec<UserEvents>,
    session_start: String,
    version_attribute: String,
}

impl InMemoryEventStore {
    /// Validate `records` and index them by user.
    ///
    /// Fails on the first malformed record.
    pub fn new(
        records: &[EventRecord],
        session_start: impl Into<String>,
        version_attribute: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let events = validate_records(records)?;
        Ok(Self::from_events(events, session_start, version_attribute))
    }

    /// Build a store from already-validated events.
    pub fn from_events(
        events: Vec<(String, Event)>,
        session_start: impl Into<String>,
        version_attribute: impl Into<String>,
    ) -> Self {
        let mut users = group_by_user(events);
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        for user in &mut users {
            user.events.sort_by_key(|e| e.timestamp);
        }

        Self {
            users,
            session_start: session_start.into(),
            version_attribute: version_attribute.into(),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn launch_versions<'a>(&'a self, user: &'a UserEvents) -> impl Iterator<Item = &'a str> + 'a {
        user.events
            .iter()
            .filter(move |e| e.name == self.session_start)
            .filter_map(move |e| e.attribute_str(&self.version_attribute))
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn app_versions(&self) -> Result<Vec<String>, StoreError> {
        let versions: BTreeSet<&str> = self
            .users
            .iter()
            .flat_map(|user| self.launch_versions(user))
            .collect();
        Ok(versions.into_iter().map(str::to_string).collect())
    }

    async fn cohort_events(&self, version: &str) -> Result<Vec<UserEvents>, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|user| self.launch_versions(user).any(|v| v == version))
            .cloned()
            .collect())
    }
}
