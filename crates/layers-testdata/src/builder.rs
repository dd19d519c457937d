//! Fluent builder for CohortConfig.

use crate::config::{CohortConfig, TimeRange};
use crate::distributions::EventCountModel;
use chrono::NaiveDate;

/// Fluent builder for [`CohortConfig`].
///
/// # Example
/// ```
/// use layers_testdata::CohortBuilder;
///
/// let config = CohortBuilder::new()
///     .seed(42)
///     .users(500)
///     .versions(&[("1.0.0", 0.7), ("1.1.0", 0.3)])
///     .duplicate_rate(0.1)
///     .build();
/// ```
pub struct CohortBuilder {
    config: CohortConfig,
}

impl CohortBuilder {
    pub fn new() -> Self {
        Self {
            config: CohortConfig::default(),
        }
    }

    /// Set the master seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the number of users.
    pub fn users(mut self, count: usize) -> Self {
        self.config.users = count;
        self
    }

    /// Generate `days` days of sessions starting on `start`.
    pub fn days_from(mut self, start: NaiveDate, days: i64) -> Self {
        self.config.time_range = TimeRange::days_from(start, days);
        self
    }

    /// Set the app versions and the share of users on each.
    ///
    /// An empty list is ignored and the current versions are kept.
    pub fn versions(mut self, versions: &[(&str, f64)]) -> Self {
        if versions.is_empty() {
            return self;
        }
        self.config.versions = versions
            .iter()
            .map(|(v, w)| (v.to_string(), *w))
            .collect();
        self
    }

    /// Set the session-start event name.
    pub fn session_start(mut self, name: &str) -> Self {
        self.config.sessions.session_start_event = name.to_string();
        self
    }

    /// Set the attribute that carries the app version.
    pub fn version_attribute(mut self, key: &str) -> Self {
        self.config.sessions.version_attribute = key.to_string();
        self
    }

    /// Set the inclusive range of sessions per user.
    pub fn sessions_per_user(mut self, min: u32, max: u32) -> Self {
        self.config.sessions.sessions_per_user = (min, max.max(min));
        self
    }

    /// Set custom in-session event types with weights.
    ///
    /// An empty list is ignored and the current event types are kept.
    pub fn event_types(mut self, types: Vec<(String, f64)>) -> Self {
        if types.is_empty() {
            return self;
        }
        self.config.sessions.event_types = types;
        self
    }

    /// Set the events per session model.
    pub fn events_per_session(mut self, model: EventCountModel) -> Self {
        self.config.sessions.events_per_session = model;
        self
    }

    /// Use short sessions.
    pub fn quick_sessions(self) -> Self {
        self.events_per_session(EventCountModel::quick_sessions())
    }

    /// Use long, engaged sessions.
    pub fn engaged_sessions(self) -> Self {
        self.events_per_session(EventCountModel::high_engagement())
    }

    /// Set the probability that an event is delivered twice.
    pub fn duplicate_rate(mut self, rate: f64) -> Self {
        self.config.sessions.duplicate_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> CohortConfig {
        self.config
    }
}

impl Default for CohortBuilder {
    fn default() -> Self {
        Self::new()
    }
}
