//! Configuration structures for cohort generation.

use crate::distributions::EventCountModel;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Top-level configuration for synthetic cohort generation.
#[derive(Debug, Clone)]
pub struct CohortConfig {
    /// Master seed for reproducibility
    pub seed: u64,

    /// Number of users to generate
    pub users: usize,

    /// Time range the sessions fall in
    pub time_range: TimeRange,

    /// App versions and the share of users on each
    pub versions: Vec<(String, f64)>,

    /// Session shape
    pub sessions: SessionConfig,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            users: 100,
            time_range: TimeRange::default(),
            versions: vec![("1.0.0".to_string(), 1.0)],
            sessions: SessionConfig::default(),
        }
    }
}

/// Time range for generated events.
#[derive(Debug, Clone)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `days` days starting at midnight UTC on `start`.
    pub fn days_from(start: NaiveDate, days: i64) -> Self {
        let start = start.and_time(NaiveTime::default()).and_utc();
        Self {
            start,
            end: start + Duration::days(days),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl Default for TimeRange {
    /// The 30 days from 2024-01-01, fixed so that output does not depend on
    /// the wall clock.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        Self::days_from(start, 30)
    }
}

/// How each user's sessions are generated.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Event that opens every session
    pub session_start_event: String,

    /// Attribute on the session-start event carrying the app version
    pub version_attribute: String,

    /// Sessions per user (inclusive range)
    pub sessions_per_user: (u32, u32),

    /// In-session event names and their relative weights
    pub event_types: Vec<(String, f64)>,

    /// Events per session distribution
    pub events_per_session: EventCountModel,

    /// Probability that an event is delivered twice
    pub duplicate_rate: f64,

    /// Gap between consecutive in-session events, in milliseconds
    pub event_gap_ms: (i64, i64),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_start_event: "App Launched".to_string(),
            version_attribute: "app_version".to_string(),
            sessions_per_user: (1, 5),
            event_types: vec![
                ("Screen Viewed".to_string(), 0.45),
                ("Button Tapped".to_string(), 0.25),
                ("Search Performed".to_string(), 0.10),
                ("Item Added To Cart".to_string(), 0.08),
                ("Checkout Started".to_string(), 0.05),
                ("Purchase Completed".to_string(), 0.03),
                ("Error Shown".to_string(), 0.04),
            ],
            events_per_session: EventCountModel::default(),
            duplicate_rate: 0.05,
            event_gap_ms: (500, 30_000),
        }
    }
}
