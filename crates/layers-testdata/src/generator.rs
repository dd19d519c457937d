//! Main cohort generator.

use crate::config::CohortConfig;
use crate::distributions::WeightedChoice;
use crate::rng::SeededRngFactory;
use layers_flows::{Event, EventRecord, UserEvents};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// A generated user.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticUser {
    /// Unique user identifier
    pub user_id: String,
    /// App version reported on every session start
    pub app_version: String,
    /// Number of sessions generated
    pub sessions: u32,
}

/// All generated data.
#[derive(Debug, Clone)]
pub struct GeneratedCohort {
    /// Generated users
    pub users: Vec<SyntheticUser>,
    /// Events grouped by user, each list in chronological order
    pub events: Vec<UserEvents>,
    /// Number of events that were emitted twice
    pub duplicates: usize,
}

impl GeneratedCohort {
    pub fn event_count(&self) -> usize {
        self.events.iter().map(|u| u.events.len()).sum()
    }

    pub fn session_count(&self) -> u32 {
        self.users.iter().map(|u| u.sessions).sum()
    }

    /// Flatten into store records, user by user.
    pub fn records(&self) -> Vec<EventRecord> {
        self.events
            .iter()
            .flat_map(|user| {
                user.events
                    .iter()
                    .map(move |event| EventRecord::new(user.user_id.clone(), event))
            })
            .collect()
    }

    /// Flatten into `(user_id, event)` pairs, user by user.
    pub fn into_pairs(self) -> Vec<(String, Event)> {
        self.events
            .into_iter()
            .flat_map(|user| {
                let user_id = user.user_id;
                user.events
                    .into_iter()
                    .map(move |event| (user_id.clone(), event))
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Generated {} users, {} sessions, {} events ({} duplicates)",
            self.users.len(),
            self.session_count(),
            self.event_count(),
            self.duplicates
        )
    }
}

/// Main entry point for generating synthetic cohorts.
pub struct CohortGenerator {
    config: CohortConfig,
    rng_factory: SeededRngFactory,
}

impl CohortGenerator {
    pub fn new(config: CohortConfig) -> Self {
        Self {
            rng_factory: SeededRngFactory::new(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Generate every user and their event stream.
    pub fn generate(&self) -> GeneratedCohort {
        let versions = WeightedChoice::new(self.config.versions.clone());
        let event_types = WeightedChoice::new(self.config.sessions.event_types.clone());

        let mut users = Vec::with_capacity(self.config.users);
        let mut events = Vec::with_capacity(self.config.users);
        let mut duplicates = 0;

        for index in 0..self.config.users {
            let mut rng = self.rng_factory.indexed_stream("user", index as u64);
            let user_id = format!("user_{:06x}", index);
            // Without any version there is no cohort to place users in.
            let Some(app_version) = versions.sample(&mut rng) else {
                break;
            };

            let (min, max) = self.config.sessions.sessions_per_user;
            let sessions = rng.gen_range(min..=max);

            let mut stream = UserStream::default();
            for start in self.session_starts(&mut rng, sessions) {
                self.generate_session(&mut rng, &mut stream, start, &app_version, &event_types);
            }

            duplicates += stream.duplicates;
            users.push(SyntheticUser {
                user_id: user_id.clone(),
                app_version,
                sessions,
            });
            events.push(UserEvents {
                user_id,
                events: stream.events,
            });
        }

        GeneratedCohort {
            users,
            events,
            duplicates,
        }
    }

    /// Sorted session start times, in epoch millis.
    fn session_starts(&self, rng: &mut ChaCha8Rng, sessions: u32) -> Vec<i64> {
        let start = self.config.time_range.start.timestamp_millis();
        let range_ms = self.config.time_range.duration().num_milliseconds();

        let mut starts: Vec<i64> = (0..sessions)
            .map(|_| {
                if range_ms > 0 {
                    start + rng.gen_range(0..range_ms)
                } else {
                    start
                }
            })
            .collect();
        starts.sort_unstable();
        starts
    }

    fn generate_session(
        &self,
        rng: &mut ChaCha8Rng,
        stream: &mut UserStream,
        start: i64,
        app_version: &str,
        event_types: &WeightedChoice<String>,
    ) {
        let session = &self.config.sessions;

        // A session that would begin inside the previous one is pushed back.
        let mut ts = start.max(stream.last_timestamp() + 1);
        let launch = Event::new(session.session_start_event.as_str(), ts)
            .with_attribute(session.version_attribute.as_str(), app_version);
        stream.push(rng, launch, session.duplicate_rate);

        let (min_gap, max_gap) = session.event_gap_ms;
        let count = session.events_per_session.sample(rng);
        for _ in 0..count {
            let Some(name) = event_types.sample(rng) else {
                break;
            };
            ts += rng.gen_range(min_gap..=max_gap.max(min_gap));
            stream.push(rng, Event::new(name, ts), session.duplicate_rate);
        }
    }
}

/// One user's events under construction.
#[derive(Default)]
struct UserStream {
    events: Vec<Event>,
    duplicates: usize,
}

impl UserStream {
    fn last_timestamp(&self) -> i64 {
        self.events.last().map_or(i64::MIN + 1, |e| e.timestamp)
    }

    fn push(&mut self, rng: &mut ChaCha8Rng, event: Event, duplicate_rate: f64) {
        if duplicate_rate > 0.0 && rng.gen_bool(duplicate_rate.min(1.0)) {
            self.events.push(event.clone());
            self.duplicates += 1;
        }
        self.events.push(event);
    }
}
