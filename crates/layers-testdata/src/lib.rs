//! Synthetic analytics cohorts for layers.
//!
//! Generates deterministic per-user event streams shaped like app analytics:
//! every session opens with a session-start event tagged with the user's app
//! version, session lengths follow a long-tailed distribution, and a share of
//! events is delivered twice, as real collectors do.
//!
//! # Quick Start
//!
//! ```rust
//! use layers_testdata::{presets, CohortGenerator};
//!
//! let cohort = CohortGenerator::new(presets::unit_test()).generate();
//! println!("{}", cohort.summary());
//! ```
//!
//! # Custom Configuration
//!
//! ```rust
//! use layers_testdata::{CohortBuilder, CohortGenerator};
//!
//! let config = CohortBuilder::new()
//!     .seed(7)
//!     .users(250)
//!     .versions(&[("3.1.0", 0.8), ("3.2.0", 0.2)])
//!     .quick_sessions()
//!     .build();
//!
//! let records = CohortGenerator::new(config).generate().records();
//! assert!(!records.is_empty());
//! ```

pub mod builder;
pub mod config;
pub mod distributions;
pub mod generator;
pub mod presets;
pub mod rng;

pub use builder::CohortBuilder;
pub use config::{CohortConfig, SessionConfig, TimeRange};
pub use distributions::{EventCountModel, WeightedChoice};
pub use generator::{CohortGenerator, GeneratedCohort, SyntheticUser};
pub use rng::SeededRngFactory;
