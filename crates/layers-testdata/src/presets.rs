//! Pre-configured cohort scenarios.

use crate::builder::CohortBuilder;
use crate::config::CohortConfig;

/// Small single-version cohort for unit tests.
///
/// - 100 users on version 1.0.0
/// - 1 to 5 sessions each
pub fn unit_test() -> CohortConfig {
    CohortBuilder::new().seed(42).users(100).build()
}

/// A cohort large enough that its flows must be sampled before analysis.
///
/// - 2,000 users on version 1.0.0
/// - engaged sessions, so flow lengths spread widely
pub fn large_cohort() -> CohortConfig {
    CohortBuilder::new()
        .seed(42)
        .users(2_000)
        .sessions_per_user(2, 8)
        .engaged_sessions()
        .build()
}

/// Users split across three app versions.
pub fn multi_version() -> CohortConfig {
    CohortBuilder::new()
        .seed(42)
        .users(600)
        .versions(&[("1.0.0", 0.5), ("1.1.0", 0.3), ("2.0.0", 0.2)])
        .build()
}
