//! Distributions used to shape synthetic cohorts.

use rand::Rng;
use rand_distr::{Distribution, Pareto};

/// Weighted choice from a list of values.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    choices: Vec<(T, f64)>,
    total_weight: f64,
}

impl<T: Clone> WeightedChoice<T> {
    pub fn new(choices: Vec<(T, f64)>) -> Self {
        let total_weight = choices.iter().map(|(_, w)| w).sum();
        Self {
            choices,
            total_weight,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Draw one value, or `None` when there is nothing to choose from.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        let mut choice = rng.gen::<f64>() * self.total_weight;
        for (value, weight) in &self.choices {
            choice -= weight;
            if choice <= 0.0 {
                return Some(value.clone());
            }
        }
        self.choices.last().map(|(value, _)| value.clone())
    }
}

/// Capped power law for "long tail" counts: most sessions are short, a few
/// are very long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventCountModel {
    /// Shape parameter (higher = fewer long sessions)
    pub alpha: f64,
    /// Minimum events per session, excluding the session-start event
    pub min_events: u32,
    /// Maximum events per session, excluding the session-start event
    pub max_events: u32,
}

impl Default for EventCountModel {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            min_events: 1,
            max_events: 40,
        }
    }
}

impl EventCountModel {
    /// Model for short sessions.
    pub fn quick_sessions() -> Self {
        Self {
            alpha: 3.0,
            min_events: 0,
            max_events: 10,
        }
    }

    /// Model for long, engaged sessions.
    pub fn high_engagement() -> Self {
        Self {
            alpha: 1.5,
            min_events: 3,
            max_events: 150,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        // Pareto needs a positive scale; shift by one and shift back.
        let scale = self.min_events as f64 + 1.0;
        let value = match Pareto::new(scale, self.alpha) {
            Ok(pareto) => pareto.sample(rng) - 1.0,
            Err(_) => self.min_events as f64,
        };
        (value as u32).clamp(self.min_events, self.max_events)
    }
}
