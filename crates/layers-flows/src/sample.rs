//! Bounded stratified sampling of flows.
//!
//! When a cohort produces more flows than fit in one text-generation request,
//! [`FlowSampler`] keeps three strata so the subset still carries signal:
//!
//! 1. **Top**: the `k / 3` longest flows.
//! 2. **Middle**: a slice of the length-sorted sequence centred on the median,
//!    from `n / 2 - k / 6` to `n / 2 + k / 6`.
//! 3. **Other**: a uniform draw without replacement from the flows not yet
//!    selected, filling the remaining budget.
//!
//! The combined selection is shuffled so the consumer sees no length ordering.

use crate::flow::Flow;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use tracing::debug;

/// Selects at most `target_count` representative flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSampler {
    target_count: i64,
}

impl FlowSampler {
    /// Create a sampler. A non-positive `target_count` always yields an empty
    /// sample.
    pub fn new(target_count: i64) -> Self {
        Self { target_count }
    }

    pub fn target_count(&self) -> i64 {
        self.target_count
    }

    /// Sample `flows` using the given randomness source.
    ///
    /// Returns `flows` unchanged (same order) when it already fits.
    pub fn sample<R: Rng + ?Sized>(&self, flows: Vec<Flow>, rng: &mut R) -> Vec<Flow> {
        let selected = match self.select(&flows, rng) {
            Some(selected) => selected,
            None => return flows,
        };

        let mut slots: Vec<Option<Flow>> = flows.into_iter().map(Some).collect();
        selected
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }

    /// Like [`FlowSampler::sample`], but borrows the kept flows instead of
    /// taking ownership of the whole collection.
    pub fn sample_refs<'a, R: Rng + ?Sized>(&self, flows: &'a [Flow], rng: &mut R) -> Vec<&'a Flow> {
        match self.select(flows, rng) {
            Some(selected) => selected.into_iter().map(|idx| &flows[idx]).collect(),
            None => flows.iter().collect(),
        }
    }

    /// Indices to keep, or `None` when every flow is kept in input order.
    fn select<R: Rng + ?Sized>(&self, flows: &[Flow], rng: &mut R) -> Option<Vec<usize>> {
        if self.target_count <= 0 {
            return Some(Vec::new());
        }
        // Saturates where usize is narrower than i64.
        let k = usize::try_from(self.target_count).unwrap_or(usize::MAX);
        if flows.len() <= k {
            return None;
        }

        let lengths: Vec<usize> = flows.iter().map(Flow::len).collect();
        Some(select_indices(&lengths, k, rng))
    }

    /// Sample reproducibly from a seed.
    pub fn sample_seeded(&self, flows: Vec<Flow>, seed: u64) -> Vec<Flow> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.sample(flows, &mut rng)
    }
}

/// Choose which input positions to keep, given each item's length.
///
/// Requires `lengths.len() > k` and `k > 0`. Returned indices refer to
/// positions in `lengths`, are pairwise distinct, and number at most `k`.
pub fn select_indices<R: Rng + ?Sized>(lengths: &[usize], k: usize, rng: &mut R) -> Vec<usize> {
    let n = lengths.len();

    // Stable: equal lengths keep input order.
    let mut by_length: Vec<usize> = (0..n).collect();
    by_length.sort_by_key(|&idx| Reverse(lengths[idx]));

    let mut chosen = vec![false; n];
    let mut selected = Vec::with_capacity(k);

    let top_width = (k / 3).min(n);
    for &idx in &by_length[..top_width] {
        chosen[idx] = true;
        selected.push(idx);
    }
    let top_count = selected.len();

    let half = (n / 2) as i64;
    let sixth = (k / 6) as i64;
    let start = (half - sixth).clamp(0, n as i64) as usize;
    let end = (half + sixth).clamp(0, n as i64) as usize;
    for &idx in &by_length[start..end] {
        if !chosen[idx] {
            chosen[idx] = true;
            selected.push(idx);
        }
    }
    let middle_count = selected.len() - top_count;

    let remaining_budget = k.saturating_sub(selected.len());
    let pool: Vec<usize> = (0..n).filter(|&idx| !chosen[idx]).collect();
    let draw = remaining_budget.min(pool.len());
    selected.extend(pool.choose_multiple(rng, draw).copied());

    selected.shuffle(rng);

    debug!(
        input = n,
        target = k,
        top = top_count,
        middle = middle_count,
        other = draw,
        "sampled flows"
    );

    selected
}
