//! Size-reduced flow records and payload budgeting.

use crate::error::FlowError;
use crate::flow::Flow;
use crate::sample::FlowSampler;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An event reduced to its name and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedEvent {
    pub event_name: String,
    pub timestamp: i64,
}

/// A flow with attributes dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedFlow {
    pub user_id: String,
    pub flow: Vec<ProjectedEvent>,
}

/// Project a flow down to owner, event names and timestamps.
pub fn project(flow: &Flow) -> ProjectedFlow {
    ProjectedFlow {
        user_id: flow.owner_id.clone(),
        flow: flow
            .events
            .iter()
            .map(|e| ProjectedEvent {
                event_name: e.name.clone(),
                timestamp: e.timestamp,
            })
            .collect(),
    }
}

/// The bounded set of flows handed to a text-generation request, with the
/// sizes the caller needs to decide whether to retry smaller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub flows: Vec<ProjectedFlow>,
    /// Number of flows before sampling
    pub total_flows: usize,
    /// Whether sampling reduced the flow set
    pub sampled: bool,
    /// The target count used for the final sample
    pub target_count: i64,
    /// Length of the compact JSON encoding of `flows`
    pub payload_bytes: usize,
}

impl AnalysisPayload {
    /// Build a payload from already-bounded flows.
    pub fn new(
        flows: &[Flow],
        total_flows: usize,
        target_count: i64,
    ) -> Result<Self, FlowError> {
        Self::from_projected(flows.iter().map(project).collect(), total_flows, target_count)
    }

    fn from_projected(
        projected: Vec<ProjectedFlow>,
        total_flows: usize,
        target_count: i64,
    ) -> Result<Self, FlowError> {
        let payload_bytes = serde_json::to_vec(&projected)?.len();
        Ok(Self {
            sampled: projected.len() < total_flows,
            flows: projected,
            total_flows,
            target_count,
            payload_bytes,
        })
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Target count for a smaller retry, or `None` once the payload holds at
    /// most one flow.
    ///
    /// Halves the number of flows actually sent, not the requested target, so
    /// every retry carries strictly fewer flows.
    pub fn smaller_target(&self) -> Option<i64> {
        let sent = i64::try_from(self.flow_count()).unwrap_or(i64::MAX);
        let effective = sent.min(self.target_count);
        (effective > 1).then(|| effective / 2)
    }

    /// Compact JSON encoding of the projected flows.
    pub fn to_json(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string(&self.flows)?)
    }
}

/// Sample, project and measure `flows`, halving the flow count while the
/// encoded payload exceeds `max_payload_bytes`.
///
/// Stops at a single flow; the returned payload may then still be over
/// budget and the caller decides what to do with it.
pub fn fit_payload<R: Rng + ?Sized>(
    flows: &[Flow],
    target_count: i64,
    max_payload_bytes: usize,
    rng: &mut R,
) -> Result<AnalysisPayload, FlowError> {
    let mut target = target_count;

    loop {
        let sampled = FlowSampler::new(target).sample_refs(flows, rng);
        let projected = sampled.into_iter().map(project).collect();
        let payload = AnalysisPayload::from_projected(projected, flows.len(), target)?;

        debug!(
            target,
            flows = payload.flow_count(),
            bytes = payload.payload_bytes,
            limit = max_payload_bytes,
            "measured payload"
        );

        if payload.payload_bytes <= max_payload_bytes {
            return Ok(payload);
        }

        match payload.smaller_target() {
            Some(smaller) => target = smaller,
            None => {
                warn!(
                    bytes = payload.payload_bytes,
                    limit = max_payload_bytes,
                    "payload exceeds budget at minimum target count"
                );
                return Ok(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn flows(count: usize, len: usize) -> Vec<Flow> {
        (0..count)
            .map(|u| {
                let events = (0..len)
                    .map(|i| Event::new("Screen Viewed", i as i64).with_attribute("screen", "home"))
                    .collect();
                Flow::new(format!("user-{}", u), events)
            })
            .collect()
    }

    #[test]
    fn test_project_drops_attributes() {
        let flow = Flow::new(
            "u1",
            vec![Event::new("App Launched", 100).with_attribute("app_version", "2.0")],
        );

        let projected = project(&flow);
        assert_eq!(
            serde_json::to_value(&projected).unwrap(),
            json!({"user_id": "u1", "flow": [{"event_name": "App Launched", "timestamp": 100}]})
        );
    }

    #[test]
    fn test_payload_reports_sizes() {
        let input = flows(4, 2);
        let payload = AnalysisPayload::new(&input[..2], input.len(), 2).unwrap();

        assert_eq!(payload.flow_count(), 2);
        assert_eq!(payload.total_flows, 4);
        assert!(payload.sampled);
        assert_eq!(payload.payload_bytes, payload.to_json().unwrap().len());
    }

    #[test]
    fn test_fit_payload_within_budget_keeps_target() {
        let input = flows(5, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let payload = fit_payload(&input, 10, usize::MAX, &mut rng).unwrap();

        assert_eq!(payload.flow_count(), 5);
        assert!(!payload.sampled);
        assert_eq!(payload.target_count, 10);
    }

    #[test]
    fn test_fit_payload_halves_until_it_fits() {
        let input = flows(64, 5);
        let one_flow = AnalysisPayload::new(&input[..1], 1, 1).unwrap().payload_bytes;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let payload = fit_payload(&input, 64, one_flow * 10, &mut rng).unwrap();

        assert!(payload.payload_bytes <= one_flow * 10);
        assert_eq!(payload.target_count, 8);
        assert_eq!(payload.flow_count(), 8);
    }

    #[test]
    fn test_fit_payload_gives_up_at_one() {
        let input = flows(10, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let payload = fit_payload(&input, 10, 1, &mut rng).unwrap();

        assert_eq!(payload.target_count, 1);
        assert_eq!(payload.flow_count(), 1);
        assert!(payload.payload_bytes > 1);
    }

    #[test]
    fn test_fit_payload_halves_flows_sent_not_target() {
        let input = flows(5, 4);
        let two_flows = AnalysisPayload::new(&input[..2], 2, 2).unwrap().payload_bytes;
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let payload = fit_payload(&input, 100, two_flows, &mut rng).unwrap();

        // 5 flows sent at target 100, then straight to 2.
        assert_eq!(payload.target_count, 2);
        assert_eq!(payload.flow_count(), 2);
        assert!(payload.payload_bytes <= two_flows);
    }

    #[test]
    fn test_smaller_target_tracks_flows_sent() {
        let input = flows(5, 1);
        let all = AnalysisPayload::new(&input, 5, 100).unwrap();
        assert_eq!(all.smaller_target(), Some(2));

        let capped = AnalysisPayload::new(&input[..3], 5, 3).unwrap();
        assert_eq!(capped.smaller_target(), Some(1));

        let single = AnalysisPayload::new(&input[..1], 5, 1).unwrap();
        assert_eq!(single.smaller_target(), None);

        let empty = AnalysisPayload::new(&[], 0, 100).unwrap();
        assert_eq!(empty.smaller_target(), None);
    }
}
