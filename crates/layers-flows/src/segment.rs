//! Splitting a user's event stream into flows.

use crate::event::{Event, UserEvents};
use crate::flow::Flow;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Splits chronological event streams into flows delimited by a
/// session-start event.
#[derive(Debug, Clone)]
pub struct FlowSegmenter {
    session_start: String,
}

impl FlowSegmenter {
    /// Create a segmenter that opens a new flow at every `session_start` event.
    pub fn new(session_start: impl Into<String>) -> Self {
        Self {
            session_start: session_start.into(),
        }
    }

    pub fn session_start(&self) -> &str {
        &self.session_start
    }

    /// Segment one user's events into flows.
    ///
    /// `events` must already be sorted ascending by timestamp; the segmenter
    /// never reorders. On unsorted input flow boundaries and duplicate
    /// suppression are undefined.
    ///
    /// Within a flow, an event whose `(name, timestamp)` was already seen is
    /// dropped before anything else happens, so a repeated session-start event
    /// never opens a flow. Otherwise a session-start event closes the current
    /// flow when that flow is non-empty.
    pub fn segment(&self, owner_id: &str, events: &[Event]) -> Vec<Flow> {
        let mut flows = Vec::new();
        let mut buffer = FlowBuffer::default();

        for event in events {
            if buffer.contains(event) {
                continue;
            }
            if event.name == self.session_start && !buffer.is_empty() {
                flows.push(buffer.close(owner_id));
            }
            buffer.push(event);
        }

        if !buffer.is_empty() {
            flows.push(buffer.close(owner_id));
        }

        debug!(
            owner_id,
            events = events.len(),
            flows = flows.len(),
            "segmented event stream"
        );

        flows
    }

    /// Segment many users' streams, in parallel.
    ///
    /// Output order follows `users`, then flow order within each user.
    pub fn segment_users(&self, users: &[UserEvents]) -> Vec<Flow> {
        users
            .par_iter()
            .map(|user| self.segment(&user.user_id, &user.events))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }
}

/// The open flow of a single segmentation pass, with its dedup keys.
#[derive(Default)]
struct FlowBuffer<'a> {
    events: Vec<&'a Event>,
    seen: HashSet<(&'a str, i64)>,
}

impl<'a> FlowBuffer<'a> {
    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn contains(&self, event: &'a Event) -> bool {
        self.seen.contains(&event.dedup_key())
    }

    fn push(&mut self, event: &'a Event) {
        self.seen.insert(event.dedup_key());
        self.events.push(event);
    }

    fn close(&mut self, owner_id: &str) -> Flow {
        self.seen.clear();
        let events = self.events.drain(..).cloned().collect();
        Flow::new(owner_id, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(name: &str, ts: i64) -> Event {
        Event::new(name, ts)
    }

    fn shape(flows: &[Flow]) -> Vec<Vec<(String, i64)>> {
        flows
            .iter()
            .map(|f| f.events.iter().map(|e| (e.name.clone(), e.timestamp)).collect())
            .collect()
    }

    fn pairs(items: &[(&str, i64)]) -> Vec<(String, i64)> {
        items.iter().map(|(n, t)| (n.to_string(), *t)).collect()
    }

    #[test]
    fn test_empty_stream_yields_no_flows() {
        let segmenter = FlowSegmenter::new("A");
        assert!(segmenter.segment("u1", &[]).is_empty());
    }

    #[test]
    fn test_duplicates_dropped_and_starts_split() {
        let events = vec![
            ev("A", 100),
            ev("A", 100),
            ev("B", 200),
            ev("A", 300),
            ev("C", 350),
            ev("A", 400),
        ];

        let flows = FlowSegmenter::new("A").segment("u1", &events);

        assert_eq!(
            shape(&flows),
            vec![
                pairs(&[("A", 100), ("B", 200)]),
                pairs(&[("A", 300), ("C", 350)]),
                pairs(&[("A", 400)]),
            ]
        );
        assert!(flows.iter().all(|f| f.owner_id == "u1"));
    }

    #[test]
    fn test_single_start_event() {
        let flows = FlowSegmenter::new("A").segment("u1", &[ev("A", 100)]);
        assert_eq!(shape(&flows), vec![pairs(&[("A", 100)])]);
    }

    #[test]
    fn test_stream_without_leading_start() {
        let events = vec![ev("B", 1), ev("C", 2), ev("A", 3), ev("B", 4)];
        let flows = FlowSegmenter::new("A").segment("u1", &events);

        assert_eq!(
            shape(&flows),
            vec![pairs(&[("B", 1), ("C", 2)]), pairs(&[("A", 3), ("B", 4)])]
        );
        assert_eq!(flows[0].first_event_name(), Some("B"));
    }

    #[test]
    fn test_consecutive_starts_make_single_event_flows() {
        let events = vec![ev("A", 1), ev("A", 2), ev("A", 3)];
        let flows = FlowSegmenter::new("A").segment("u1", &events);
        assert_eq!(flows.len(), 3);
        assert!(flows.iter().all(|f| f.len() == 1));
    }

    #[test]
    fn test_repeated_start_never_splits() {
        let events = vec![ev("A", 100), ev("B", 100), ev("A", 100), ev("C", 120)];
        let flows = FlowSegmenter::new("A").segment("u1", &events);
        assert_eq!(
            shape(&flows),
            vec![pairs(&[("A", 100), ("B", 100), ("C", 120)])]
        );
    }

    #[test]
    fn test_dedup_scoped_to_flow() {
        let events = vec![ev("A", 1), ev("B", 5), ev("A", 5), ev("B", 5)];
        let flows = FlowSegmenter::new("A").segment("u1", &events);
        assert_eq!(flows[1].len(), 2);
    }

    #[test]
    fn test_timestamp_ties_keep_input_order() {
        let events = vec![ev("A", 1), ev("C", 5), ev("B", 5)];
        let flows = FlowSegmenter::new("A").segment("u1", &events);
        assert_eq!(shape(&flows), vec![pairs(&[("A", 1), ("C", 5), ("B", 5)])]);
    }

    #[test]
    fn test_segment_users_keeps_user_order() {
        let users = vec![
            UserEvents {
                user_id: "u2".to_string(),
                events: vec![ev("A", 1), ev("A", 2)],
            },
            UserEvents {
                user_id: "u1".to_string(),
                events: vec![ev("A", 1)],
            },
        ];

        let flows = FlowSegmenter::new("A").segment_users(&users);
        let owners: Vec<&str> = flows.iter().map(|f| f.owner_id.as_str()).collect();
        assert_eq!(owners, vec!["u2", "u2", "u1"]);
    }
}
