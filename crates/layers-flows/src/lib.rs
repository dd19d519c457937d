//! Flow segmentation and bounded sampling for analytics event streams.
//!
//! A user's chronological events are split into *flows*, one per session,
//! delimited by a designated session-start event (e.g. "App Launched").
//! When a cohort yields more flows than a text-generation request can hold,
//! a stratified sample keeps the longest journeys, a slice around the median
//! length and a random remainder.
//!
//! # Segmentation
//!
//! ```rust
//! use layers_flows::{Event, FlowSegmenter};
//!
//! let events = vec![
//!     Event::new("App Launched", 100),
//!     Event::new("App Launched", 100), // duplicate, dropped
//!     Event::new("Screen Viewed", 200),
//!     Event::new("App Launched", 300),
//! ];
//!
//! let flows = FlowSegmenter::new("App Launched").segment("user-1", &events);
//! assert_eq!(flows.len(), 2);
//! assert_eq!(flows[0].len(), 2);
//! ```
//!
//! # Sampling
//!
//! ```rust
//! use layers_flows::{Event, Flow, FlowSampler};
//!
//! let flows: Vec<Flow> = (0..10)
//!     .map(|i| Flow::new(format!("u{}", i), vec![Event::new("App Launched", i)]))
//!     .collect();
//!
//! let sample = FlowSampler::new(6).sample_seeded(flows, 42);
//! assert_eq!(sample.len(), 6);
//! ```
//!
//! # Concurrency
//!
//! Segmentation and sampling are pure: each call owns its buffers, so
//! independent callers need no coordination. Sampling takes its randomness
//! source as an argument.

pub mod config;
pub mod error;
pub mod event;
pub mod flow;
pub mod pipeline;
pub mod project;
pub mod sample;
pub mod segment;
pub mod store;

// Re-export main types for convenience
pub use config::AnalysisConfig;
pub use error::{AnalysisError, FlowError, GenerationError, StoreError};
pub use event::{group_by_user, validate_records, Attributes, Event, EventRecord, UserEvents};
pub use flow::Flow;
pub use pipeline::{
    analyze, analyze_cohort, build_prompt, cohort_flows, prepare_analysis, sampling_rng,
    AnalysisOutcome, TextGenerator,
};
pub use project::{fit_payload, project, AnalysisPayload, ProjectedEvent, ProjectedFlow};
pub use sample::FlowSampler;
pub use segment::FlowSegmenter;
pub use store::{EventStore, InMemoryEventStore};
