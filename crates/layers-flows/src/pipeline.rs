//! Cohort analysis pipeline: store → flows → bounded payload → generation.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, FlowError, GenerationError, StoreError};
use crate::flow::Flow;
use crate::project::{fit_payload, AnalysisPayload};
use crate::segment::FlowSegmenter;
use crate::store::EventStore;
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// A text-generation service with a prompt size limit.
///
/// The response is returned as-is; interpreting it is the caller's concern.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// The generator's response together with the payload that produced it.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub response: String,
    pub payload: AnalysisPayload,
}

/// Randomness source for sampling: seeded when `config.seed` is set.
pub fn sampling_rng(config: &AnalysisConfig) -> ChaCha8Rng {
    match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Fetch a version cohort from `store` and segment every user's stream.
pub async fn cohort_flows<S: EventStore + ?Sized>(
    store: &S,
    version: &str,
    config: &AnalysisConfig,
) -> Result<Vec<Flow>, StoreError> {
    let users = store.cohort_events(version).await?;
    let flows = FlowSegmenter::new(config.session_start_event.as_str()).segment_users(&users);

    info!(
        version,
        users = users.len(),
        flows = flows.len(),
        "segmented cohort"
    );

    Ok(flows)
}

/// Bound `flows` to the configured target count and payload size.
pub fn prepare_analysis<R: Rng + ?Sized>(
    flows: &[Flow],
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<AnalysisPayload, FlowError> {
    let payload = fit_payload(flows, config.target_count, config.max_payload_bytes, rng)?;

    info!(
        total = payload.total_flows,
        kept = payload.flow_count(),
        bytes = payload.payload_bytes,
        "prepared analysis payload"
    );

    Ok(payload)
}

/// Caller-supplied instructions followed by the JSON flow payload.
pub fn build_prompt(instructions: &str, payload: &AnalysisPayload) -> Result<String, FlowError> {
    Ok(format!("{}\n\n{}", instructions, payload.to_json()?))
}

/// Send a bounded sample of `flows` to `generator`.
///
/// When the generator reports the prompt as too large, the number of flows
/// sent is halved and the flows resampled, down to a single flow. Every retry
/// sends fewer flows than the prompt it replaces.
pub async fn analyze<G, R>(
    generator: &G,
    instructions: &str,
    flows: &[Flow],
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<AnalysisOutcome, AnalysisError>
where
    G: TextGenerator + ?Sized,
    R: Rng + Send + ?Sized,
{
    let mut target = config.target_count;

    loop {
        let payload = fit_payload(flows, target, config.max_payload_bytes, rng)?;
        let prompt = build_prompt(instructions, &payload)?;

        match generator.generate(&prompt).await {
            Ok(response) => return Ok(AnalysisOutcome { response, payload }),
            Err(GenerationError::PayloadTooLarge { prompt_bytes }) => {
                match payload.smaller_target() {
                    Some(smaller) => target = smaller,
                    None => return Err(GenerationError::PayloadTooLarge { prompt_bytes }.into()),
                }
                warn!(prompt_bytes, retry_target = target, "prompt rejected as too large");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Fetch, segment, bound and analyse a version cohort.
pub async fn analyze_cohort<S, G>(
    store: &S,
    generator: &G,
    version: &str,
    instructions: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalysisError>
where
    S: EventStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let flows = cohort_flows(store, version, config).await?;
    let mut rng = sampling_rng(config);
    analyze(generator, instructions, &flows, config, &mut rng).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::store::InMemoryEventStore;
    use std::sync::Mutex;

    /// Rejects prompts above a byte limit and records every prompt.
    struct LimitedGenerator {
        limit: usize,
        prompts: Mutex<Vec<String>>,
    }

    impl LimitedGenerator {
        fn new(limit: usize) -> Self {
            Self {
                limit,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for LimitedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if prompt.len() > self.limit {
                return Err(GenerationError::PayloadTooLarge {
                    prompt_bytes: prompt.len(),
                });
            }
            Ok(format!("analysed {} bytes", prompt.len()))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::failed("rate limited"))
        }
    }

    fn cohort_store() -> InMemoryEventStore {
        let mut events = Vec::new();
        for u in 0..30 {
            let user = format!("user-{:02}", u);
            let version = if u % 3 == 0 { "1.0" } else { "2.0" };
            for s in 0..3 {
                let base = (s * 1_000) as i64;
                events.push((
                    user.clone(),
                    Event::new("App Launched", base).with_attribute("app_version", version),
                ));
                for i in 0..(u % 5 + 1) {
                    events.push((user.clone(), Event::new("Screen Viewed", base + 1 + i as i64)));
                }
            }
        }
        InMemoryEventStore::from_events(events, "App Launched", "app_version")
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default().with_seed(17)
    }

    #[tokio::test]
    async fn test_cohort_flows_segments_each_user() {
        let flows = cohort_flows(&cohort_store(), "1.0", &config()).await.unwrap();
        // Users 0, 3, ..., 27 with three sessions each.
        assert_eq!(flows.len(), 30);
        assert!(flows
            .iter()
            .all(|f| f.first_event_name() == Some("App Launched")));
    }

    #[tokio::test]
    async fn test_prepare_analysis_bounds_flow_count() {
        let flows = cohort_flows(&cohort_store(), "2.0", &config()).await.unwrap();
        assert_eq!(flows.len(), 60);

        let config = config().with_target_count(12);
        let mut rng = sampling_rng(&config);
        let payload = prepare_analysis(&flows, &config, &mut rng).unwrap();

        assert_eq!(payload.flow_count(), 12);
        assert_eq!(payload.total_flows, 60);
        assert!(payload.sampled);
    }

    #[tokio::test]
    async fn test_analyze_retries_with_smaller_target() {
        let flows = cohort_flows(&cohort_store(), "2.0", &config()).await.unwrap();
        let config = config().with_target_count(40);
        let generator = LimitedGenerator::new(2_000);
        let mut rng = sampling_rng(&config);

        let outcome = analyze(&generator, "Summarise these flows.", &flows, &config, &mut rng)
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap().clone();
        assert!(prompts.len() > 1);
        assert!(prompts.last().unwrap().len() <= 2_000);
        assert!(outcome.payload.target_count < 40);
        assert!(outcome.response.starts_with("analysed"));
    }

    #[tokio::test]
    async fn test_analyze_propagates_other_failures() {
        let flows = cohort_flows(&cohort_store(), "1.0", &config()).await.unwrap();
        let mut rng = sampling_rng(&config());

        let err = analyze(&FailingGenerator, "x", &flows, &config(), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Generation(GenerationError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_analyze_cohort_end_to_end() {
        let generator = LimitedGenerator::new(usize::MAX);
        let outcome = analyze_cohort(&cohort_store(), &generator, "1.0", "Find drop-offs.", &config())
            .await
            .unwrap();

        assert_eq!(outcome.payload.flow_count(), 30);
        assert!(!outcome.payload.sampled);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = config();
        let mut a = sampling_rng(&config);
        let mut b = sampling_rng(&config);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    fn same_shape_flows(count: usize) -> Vec<Flow> {
        (0..count)
            .map(|u| {
                let events = (0..4)
                    .map(|i| Event::new("Screen Viewed", i as i64))
                    .collect();
                Flow::new(format!("user-{}", u), events)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_analyze_never_resends_same_prompt() {
        let flows = same_shape_flows(5);
        let instructions = "Summarise these flows.";
        let two_flows = AnalysisPayload::new(&flows[..2], flows.len(), 2).unwrap();
        let limit = build_prompt(instructions, &two_flows).unwrap().len();

        let config = config();
        assert!(config.target_count as usize > flows.len());
        let generator = LimitedGenerator::new(limit);
        let mut rng = sampling_rng(&config);

        let outcome = analyze(&generator, instructions, &flows, &config, &mut rng)
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap().clone();
        assert!(prompts.windows(2).all(|pair| pair[0] != pair[1]));
        assert_eq!(prompts.len(), 2);
        assert_eq!(outcome.payload.flow_count(), 2);
    }

    #[tokio::test]
    async fn test_analyze_gives_up_after_single_flow() {
        let flows = same_shape_flows(5);
        let generator = LimitedGenerator::new(1);
        let mut rng = sampling_rng(&config());

        let err = analyze(&generator, "x", &flows, &config(), &mut rng)
            .await
            .unwrap_err();

        let counts: Vec<usize> = generator
            .prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.matches("user_id").count())
            .collect();
        assert_eq!(counts, vec![5, 2, 1]);
        assert!(matches!(
            err,
            AnalysisError::Generation(GenerationError::PayloadTooLarge { .. })
        ));
    }
}
