//! Command implementations, kept free of terminal I/O so they can be tested.

use crate::errors::CliError;
use anyhow::{Context, Result};
use layers_flows::{
    cohort_flows, group_by_user, prepare_analysis, sampling_rng, validate_records,
    AnalysisConfig, AnalysisPayload, EventRecord, EventStore, Flow, FlowSampler, FlowSegmenter,
    InMemoryEventStore,
};
use layers_testdata::{CohortBuilder, CohortGenerator};
use tracing::info;

/// Validate records and segment each user's stream.
///
/// Records must already be in chronological order per user; they are not
/// re-sorted.
pub fn segment_records(records: &[EventRecord], config: &AnalysisConfig) -> Result<Vec<Flow>> {
    let events = validate_records(records).context("Event stream rejected")?;
    let users = group_by_user(events);
    let flows = FlowSegmenter::new(config.session_start_event.as_str()).segment_users(&users);

    info!(
        records = records.len(),
        users = users.len(),
        flows = flows.len(),
        "segmented records"
    );

    Ok(flows)
}

/// Bound a flow collection to the configured target count.
pub fn sample_flows(flows: Vec<Flow>, config: &AnalysisConfig) -> Vec<Flow> {
    let total = flows.len();
    let mut rng = sampling_rng(config);
    let sampled = FlowSampler::new(config.target_count).sample(flows, &mut rng);

    info!(
        total,
        kept = sampled.len(),
        target = config.target_count,
        "sampled flows"
    );

    sampled
}

fn build_store(records: &[EventRecord], config: &AnalysisConfig) -> Result<InMemoryEventStore> {
    InMemoryEventStore::new(
        records,
        config.session_start_event.as_str(),
        config.version_attribute.as_str(),
    )
    .context("Event stream rejected")
}

/// App versions seen on session-start events.
pub async fn list_versions(records: &[EventRecord], config: &AnalysisConfig) -> Result<Vec<String>> {
    let store = build_store(records, config)?;
    Ok(store.app_versions().await?)
}

/// Segment a version cohort and bound it into an analysis payload.
pub async fn analyze_records(
    records: &[EventRecord],
    version: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisPayload> {
    let store = build_store(records, config)?;

    let flows = cohort_flows(&store, version, config).await?;
    if flows.is_empty() {
        return Err(CliError::UnknownVersion {
            version: version.to_string(),
            available: store.app_versions().await?,
        }
        .into());
    }

    let mut rng = sampling_rng(config);
    Ok(prepare_analysis(&flows, config, &mut rng)?)
}

/// Settings for the `generate` command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub seed: u64,
    pub users: usize,
    pub versions: Vec<String>,
    pub duplicate_rate: f64,
}

/// Generate a synthetic cohort as store records.
///
/// Users are spread evenly across `versions`.
pub fn generate_records(options: &GenerateOptions, config: &AnalysisConfig) -> Vec<EventRecord> {
    let versions: Vec<(&str, f64)> = options.versions.iter().map(|v| (v.as_str(), 1.0)).collect();

    let mut builder = CohortBuilder::new()
        .seed(options.seed)
        .users(options.users)
        .duplicate_rate(options.duplicate_rate)
        .session_start(&config.session_start_event)
        .version_attribute(&config.version_attribute);
    if !versions.is_empty() {
        builder = builder.versions(&versions);
    }

    let cohort = CohortGenerator::new(builder.build()).generate();
    info!("{}", cohort.summary());
    cohort.records()
}
