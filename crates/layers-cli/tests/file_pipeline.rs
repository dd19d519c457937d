//! Integration test for the file-based commands

use layers_cli::{
    analyze_records, generate_records, read_flows, read_records, resolve_config, sample_flows,
    segment_records, GenerateOptions, Overrides,
};
use std::io::Write;
use tempfile::TempDir;

/// Write a generated cohort as JSON Lines, the way `layers generate` does
fn write_cohort(dir: &TempDir, options: &GenerateOptions) -> anyhow::Result<std::path::PathBuf> {
    let (config, _) = resolve_config(None, dir.path())?;
    let path = dir.path().join("events.jsonl");
    let mut file = std::fs::File::create(&path)?;
    for record in generate_records(options, &config) {
        serde_json::to_writer(&mut file, &record)?;
        writeln!(file)?;
    }
    Ok(path)
}

#[test]
fn test_segment_then_sample_through_files() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let options = GenerateOptions {
        seed: 11,
        users: 80,
        versions: vec!["1.0.0".to_string()],
        duplicate_rate: 0.05,
    };
    let events = write_cohort(&dir, &options)?;

    let (config, _) = resolve_config(None, dir.path())?;
    let records = read_records(&events)?;
    let flows = segment_records(&records, &config)?;
    assert!(flows.len() >= 80);

    let flows_path = dir.path().join("flows.json");
    std::fs::write(&flows_path, serde_json::to_string(&flows)?)?;
    let reread = read_flows(&flows_path)?;
    assert_eq!(reread, flows);

    let config = Overrides {
        target_count: Some(25),
        seed: Some(3),
        ..Default::default()
    }
    .apply(config);
    let sampled = sample_flows(reread, &config);
    assert_eq!(sampled.len(), 25);

    let longest = flows.iter().map(|f| f.len()).max().unwrap_or(0);
    assert!(sampled.iter().any(|f| f.len() == longest));
    Ok(())
}

#[tokio::test]
async fn test_project_config_drives_analysis() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("layers.yml"),
        "session_start_event: Session Began\ntarget_count: 12\nseed: 5\n",
    )?;

    let options = GenerateOptions {
        seed: 2,
        users: 60,
        versions: vec!["2.0".to_string()],
        duplicate_rate: 0.0,
    };
    let events = write_cohort(&dir, &options)?;

    let (config, path) = resolve_config(None, dir.path())?;
    assert!(path.is_some());

    let records = read_records(&events)?;
    let payload = analyze_records(&records, "2.0", &config).await?;
    assert!(payload.sampled);
    assert!(payload.flow_count() <= 12);

    let again = analyze_records(&records, "2.0", &config).await?;
    assert_eq!(payload, again);
    Ok(())
}
