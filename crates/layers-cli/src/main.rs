use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use layers_cli::{
    analyze_records, generate_records, list_versions, read_flows, read_records, resolve_config,
    sample_flows, segment_records, GenerateOptions, Overrides,
};
use layers_flows::{build_prompt, AnalysisConfig};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "layers")]
#[command(about = "Segment analytics event streams into user flows", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./layers.yml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split event records into per-session flows
    Segment(SegmentArgs),
    /// Bound a set of flows to a target count
    Sample(SampleArgs),
    /// Build the analysis payload for one app version's cohort
    Analyze(AnalyzeArgs),
    /// List app versions seen on session-start events
    Versions(VersionsArgs),
    /// Write a synthetic event stream as JSON Lines
    Generate(GenerateArgs),
}

#[derive(Args)]
struct SegmentArgs {
    /// Event records, as a JSON array or JSON Lines
    input: PathBuf,

    /// Name of the event that opens a flow
    #[arg(long)]
    session_start: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct SampleArgs {
    /// Flows, as a JSON array or JSON Lines
    input: PathBuf,

    /// Maximum number of flows to keep
    #[arg(long)]
    target_count: Option<i64>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Event records, as a JSON array or JSON Lines
    input: PathBuf,

    /// App version whose cohort to analyze
    #[arg(long)]
    version: String,

    #[arg(long)]
    session_start: Option<String>,

    #[arg(long)]
    version_attribute: Option<String>,

    #[arg(long)]
    target_count: Option<i64>,

    /// Upper bound on the serialized flow payload
    #[arg(long)]
    max_payload_bytes: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Print the full prompt built from these instructions instead of the payload
    #[arg(long)]
    instructions: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct VersionsArgs {
    /// Event records, as a JSON array or JSON Lines
    input: PathBuf,

    #[arg(long)]
    session_start: Option<String>,

    #[arg(long)]
    version_attribute: Option<String>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of users to generate
    #[arg(long, default_value = "100")]
    users: usize,

    /// Seed for reproducible generation
    #[arg(long, default_value = "42")]
    seed: u64,

    /// App versions to spread users across
    #[arg(long, value_delimiter = ',', default_value = "1.0.0")]
    versions: Vec<String>,

    /// Probability that an event is recorded twice
    #[arg(long, default_value = "0.05")]
    duplicate_rate: f64,

    /// Output file (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let (config, config_path) = resolve_config(cli.config.as_deref(), &cwd)?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "loaded configuration");
    }

    match cli.command {
        Commands::Segment(args) => segment(args, config),
        Commands::Sample(args) => sample(args, config),
        Commands::Analyze(args) => analyze(args, config).await,
        Commands::Versions(args) => versions(args, config).await,
        Commands::Generate(args) => generate(args, config),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn segment(args: SegmentArgs, config: AnalysisConfig) -> Result<()> {
    let config = Overrides {
        session_start_event: args.session_start,
        ..Default::default()
    }
    .apply(config);

    let records = read_records(&args.input)?;
    let flows = segment_records(&records, &config)?;
    print_json(&flows, args.pretty)
}

fn sample(args: SampleArgs, config: AnalysisConfig) -> Result<()> {
    let config = Overrides {
        target_count: args.target_count,
        seed: args.seed,
        ..Default::default()
    }
    .apply(config);

    let flows = read_flows(&args.input)?;
    let sampled = sample_flows(flows, &config);
    print_json(&sampled, args.pretty)
}

async fn analyze(args: AnalyzeArgs, config: AnalysisConfig) -> Result<()> {
    let config = Overrides {
        session_start_event: args.session_start,
        version_attribute: args.version_attribute,
        target_count: args.target_count,
        max_payload_bytes: args.max_payload_bytes,
        seed: args.seed,
    }
    .apply(config);

    let records = read_records(&args.input)?;
    let payload = analyze_records(&records, &args.version, &config).await?;

    match args.instructions {
        Some(instructions) => {
            println!("{}", build_prompt(&instructions, &payload)?);
            Ok(())
        }
        None => print_json(&payload, args.pretty),
    }
}

async fn versions(args: VersionsArgs, config: AnalysisConfig) -> Result<()> {
    let config = Overrides {
        session_start_event: args.session_start,
        version_attribute: args.version_attribute,
        ..Default::default()
    }
    .apply(config);

    let records = read_records(&args.input)?;
    for version in list_versions(&records, &config).await? {
        println!("{}", version);
    }
    Ok(())
}

fn generate(args: GenerateArgs, config: AnalysisConfig) -> Result<()> {
    let options = GenerateOptions {
        seed: args.seed,
        users: args.users,
        versions: args.versions,
        duplicate_rate: args.duplicate_rate,
    };
    let records = generate_records(&options, &config);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout().lock())),
    };

    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    out.flush()?;

    if let Some(path) = &args.output {
        info!(records = records.len(), path = %path.display(), "wrote event stream");
    }
    Ok(())
}
