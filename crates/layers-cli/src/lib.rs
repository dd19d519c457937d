pub mod commands;
pub mod config;
pub mod errors;
pub mod input;

pub use commands::{
    analyze_records, generate_records, list_versions, sample_flows, segment_records,
    GenerateOptions,
};
pub use config::{load_config, resolve_config, Overrides, CONFIG_FILE};
pub use errors::CliError;
pub use input::{parse_items, read_flows, read_records};
