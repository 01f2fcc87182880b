//! CLI subcommands.

pub mod extract;
pub mod ingest;
pub mod parse;

use fattix_core::FattixConfig;

/// Load the pipeline configuration, defaulting when no file is given.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FattixConfig> {
    match config_path {
        Some(path) => Ok(FattixConfig::from_file(std::path::Path::new(path))?),
        None => Ok(FattixConfig::default()),
    }
}
