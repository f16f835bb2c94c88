//! Command implementations.

mod info;
mod simulate;
mod validate;

pub use info::run_info;
pub use simulate::run_simulate;
pub use validate::run_validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{LoaderConfig, Roster, SharedHost};
use page_sim::SimulatedPage;

use crate::error::CliError;

/// Load a configuration file, failing early when it does not exist
fn load_config(path: &Path) -> Result<LoaderConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Roster built against a throwaway page, for inspecting predicates only
fn preview_roster(config: &LoaderConfig) -> Roster {
    let host: SharedHost = Arc::new(SimulatedPage::new());
    vendors::build_roster(config, host)
}
