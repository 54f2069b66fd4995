// Command handlers module
pub mod config;
pub mod run;
pub mod status;

use anyhow::Result;
use clap::ArgMatches;

use crate::core::ConfigStore;

/// Config store selected by the global `--config` flag, or the default location
pub fn config_store(matches: &ArgMatches) -> Result<ConfigStore> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(ConfigStore::new(path)),
        None => ConfigStore::default_location(),
    }
}
