//! `sdm status`: classify every monitored volume once.

use anyhow::Result;
use clap::ArgMatches;

use super::config_store;
use crate::core::disk_monitor::{scan_volumes, system_probe};
use crate::ui::print_status_table;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = config_store(matches)?.load();
    let probe = system_probe();
    let statuses = scan_volumes(probe.as_ref(), &config);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    print_status_table(&statuses, Some(&config.thresholds()));
    Ok(())
}
