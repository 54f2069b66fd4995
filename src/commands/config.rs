use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::config_store;
use crate::core::{Config, ConfigStore, ConfigUpdate};
use crate::platform::set_autostart;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let store = config_store(matches)?;

    match matches.subcommand() {
        Some(("show", _)) => show(&store),
        Some(("path", _)) => {
            println!("{}", store.path().display());
            Ok(())
        }
        Some(("set", sub_matches)) => set(&store, sub_matches),
        Some(("reset", _)) => reset(&store),
        _ => {
            println!("Use 'sdm config --help' for more information.");
            Ok(())
        }
    }
}

fn show(store: &ConfigStore) -> Result<()> {
    let config = store.load();

    println!("{}", "Configuration:".white());
    println!("  {:<18} {}", "file", store.path().display().to_string().dimmed());
    println!("  {:<18} {}%", "notice threshold", config.notice_threshold);
    println!("  {:<18} {}%", "warning threshold", config.warning_threshold);
    println!("  {:<18} {}%", "critical threshold", config.critical_threshold);
    println!("  {:<18} {} min", "check interval", config.check_interval);
    println!(
        "  {:<18} {}",
        "volumes",
        if config.drives_to_monitor.is_empty() {
            "all".to_string()
        } else {
            config.drives_to_monitor.join(", ")
        }
    );
    println!("  {:<18} {}", "silent mode", config.silent_mode);
    println!("  {:<18} {}", "run at startup", config.run_at_startup);

    Ok(())
}

/// Build the requested change from `config set` flags
pub fn update_from_matches(matches: &ArgMatches) -> ConfigUpdate {
    ConfigUpdate {
        notice_threshold: matches.get_one::<u8>("notice").copied(),
        warning_threshold: matches.get_one::<u8>("warning").copied(),
        critical_threshold: matches.get_one::<u8>("critical").copied(),
        check_interval: matches.get_one::<f64>("interval").copied(),
        drives_to_monitor: matches
            .get_many::<String>("drives")
            .map(|values| values.cloned().collect()),
        silent_mode: matches.get_one::<bool>("silent").copied(),
        run_at_startup: matches.get_one::<bool>("autostart").copied(),
    }
}

fn set(store: &ConfigStore, matches: &ArgMatches) -> Result<()> {
    let update = update_from_matches(matches);
    if update.is_empty() {
        println!("Nothing to change. Use 'sdm config set --help' for the available options.");
        return Ok(());
    }

    let current = store.load();
    let next = match current.with_update(&update) {
        Ok(next) => next,
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            println!("{}", "The current configuration was left unchanged.".dimmed());
            return Err(e.into());
        }
    };

    store.save(&next)?;

    if next.run_at_startup != current.run_at_startup {
        set_autostart(next.run_at_startup).context("Failed to update autostart setting")?;
    }

    println!("{}", "✓ Configuration saved".green());
    println!(
        "{}",
        "A running monitor picks it up on `reload` or its next restart.".dimmed()
    );
    Ok(())
}

fn reset(store: &ConfigStore) -> Result<()> {
    store.save(&Config::default())?;
    println!("{}", "✓ Configuration reset to defaults".green());
    Ok(())
}
