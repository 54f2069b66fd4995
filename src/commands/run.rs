//! `sdm run`: start the monitor in the foreground.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::Arc;

use super::config_store;
use crate::core::disk_monitor::poller::DEFAULT_STOP_GRACE;
use crate::core::disk_monitor::{system_probe, EventContext, EventContextParts, UserCommand};
use crate::core::Config;
use crate::error::SdmError;
use crate::platform::{acquire_single_instance, app_data_dir, set_autostart};
use crate::ui::console;
use crate::ui::TerminalNotifier;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let data_dir = app_data_dir()?;
    std::fs::create_dir_all(&data_dir).map_err(|e| {
        SdmError::startup_fatal(format!("cannot create data directory {:?}: {}", data_dir, e))
    })?;

    // A second instance leaves before touching the config or starting a poller
    let Some(guard) = acquire_single_instance(&data_dir)? else {
        println!("{}", "Disk monitor is already running.".yellow());
        log::info!("Another instance is already running, exiting");
        return Ok(());
    };
    log::debug!("Holding instance lock {:?}", guard.path());

    let store = config_store(matches)?;
    let mut config = store.load();
    apply_launch_flags(matches, &mut config);

    if let Err(e) = set_autostart(config.run_at_startup) {
        log::error!("Failed to update autostart setting: {:#}", e);
    }

    log::info!("Disk monitor starting, config file: {:?}", store.path());
    print_banner(&config);

    let (mut ctx, commands) = EventContext::new(EventContextParts {
        sink: Arc::new(TerminalNotifier::new()),
        probe: system_probe(),
        config,
        store: Some(store),
        stop_grace: DEFAULT_STOP_GRACE,
    })
    .context("Failed to set up monitoring")?;

    let quit_tx = commands.clone();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(UserCommand::Quit);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    console::spawn_reader(commands).context("Failed to start console input")?;

    ctx.run().context("Failed to start monitoring")?;

    println!("{}", "Disk monitor stopped.".dimmed());
    Ok(())
}

/// Command-line flags override the loaded config for this run only.
fn apply_launch_flags(matches: &ArgMatches, config: &mut Config) {
    if matches.get_flag("silent") {
        config.silent_mode = true;
    }
    if matches.get_flag("no-silent") {
        config.silent_mode = false;
    }
    if matches.get_flag("autostart") {
        config.run_at_startup = true;
    }
    if matches.get_flag("no-autostart") {
        config.run_at_startup = false;
    }
}

fn print_banner(config: &Config) {
    let drives = if config.drives_to_monitor.is_empty() {
        "all volumes".to_string()
    } else {
        config.drives_to_monitor.join(", ")
    };

    println!("{}", "Simple Disk Monitor".bold().bright_cyan());
    println!(
        "{}",
        format!(
            "watching {} every {} min (notice {}%, warning {}%, critical {}%)",
            drives,
            config.check_interval,
            config.notice_threshold,
            config.warning_threshold,
            config.critical_threshold
        )
        .dimmed()
    );
    if config.silent_mode {
        println!("{}", "silent mode: alerts are suppressed".yellow());
    }
    println!("{}", "type `help` for commands, Ctrl+C to quit".dimmed());
}
