use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use colored::*;
use std::path::PathBuf;

use sdm::commands;
use sdm::SdmError;

fn cli() -> Command {
    Command::new("sdm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Simple disk monitor: watches volume usage and raises tiered alerts")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Use this config file instead of the default location")
                .global(true)
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append log records to this file instead of stderr")
                .global(true)
        )
        .subcommand(
            Command::new("run")
                .about("Start monitoring in the foreground")
                .arg(
                    Arg::new("silent")
                        .long("silent")
                        .help("Suppress alerts for this run")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-silent")
                )
                .arg(
                    Arg::new("no-silent")
                        .long("no-silent")
                        .help("Show alerts even if the config enables silent mode")
                        .action(ArgAction::SetTrue)
                )
                .arg(
                    Arg::new("autostart")
                        .long("autostart")
                        .help("Register the monitor to start at login")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-autostart")
                )
                .arg(
                    Arg::new("no-autostart")
                        .long("no-autostart")
                        .help("Remove the start-at-login registration")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("status")
                .about("Sample every monitored volume once and print its tier")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print machine-readable JSON")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("config")
                .about("Show or change configuration (use 'sdm config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the configuration in effect"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(Command::new("reset").about("Restore the default configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Change one or more settings")
                        .arg(
                            Arg::new("notice")
                                .long("notice")
                                .value_name("PERCENT")
                                .help("Notice threshold (1-100)")
                                .value_parser(clap::value_parser!(u8))
                        )
                        .arg(
                            Arg::new("warning")
                                .long("warning")
                                .value_name("PERCENT")
                                .help("Warning threshold (1-100)")
                                .value_parser(clap::value_parser!(u8))
                        )
                        .arg(
                            Arg::new("critical")
                                .long("critical")
                                .value_name("PERCENT")
                                .help("Critical threshold (1-100)")
                                .value_parser(clap::value_parser!(u8))
                        )
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .value_name("MINUTES")
                                .help("Minutes between checks, fractions allowed")
                                .value_parser(clap::value_parser!(f64))
                        )
                        .arg(
                            Arg::new("drives")
                                .long("drives")
                                .value_name("MOUNTS")
                                .help("Comma-separated volumes to watch; empty means all")
                                .value_delimiter(',')
                                .num_args(0..=1)
                                .default_missing_value("")
                        )
                        .arg(
                            Arg::new("silent")
                                .long("silent")
                                .value_name("BOOL")
                                .help("Suppress alerts (true/false)")
                                .value_parser(clap::value_parser!(bool))
                        )
                        .arg(
                            Arg::new("autostart")
                                .long("autostart")
                                .value_name("BOOL")
                                .help("Start at login (true/false)")
                                .value_parser(clap::value_parser!(bool))
                        )
                )
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_file = matches.get_one::<String>("log-file").map(PathBuf::from);
    if let Err(e) = sdm::init_logging(log_file.as_deref()) {
        eprintln!("{} could not set up logging: {:#}", "warning:".yellow(), e);
    }

    let result = match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run::execute(sub_matches),
        Some(("status", sub_matches)) => commands::status::execute(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        _ => {
            println!("Welcome to sdm!");
            println!("Use 'sdm run' to start monitoring or 'sdm --help' for more information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        if let Some(SdmError::StartupFatal(msg)) = e.downcast_ref::<SdmError>() {
            log::error!("Startup failed: {}", msg);
            eprintln!("{} {}", "Startup failed:".red().bold(), msg);
            std::process::exit(2);
        }
        return Err(e);
    }

    Ok(())
}
