//! Interactive input while the monitor runs.
//!
//! A reader thread turns stdin lines into [`UserCommand`]s for the event
//! context. End of input only stops the reader, never the monitor.

use colored::*;
use std::io::{self, BufRead};
use tokio::sync::mpsc::UnboundedSender;
use std::thread;

use crate::core::disk_monitor::{Handle, UserCommand, Volume};

pub const HELP: &str = "\
commands:
  ack <id>        acknowledge one alert
  ack             acknowledge every open alert
  check           sample all volumes now
  list            show open alerts
  reset [volume]  close alerts and reset their state
  reload          re-read the config file
  quit            stop monitoring and exit";

/// Parse one input line. `Err` carries a message for the user.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = parts.collect();

    let command = match (word.to_lowercase().as_str(), rest.as_slice()) {
        ("ack" | "a", []) => UserCommand::AcknowledgeAll,
        ("ack" | "a", [id]) => {
            let id = id
                .trim_start_matches('#')
                .parse::<u64>()
                .map_err(|_| format!("not an alert id: {}", id))?;
            UserCommand::Acknowledge(Handle(id))
        }
        ("check" | "c", []) => UserCommand::CheckNow,
        ("list" | "l", []) => UserCommand::ListAlerts,
        ("reset", []) => UserCommand::Reset(None),
        ("reset", [volume]) => UserCommand::Reset(Some(Volume::new(*volume))),
        ("reload", []) => UserCommand::ReloadConfig,
        ("quit" | "q" | "exit", []) => UserCommand::Quit,
        ("help" | "h" | "?", _) => {
            println!("{}", HELP);
            return Ok(None);
        }
        _ => return Err(format!("unknown command: {}", line.trim())),
    };

    Ok(Some(command))
}

/// Spawn the stdin reader thread.
pub fn spawn_reader(commands: UnboundedSender<UserCommand>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::error!("Failed to read input: {}", e);
                        break;
                    }
                };

                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => {
                        eprintln!("{} (type `help` for commands)", msg.yellow());
                    }
                }
            }
            log::debug!("Console input closed");
        })
}
