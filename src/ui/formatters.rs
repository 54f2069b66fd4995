use colored::*;
use humansize::{format_size as human_format_size, BINARY};

use crate::core::disk_monitor::{Severity, Thresholds, UsageSnapshot, VolumeStatus};

/// Format a byte count in human-readable binary units (KiB, MiB, GiB)
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY)
}

/// Severity label padded and colored for terminal output
pub fn severity_badge(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.label().to_uppercase());
    match severity {
        Severity::Normal => label.green(),
        Severity::Notice => label.cyan(),
        Severity::Warning => label.yellow().bold(),
        Severity::Critical => label.red().bold(),
    }
}

/// One-line usage summary, e.g. `92.0% used (184 GiB of 200 GiB, 16 GiB free)`
pub fn usage_line(snapshot: &UsageSnapshot) -> String {
    format!(
        "{:.1}% used ({} of {}, {} free)",
        snapshot.percent,
        format_size(snapshot.used),
        format_size(snapshot.total),
        format_size(snapshot.free)
    )
}

/// What the user is asked to do for each tier.
pub fn advice_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Normal => "No action needed.",
        Severity::Notice => "Disk space is getting low. Consider cleaning up unneeded files.",
        Severity::Warning => "Disk space is low. Please free some space soon.",
        Severity::Critical => {
            "Disk space is critically low! Free space now; this alert returns until usage drops."
        }
    }
}

/// Text bar showing percent used, 20 cells wide
pub fn usage_bar(percent: f64, severity: Severity) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));
    match severity {
        Severity::Normal => bar.green().to_string(),
        Severity::Notice => bar.cyan().to_string(),
        Severity::Warning => bar.yellow().to_string(),
        Severity::Critical => bar.red().to_string(),
    }
}

/// Print a status table for a set of classified volumes
pub fn print_status_table(statuses: &[VolumeStatus], thresholds: Option<&Thresholds>) {
    println!();
    println!("{}", "DISK STATUS".bold().bright_cyan());
    if let Some(t) = thresholds {
        println!(
            "{}",
            format!(
                "thresholds: notice {}%  warning {}%  critical {}%",
                t.notice, t.warning, t.critical
            )
            .dimmed()
        );
    }
    println!("{}", "=".repeat(80));

    if statuses.is_empty() {
        println!("{}", "No monitored volume could be sampled.".yellow());
        return;
    }

    let width = statuses
        .iter()
        .map(|s| s.volume.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    for status in statuses {
        println!(
            "{:<width$}  {}  {}  {}",
            status.volume.as_str(),
            severity_badge(status.severity),
            usage_bar(status.snapshot.percent, status.severity),
            usage_line(&status.snapshot),
            width = width
        );
    }
    println!();
}
