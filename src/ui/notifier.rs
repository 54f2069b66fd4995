//! Terminal notification sink.
//!
//! Alerts are printed as colored blocks and stay "open" until the user types
//! `ack <id>` (see [`crate::ui::console`]).

use chrono::{DateTime, Local};
use colored::*;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::formatters::{advice_for, print_status_table, severity_badge, usage_line};
use crate::core::disk_monitor::{
    Handle, NotificationSink, Severity, UsageSnapshot, Volume, VolumeStatus,
};

#[derive(Debug, Clone)]
struct OpenNotice {
    volume: Volume,
    tier: Severity,
    raised_at: DateTime<Local>,
}

pub struct TerminalNotifier {
    next_id: AtomicU64,
    open: Mutex<BTreeMap<u64, OpenNotice>>,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for TerminalNotifier {
    fn present(&self, volume: &Volume, tier: Severity, snapshot: &UsageSnapshot) -> Handle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let notice = OpenNotice {
            volume: volume.clone(),
            tier,
            raised_at: Local::now(),
        };

        println!();
        println!(
            "{} {} {}  {}",
            severity_badge(tier),
            format!("#{}", id).bold(),
            volume.as_str().bold(),
            notice.raised_at.format("%H:%M").to_string().dimmed()
        );
        println!("         {}", usage_line(snapshot));
        println!("         {}", advice_for(tier));
        println!("         {}", format!("type `ack {}` to acknowledge", id).dimmed());

        match tier {
            Severity::Critical => log::warn!(
                "Critical alert: {} at {:.1}%",
                volume,
                snapshot.percent
            ),
            _ => log::info!("Showing {} alert: {} at {:.1}%", tier, volume, snapshot.percent),
        }

        self.open.lock().insert(id, notice);
        Handle(id)
    }

    fn is_live(&self, handle: &Handle) -> bool {
        self.open.lock().contains_key(&handle.0)
    }

    fn dismiss(&self, handle: &Handle) {
        if let Some(notice) = self.open.lock().remove(&handle.0) {
            println!(
                "{}",
                format!(
                    "Closed {} alert #{} for {}",
                    notice.tier, handle.0, notice.volume
                )
                .dimmed()
            );
        }
    }

    fn report_status(&self, statuses: &[VolumeStatus]) {
        print_status_table(statuses, None);
    }

    fn report_pending(&self, pending: &[(Handle, Volume, Severity)]) {
        if pending.is_empty() {
            println!("{}", "No open alerts.".green());
            return;
        }

        let open = self.open.lock();
        for (handle, volume, tier) in pending {
            let since = open
                .get(&handle.0)
                .map(|n| n.raised_at.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            println!(
                "{} {} {}  {}",
                severity_badge(*tier),
                format!("#{}", handle.0).bold(),
                volume,
                format!("since {}", since).dimmed()
            );
        }
    }

    fn report_error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}
