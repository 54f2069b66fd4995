//! Alert de-duplication state.
//!
//! Tracks, per volume and per alert tier, whether an alert is currently being
//! shown. The poller asks [`AlertStateMachine::should_emit`] before raising an
//! alert; the event context reports acknowledgments and requests resets.
//!
//! All operations take the single internal lock for their own duration only.
//! Emitting and attaching the resulting handle are two separate operations.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::sampler::UsageSnapshot;
use super::thresholds::Severity;
use super::volumes::Volume;
use super::VolumeStatus;

/// Opaque reference to a notification owned by a [`NotificationSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub u64);

/// The user-facing surface that displays alerts.
///
/// The sink owns every notification it presents; the state machine only
/// queries liveness and requests dismissal through the handle. `is_live` is
/// called with the state lock held and must not block or call back into the
/// state machine.
pub trait NotificationSink: Send + Sync {
    /// Display an alert and return a handle to it.
    fn present(&self, volume: &Volume, tier: Severity, snapshot: &UsageSnapshot) -> Handle;

    /// Whether the handle still refers to a visible notification.
    fn is_live(&self, handle: &Handle) -> bool;

    /// Force-close a notification. Unknown or already-closed handles are ignored.
    fn dismiss(&self, handle: &Handle);

    /// Show the result of an on-demand check.
    fn report_status(&self, statuses: &[VolumeStatus]) {
        for status in statuses {
            log::info!(
                "{}: {:.1}% used ({})",
                status.volume,
                status.snapshot.percent,
                status.severity
            );
        }
    }

    /// List notifications that still wait for acknowledgment.
    fn report_pending(&self, pending: &[(Handle, Volume, Severity)]) {
        if pending.is_empty() {
            log::info!("No open alerts");
        }
        for (handle, volume, tier) in pending {
            log::info!("#{} {} alert for {}", handle.0, tier, volume);
        }
    }

    /// Show a generic failure to the user.
    fn report_error(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Suppression state for one (volume, tier) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertRecord {
    pub active: bool,
    pub handle: Option<Handle>,
}

impl AlertRecord {
    fn clear(&mut self) -> Option<Handle> {
        self.active = false;
        self.handle.take()
    }
}

#[derive(Default)]
struct AlertTable {
    silent: bool,
    records: HashMap<Volume, HashMap<Severity, AlertRecord>>,
}

/// Decides whether an alert may be raised for a (volume, tier) pair.
pub struct AlertStateMachine {
    table: Mutex<AlertTable>,
    sink: Arc<dyn NotificationSink>,
}

impl AlertStateMachine {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            table: Mutex::new(AlertTable::default()),
            sink,
        }
    }

    pub fn set_silent(&self, silent: bool) {
        let mut table = self.table.lock();
        if table.silent != silent {
            log::info!("Silent mode {}", if silent { "enabled" } else { "disabled" });
        }
        table.silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.table.lock().silent
    }

    /// Decide whether to raise an alert, marking the record active when the
    /// answer is yes.
    ///
    /// An active record whose notification is gone (no handle, or the sink no
    /// longer knows it) is treated as stale and re-emits.
    pub fn should_emit(&self, volume: &Volume, tier: Severity) -> bool {
        if !tier.is_alert() {
            return false;
        }

        let mut table = self.table.lock();
        if table.silent {
            log::debug!("Silent mode, skipping {} alert for {}", tier, volume);
            return false;
        }

        let record = table
            .records
            .entry(volume.clone())
            .or_default()
            .entry(tier)
            .or_default();

        if !record.active {
            record.active = true;
            return true;
        }

        match record.handle {
            Some(handle) if self.sink.is_live(&handle) => {
                log::debug!("{} alert for {} is already showing", tier, volume);
                false
            }
            _ => {
                log::warn!(
                    "{} alert for {} was marked active but its notification is gone; re-raising",
                    tier,
                    volume
                );
                record.handle = None;
                true
            }
        }
    }

    /// Remember the notification raised for an emitted alert.
    ///
    /// Only an active record takes the handle. Returns false when the record
    /// was acknowledged or reset after the alert was emitted; the caller then
    /// owns a notification nothing tracks and should close it.
    pub fn attach_handle(&self, volume: &Volume, tier: Severity, handle: Handle) -> bool {
        let mut table = self.table.lock();
        match table
            .records
            .get_mut(volume)
            .and_then(|tiers| tiers.get_mut(&tier))
        {
            Some(record) if record.active => {
                record.handle = Some(handle);
                true
            }
            _ => {
                log::debug!("{} alert for {} is no longer active, not attaching", tier, volume);
                false
            }
        }
    }

    /// The user dismissed or confirmed the notification `handle`; re-arm the
    /// record it belongs to.
    ///
    /// A handle that was already replaced (stale recovery raised a newer one)
    /// leaves the record alone. Returns whether the record was re-armed.
    pub fn acknowledge(&self, volume: &Volume, tier: Severity, handle: Handle) -> bool {
        let mut table = self.table.lock();
        let Some(record) = table
            .records
            .get_mut(volume)
            .and_then(|tiers| tiers.get_mut(&tier))
        else {
            return false;
        };

        if record.handle != Some(handle) {
            log::debug!(
                "Ignoring acknowledgment of superseded {} alert #{} for {}",
                tier,
                handle.0,
                volume
            );
            return false;
        }

        record.clear();
        log::debug!("Acknowledged {} alert for {}", tier, volume);
        true
    }

    /// Reset suppression state.
    ///
    /// * no volume: dismiss every live notification and discard all records
    /// * volume only: dismiss that volume's notifications, zero its three records
    /// * volume and tier: that single record
    pub fn reset(&self, volume: Option<&Volume>, tier: Option<Severity>) {
        let handles: Vec<Handle> = {
            let mut table = self.table.lock();
            match (volume, tier) {
                (None, _) => {
                    let handles: Vec<Handle> = table
                        .records
                        .values()
                        .flat_map(|tiers| tiers.values())
                        .filter_map(|record| record.handle)
                        .collect();
                    table.records.clear();
                    log::debug!("Reset alert state for all volumes");
                    handles
                }
                (Some(volume), None) => {
                    let Some(tiers) = table.records.get_mut(volume) else {
                        log::debug!("No alert state for {}", volume);
                        return;
                    };
                    let handles: Vec<Handle> =
                        tiers.values_mut().filter_map(AlertRecord::clear).collect();
                    log::debug!("Reset alert state for {}", volume);
                    handles
                }
                (Some(volume), Some(tier)) => {
                    let handle = table
                        .records
                        .get_mut(volume)
                        .and_then(|tiers| tiers.get_mut(&tier))
                        .and_then(AlertRecord::clear);
                    log::debug!("Reset {} alert state for {}", tier, volume);
                    handle.into_iter().collect()
                }
            }
        };

        for handle in handles {
            if self.sink.is_live(&handle) {
                self.sink.dismiss(&handle);
            }
        }
    }

    pub fn is_active(&self, volume: &Volume, tier: Severity) -> bool {
        self.record(volume, tier).is_some_and(|r| r.active)
    }

    pub fn record(&self, volume: &Volume, tier: Severity) -> Option<AlertRecord> {
        self.table
            .lock()
            .records
            .get(volume)
            .and_then(|tiers| tiers.get(&tier))
            .cloned()
    }

    /// Every active (volume, tier) pair, sorted by volume then severity.
    pub fn active_alerts(&self) -> Vec<(Volume, Severity)> {
        let table = self.table.lock();
        let mut active: Vec<(Volume, Severity)> = table
            .records
            .iter()
            .flat_map(|(volume, tiers)| {
                tiers
                    .iter()
                    .filter(|(_, record)| record.active)
                    .map(move |(tier, _)| (volume.clone(), *tier))
            })
            .collect();
        active.sort();
        active
    }

    pub fn tracked_volumes(&self) -> usize {
        self.table.lock().records.len()
    }
}
