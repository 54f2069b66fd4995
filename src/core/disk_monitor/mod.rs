//! Disk usage monitoring core.
//!
//! Volume discovery, usage sampling, threshold classification, alert
//! de-duplication and the background poller that ties them together.

pub mod alerts;
pub mod events;
pub mod poller;
pub mod sampler;
pub mod thresholds;
pub mod volumes;

pub use alerts::{AlertRecord, AlertStateMachine, Handle, NotificationSink};
pub use events::{EventContext, EventContextParts, Flow, UiMessage, UserCommand};
pub use poller::{Poller, PollerState};
pub use sampler::{system_probe, DiskProbe, SystemDisks, UsageSampler, UsageSnapshot};
pub use thresholds::{classify, Severity, Thresholds};
pub use volumes::{resolve_monitored_set, Volume, VolumeEnumerator};

use serde::Serialize;

use crate::core::config::Config;

/// Classified usage of one monitored volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeStatus {
    pub volume: Volume,
    pub snapshot: UsageSnapshot,
    pub severity: Severity,
}

/// Sample and classify every monitored volume.
///
/// Volumes that fail to sample are logged and left out; one bad volume never
/// stops the rest of the scan.
pub fn scan_volumes(probe: &dyn DiskProbe, config: &Config) -> Vec<VolumeStatus> {
    let available = probe.list_volumes();
    let monitored = resolve_monitored_set(&config.drives_to_monitor, &available);
    let thresholds = config.thresholds();

    let mut statuses = Vec::with_capacity(monitored.len());
    for volume in monitored {
        match probe.sample(&volume) {
            Ok(snapshot) => {
                let severity = classify(snapshot.percent, &thresholds);
                log::info!("Volume {} usage: {:.1}% ({})", volume, snapshot.percent, severity);
                statuses.push(VolumeStatus {
                    volume,
                    snapshot,
                    severity,
                });
            }
            Err(e) => {
                log::error!("Skipping {} this cycle: {}", volume, e);
            }
        }
    }
    statuses
}
