//! Usage sampling for individual volumes.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use sysinfo::Disks;

use super::volumes::{filter_mount_points, Volume, VolumeEnumerator};
use crate::error::SampleError;

/// Point-in-time usage of one volume. Never retained between polls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Percent used, in `[0, 100]`
    pub percent: f64,
}

impl UsageSnapshot {
    /// Build a snapshot from total and available bytes.
    pub fn from_capacity(total: u64, free: u64) -> Self {
        let free = free.min(total);
        let used = total - free;
        let percent = if total > 0 {
            ((used as f64 / total as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            total,
            used,
            free,
            percent,
        }
    }
}

/// Reads usage figures for one volume.
pub trait UsageSampler: Send + Sync {
    fn sample(&self, volume: &Volume) -> Result<UsageSnapshot, SampleError>;
}

/// Everything the poller needs from the host: enumeration and sampling.
pub trait DiskProbe: VolumeEnumerator + UsageSampler {}

impl<T: VolumeEnumerator + UsageSampler> DiskProbe for T {}

/// `sysinfo`-backed probe for the local machine.
pub struct SystemDisks {
    disks: Mutex<Disks>,
}

impl SystemDisks {
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl Default for SystemDisks {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeEnumerator for SystemDisks {
    fn list_volumes(&self) -> Vec<Volume> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        let mounts: Vec<String> = disks
            .iter()
            .map(|disk| disk.mount_point().to_string_lossy().to_string())
            .collect();

        if mounts.is_empty() {
            log::error!("No mounted filesystems reported by the operating system");
        }

        let volumes = filter_mount_points(&mounts);
        log::debug!("Available volumes: {:?}", volumes);
        volumes
    }
}

impl UsageSampler for SystemDisks {
    fn sample(&self, volume: &Volume) -> Result<UsageSnapshot, SampleError> {
        if !Path::new(volume.as_str()).exists() {
            return Err(SampleError::Inaccessible {
                volume: volume.to_string(),
                reason: "path does not exist".to_string(),
            });
        }

        let mut disks = self.disks.lock();
        disks.refresh(true);

        let disk = disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new(volume.as_str()))
            .ok_or_else(|| SampleError::NotMounted(volume.to_string()))?;

        let total = disk.total_space();
        if total == 0 {
            return Err(SampleError::NoCapacity(volume.to_string()));
        }

        Ok(UsageSnapshot::from_capacity(total, disk.available_space()))
    }
}

/// Probe for the machine this process runs on.
pub fn system_probe() -> Arc<dyn DiskProbe> {
    Arc::new(SystemDisks::new())
}
