//! Volume discovery and monitored-set resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mount points under these roots are virtual filesystems, never real volumes.
const PSEUDO_FS_ROOTS: [&str; 4] = ["/proc", "/sys", "/dev", "/run"];

/// A storage volume, identified by its mount point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(String);

impl Volume {
    pub fn new<S: Into<String>>(mount_point: S) -> Self {
        Volume(mount_point.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Volume {
    fn from(s: &str) -> Self {
        Volume::new(s)
    }
}

/// Lists candidate volumes on the host.
///
/// Implementations never fail: an OS-level failure is logged and yields an
/// empty list.
pub trait VolumeEnumerator: Send + Sync {
    fn list_volumes(&self) -> Vec<Volume>;
}

/// Whether a mount point looks like a real volume.
pub fn is_candidate_mount(mount_point: &str) -> bool {
    !mount_point.is_empty() && !PSEUDO_FS_ROOTS.iter().any(|root| mount_point.starts_with(root))
}

/// Turn raw mount points into volumes, dropping pseudo filesystems and
/// duplicates while keeping the first occurrence.
pub fn filter_mount_points<I, S>(mount_points: I) -> Vec<Volume>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut volumes: Vec<Volume> = Vec::new();

    for mount in mount_points {
        let mount = mount.as_ref();
        if !is_candidate_mount(mount) {
            log::debug!("Ignoring pseudo filesystem mount: {}", mount);
            continue;
        }
        if volumes.iter().any(|v| v.as_str() == mount) {
            continue;
        }
        volumes.push(Volume::new(mount));
    }

    volumes
}

/// Decide which volumes to poll.
///
/// An empty `configured` list means every available volume. Otherwise the
/// configured order is kept and entries that are not currently available are
/// dropped without error.
pub fn resolve_monitored_set(configured: &[String], available: &[Volume]) -> Vec<Volume> {
    if configured.is_empty() {
        return available.to_vec();
    }

    let mut resolved: Vec<Volume> = Vec::new();
    for wanted in configured {
        if let Some(volume) = available.iter().find(|v| v.as_str() == wanted) {
            if !resolved.contains(volume) {
                resolved.push(volume.clone());
            }
        } else {
            log::debug!("Configured volume {} is not available, skipping", wanted);
        }
    }
    resolved
}
