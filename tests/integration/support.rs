// Shared fakes for driving the monitor without real disks

use parking_lot::Mutex;
use sdm::core::disk_monitor::{
    Handle, NotificationSink, Severity, UsageSampler, UsageSnapshot, Volume, VolumeEnumerator,
};
use sdm::error::SampleError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Probe whose volumes and usage are set by the test.
#[derive(Default)]
pub struct FakeProbe {
    volumes: Mutex<BTreeMap<String, Option<UsageSnapshot>>>,
    delay: Mutex<Duration>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a volume to `percent` used of a 1000-byte disk.
    pub fn set_percent(&self, mount: &str, percent: u64) {
        let snapshot = UsageSnapshot::from_capacity(1000, 1000 - percent * 10);
        self.volumes.lock().insert(mount.to_string(), Some(snapshot));
    }

    /// Make every sample block for `delay`, like a hung network mount.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Keep the volume listed but make every sample fail.
    pub fn set_failing(&self, mount: &str) {
        self.volumes.lock().insert(mount.to_string(), None);
    }
}

impl VolumeEnumerator for FakeProbe {
    fn list_volumes(&self) -> Vec<Volume> {
        self.volumes.lock().keys().map(|k| Volume::new(k.as_str())).collect()
    }
}

impl UsageSampler for FakeProbe {
    fn sample(&self, volume: &Volume) -> Result<UsageSnapshot, SampleError> {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match self.volumes.lock().get(volume.as_str()) {
            Some(Some(snapshot)) => Ok(*snapshot),
            Some(None) => Err(SampleError::Inaccessible {
                volume: volume.to_string(),
                reason: "device error".to_string(),
            }),
            None => Err(SampleError::NotMounted(volume.to_string())),
        }
    }
}

/// Sink that records everything it is asked to show.
#[derive(Default)]
pub struct FakeSink {
    next: AtomicU64,
    pub live: Mutex<BTreeSet<Handle>>,
    pub presented: Mutex<Vec<(Handle, Volume, Severity)>>,
    pub dismissed: Mutex<Vec<Handle>>,
    pub errors: Mutex<Vec<String>>,
    pub status_reports: Mutex<usize>,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user closing a notification outside the app.
    pub fn close_externally(&self, handle: Handle) {
        self.live.lock().remove(&handle);
    }

    pub fn is_live_handle(&self, handle: Handle) -> bool {
        self.live.lock().contains(&handle)
    }

    pub fn presented_count(&self) -> usize {
        self.presented.lock().len()
    }

    pub fn last_presented(&self) -> Option<(Handle, Volume, Severity)> {
        self.presented.lock().last().cloned()
    }
}

impl NotificationSink for FakeSink {
    fn present(&self, volume: &Volume, tier: Severity, _snapshot: &UsageSnapshot) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().insert(handle);
        self.presented.lock().push((handle, volume.clone(), tier));
        handle
    }

    fn is_live(&self, handle: &Handle) -> bool {
        self.live.lock().contains(handle)
    }

    fn dismiss(&self, handle: &Handle) {
        self.live.lock().remove(handle);
        self.dismissed.lock().push(*handle);
    }

    fn report_status(&self, _statuses: &[sdm::core::disk_monitor::VolumeStatus]) {
        *self.status_reports.lock() += 1;
    }

    fn report_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}
