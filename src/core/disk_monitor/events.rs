//! The event-processing context.
//!
//! Owns the notification sink and performs every user-facing action. The
//! poller and blocking checks only enqueue [`UiMessage`]s; user input arrives
//! as [`UserCommand`]s. Both queues are drained on a fixed tick.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::alerts::{AlertStateMachine, Handle, NotificationSink};
use super::poller::Poller;
use super::sampler::{DiskProbe, UsageSnapshot};
use super::thresholds::{classify, Severity};
use super::volumes::Volume;
use super::{scan_volumes, VolumeStatus};
use crate::core::config::{Config, ConfigStore};

/// How often the queues are drained.
pub const TICK: Duration = Duration::from_millis(100);

/// Work requested by background threads.
#[derive(Debug, Clone)]
pub enum UiMessage {
    AlertReady {
        volume: Volume,
        tier: Severity,
        snapshot: UsageSnapshot,
    },
    StatusReady(Vec<VolumeStatus>),
    Error(String),
}

/// Requests coming from the user.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// The user confirmed or closed the notification.
    Acknowledge(Handle),
    AcknowledgeAll,
    CheckNow,
    ListAlerts,
    Reset(Option<Volume>),
    ReloadConfig,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct EventContext {
    alerts: Arc<AlertStateMachine>,
    sink: Arc<dyn NotificationSink>,
    probe: Arc<dyn DiskProbe>,
    config: Arc<RwLock<Config>>,
    store: Option<ConfigStore>,
    poller: Poller,
    ui_tx: UnboundedSender<UiMessage>,
    ui_rx: UnboundedReceiver<UiMessage>,
    commands: UnboundedReceiver<UserCommand>,
    /// Notifications presented and not yet acknowledged.
    presented: BTreeMap<Handle, (Volume, Severity)>,
}

/// Builder-style wiring for an [`EventContext`] and its poller.
pub struct EventContextParts {
    pub sink: Arc<dyn NotificationSink>,
    pub probe: Arc<dyn DiskProbe>,
    pub config: Config,
    pub store: Option<ConfigStore>,
    pub stop_grace: Duration,
}

impl EventContext {
    /// Wire up the state machine, the poller and the message queue.
    ///
    /// Returns the context together with the sender user input is fed into.
    /// Fails only if the poller's runtime cannot be built.
    pub fn new(
        parts: EventContextParts,
    ) -> std::io::Result<(Self, UnboundedSender<UserCommand>)> {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();

        let alerts = Arc::new(AlertStateMachine::new(parts.sink.clone()));
        alerts.set_silent(parts.config.silent_mode);
        let config = Arc::new(RwLock::new(parts.config));

        let poller = Poller::new(
            parts.probe.clone(),
            alerts.clone(),
            config.clone(),
            ui_tx.clone(),
        )?
        .with_stop_grace(parts.stop_grace);

        let ctx = Self {
            alerts,
            sink: parts.sink,
            probe: parts.probe,
            config,
            store: parts.store,
            poller,
            ui_tx,
            ui_rx,
            commands,
            presented: BTreeMap::new(),
        };
        Ok((ctx, command_tx))
    }

    pub fn alerts(&self) -> &Arc<AlertStateMachine> {
        &self.alerts
    }

    pub fn poller_mut(&mut self) -> &mut Poller {
        &mut self.poller
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Handles of notifications currently awaiting acknowledgment.
    pub fn pending(&self) -> Vec<(Handle, Volume, Severity)> {
        self.presented
            .iter()
            .filter(|(h, _)| self.sink.is_live(h))
            .map(|(h, (v, t))| (*h, v.clone(), *t))
            .collect()
    }

    /// Forget notifications that were closed outside the app.
    fn prune_closed(&mut self) {
        let sink = &self.sink;
        self.presented.retain(|handle, _| sink.is_live(handle));
    }

    /// Start polling and drain both queues every [`TICK`] until asked to quit.
    pub fn run(&mut self) -> std::io::Result<()> {
        self.poller.start()?;

        loop {
            if self.process_pending() == Flow::Quit {
                break;
            }
            thread::sleep(TICK);
        }

        self.shutdown();
        Ok(())
    }

    /// Stop polling and close every open notification.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.alerts.reset(None, None);
        self.presented.clear();
        while self.ui_rx.try_recv().is_ok() {}
        log::info!("Event loop finished");
    }

    /// Handle everything currently queued, without blocking.
    pub fn process_pending(&mut self) -> Flow {
        while let Ok(command) = self.commands.try_recv() {
            if self.handle_command(command) == Flow::Quit {
                return Flow::Quit;
            }
        }

        while let Ok(message) = self.ui_rx.try_recv() {
            self.handle_message(message);
        }

        Flow::Continue
    }

    pub fn handle_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::AlertReady {
                volume,
                tier,
                snapshot,
            } => self.present(volume, tier, &snapshot),
            UiMessage::StatusReady(statuses) => self.sink.report_status(&statuses),
            UiMessage::Error(e) => {
                log::error!("Background task failed: {}", e);
                if !self.alerts.is_silent() {
                    self.sink.report_error(&format!("Operation failed: {}", e));
                }
            }
        }
    }

    pub fn handle_command(&mut self, command: UserCommand) -> Flow {
        match command {
            UserCommand::Acknowledge(handle) => self.acknowledge(handle),
            UserCommand::AcknowledgeAll => {
                self.prune_closed();
                let handles: Vec<Handle> = self.presented.keys().copied().collect();
                for handle in handles {
                    self.acknowledge(handle);
                }
            }
            UserCommand::CheckNow => self.check_now(),
            UserCommand::ListAlerts => self.sink.report_pending(&self.pending()),
            UserCommand::Reset(volume) => {
                self.alerts.reset(volume.as_ref(), None);
                match volume {
                    Some(v) => self.presented.retain(|_, (pv, _)| *pv != v),
                    None => self.presented.clear(),
                }
            }
            UserCommand::ReloadConfig => self.reload_config(),
            UserCommand::Quit => {
                log::info!("Quit requested");
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Show an emitted alert, unless its record was acknowledged or reset
    /// while the alert sat in the queue.
    fn present(&mut self, volume: Volume, tier: Severity, snapshot: &UsageSnapshot) {
        if self.alerts.is_silent() || !self.alerts.is_active(&volume, tier) {
            log::debug!("Dropping queued {} alert for {}", tier, volume);
            return;
        }

        self.prune_closed();
        let handle = self.sink.present(&volume, tier, snapshot);
        if !self.alerts.attach_handle(&volume, tier, handle) {
            self.sink.dismiss(&handle);
            return;
        }
        self.presented.insert(handle, (volume, tier));
    }

    fn acknowledge(&mut self, handle: Handle) {
        let Some((volume, tier)) = self.presented.remove(&handle) else {
            log::warn!("No open alert with id {}", handle.0);
            return;
        };

        self.sink.dismiss(&handle);
        if !self.alerts.acknowledge(&volume, tier, handle) {
            return;
        }
        log::info!("User acknowledged {} alert for {}", tier, volume);

        if tier == Severity::Critical {
            self.recheck_critical(&volume);
        }
    }

    /// Critical alerts come straight back while the volume stays above the
    /// critical threshold.
    fn recheck_critical(&mut self, volume: &Volume) {
        let thresholds = self.config.read().thresholds();

        let snapshot = match self.probe.sample(volume) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Could not re-check {}: {}", volume, e);
                return;
            }
        };

        if classify(snapshot.percent, &thresholds) != Severity::Critical {
            log::info!("Volume {} dropped below the critical threshold", volume);
            return;
        }

        log::info!(
            "Volume {} still at {:.1}%, raising critical alert again",
            volume,
            snapshot.percent
        );
        if self.alerts.should_emit(volume, Severity::Critical) {
            self.present(volume.clone(), Severity::Critical, &snapshot);
        }
    }

    /// Sample everything on the blocking pool and report back through the queue.
    fn check_now(&self) {
        let Some(runtime) = self.poller.runtime() else {
            log::error!("Cannot run a disk check, runtime is shut down");
            return;
        };

        let probe = self.probe.clone();
        let config = self.config.read().clone();
        let ui_tx = self.ui_tx.clone();

        runtime.spawn_blocking(move || {
            let statuses = scan_volumes(probe.as_ref(), &config);
            let message = if statuses.is_empty() {
                UiMessage::Error("no monitored volume could be sampled".to_string())
            } else {
                UiMessage::StatusReady(statuses)
            };
            let _ = ui_tx.send(message);
        });
    }

    fn reload_config(&mut self) {
        let Some(store) = self.store.as_ref() else {
            log::warn!("No config file to reload from");
            return;
        };

        let loaded = store.load();
        self.apply_config(loaded);
    }

    /// Make `config` the one in effect. Invalid configs are rejected and the
    /// current one stays.
    pub fn apply_config(&mut self, config: Config) {
        if let Err(e) = config.validate() {
            log::warn!("Rejected config change: {}", e);
            return;
        }

        self.alerts.set_silent(config.silent_mode);
        *self.config.write() = config;
        log::info!("Applied new configuration");
    }
}
