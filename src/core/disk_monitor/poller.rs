//! Background poller.
//!
//! One task on a dedicated Tokio runtime samples every monitored volume, runs
//! the results through the alert state machine and enqueues alerts for the
//! event context. The task never touches user-facing surfaces itself.

use parking_lot::RwLock;
use std::io;
use std::sync::Arc;
use tokio::runtime::{Handle as RuntimeHandle, Runtime};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Duration, Instant, MissedTickBehavior};

use super::alerts::AlertStateMachine;
use super::events::UiMessage;
use super::sampler::DiskProbe;
use super::scan_volumes;
use crate::core::config::Config;

/// How long `stop()` waits for the task to finish a cycle in progress.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

/// Everything the polling task needs for one cycle.
#[derive(Clone)]
struct PollContext {
    probe: Arc<dyn DiskProbe>,
    alerts: Arc<AlertStateMachine>,
    config: Arc<RwLock<Config>>,
    ui_tx: mpsc::UnboundedSender<UiMessage>,
}

pub struct Poller {
    ctx: PollContext,
    runtime: Option<Runtime>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    task: Option<JoinHandle<()>>,
    /// Task that outlived a `stop()`; it exits after its current cycle.
    lingering: Option<JoinHandle<()>>,
    stop_grace: Duration,
}

impl Poller {
    /// Build the poller and its runtime. Nothing runs until [`Poller::start`].
    pub fn new(
        probe: Arc<dyn DiskProbe>,
        alerts: Arc<AlertStateMachine>,
        config: Arc<RwLock<Config>>,
        ui_tx: mpsc::UnboundedSender<UiMessage>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("disk-poller")
            .build()?;

        Ok(Self {
            ctx: PollContext {
                probe,
                alerts,
                config,
                ui_tx,
            },
            runtime: Some(runtime),
            shutdown_tx: None,
            task: None,
            lingering: None,
            stop_grace: DEFAULT_STOP_GRACE,
        })
    }

    /// Use a different stop grace period (mainly for tests).
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn state(&self) -> PollerState {
        if self.task.is_some() {
            PollerState::Running
        } else {
            PollerState::Stopped
        }
    }

    /// Handle to the poller's runtime, for one-off background work.
    pub fn runtime(&self) -> Option<&RuntimeHandle> {
        self.runtime.as_ref().map(Runtime::handle)
    }

    /// Start the polling task. Does nothing if already running.
    ///
    /// Fails if a task left over from a timed-out `stop()` is still busy.
    pub fn start(&mut self) -> io::Result<()> {
        if self.task.is_some() {
            log::warn!("Monitoring is already running");
            return Ok(());
        }

        if let Some(previous) = self.lingering.take() {
            if !previous.is_finished() {
                log::warn!("Previous monitoring task has not exited yet, not starting");
                self.lingering = Some(previous);
                return Err(io::Error::other("previous monitoring task is still running"));
            }
        }

        let Some(runtime) = self.runtime.as_ref() else {
            return Err(io::Error::other("monitoring runtime is shut down"));
        };

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        self.task = Some(runtime.spawn(poll_task(self.ctx.clone(), shutdown_rx)));
        self.shutdown_tx = Some(shutdown_tx);
        log::info!("Disk monitoring started");
        Ok(())
    }

    /// Stop the task, waiting at most the grace period for it to exit.
    pub fn stop(&mut self) {
        let Some(mut task) = self.task.take() else {
            log::info!("Monitoring is already stopped");
            return;
        };

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        let grace = self.stop_grace;
        match runtime.block_on(async { tokio::time::timeout(grace, &mut task).await }) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Monitoring task failed: {}", e),
            Err(_) => {
                log::warn!("Monitoring task did not exit in time, continuing shutdown");
                self.lingering = Some(task);
            }
        }

        log::info!("Disk monitoring stopped");
    }

    /// Run one cycle on the calling thread.
    pub fn poll_once(&self) -> usize {
        run_cycle(&self.ctx)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if self.state() == PollerState::Running {
            self.stop();
        }
        // A task stuck in a cycle must not block the caller
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Poll on a ticker that follows the configured interval.
///
/// The first tick fires immediately. The interval is re-read after every
/// cycle so reloaded settings apply without a restart.
async fn poll_task(ctx: PollContext, mut shutdown: broadcast::Receiver<()>) {
    log::info!("Monitoring task started");

    let mut period = period_of(&ctx.config);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&ctx);

                let next = period_of(&ctx.config);
                if next != period {
                    period = next;
                    ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                }
                log::info!(
                    "Disk check finished, next check in {:.1} minutes",
                    period.as_secs_f64() / 60.0
                );
            }
            _ = shutdown.recv() => {
                log::info!("Stop requested");
                break;
            }
        }
    }

    log::info!("Monitoring task exited");
}

fn period_of(config: &RwLock<Config>) -> Duration {
    config.read().check_interval().max(Duration::from_millis(1))
}

/// Scan, classify and enqueue alerts. Returns how many alerts were enqueued.
fn run_cycle(ctx: &PollContext) -> usize {
    let config = ctx.config.read().clone();
    let mut statuses = scan_volumes(ctx.probe.as_ref(), &config);

    // Most severe first
    statuses.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut emitted = 0;
    for status in statuses.into_iter().filter(|s| s.severity.is_alert()) {
        if !ctx.alerts.should_emit(&status.volume, status.severity) {
            continue;
        }

        let message = UiMessage::AlertReady {
            volume: status.volume,
            tier: status.severity,
            snapshot: status.snapshot,
        };
        if ctx.ui_tx.send(message).is_err() {
            log::error!("Event queue closed, dropping alert");
            break;
        }
        emitted += 1;
    }
    emitted
}
