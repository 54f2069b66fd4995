use parking_lot::RwLock;
use sdm::core::disk_monitor::{
    AlertStateMachine, NotificationSink, Poller, PollerState, Severity, UiMessage, Volume,
};
use sdm::core::Config;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::support::{FakeProbe, FakeSink};

struct Rig {
    probe: Arc<FakeProbe>,
    sink: Arc<FakeSink>,
    alerts: Arc<AlertStateMachine>,
    poller: Poller,
    rx: UnboundedReceiver<UiMessage>,
}

fn rig(check_interval: f64) -> Rig {
    rig_with_grace(check_interval, Duration::from_millis(500))
}

fn rig_with_grace(check_interval: f64, grace: Duration) -> Rig {
    let probe = Arc::new(FakeProbe::new());
    let sink = Arc::new(FakeSink::new());
    let alerts = Arc::new(AlertStateMachine::new(sink.clone()));
    let config = Arc::new(RwLock::new(Config {
        check_interval,
        ..Default::default()
    }));
    let (tx, rx) = mpsc::unbounded_channel();
    let poller = Poller::new(probe.clone(), alerts.clone(), config, tx)
        .unwrap()
        .with_stop_grace(grace);

    Rig {
        probe,
        sink,
        alerts,
        poller,
        rx,
    }
}

fn drain(rx: &mut UnboundedReceiver<UiMessage>) -> Vec<UiMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

fn wait_for_message(rx: &mut UnboundedReceiver<UiMessage>, timeout: Duration) -> Option<UiMessage> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(message) = rx.try_recv() {
            return Some(message);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    None
}

#[test]
fn test_poll_once_enqueues_most_severe_first() {
    let mut r = rig(5.0);
    r.probe.set_percent("/a", 65);
    r.probe.set_percent("/b", 95);
    r.probe.set_percent("/c", 10);

    assert_eq!(r.poller.poll_once(), 2);

    let tiers: Vec<Severity> = drain(&mut r.rx)
        .into_iter()
        .map(|m| match m {
            UiMessage::AlertReady { tier, .. } => tier,
            other => panic!("unexpected message: {:?}", other),
        })
        .collect();
    assert_eq!(tiers, vec![Severity::Critical, Severity::Notice]);
}

#[test]
fn test_live_alert_is_not_repeated() {
    let mut r = rig(5.0);
    r.probe.set_percent("/data", 80);
    let volume = Volume::new("/data");

    assert_eq!(r.poller.poll_once(), 1);
    let Ok(UiMessage::AlertReady { snapshot, .. }) = r.rx.try_recv() else {
        panic!("expected an alert");
    };
    let handle = r.sink.present(&volume, Severity::Warning, &snapshot);
    assert!(r.alerts.attach_handle(&volume, Severity::Warning, handle));

    assert_eq!(r.poller.poll_once(), 0);

    // Closed behind our back: the next cycle re-raises it
    r.sink.close_externally(handle);
    assert_eq!(r.poller.poll_once(), 1);
}

#[test]
fn test_failing_volume_does_not_stop_the_cycle() {
    let mut r = rig(5.0);
    r.probe.set_failing("/broken");
    r.probe.set_percent("/ok", 91);

    assert_eq!(r.poller.poll_once(), 1);
    match r.rx.try_recv().unwrap() {
        UiMessage::AlertReady { volume, tier, .. } => {
            assert_eq!(volume, Volume::new("/ok"));
            assert_eq!(tier, Severity::Critical);
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_worker_polls_and_stops_promptly() {
    // 30ms between cycles
    let mut r = rig(0.0005);
    r.probe.set_percent("/data", 99);

    r.poller.start().unwrap();
    assert_eq!(r.poller.state(), PollerState::Running);

    let first = wait_for_message(&mut r.rx, Duration::from_secs(5));
    assert!(matches!(first, Some(UiMessage::AlertReady { .. })));

    let started = Instant::now();
    r.poller.stop();
    assert_eq!(r.poller.state(), PollerState::Stopped);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_stop_interrupts_long_interval() {
    let mut r = rig(60.0);
    r.poller.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    r.poller.stop();
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_start_twice_and_stop_twice_are_harmless() {
    let mut r = rig(60.0);
    r.poller.start().unwrap();
    r.poller.start().unwrap();
    assert_eq!(r.poller.state(), PollerState::Running);

    r.poller.stop();
    r.poller.stop();
    assert_eq!(r.poller.state(), PollerState::Stopped);
}

#[test]
fn test_restart_refused_while_stuck_cycle_finishes() {
    let mut r = rig_with_grace(60.0, Duration::from_millis(50));
    r.probe.set_percent("/slow", 10);
    r.probe.set_delay(Duration::from_millis(800));

    r.poller.start().unwrap();
    // Let the first cycle get stuck in the slow sample
    std::thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    r.poller.stop();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(r.poller.state(), PollerState::Stopped);

    // The old task is still inside its cycle
    assert!(r.poller.start().is_err());
    assert_eq!(r.poller.state(), PollerState::Stopped);

    r.probe.set_delay(Duration::ZERO);
    std::thread::sleep(Duration::from_millis(1200));
    r.poller.start().unwrap();
    assert_eq!(r.poller.state(), PollerState::Running);
    r.poller.stop();
}
