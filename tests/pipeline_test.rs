//! End-to-end tests through the link → buffer → metrics → classifier →
//! publisher pipeline, using real threads and the published read surface.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vital_affect_agent::config::Config;
use vital_affect_agent::core::EmotionState;
use vital_affect_agent::ingest::IngestWorker;
use vital_affect_agent::link::{LinkEvent, SimLinkConfig, SimulatedLink, VitalSample};
use vital_affect_agent::publish::StatePublisher;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.compute_interval = Duration::from_millis(10);
    config
}

fn sample_at(offset_secs: i64, hr: f64, br: f64) -> VitalSample {
    let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    VitalSample::new(base + ChronoDuration::seconds(offset_secs), hr, br)
}

#[test]
fn test_simulated_link_end_to_end() {
    let publisher = Arc::new(StatePublisher::new(240));
    let mut link = SimulatedLink::new(SimLinkConfig {
        sample_interval: Duration::from_millis(5),
        ..SimLinkConfig::default()
    });
    link.start().unwrap();

    let mut worker =
        IngestWorker::start(fast_config(), link.receiver().clone(), publisher.clone()).unwrap();

    thread::sleep(Duration::from_millis(300));
    link.stop();
    worker.stop();

    let state = publisher.read();
    assert!(state.cycle > 0);
    assert!(!state.stale);
    assert!(!state.history.is_empty());

    // Simulated vitals stay inside the configured oscillation bands
    let hr = state.metrics.hr_mean.unwrap();
    assert!((60.0..=80.0).contains(&hr), "hr_mean out of range: {hr}");
    let br = state.metrics.br_mean.unwrap();
    assert!((12.0..=16.0).contains(&br), "br_mean out of range: {br}");
}

#[test]
fn test_scripted_outage_flags_staleness_and_recovers() {
    let publisher = Arc::new(StatePublisher::new(240));
    let mut link = SimulatedLink::new(SimLinkConfig {
        sample_interval: Duration::from_millis(5),
        disconnect_after: Some(10),
        gap: Duration::from_millis(150),
        ..SimLinkConfig::default()
    });
    link.start().unwrap();

    let mut worker =
        IngestWorker::start(fast_config(), link.receiver().clone(), publisher.clone()).unwrap();

    // Land inside the outage window
    thread::sleep(Duration::from_millis(120));
    let during = publisher.read();
    assert!(during.stale);
    assert!(!during.history.is_empty());

    // Wait out the gap plus a few samples
    thread::sleep(Duration::from_millis(200));
    link.stop();
    worker.stop();

    let after = publisher.read();
    assert!(!after.stale);
    assert!(after.history.len() > during.history.len());
}

#[test]
fn test_short_session_classifies_without_spectral_metric() {
    let (tx, rx) = bounded(100);
    let publisher = Arc::new(StatePublisher::new(240));
    let mut worker = IngestWorker::start(fast_config(), rx, publisher.clone()).unwrap();

    // 25 one-second samples: enough for HRV, not enough spectral span
    for i in 0..25 {
        let hr = if i % 2 == 0 { 65.0 } else { 75.0 };
        tx.send(LinkEvent::Sample(sample_at(i, hr, 14.0))).unwrap();
    }
    thread::sleep(Duration::from_millis(200));
    worker.stop();

    let state = publisher.read();
    assert!(state.metrics.sdnn.unwrap() > 0.0);
    assert!(state.metrics.lf_hf.is_none());
    assert!(state.metrics.valence.is_some());
    assert!(state.metrics.arousal.is_some());
}

#[test]
fn test_elevated_vitals_commit_to_joy_after_hysteresis() {
    let (tx, rx) = bounded(200);
    let publisher = Arc::new(StatePublisher::new(240));
    let mut worker = IngestWorker::start(fast_config(), rx, publisher.clone()).unwrap();

    // High heart rate with low variability and slow breathing lands in the
    // positive-valence, positive-arousal quadrant
    for i in 0..40 {
        let hr = if i % 2 == 0 { 89.0 } else { 91.0 };
        tx.send(LinkEvent::Sample(sample_at(i, hr, 10.0))).unwrap();
    }
    // Plenty of compute cycles for the label to commit
    thread::sleep(Duration::from_millis(300));
    worker.stop();

    let state = publisher.read();
    assert!(state.metrics.valence.unwrap() > 0.0);
    assert!(state.metrics.arousal.unwrap() > 0.0);
    assert_eq!(state.emotion, EmotionState::Joy);
}

#[test]
fn test_link_reset_returns_to_initial_shape() {
    let (tx, rx) = bounded(100);
    let publisher = Arc::new(StatePublisher::new(240));
    let mut worker = IngestWorker::start(fast_config(), rx, publisher.clone()).unwrap();

    for i in 0..30 {
        tx.send(LinkEvent::Sample(sample_at(i, 72.0, 14.0))).unwrap();
    }
    thread::sleep(Duration::from_millis(100));
    assert!(!publisher.read().history.is_empty());

    tx.send(LinkEvent::Reset).unwrap();
    thread::sleep(Duration::from_millis(100));
    worker.stop();

    let state = publisher.read();
    assert!(state.history.is_empty());
    assert!(state.metrics.hr_mean.is_none());
    assert_eq!(state.emotion, EmotionState::Neutral);
    // The cycle counter keeps its history across resets
    assert!(state.cycle > 0);
}
