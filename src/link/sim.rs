//! Simulated sensor link.
//!
//! Produces a smooth synthetic heart-rate/respiration stream for demos and
//! tests, with an optional scripted mid-stream disconnect. Real deployments
//! replace this with a hardware link feeding the same channel.

use crate::link::types::{LinkEvent, VitalSample};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for the simulated sensor.
#[derive(Debug, Clone)]
pub struct SimLinkConfig {
    /// Interval between emitted samples
    pub sample_interval: Duration,
    /// Center of the heart-rate oscillation (bpm)
    pub hr_base: f64,
    /// Peak deviation of the heart-rate oscillation (bpm)
    pub hr_amplitude: f64,
    /// Heart-rate oscillation period in seconds
    pub hr_period_secs: f64,
    /// Center of the respiration oscillation (breaths/min)
    pub br_base: f64,
    /// Peak deviation of the respiration oscillation (breaths/min)
    pub br_amplitude: f64,
    /// Respiration oscillation period in seconds
    pub br_period_secs: f64,
    /// Emit a disconnect after this many samples, then reconnect after `gap`
    pub disconnect_after: Option<usize>,
    /// Duration of the scripted outage
    pub gap: Duration,
}

impl Default for SimLinkConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            hr_base: 70.0,
            hr_amplitude: 10.0,
            hr_period_secs: 20.0,
            br_base: 14.0,
            br_amplitude: 2.0,
            br_period_secs: 30.0,
            disconnect_after: None,
            gap: Duration::from_secs(5),
        }
    }
}

/// Errors from the simulated link.
#[derive(Debug)]
pub enum LinkError {
    AlreadyRunning,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::AlreadyRunning => write!(f, "Link is already running"),
        }
    }
}

impl std::error::Error for LinkError {}

/// A background thread emitting synthetic link events.
pub struct SimulatedLink {
    config: SimLinkConfig,
    sender: Sender<LinkEvent>,
    receiver: Receiver<LinkEvent>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SimulatedLink {
    pub fn new(config: SimLinkConfig) -> Self {
        // Bounded so a stalled consumer cannot grow memory without limit
        let (sender, receiver) = bounded(10_000);

        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start emitting events in a background thread.
    pub fn start(&mut self) -> Result<(), LinkError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(LinkError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            run_sim_loop(sender, running.clone(), config);
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop emitting events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Receiver the ingestion loop drains.
    pub fn receiver(&self) -> &Receiver<LinkEvent> {
        &self.receiver
    }
}

impl Drop for SimulatedLink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_sim_loop(sender: Sender<LinkEvent>, running: Arc<AtomicBool>, config: SimLinkConfig) {
    let _ = sender.send(LinkEvent::Connected);

    let mut emitted = 0usize;
    while running.load(Ordering::SeqCst) {
        if let Some(limit) = config.disconnect_after {
            if emitted == limit {
                let _ = sender.send(LinkEvent::Disconnected);
                sleep_while_running(&running, config.gap);
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let _ = sender.send(LinkEvent::Connected);
            }
        }

        let t = emitted as f64 * config.sample_interval.as_secs_f64();
        let hr = config.hr_base + config.hr_amplitude * (2.0 * PI * t / config.hr_period_secs).sin();
        let br = config.br_base + config.br_amplitude * (2.0 * PI * t / config.br_period_secs).sin();

        let sample = VitalSample::new(Utc::now(), hr, br);
        if sender.send(LinkEvent::Sample(sample)).is_err() {
            break;
        }
        emitted += 1;

        sleep_while_running(&running, config.sample_interval);
    }
}

/// Sleep in short slices so stop() is honored promptly.
fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let slice = Duration::from_millis(50);
    let mut remaining = total;
    while running.load(Ordering::SeqCst) && !remaining.is_zero() {
        let step = remaining.min(slice);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}
