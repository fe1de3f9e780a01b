//! Ingestion worker: drains link events into the buffer and publishes
//! computed state on a fixed cadence.
//!
//! Runs on its own thread. Link events arrive over a bounded channel; the
//! loop wakes at least every 100 ms so the compute cadence holds even when
//! the link goes quiet. Rejected samples are logged and dropped, they never
//! abort the loop.

use crate::config::{Config, ConfigError, NormProfile};
use crate::core::{compute_metrics, EmotionClassifier, MetricSnapshot, SampleBuffer};
use crate::link::types::LinkEvent;
use crate::publish::StatePublisher;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Upper bound on how long the loop sleeps between shutdown-flag checks.
const IDLE_WAKE: Duration = Duration::from_millis(100);

/// Handle to the running ingestion thread.
pub struct IngestWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl IngestWorker {
    /// Spawn the worker. Fails only if the configured norm profile is unknown.
    pub fn start(
        config: Config,
        receiver: Receiver<LinkEvent>,
        publisher: Arc<StatePublisher>,
    ) -> Result<Self, ConfigError> {
        let norms = config.norms()?;
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let handle = thread::spawn(move || {
            run_loop(config, norms, receiver, publisher, thread_running.clone());
            thread_running.store(false, Ordering::SeqCst);
        });

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to exit and wait for the thread to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IngestWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    config: Config,
    norms: NormProfile,
    receiver: Receiver<LinkEvent>,
    publisher: Arc<StatePublisher>,
    running: Arc<AtomicBool>,
) {
    let mut buffer = SampleBuffer::new(config.retention_secs);
    let mut classifier = EmotionClassifier::new(config.classifier.clone());
    let mut stale = false;
    let mut last_compute = Instant::now();

    info!("Ingestion loop started");

    while running.load(Ordering::SeqCst) {
        // Wake in time for the next compute deadline even on a quiet link
        let timeout = config
            .compute_interval
            .saturating_sub(last_compute.elapsed())
            .min(IDLE_WAKE);
        match receiver.recv_timeout(timeout) {
            Ok(LinkEvent::Sample(sample)) => match buffer.push(sample) {
                Ok(()) => {
                    stale = false;
                    debug!(
                        hr = sample.heart_rate,
                        br = sample.respiration_rate,
                        "Accepted sample"
                    );
                }
                Err(e) => warn!("Rejected sample: {}", e),
            },
            Ok(LinkEvent::Connected) => {
                info!("Sensor link connected");
            }
            Ok(LinkEvent::Disconnected) => {
                warn!("Sensor link lost, holding last state as stale");
                stale = true;
            }
            Ok(LinkEvent::Reset) => {
                info!("Sensor link reset, clearing all history");
                buffer.clear();
                classifier.reset();
                stale = false;
                publisher.reset();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Link channel closed, stopping ingestion");
                break;
            }
        }

        if last_compute.elapsed() >= config.compute_interval {
            last_compute = Instant::now();
            let window = buffer.snapshot();
            let metrics = compute_or_absent(|| {
                compute_metrics(&window, &config.metrics, &config.weights, &norms)
            });
            let emotion = classifier.update(metrics.valence, metrics.arousal);
            publisher.publish(&window, metrics, emotion, stale);
        }
    }

    info!("Ingestion loop stopped");
}

/// Run one metric computation, converting a panic into absent metrics so a
/// fault in a single cycle never kills the ingestion thread.
fn compute_or_absent<F>(compute: F) -> MetricSnapshot
where
    F: FnOnce() -> MetricSnapshot,
{
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(compute)).unwrap_or_else(|_| {
        error!("Metric computation panicked; treating this cycle as absent");
        MetricSnapshot::absent()
    })
}
