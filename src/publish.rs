//! Atomic publication of the agent's observable state.
//!
//! The ingestion loop is the only writer. Each cycle it builds a complete
//! [`PublishedState`] and swaps it in behind an `RwLock<Arc<_>>`; readers
//! clone the `Arc` under a momentary read lock and then work with an
//! immutable snapshot. A reader can never observe a half-updated cycle, and
//! a slow reader never blocks the writer for longer than the pointer swap.

use crate::core::{EmotionState, MetricSnapshot, SampleWindow};
use crate::link::types::VitalSample;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One immutable, internally consistent snapshot of the agent.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedState {
    /// Stable identifier for this agent process
    pub instance_id: Uuid,
    /// Monotonically increasing publication counter
    pub cycle: u64,
    /// When this snapshot was published
    pub published_at: DateTime<Utc>,
    /// True when the sensor link is down and the data below is aging
    pub stale: bool,
    /// Committed emotional state
    pub emotion: EmotionState,
    /// Derived metrics, each possibly absent
    pub metrics: MetricSnapshot,
    /// Recent raw samples for display, oldest first
    pub history: Vec<VitalSample>,
}

impl PublishedState {
    fn initial(instance_id: Uuid) -> Self {
        Self {
            instance_id,
            cycle: 0,
            published_at: Utc::now(),
            stale: false,
            emotion: EmotionState::Neutral,
            metrics: MetricSnapshot::absent(),
            history: Vec::new(),
        }
    }
}

/// Shared handle through which pollers observe the agent.
pub struct StatePublisher {
    instance_id: Uuid,
    display_secs: u64,
    inner: RwLock<Arc<PublishedState>>,
}

impl StatePublisher {
    /// Create a publisher holding the all-absent initial state.
    pub fn new(display_secs: u64) -> Self {
        let instance_id = Uuid::new_v4();
        Self {
            instance_id,
            display_secs,
            inner: RwLock::new(Arc::new(PublishedState::initial(instance_id))),
        }
    }

    /// The most recently published snapshot.
    pub fn read(&self) -> Arc<PublishedState> {
        self.inner.read().expect("state lock poisoned").clone()
    }

    /// Publish a new snapshot built from one computation cycle.
    pub fn publish(
        &self,
        window: &SampleWindow,
        metrics: MetricSnapshot,
        emotion: EmotionState,
        stale: bool,
    ) {
        let history = window.tail_secs(self.display_secs).to_vec();
        let next = Arc::new(PublishedState {
            instance_id: self.instance_id,
            cycle: self.read().cycle + 1,
            published_at: Utc::now(),
            stale,
            emotion,
            metrics,
            history,
        });
        *self.inner.write().expect("state lock poisoned") = next;
    }

    /// Return to the all-absent state while keeping the cycle counter moving.
    pub fn reset(&self) {
        let cycle = self.read().cycle + 1;
        let mut state = PublishedState::initial(self.instance_id);
        state.cycle = cycle;
        *self.inner.write().expect("state lock poisoned") = Arc::new(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleBuffer;
    use chrono::Duration;
    use std::thread;

    fn window_of(n: usize) -> SampleWindow {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut buffer = SampleBuffer::new(3600);
        for i in 0..n {
            buffer
                .push(VitalSample::new(
                    base + Duration::seconds(i as i64),
                    70.0,
                    14.0,
                ))
                .unwrap();
        }
        buffer.snapshot()
    }

    #[test]
    fn test_initial_state_is_absent_and_neutral() {
        let publisher = StatePublisher::new(240);
        let state = publisher.read();
        assert_eq!(state.cycle, 0);
        assert!(!state.stale);
        assert_eq!(state.emotion, EmotionState::Neutral);
        assert_eq!(state.metrics, MetricSnapshot::absent());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_publish_advances_cycle_and_replaces_state() {
        let publisher = StatePublisher::new(240);
        let old = publisher.read();

        publisher.publish(
            &window_of(10),
            MetricSnapshot {
                hr_mean: Some(70.0),
                ..MetricSnapshot::absent()
            },
            EmotionState::Calm,
            false,
        );

        let new = publisher.read();
        assert_eq!(new.cycle, old.cycle + 1);
        assert_eq!(new.emotion, EmotionState::Calm);
        assert_eq!(new.history.len(), 10);
        // The old snapshot is untouched
        assert_eq!(old.cycle, 0);
        assert_eq!(old.emotion, EmotionState::Neutral);
    }

    #[test]
    fn test_history_trimmed_to_display_horizon() {
        let publisher = StatePublisher::new(10);
        publisher.publish(
            &window_of(60),
            MetricSnapshot::absent(),
            EmotionState::Neutral,
            false,
        );
        assert_eq!(publisher.read().history.len(), 11);
    }

    #[test]
    fn test_reset_clears_but_keeps_counting() {
        let publisher = StatePublisher::new(240);
        publisher.publish(
            &window_of(5),
            MetricSnapshot::absent(),
            EmotionState::Joy,
            false,
        );
        publisher.reset();

        let state = publisher.read();
        assert_eq!(state.cycle, 2);
        assert_eq!(state.emotion, EmotionState::Neutral);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_snapshots() {
        let publisher = Arc::new(StatePublisher::new(240));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let publisher = publisher.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let state = publisher.read();
                        // Emotion and mean must come from the same cycle
                        if state.cycle > 0 {
                            let hr = state.metrics.hr_mean.unwrap();
                            let expected = if state.emotion == EmotionState::Joy {
                                90.0
                            } else {
                                60.0
                            };
                            assert!((hr - expected).abs() < 1e-9);
                        }
                    }
                })
            })
            .collect();

        for i in 0..500 {
            let (hr, emotion) = if i % 2 == 0 {
                (90.0, EmotionState::Joy)
            } else {
                (60.0, EmotionState::Calm)
            };
            publisher.publish(
                &SampleWindow::default(),
                MetricSnapshot {
                    hr_mean: Some(hr),
                    ..MetricSnapshot::absent()
                },
                emotion,
                false,
            );
        }

        for handle in readers {
            handle.join().unwrap();
        }
    }
}
