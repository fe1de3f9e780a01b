//! Bounded, time-ordered buffer of recent physiological samples.
//!
//! Eviction is time-based rather than count-based because the sensor cadence
//! is irregular. The buffer enforces strictly increasing timestamps at the
//! boundary; out-of-order or duplicate-timestamp samples are rejected, never
//! reordered.

use crate::link::types::VitalSample;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Why a sample was rejected at the buffer boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushError {
    /// Timestamp not after the newest buffered sample
    OutOfOrder {
        newest: DateTime<Utc>,
        rejected: DateTime<Utc>,
    },
    /// Non-finite or non-positive channel values
    Invalid,
}

impl std::fmt::Display for PushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::OutOfOrder { newest, rejected } => {
                write!(f, "out-of-order sample: {rejected} not after {newest}")
            }
            PushError::Invalid => write!(f, "sample has non-finite or non-positive values"),
        }
    }
}

impl std::error::Error for PushError {}

/// A read-only, time-ordered copy of buffer contents.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    samples: Vec<VitalSample>,
}

impl SampleWindow {
    pub fn samples(&self) -> &[VitalSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time covered by the window in seconds (0 for fewer than two samples).
    pub fn span_secs(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    pub fn heart_rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.heart_rate).collect()
    }

    pub fn respiration_rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.respiration_rate).collect()
    }

    /// The suffix of the window covering at most the trailing `secs` seconds.
    pub fn tail_secs(&self, secs: u64) -> &[VitalSample] {
        let Some(last) = self.samples.last() else {
            return &[];
        };
        let cutoff = last.timestamp - Duration::seconds(secs as i64);
        let start = self.samples.partition_point(|s| s.timestamp < cutoff);
        &self.samples[start..]
    }
}

/// Bounded ring of recent samples with a trailing retention horizon.
///
/// Single-owner: only the ingestion loop mutates it. `snapshot` hands out
/// copies for the pure metric/classifier stages.
pub struct SampleBuffer {
    retention: Duration,
    samples: VecDeque<VitalSample>,
}

impl SampleBuffer {
    pub fn new(retention_secs: u64) -> Self {
        Self {
            retention: Duration::seconds(retention_secs as i64),
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, enforcing ordering and evicting expired history.
    pub fn push(&mut self, sample: VitalSample) -> Result<(), PushError> {
        if !sample.is_valid() {
            return Err(PushError::Invalid);
        }

        if let Some(newest) = self.samples.back() {
            if sample.timestamp <= newest.timestamp {
                return Err(PushError::OutOfOrder {
                    newest: newest.timestamp,
                    rejected: sample.timestamp,
                });
            }
        }

        self.samples.push_back(sample);
        self.evict(sample.timestamp);
        Ok(())
    }

    /// Snapshot the current contents, oldest first.
    pub fn snapshot(&self) -> SampleWindow {
        SampleWindow {
            samples: self.samples.iter().copied().collect(),
        }
    }

    /// Drop all history (sensor-link reset).
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.back().map(|s| s.timestamp)
    }

    fn evict(&mut self, latest: DateTime<Utc>) {
        let cutoff = latest - self.retention;
        while let Some(oldest) = self.samples.front() {
            if oldest.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}
