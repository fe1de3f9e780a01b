//! Event types crossing the sensor-link boundary.
//!
//! The link component owns pairing and wire decoding; this core only sees
//! timestamped numeric samples plus connect/disconnect lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single physiological sample from the sensor link.
///
/// Immutable once created. Cadence is sensor-determined and not guaranteed
/// to be periodic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSample {
    /// When the sensor observed this sample
    pub timestamp: DateTime<Utc>,
    /// Heart rate in beats per minute
    pub heart_rate: f64,
    /// Respiration rate in breaths per minute
    pub respiration_rate: f64,
}

impl VitalSample {
    pub fn new(timestamp: DateTime<Utc>, heart_rate: f64, respiration_rate: f64) -> Self {
        Self {
            timestamp,
            heart_rate,
            respiration_rate,
        }
    }

    /// Whether both channels carry usable values.
    ///
    /// Sensors report 0 bpm while searching for a subject; those readings
    /// are not physiological data.
    pub fn is_valid(&self) -> bool {
        self.heart_rate.is_finite()
            && self.heart_rate > 0.0
            && self.respiration_rate.is_finite()
            && self.respiration_rate > 0.0
    }
}

/// Lifecycle and data events delivered by the sensor link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinkEvent {
    /// A new physiological sample
    Sample(VitalSample),
    /// The link (re)established contact with the sensor
    Connected,
    /// The link lost contact; samples stop until reconnect
    Disconnected,
    /// The link was re-paired from scratch; accumulated history is void
    Reset,
}

impl LinkEvent {
    /// Timestamp of the carried sample, if this event carries one.
    pub fn sample_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LinkEvent::Sample(s) => Some(s.timestamp),
            _ => None,
        }
    }
}
