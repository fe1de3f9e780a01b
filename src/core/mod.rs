//! Core pipeline stages for the Vital Affect Agent.
//!
//! This module contains:
//! - The bounded, time-ordered sample buffer
//! - Metric computation over a window snapshot
//! - Emotion classification over the affect scores

pub mod buffer;
pub mod classifier;
pub mod metrics;

// Re-export commonly used types
pub use buffer::{PushError, SampleBuffer, SampleWindow};
pub use classifier::{EmotionClassifier, EmotionState};
pub use metrics::{compute as compute_metrics, MetricSnapshot};
