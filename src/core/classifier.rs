//! Quadrant-based emotion classification with hysteresis.
//!
//! The valence/arousal plane is carved into four quadrants plus a neutral
//! disc around the origin. A raw region must be observed for a configured
//! number of consecutive cycles before the committed label changes, which
//! keeps the published state from flapping when scores hover near a boundary.

use crate::config::ClassifierConfig;
use serde::{Deserialize, Serialize};

/// Committed emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionState {
    /// High arousal, positive valence
    Joy,
    /// High arousal, negative valence
    Tense,
    /// Low arousal, negative valence
    Low,
    /// Low arousal, positive valence
    Calm,
    /// Scores too close to baseline to call
    Neutral,
}

impl std::fmt::Display for EmotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EmotionState::Joy => "joy",
            EmotionState::Tense => "tense",
            EmotionState::Low => "low",
            EmotionState::Calm => "calm",
            EmotionState::Neutral => "neutral",
        };
        write!(f, "{name}")
    }
}

/// Stateful classifier holding the committed label across cycles.
pub struct EmotionClassifier {
    config: ClassifierConfig,
    committed: EmotionState,
    candidate: Option<EmotionState>,
    candidate_cycles: u32,
}

impl EmotionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            committed: EmotionState::Neutral,
            candidate: None,
            candidate_cycles: 0,
        }
    }

    pub fn current(&self) -> EmotionState {
        self.committed
    }

    /// Advance one cycle and return the committed state.
    ///
    /// An absent score pair holds the committed label and resets any pending
    /// candidate; hysteresis counts only contiguous observations.
    pub fn update(&mut self, valence: Option<f64>, arousal: Option<f64>) -> EmotionState {
        let (Some(valence), Some(arousal)) = (valence, arousal) else {
            self.candidate = None;
            self.candidate_cycles = 0;
            return self.committed;
        };

        let raw = Self::region(valence, arousal, self.config.neutral_radius);
        if raw == self.committed {
            self.candidate = None;
            self.candidate_cycles = 0;
            return self.committed;
        }

        if self.candidate == Some(raw) {
            self.candidate_cycles += 1;
        } else {
            self.candidate = Some(raw);
            self.candidate_cycles = 1;
        }

        if self.candidate_cycles >= self.config.hysteresis_cycles {
            self.committed = raw;
            self.candidate = None;
            self.candidate_cycles = 0;
        }
        self.committed
    }

    /// Forget all state, returning to neutral.
    pub fn reset(&mut self) {
        self.committed = EmotionState::Neutral;
        self.candidate = None;
        self.candidate_cycles = 0;
    }

    fn region(valence: f64, arousal: f64, neutral_radius: f64) -> EmotionState {
        if (valence * valence + arousal * arousal).sqrt() < neutral_radius {
            return EmotionState::Neutral;
        }
        // The axes themselves belong to the negative-side regions
        match (valence > 0.0, arousal > 0.0) {
            (true, true) => EmotionState::Joy,
            (false, true) => EmotionState::Tense,
            (false, false) => EmotionState::Low,
            (true, false) => EmotionState::Calm,
        }
    }
}
