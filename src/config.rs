//! Configuration for the vital-affect agent.
//!
//! Every tuning constant in the pipeline lives here: window horizons, the
//! compute cadence, metric minima, classifier thresholds, the valence/arousal
//! weights, and the resting-baseline norm profiles the affect scores are
//! z-scored against. The weights and thresholds are product tuning values
//! validated against reference recordings, not derived quantities.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How much sample history the buffer retains (seconds)
    pub retention_secs: u64,

    /// Span of the time-series arrays in the published state (seconds)
    pub display_secs: u64,

    /// Interval between recompute/publish cycles
    #[serde(with = "duration_serde")]
    pub compute_interval: Duration,

    /// Port for the HTTP read surface (0 picks a free port)
    pub server_port: u16,

    /// Metric engine thresholds
    pub metrics: MetricConfig,

    /// Emotion classifier thresholds
    pub classifier: ClassifierConfig,

    /// Valence/arousal combination weights
    pub weights: AffectWeights,

    /// Which baseline norm profile to score against
    pub norm_profile: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention_secs: 240,
            display_secs: 240,
            compute_interval: Duration::from_secs(1),
            server_port: 5000,
            metrics: MetricConfig::default(),
            classifier: ClassifierConfig::default(),
            weights: AffectWeights::default(),
            norm_profile: "young_male".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vital-affect-agent")
            .join("config.json")
    }

    /// Resolve the configured norm profile.
    pub fn norms(&self) -> Result<NormProfile, ConfigError> {
        NormProfile::by_name(&self.norm_profile)
            .ok_or_else(|| ConfigError::UnknownNormProfile(self.norm_profile.clone()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_secs == 0 {
            return Err(ConfigError::ParseError(
                "retention_secs must be positive".to_string(),
            ));
        }
        if self.compute_interval.is_zero() {
            return Err(ConfigError::ParseError(
                "compute_interval must be positive".to_string(),
            ));
        }
        if self.classifier.hysteresis_cycles == 0 {
            return Err(ConfigError::ParseError(
                "hysteresis_cycles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds for the metric engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Minimum samples before SDNN/RMSSD are reported
    pub min_hrv_samples: usize,
    /// Minimum window span before LF/HF is reported (seconds)
    pub min_spectral_secs: f64,
    /// Uniform grid rate the irregular stream is resampled to (Hz)
    pub resample_hz: f64,
    /// Low-frequency band (Hz)
    pub lf_band: (f64, f64),
    /// High-frequency band (Hz)
    pub hf_band: (f64, f64),
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            min_hrv_samples: 20,
            min_spectral_secs: 60.0,
            resample_hz: 1.0,
            lf_band: (0.04, 0.15),
            hf_band: (0.15, 0.40),
        }
    }
}

/// Thresholds for the emotion classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Scores within this distance of the origin classify as Neutral
    pub neutral_radius: f64,
    /// Consecutive cycles a new region must hold before the label commits
    pub hysteresis_cycles: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            neutral_radius: 1.0,
            hysteresis_cycles: 3,
        }
    }
}

/// Weights combining metric deviations into affect scores.
///
/// Arousal grows with heart rate and shrinking variability; valence grows
/// with slower breathing and larger variability. LF/HF contributes to
/// arousal only when the spectral estimate is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectWeights {
    pub hr_arousal: f64,
    pub sdnn_arousal: f64,
    pub lfhf_arousal: f64,
    pub br_valence: f64,
    pub sdnn_valence: f64,
}

impl Default for AffectWeights {
    fn default() -> Self {
        Self {
            hr_arousal: 0.40,
            sdnn_arousal: 0.59,
            lfhf_arousal: 0.01,
            br_valence: 0.70,
            sdnn_valence: 0.30,
        }
    }
}

/// Mean and standard deviation of a resting-baseline quantity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormStat {
    pub mean: f64,
    pub std: f64,
}

impl NormStat {
    /// Standardized deviation of `value` from this norm.
    pub fn z(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean) / self.std
        } else {
            0.0
        }
    }
}

/// Resting-baseline norms for one population group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormProfile {
    pub hr: NormStat,
    pub sdnn: NormStat,
    pub lf_hf: NormStat,
    pub br: NormStat,
}

impl NormProfile {
    /// Built-in population norm profiles.
    pub fn builtin() -> [(&'static str, NormProfile); 3] {
        [
            (
                "young_male",
                NormProfile {
                    hr: NormStat { mean: 63.90, std: 7.72 },
                    sdnn: NormStat { mean: 50.0, std: 20.9 },
                    lf_hf: NormStat { mean: 2.79, std: 3.20 },
                    br: NormStat { mean: 16.0, std: 3.0 },
                },
            ),
            (
                "young_female",
                NormProfile {
                    hr: NormStat { mean: 66.7, std: 7.6 },
                    sdnn: NormStat { mean: 48.7, std: 19.0 },
                    lf_hf: NormStat { mean: 1.75, std: 1.78 },
                    br: NormStat { mean: 16.5, std: 3.0 },
                },
            ),
            (
                "old_male",
                NormProfile {
                    hr: NormStat { mean: 64.86, std: 8.42 },
                    sdnn: NormStat { mean: 44.6, std: 16.8 },
                    lf_hf: NormStat { mean: 3.62, std: 3.73 },
                    br: NormStat { mean: 15.5, std: 2.5 },
                },
            ),
        ]
    }

    /// Look up a built-in profile by name.
    pub fn by_name(name: &str) -> Option<NormProfile> {
        Self::builtin()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    UnknownNormProfile(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::UnknownNormProfile(name) => {
                write!(f, "Unknown norm profile: {name}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
