//! Vital Affect Agent - physiological monitoring and emotion estimation core.
//!
//! This library ingests heart-rate and respiration samples from an unreliable
//! sensor link, maintains a bounded time-ordered history, derives HRV and
//! affect metrics on a fixed cadence, classifies a coarse emotional state with
//! hysteresis, and publishes consistent snapshots for any number of pollers.
//!
//! # Data honesty
//!
//! Every derived quantity is optional. A window that is too short or too
//! sparse yields an absent metric, never a fabricated value, and the last
//! snapshot is flagged stale while the link is down.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Vital Affect Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Sensor Link │──▶│   Buffer    │──▶│   Metrics   │        │
//! │  │  (events)   │   │ (240s ring) │   │ (SDNN, ...) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                             │               │
//! │                                             ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ GET /state  │◀──│  Publisher  │◀──│ Classifier  │        │
//! │  │  (pollers)  │   │ (Arc swap)  │   │ (hysteresis)│        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vital_affect_agent::{Config, IngestWorker, SimulatedLink, SimLinkConfig, StatePublisher};
//!
//! let config = Config::default();
//! let publisher = Arc::new(StatePublisher::new(config.display_secs));
//!
//! let mut link = SimulatedLink::new(SimLinkConfig::default());
//! link.start().expect("Failed to start link");
//!
//! let worker = IngestWorker::start(config, link.receiver().clone(), publisher.clone())
//!     .expect("Failed to start ingestion");
//!
//! // Poll the latest snapshot at any time
//! let state = publisher.read();
//! println!("{} (cycle {})", state.emotion, state.cycle);
//! # drop(worker);
//! ```

pub mod config;
pub mod core;
pub mod ingest;
pub mod link;
pub mod publish;
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, NormProfile, NormStat};
pub use core::{EmotionClassifier, EmotionState, MetricSnapshot, SampleBuffer, SampleWindow};
pub use ingest::IngestWorker;
pub use link::{LinkEvent, LinkError, SimLinkConfig, SimulatedLink, VitalSample};
pub use publish::{PublishedState, StatePublisher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
