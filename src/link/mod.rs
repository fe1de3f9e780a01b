//! Sensor-link boundary for the agent.
//!
//! Pairing, reconnect policy, and wire decoding live outside this crate; the
//! link delivers timestamped samples and lifecycle events over a bounded
//! channel, and this module defines those events plus a simulated link for
//! demos and tests.

pub mod sim;
pub mod types;

pub use sim::{LinkError, SimLinkConfig, SimulatedLink};
pub use types::{LinkEvent, VitalSample};
