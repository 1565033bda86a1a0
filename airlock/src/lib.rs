//! Runner crate: wires [`airlock_core::SecurityAirlock`] to real
//! ingress/egress TCP transport, configuration loading, and telemetry.

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod reset;
pub mod runner;
pub mod telemetry;

pub use error::{AirlockError, Result};
pub use runner::AirlockRunner;
