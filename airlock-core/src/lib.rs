//! Deterministic core of the security airlock: a single-threaded,
//! cycle-stepped packet guard. See [`SecurityAirlock`] for the entry
//! point.

mod airlock;
mod arp_bucket;
mod config;
mod gate;
mod lock;
mod parser;
mod policy;
mod resync;
mod stream;
mod violation;
mod volume;
mod watchdog;

pub use airlock::SecurityAirlock;
pub use arp_bucket::ArpLeakyBucket;
pub use config::AirlockLimits;
pub use gate::{compute as compute_gate, GateInputs, GateOutputs};
pub use lock::{decide as decide_lock, LockInputs, LockOutcome};
pub use parser::ParserState;
pub use policy::{evaluate as evaluate_policy, PolicyInputs};
pub use resync::{FlushOutcome, ResyncController};
pub use stream::{Input, Output};
pub use violation::{ViolationKind, ViolationLatches, ViolationNow};
pub use volume::VolumeCounter;
pub use watchdog::HeartbeatWatchdog;
