//! # TAKT Core Library
//!
//! Lock-step simulation harness for multi-clock-domain digital designs.
//! Advances simulated time in picosecond steps, delivers correctly phased
//! clock edges to every registered design and behavioral model, evaluates
//! combinational settling between them, and records waveform traces.
//!
//! # Module Structure
//!
//! - [`context`] - Shared simulation context (absolute time, finish flag)
//! - [`clock`] - Picosecond-accurate clock domains
//! - [`module`] - Facade trait for compiled designs under test
//! - [`model`] - Facade trait for behavioral device models
//! - [`bench`] - The test harness that owns time and all registries
//! - [`trace`] - VCD waveform sink
//!
//! # Evaluation scheme
//!
//! Given multiple clock domains, each [`bench::TestBench::eval`] call finds
//! the minimum time to the next clock edge across all domains, evaluates
//! every participant at the current instant, then advances time by that
//! minimum and flips the clock of every domain that tied at it. No edge is
//! ever skipped and the ordering of events across domains is deterministic.

pub mod bench;
pub mod clock;
pub mod context;
pub mod model;
pub mod module;
pub mod trace;

// Re-export key types for convenience
pub use crate::bench::{DomainId, TestBench};
pub use crate::clock::ClockDomain;
pub use crate::context::SimContext;
pub use crate::model::Model;
pub use crate::module::Module;
pub use crate::trace::VcdTracer;
