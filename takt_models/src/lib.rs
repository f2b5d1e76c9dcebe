//! # TAKT Device Models
//!
//! Behavioral devices that plug into the TAKT harness as [`takt_core::Model`]
//! implementations, plus a behavioral bus master that plugs in as a
//! [`takt_core::Module`].
//!
//! # Module Structure
//!
//! - [`consts`] - SDRAM geometry constants
//! - [`timing`] - Nanosecond timing parameters and derived cycle counts
//! - [`command`] - Command-bus decode
//! - [`sdram`] - The SDRAM model: command-decoded state machine over a
//!   byte-addressed backing store
//! - [`controller`] - Behavioral host controller issuing bring-up and
//!   block transfers against the SDRAM wire protocol
//!
//! The SDRAM model is a *specification aid*: any command inconsistent with
//! its current state, a missed refresh deadline, or a disabled clock at an
//! edge is a fatal abort, because those indicate bugs in the design under
//! test.

pub mod command;
pub mod consts;
pub mod controller;
pub mod sdram;
pub mod timing;

pub use crate::command::Command;
pub use crate::controller::HostController;
pub use crate::sdram::{Sdram, SdramState};
pub use crate::timing::{SdramTiming, WaitCycles};
