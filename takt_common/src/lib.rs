//! TAKT Common Library
//!
//! This crate provides the leaf types shared by all TAKT workspace crates:
//! signal nets, model pin indirections, and rig configuration loading.
//!
//! # Module Structure
//!
//! - [`signal`] - Shared signal cells (`Net`) and rewireable pins (`Pin`)
//! - [`config`] - TOML configuration types and loading
//!
//! # Usage
//!
//! ```rust
//! use takt_common::signal::{Net, Pin};
//!
//! let cell = Net::new(0u8);
//! let mut pin = Pin::new("clk");
//! pin.wire(&cell);
//! cell.set(1);
//! assert_eq!(pin.get(), 1);
//! ```

pub mod config;
pub mod signal;
