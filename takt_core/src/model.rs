//! Facade trait for behavioral device models.
//!
//! A model is a host-language device that participates in evaluation like
//! a design but is written directly: an SDRAM, a flash chip, a host bus
//! agent. All model IO goes through [`takt_common::signal::Pin`]
//! indirections wired at hookup time.

/// Uniform facade over one behavioral device model.
pub trait Model {
    /// Evaluate the model at the current instant.
    ///
    /// Called after the designs have settled, and possibly *several times
    /// per tick* while model and design outputs settle against each other.
    /// Models must therefore detect their own clock edges (rising, by
    /// convention) internally and treat repeated calls at the same level
    /// as no-ops.
    fn eval(&mut self);
}
