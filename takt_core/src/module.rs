//! Facade trait for compiled designs under test.
//!
//! A design enters the bench as a trait object: the bench never needs the
//! concrete type, only the two-phase evaluator and the trace registration
//! hook. Pin access stays on the concrete type; a driver wires nets while
//! it still holds the concrete value, then moves it into the bench.

use crate::trace::VcdTracer;

/// Uniform facade over one design under test.
///
/// The two-phase evaluator exists so combinational dependencies *between*
/// designs in one bench settle correctly: the bench runs every design's
/// [`Module::eval_step`] before any [`Module::eval_end_step`].
///
/// Ownership replaces the identity bookkeeping a pointer-based registry
/// would need: a design is moved into the bench exactly once, so the
/// registry cannot hold duplicates.
pub trait Module {
    /// Instance name, used as the trace scope.
    fn name(&self) -> &str;

    /// Register this design's signals with the trace sink. Called once,
    /// before the sink opens its output file.
    fn trace(&mut self, tracer: &mut VcdTracer);

    /// First half of the evaluator: compute from current inputs.
    fn eval_step(&mut self);

    /// Second half of the evaluator: commit results.
    fn eval_end_step(&mut self);
}
