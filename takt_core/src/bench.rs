//! The test harness.
//!
//! A `TestBench` owns absolute simulated time and the registries of clock
//! domains, designs, and behavioral models. Each [`TestBench::eval`]
//! evaluates everything at the current instant, then advances time to the
//! globally nearest clock edge and applies it.
//!
//! Everything lives in one owning value: drivers construct the bench,
//! register participants, and loop on `eval` / `eval_until_clock_edge`
//! until [`TestBench::is_done`]. An interrupt handler flips the shared
//! finish flag and the run winds down at the next step boundary, with the
//! trace file already flushed.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::clock::ClockDomain;
use crate::context::SimContext;
use crate::model::Model;
use crate::module::Module;
use crate::trace::{TraceError, VcdTracer};

/// Handle to a clock domain registered with a bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainId(usize);

/// Rounds of model-then-design re-evaluation per step, so pin updates
/// driven by models settle through the designs within the same instant.
/// A model whose output feeds combinational logic that feeds the model
/// again settles in the second round; deeper loops than that are design
/// bugs this harness does not chase.
const SETTLE_ROUNDS: usize = 2;

/// The harness: simulated time plus every registered participant.
pub struct TestBench {
    ctx: Rc<SimContext>,
    tracer: Option<VcdTracer>,
    trace_enabled: bool,
    domains: Vec<ClockDomain>,
    modules: Vec<Box<dyn Module>>,
    models: Vec<Box<dyn Model>>,
    runtime_limit_ps: u64,
    /// Set on the first eval; no clock domain may be added afterwards,
    /// because a domain added mid-run would have missed edges.
    clock_lock: bool,
    finish_flag: Arc<AtomicBool>,
}

impl TestBench {
    /// Create a bench.
    ///
    /// `args` are forwarded verbatim to the shared simulation context.
    /// A `runtime_limit_ps` of zero means unbounded: the run ends only on
    /// a finish request or an interrupt.
    pub fn new(args: Vec<String>, runtime_limit_ps: u64) -> Self {
        Self {
            ctx: SimContext::new(args),
            tracer: None,
            trace_enabled: false,
            domains: Vec::new(),
            modules: Vec::new(),
            models: Vec::new(),
            runtime_limit_ps: if runtime_limit_ps == 0 {
                u64::MAX
            } else {
                runtime_limit_ps
            },
            clock_lock: false,
            finish_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to the shared simulation context, for constructing designs.
    pub fn context(&self) -> Rc<SimContext> {
        Rc::clone(&self.ctx)
    }

    /// Current absolute time [ps].
    pub fn time_ps(&self) -> u64 {
        self.ctx.time_ps()
    }

    /// Shared flag that ends the run when set. Hand this to a signal
    /// handler; the bench polls it in [`Self::is_done`].
    pub fn finish_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.finish_flag)
    }

    /// Register a clock domain. All domains align their schedules at time
    /// zero, so registration is only allowed before the first eval.
    pub fn add_domain(&mut self, domain: ClockDomain) -> DomainId {
        assert!(
            !self.clock_lock,
            "bench::add_domain: clock domains are locked after the first eval"
        );
        self.domains.push(domain);
        DomainId(self.domains.len() - 1)
    }

    /// Borrow a registered domain.
    pub fn domain(&self, id: DomainId) -> &ClockDomain {
        &self.domains[id.0]
    }

    /// Mutably borrow a registered domain, for attaching clock pins.
    pub fn domain_mut(&mut self, id: DomainId) -> &mut ClockDomain {
        &mut self.domains[id.0]
    }

    /// Register a design under test.
    ///
    /// The trace sink cannot register new signals once its file is open,
    /// so designs must be added before the sink is installed.
    pub fn add_module(&mut self, module: Box<dyn Module>) {
        assert!(
            self.tracer.is_none(),
            "bench::add_module: design '{}' registered after the trace sink \
             was installed; it would not be traced",
            module.name()
        );
        self.modules.push(module);
    }

    /// Register a behavioral model. Wire its pins first; the bench only
    /// calls [`Model::eval`].
    pub fn add_model(&mut self, model: Box<dyn Model>) {
        self.models.push(model);
    }

    /// Install the trace sink: register every design's signals, then open
    /// the file. Idempotent once installed.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` when the file cannot be created.
    pub fn vcd_trace_set(&mut self, path: &Path) -> Result<(), TraceError> {
        if self.tracer.is_none() {
            debug!(path = %path.display(), "installing trace sink");
            let mut tracer = VcdTracer::new();
            for module in &mut self.modules {
                module.trace(&mut tracer);
            }
            tracer.open(path)?;
            self.tracer = Some(tracer);
        }
        Ok(())
    }

    /// Toggle trace dumping, optionally installing the sink first.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` when installing the sink fails.
    pub fn set_tracing(&mut self, enabled: bool, path: Option<&Path>) -> Result<(), TraceError> {
        if self.tracer.is_none() {
            let Some(path) = path else {
                debug!("set_tracing: no sink installed and no path given");
                return Ok(());
            };
            self.vcd_trace_set(path)?;
        }
        self.trace_enabled = enabled;
        Ok(())
    }

    fn module_eval(&mut self) {
        for module in &mut self.modules {
            module.eval_step();
        }
        for module in &mut self.modules {
            module.eval_end_step();
        }
    }

    fn model_eval(&mut self) {
        for model in &mut self.models {
            model.eval();
        }
    }

    /// One evaluation step.
    ///
    /// Evaluates every design (two-phase), then lets models and designs
    /// settle against each other for a bounded number of rounds, dumps a
    /// trace sample, and finally advances time to the nearest edge across
    /// all domains, flipping the clock of every domain that ties at it.
    pub fn eval(&mut self) {
        // No more clock domains after this point.
        self.clock_lock = true;

        // The first call evaluates the initial clock position at time 0.
        self.module_eval();
        for _ in 0..SETTLE_ROUNDS {
            self.model_eval();
            self.module_eval();
        }

        if self.trace_enabled
            && let Some(tracer) = self.tracer.as_mut()
        {
            let now = self.ctx.time_ps();
            tracer
                .dump(now)
                .unwrap_or_else(|e| panic!("bench::eval: trace dump at {now} ps failed: {e}"));
            tracer
                .flush()
                .unwrap_or_else(|e| panic!("bench::eval: trace flush failed: {e}"));
        }

        if self.domains.is_empty() {
            return;
        }

        let now = self.ctx.time_ps();
        let distances: Vec<u64> = self
            .domains
            .iter()
            .map(|domain| domain.time_to_next_edge(now))
            .collect();
        // A distance of zero cannot occur: edges applied at the end of the
        // previous step lie strictly behind the next ones.
        let nearest = *distances.iter().min().expect("at least one domain");

        self.ctx.advance(nearest);
        let edge_time = self.ctx.time_ps();
        for (domain, distance) in self.domains.iter_mut().zip(&distances) {
            if *distance == nearest {
                domain.apply_edge(edge_time);
            }
        }
    }

    /// Step until the sampled domain's clock changes level, then until it
    /// equals `desired_level`. The primary way drivers synchronize with a
    /// design.
    pub fn eval_until_clock_edge(&mut self, sampler: DomainId, desired_level: u8) {
        let start = self.domains[sampler.0].clock_value_at(self.ctx.time_ps());
        loop {
            self.eval();
            if self.domains[sampler.0].clock_value_at(self.ctx.time_ps()) != start {
                break;
            }
        }
        while self.domains[sampler.0].clock_value_at(self.ctx.time_ps()) != desired_level {
            self.eval();
        }
    }

    /// True once the runtime limit is reached, a participant requested
    /// finish, or the external finish flag was set.
    pub fn is_done(&self) -> bool {
        self.ctx.time_ps() >= self.runtime_limit_ps
            || self.ctx.finish_requested()
            || self.finish_flag.load(Ordering::SeqCst)
    }
}
