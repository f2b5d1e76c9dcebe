//! End-to-end harness scenarios.
//!
//! These drive a whole `TestBench` the way a rig binary would: register
//! domains and participants, loop on `eval`, and check the deterministic
//! edge schedule and trace output.

use takt_common::signal::Net;
use takt_core::bench::TestBench;
use takt_core::clock::ClockDomain;
use takt_core::module::Module;
use takt_core::trace::VcdTracer;

/// A design stub whose output follows its clock input through the
/// two-phase evaluator: `eval_step` samples, `eval_end_step` commits.
struct Follower {
    clk: Net<u8>,
    q: Net<u8>,
    pending: u8,
}

impl Follower {
    fn new() -> Self {
        Self {
            clk: Net::new(0),
            q: Net::new(0),
            pending: 0,
        }
    }
}

impl Module for Follower {
    fn name(&self) -> &str {
        "follower"
    }

    fn trace(&mut self, tracer: &mut VcdTracer) {
        tracer.add_bit("follower", "clk", &self.clk);
        tracer.add_bit("follower", "q", &self.q);
    }

    fn eval_step(&mut self) {
        self.pending = self.clk.get();
    }

    fn eval_end_step(&mut self) {
        self.q.set(self.pending);
    }
}

#[test]
fn single_domain_idle_run() {
    // One 50 MHz domain, no design, no model, 1 µs runtime: exactly one
    // edge per eval, 100 edges, and a clean stop at exactly 1_000_000 ps.
    let mut bench = TestBench::new(vec![], 1_000_000);
    let id = bench.add_domain(ClockDomain::new(50.0, 0.0).expect("domain"));

    let mut evals = 0u64;
    let mut toggles = 0u64;
    let mut prev = bench.domain(id).level();
    while !bench.is_done() {
        bench.eval();
        evals += 1;
        let level = bench.domain(id).level();
        if level != prev {
            toggles += 1;
        }
        prev = level;
    }

    assert_eq!(bench.time_ps(), 1_000_000);
    assert_eq!(evals, 100);
    assert_eq!(toggles, 100);
    // 1 µs is 50 full periods: the run ends on a positive edge.
    assert_eq!(bench.domain(id).level(), 1);
    assert_eq!(bench.domain(id).last_posedge_ps(), 1_000_000);
}

#[test]
fn two_domain_edge_budget() {
    // 50 MHz and 90 MHz, both in phase at time 0. The 90 MHz half period
    // rounds up to 5556 ps, so within 1 µs it fires floor(1e6 / 5556)
    // times while the 50 MHz domain fires 100 times, and the two never tie.
    let mut bench = TestBench::new(vec![], 1_000_000);
    let slow = bench.add_domain(ClockDomain::new(50.0, 0.0).expect("domain"));
    let fast = bench.add_domain(ClockDomain::new(90.0, 0.0).expect("domain"));

    let mut evals = 0u64;
    let mut slow_edges = 0u64;
    let mut fast_edges = 0u64;
    let mut prev_slow = bench.domain(slow).level();
    let mut prev_fast = bench.domain(fast).level();
    while !bench.is_done() {
        bench.eval();
        evals += 1;
        if bench.domain(slow).level() != prev_slow {
            slow_edges += 1;
            prev_slow = bench.domain(slow).level();
        }
        if bench.domain(fast).level() != prev_fast {
            fast_edges += 1;
            prev_fast = bench.domain(fast).level();
        }
    }

    assert_eq!(bench.time_ps(), 1_000_000);
    assert_eq!(slow_edges, 100);
    assert_eq!(fast_edges, 1_000_000 / 5_556);
    assert_eq!(evals, slow_edges + fast_edges);
}

#[test]
fn trace_captures_every_eval() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bench.vcd");

    let mut bench = TestBench::new(vec![], 0);
    let follower = Follower::new();
    let id = bench.add_domain(ClockDomain::new(100.0, 0.0).expect("domain"));
    bench.domain_mut(id).attach_uut_clock(&follower.clk);
    bench.add_module(Box::new(follower));

    bench.vcd_trace_set(&path).expect("install sink");
    bench.set_tracing(true, None).expect("enable tracing");

    for _ in 0..10 {
        bench.eval();
    }

    let text = std::fs::read_to_string(&path).expect("read trace");
    assert!(text.contains("$timescale 1 ps $end"));
    assert!(text.contains("$scope module follower $end"));
    let samples = text.lines().filter(|line| line.starts_with('#')).count();
    assert_eq!(samples, 10);
    // The follower's q tracks the clock, so both levels show up.
    assert!(text.contains("$dumpvars"));
}

#[test]
#[should_panic(expected = "after the trace sink")]
fn late_module_registration_aborts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("late.vcd");

    let mut bench = TestBench::new(vec![], 0);
    bench.add_domain(ClockDomain::new(50.0, 0.0).expect("domain"));
    bench.vcd_trace_set(&path).expect("install sink");
    bench.add_module(Box::new(Follower::new()));
}

#[test]
fn finish_request_from_context_stops_run() {
    let mut bench = TestBench::new(vec![], 0);
    bench.add_domain(ClockDomain::new(50.0, 0.0).expect("domain"));
    let ctx = bench.context();

    let mut evals = 0;
    while !bench.is_done() {
        bench.eval();
        evals += 1;
        if evals == 5 {
            ctx.request_finish();
        }
    }
    assert_eq!(evals, 5);
    assert_eq!(bench.time_ps(), 50_000);
}
