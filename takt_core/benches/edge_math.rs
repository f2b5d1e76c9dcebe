//! Edge math benchmark — the per-step hot path of the harness.
//!
//! Every eval queries `time_to_next_edge` once per domain, so the edge
//! math dominates idle-bench throughput. Measures the raw queries and a
//! full two-domain eval loop.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use takt_core::bench::TestBench;
use takt_core::clock::ClockDomain;

fn bench_edge_queries(c: &mut Criterion) {
    let domain = ClockDomain::new(143.0, 90.0).expect("domain");
    // Query times covering one full window around the first posedge.
    let horizon = domain.last_posedge_ps() + domain.period_ps();
    let times: Vec<u64> = (0..horizon).step_by(131).collect();

    c.bench_function("time_to_next_edge_sweep", |b| {
        b.iter(|| {
            times
                .iter()
                .map(|&t| domain.time_to_next_edge(black_box(t)))
                .sum::<u64>()
        })
    });

    c.bench_function("clock_domain_new", |b| {
        b.iter(|| ClockDomain::new(black_box(143.0), black_box(90.0)).expect("domain"))
    });
}

fn bench_eval_loop(c: &mut Criterion) {
    c.bench_function("eval_two_domains", |b| {
        let mut bench = TestBench::new(vec![], 0);
        bench.add_domain(ClockDomain::new(50.0, 0.0).expect("domain"));
        bench.add_domain(ClockDomain::new(90.0, 0.0).expect("domain"));
        b.iter(|| bench.eval());
    });
}

criterion_group!(benches, bench_edge_queries, bench_eval_loop);
criterion_main!(benches);
