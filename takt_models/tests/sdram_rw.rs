//! Full-bench SDRAM scenarios: host controller and SDRAM model wired
//! through the harness, clocked from one domain, run to completion.

use std::cell::RefCell;
use std::rc::Rc;

use takt_common::signal::Net;
use takt_core::bench::TestBench;
use takt_core::clock::ClockDomain;
use takt_models::controller::{HostController, blocks_from_bytes, bytes_from_blocks};
use takt_models::sdram::Sdram;
use takt_models::timing::SdramTiming;

/// A rigged bench: one domain, one host controller, one SDRAM.
struct Rig {
    bench: TestBench,
    idle: Net<u8>,
    sink: Rc<RefCell<Vec<u32>>>,
}

fn rig(freq_mhz: f64, cas_latency: u8, burst: u8, queue: impl FnOnce(&mut HostController)) -> Rig {
    let mut bench = TestBench::new(vec![], 0);
    let domain = bench.add_domain(ClockDomain::new(freq_mhz, 0.0).expect("domain"));

    let mut host = HostController::new("host", freq_mhz, cas_latency, burst, SdramTiming::default());
    let mut sdram = Sdram::new(freq_mhz, cas_latency, burst, SdramTiming::default());
    host.hook_up(&mut sdram);
    bench.domain_mut(domain).attach_uut_clock(&host.clk);
    bench.domain_mut(domain).attach_model_clock(&mut sdram.clk);

    let idle = host.idle.clone();
    let sink = host.read_sink();
    queue(&mut host);

    bench.add_module(Box::new(host));
    bench.add_model(Box::new(sdram));
    Rig { bench, idle, sink }
}

impl Rig {
    /// Run until the controller drains its queue. The cycle cap guards
    /// against a hung state machine taking the test suite with it.
    fn run_until_idle(&mut self, max_evals: u64) {
        let mut evals = 0;
        while self.idle.get() == 0 {
            self.bench.eval();
            evals += 1;
            assert!(evals < max_evals, "rig did not go idle in {max_evals} evals");
        }
    }
}

/// Two evals per clock cycle, plus slack for refreshes.
const BRING_UP_EVALS: u64 = 2 * 40_000;

#[test]
fn bring_up_alone_reaches_idle() {
    let mut rig = rig(143.0, 3, 1, |_| {});
    rig.run_until_idle(BRING_UP_EVALS);
    // 28600 startup cycles at 6994 ps each have to have elapsed.
    assert!(rig.bench.time_ps() > 28_600 * 6_994);
}

#[test]
fn round_trip_single_block_bursts() {
    // The literal scenario: 143 MHz, burst 1, CAS 3, 44 bytes at block 0.
    let payload: &[u8] = b"Good evening twitter this is your boy edp445";
    let blocks = blocks_from_bytes(payload);
    assert_eq!(blocks.len(), 11);

    let n = blocks.len();
    let mut rig = rig(143.0, 3, 1, move |host| {
        host.enqueue_write(0, blocks);
        host.enqueue_read(0, n);
    });
    rig.run_until_idle(BRING_UP_EVALS);

    let read_back = bytes_from_blocks(&rig.sink.borrow());
    assert_eq!(&read_back, payload);
}

#[test]
fn round_trip_long_bursts() {
    // Burst 4 at CAS 2 and the 90 MHz controller clock: four chunks of
    // four blocks each, written and read back through multi-block bursts.
    let data: Vec<u32> = (0..16).map(|i| 0x1000_0000 + i * 0x0101).collect();
    let expected = data.clone();

    let mut rig = rig(90.0, 2, 4, move |host| {
        host.enqueue_write(32, data);
        host.enqueue_read(32, 16);
    });
    rig.run_until_idle(BRING_UP_EVALS);

    assert_eq!(*rig.sink.borrow(), expected);
}

#[test]
fn controller_keeps_the_refresh_deadline() {
    // Idle long past several refresh intervals; the model aborts the run
    // if the controller ever misses its deadline, so surviving is the
    // assertion.
    let mut rig = rig(143.0, 3, 1, |_| {});
    rig.run_until_idle(BRING_UP_EVALS);

    // Roughly three refresh intervals of pure idling.
    for _ in 0..(3 * 2_230 * 2) {
        rig.bench.eval();
    }
    // The idle net dips while a refresh is in flight; let it drain.
    rig.run_until_idle(100);
}

#[test]
fn transfers_interleave_with_refreshes() {
    // Back-to-back transfers spanning more than a whole refresh interval
    // (256 single-block bursts at ~11 cycles each), forcing refreshes
    // between bursts while the data stays intact.
    let data: Vec<u32> = (0..256).map(|i| 0xCAFE_0000 | i).collect();
    let expected = data.clone();

    let mut rig = rig(143.0, 3, 1, move |host| {
        for (chunk_idx, chunk) in data.chunks(8).enumerate() {
            host.enqueue_write(chunk_idx as u32 * 8, chunk.to_vec());
        }
        host.enqueue_read(0, 256);
    });
    rig.run_until_idle(BRING_UP_EVALS + 2 * 256 * 32);

    assert_eq!(*rig.sink.borrow(), expected);
}
