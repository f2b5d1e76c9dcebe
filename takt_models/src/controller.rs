//! Behavioral SDRAM host controller.
//!
//! A bus master implementing [`takt_core::Module`], standing in for a
//! compiled memory controller: it owns the command-bus nets the SDRAM
//! model's pins are wired to, runs the standard bring-up sequence
//! (startup delay, precharge-all, two auto-refreshes, mode-register-set),
//! and then services a queue of block transfers as auto-precharge bursts,
//! refreshing on schedule in between.
//!
//! Clocked logic lives in the step phase behind a rising-edge detector;
//! the end-step phase commits the detector, so repeated evaluation within
//! one instant is a no-op. Read data driven by the SDRAM within a tick is
//! sampled on the following rising edge, the way a registered bus input
//! would behave.
//!
//! Drivers observe the controller through hardware-style surfaces: the
//! [`HostController::idle`] net goes high once the queue has drained, and
//! captured read data accumulates in a shared sink obtained from
//! [`HostController::read_sink`] before the controller moves into the
//! bench.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, info};

use takt_common::signal::Net;
use takt_core::module::Module;
use takt_core::trace::VcdTracer;

use crate::command::{Command, encode_burst_length};
use crate::consts::{ADDR_BITS, AUTO_PRECHARGE_BIT, BANK_BITS, COL_BITS, COL_MASK, ROW_BITS};
use crate::sdram::Sdram;
use crate::timing::{SdramTiming, WaitCycles};

/// Issue a refresh once this many cycles remain of the refresh interval,
/// so a transfer already in flight can always drain first. Generously
/// above the longest activate-plus-burst any supported mode produces.
const REFRESH_LEAD: u64 = 64;

/// One queued block transfer.
#[derive(Debug)]
enum Transfer {
    /// Write `data` starting at block `base`.
    Write {
        base: u32,
        data: Vec<u32>,
        next: usize,
    },
    /// Read `blocks` blocks starting at block `base`.
    Read {
        base: u32,
        blocks: usize,
        next: usize,
    },
}

impl Transfer {
    fn chunk_block(&self) -> u32 {
        match self {
            Self::Write { base, next, .. } | Self::Read { base, next, .. } => *base + *next as u32,
        }
    }

    fn remaining(&self) -> usize {
        match self {
            Self::Write { data, next, .. } => data.len() - next,
            Self::Read { blocks, next, .. } => blocks - next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostState {
    PowerUp,
    PrechargeAll,
    /// `remaining` further bring-up refreshes after the current one.
    InitRefresh {
        remaining: u8,
    },
    LoadMode,
    Idle,
    Activate,
    ReadBurst,
    WriteBurst,
    Refresh,
}

/// The host controller. Construct, queue transfers, grab the read sink
/// and the `idle` net, wire, then move it into the bench.
pub struct HostController {
    /// Clock input; register this net with a clock domain.
    pub clk: Net<u8>,
    /// Clock enable, held high.
    pub cke: Net<u8>,
    /// Chip select, held low (always selected).
    pub cs_n: Net<u8>,
    /// Row address strobe.
    pub ras_n: Net<u8>,
    /// Column address strobe.
    pub cas_n: Net<u8>,
    /// Write enable.
    pub we_n: Net<u8>,
    /// Bank address.
    pub ba: Net<u8>,
    /// Multiplexed address bus.
    pub addr: Net<u16>,
    /// Write data out to the SDRAM.
    pub wdata: Net<u32>,
    /// Read data in from the SDRAM.
    pub rdata: Net<u32>,
    /// Byte mask, held inactive.
    pub dqm: Net<u8>,
    /// High once bring-up is done and the transfer queue has drained.
    pub idle: Net<u8>,

    name: String,
    cas_latency: u8,
    burst_length: u8,
    waits: WaitCycles,
    read_wait: u64,
    write_wait: u64,

    state: HostState,
    wait: u64,
    running: bool,
    refresh_due: u64,

    requests: VecDeque<Transfer>,
    current: Option<Transfer>,
    read_buf: Rc<RefCell<Vec<u32>>>,

    last_clk: u8,
}

impl HostController {
    /// Create a controller for the given clock frequency and mode.
    ///
    /// # Panics
    ///
    /// Panics when `burst_length` has no mode-register encoding.
    pub fn new(
        name: &str,
        freq_mhz: f64,
        cas_latency: u8,
        burst_length: u8,
        timing: SdramTiming,
    ) -> Self {
        encode_burst_length(burst_length)
            .unwrap_or_else(|| panic!("host: burst length {burst_length} is not programmable"));
        let waits = timing.cycles(freq_mhz);
        Self {
            clk: Net::new(0),
            cke: Net::new(1),
            cs_n: Net::new(0),
            ras_n: Net::new(1),
            cas_n: Net::new(1),
            we_n: Net::new(1),
            ba: Net::new(0),
            addr: Net::new(0),
            wdata: Net::new(0),
            rdata: Net::new(0),
            dqm: Net::new(0),
            idle: Net::new(0),
            name: name.to_string(),
            cas_latency,
            burst_length,
            waits,
            read_wait: cas_latency as u64 + burst_length as u64,
            write_wait: waits.write_recovery + burst_length as u64,
            state: HostState::PowerUp,
            wait: waits.startup,
            running: false,
            refresh_due: 0,
            requests: VecDeque::new(),
            current: None,
            read_buf: Rc::new(RefCell::new(Vec::new())),
            last_clk: 0,
        }
    }

    /// Wire every SDRAM pin except the clock to this controller's nets.
    /// The clocks stay with the clock domain: register [`Self::clk`] via
    /// `attach_uut_clock` and the model's pin via `attach_model_clock`.
    pub fn hook_up(&self, sdram: &mut Sdram) {
        sdram.cke.wire(&self.cke);
        sdram.cs_n.wire(&self.cs_n);
        sdram.ras_n.wire(&self.ras_n);
        sdram.cas_n.wire(&self.cas_n);
        sdram.we_n.wire(&self.we_n);
        sdram.ba.wire(&self.ba);
        sdram.addr.wire(&self.addr);
        sdram.data_in.wire(&self.wdata);
        sdram.dqm.wire(&self.dqm);
        sdram.data_out.wire(&self.rdata);
    }

    /// Queue a block write. `data.len()` must be a multiple of the burst
    /// length, since every bus transaction moves exactly one burst.
    pub fn enqueue_write(&mut self, base_block: u32, data: Vec<u32>) {
        assert!(
            !data.is_empty() && data.len() % self.burst_length as usize == 0,
            "host: write of {} blocks is not a multiple of burst length {}",
            data.len(),
            self.burst_length
        );
        self.requests.push_back(Transfer::Write {
            base: base_block,
            data,
            next: 0,
        });
    }

    /// Queue a block read; data accumulates in the read sink.
    pub fn enqueue_read(&mut self, base_block: u32, blocks: usize) {
        assert!(
            blocks != 0 && blocks % self.burst_length as usize == 0,
            "host: read of {blocks} blocks is not a multiple of burst length {}",
            self.burst_length
        );
        self.requests.push_back(Transfer::Read {
            base: base_block,
            blocks,
            next: 0,
        });
    }

    /// Shared handle to the captured read data, in request order.
    pub fn read_sink(&self) -> Rc<RefCell<Vec<u32>>> {
        Rc::clone(&self.read_buf)
    }

    fn is_idle(&self) -> bool {
        self.running
            && self.state == HostState::Idle
            && self.current.is_none()
            && self.requests.is_empty()
    }

    fn drive(&self, cmd: Command) {
        let (ras_n, cas_n, we_n) = cmd.encode();
        self.ras_n.set(ras_n);
        self.cas_n.set(cas_n);
        self.we_n.set(we_n);
    }

    fn issue_refresh(&mut self) {
        self.drive(Command::AutoRefresh);
        self.state = HostState::Refresh;
        self.wait = self.waits.refresh;
        debug!("host: auto refresh");
    }

    /// Activate the row of the next chunk. Returns false with the bus at
    /// NOP when there is nothing to do.
    fn begin_next_chunk(&mut self) -> bool {
        if self.current.is_none() {
            self.current = self.requests.pop_front();
        }
        let Some(transfer) = &self.current else {
            return false;
        };
        let block = transfer.chunk_block();
        let bank = (block >> (ROW_BITS + COL_BITS)) as u8;
        let row = ((block >> COL_BITS) & ((1 << ROW_BITS) - 1)) as u16;
        self.ba.set(bank);
        self.addr.set(row);
        self.drive(Command::BankActive);
        self.state = HostState::Activate;
        self.wait = self.waits.active;
        true
    }

    /// Issue the read or write command for the activated chunk.
    fn issue_transfer(&mut self) {
        let transfer = self.current.as_ref().expect("activated without a transfer");
        let block = transfer.chunk_block();
        let col = (block & u32::from(COL_MASK)) as u16;
        self.addr.set(AUTO_PRECHARGE_BIT | col);
        match transfer {
            Transfer::Write { data, next, .. } => {
                self.wdata.set(data[*next]);
                self.drive(Command::Write);
                self.state = HostState::WriteBurst;
                self.wait = self.write_wait;
            }
            Transfer::Read { .. } => {
                self.drive(Command::Read);
                self.state = HostState::ReadBurst;
                self.wait = self.read_wait;
            }
        }
    }

    /// Account a finished burst and choose the next command this cycle.
    fn finish_chunk(&mut self) {
        let transfer = self.current.as_mut().expect("burst without a transfer");
        let burst = self.burst_length as usize;
        match transfer {
            Transfer::Write { next, .. } | Transfer::Read { next, .. } => *next += burst,
        }
        if transfer.remaining() == 0 {
            self.current = None;
        }
        if self.refresh_due <= REFRESH_LEAD {
            self.issue_refresh();
        } else if !self.begin_next_chunk() {
            self.state = HostState::Idle;
        }
    }

    fn load_mode_register(&mut self) {
        let field = encode_burst_length(self.burst_length).expect("validated in new");
        let mode = (u16::from(self.cas_latency) << 4) | u16::from(field);
        self.addr.set(mode);
        self.drive(Command::ModeRegisterSet);
        self.state = HostState::LoadMode;
        self.wait = self.waits.load_mode;
    }

    /// Per-cycle logic, run once per rising clock edge.
    fn on_posedge(&mut self) {
        self.drive(Command::Nop);
        if self.running {
            self.refresh_due = self.refresh_due.saturating_sub(1);
        }

        match self.state {
            HostState::PowerUp => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.addr.set(AUTO_PRECHARGE_BIT);
                    self.drive(Command::Precharge);
                    self.state = HostState::PrechargeAll;
                    self.wait = self.waits.precharge;
                    debug!("host: precharge all");
                }
            }
            HostState::PrechargeAll => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.drive(Command::AutoRefresh);
                    self.state = HostState::InitRefresh { remaining: 1 };
                    self.wait = self.waits.refresh;
                }
            }
            HostState::InitRefresh { remaining } => {
                self.wait -= 1;
                if self.wait == 0 {
                    if remaining > 0 {
                        self.drive(Command::AutoRefresh);
                        self.state = HostState::InitRefresh {
                            remaining: remaining - 1,
                        };
                        self.wait = self.waits.refresh;
                    } else {
                        self.load_mode_register();
                    }
                }
            }
            HostState::LoadMode => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.state = HostState::Idle;
                    self.running = true;
                    self.refresh_due = self.waits.refresh_interval;
                    info!("host: bring-up complete");
                }
            }
            HostState::Idle => {
                if self.refresh_due <= REFRESH_LEAD {
                    self.issue_refresh();
                } else {
                    self.begin_next_chunk();
                }
            }
            HostState::Activate => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.issue_transfer();
                }
            }
            HostState::ReadBurst => {
                self.wait -= 1;
                // The SDRAM drove this block last cycle; the net holds it.
                if self.wait < u64::from(self.burst_length) {
                    self.read_buf.borrow_mut().push(self.rdata.get());
                }
                if self.wait == 0 {
                    self.finish_chunk();
                }
            }
            HostState::WriteBurst => {
                self.wait -= 1;
                let offset = (self.write_wait - self.wait) as usize;
                if offset < self.burst_length as usize {
                    let Some(Transfer::Write { data, next, .. }) = &self.current else {
                        panic!("host: write burst without a write transfer");
                    };
                    self.wdata.set(data[*next + offset]);
                }
                if self.wait == 0 {
                    self.finish_chunk();
                }
            }
            HostState::Refresh => {
                self.wait -= 1;
                if self.wait == 0 {
                    self.refresh_due = self.waits.refresh_interval;
                    if !self.begin_next_chunk() {
                        self.state = HostState::Idle;
                    }
                }
            }
        }

        self.idle.set(u8::from(self.is_idle()));
    }
}

impl Module for HostController {
    fn name(&self) -> &str {
        &self.name
    }

    fn trace(&mut self, tracer: &mut VcdTracer) {
        tracer.add_bit(&self.name, "clk", &self.clk);
        tracer.add_bit(&self.name, "cke", &self.cke);
        tracer.add_bit(&self.name, "cs_n", &self.cs_n);
        tracer.add_bit(&self.name, "ras_n", &self.ras_n);
        tracer.add_bit(&self.name, "cas_n", &self.cas_n);
        tracer.add_bit(&self.name, "we_n", &self.we_n);
        tracer.add_bit(&self.name, "idle", &self.idle);
        tracer.add_vec(&self.name, "ba", BANK_BITS, &self.ba);
        tracer.add_vec(&self.name, "addr", ADDR_BITS, &self.addr);
        tracer.add_vec(&self.name, "wdata", 32, &self.wdata);
        tracer.add_vec(&self.name, "rdata", 32, &self.rdata);
    }

    fn eval_step(&mut self) {
        if self.last_clk == 0 && self.clk.get() == 1 {
            self.on_posedge();
        }
    }

    fn eval_end_step(&mut self) {
        self.last_clk = self.clk.get();
    }
}

/// Pack bytes into 32-bit blocks, little endian, zero padded.
pub fn blocks_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect()
}

/// Unpack 32-bit blocks into bytes, little endian.
pub fn bytes_from_blocks(blocks: &[u32]) -> Vec<u8> {
    blocks.iter().flat_map(|b| b.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_packing_round_trips() {
        let text = b"Good evening";
        let blocks = blocks_from_bytes(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!(&bytes_from_blocks(&blocks), text);
    }

    #[test]
    fn block_packing_pads_the_tail() {
        let blocks = blocks_from_bytes(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
        assert_eq!(blocks, vec![0xDDCC_BBAA, 0x0000_00EE]);
    }

    #[test]
    #[should_panic(expected = "not a multiple of burst")]
    fn odd_write_length_is_rejected() {
        let mut host = HostController::new("host", 143.0, 3, 4, SdramTiming::default());
        host.enqueue_write(0, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "not programmable")]
    fn unsupported_burst_length_is_rejected() {
        let _ = HostController::new("host", 143.0, 3, 5, SdramTiming::default());
    }
}
