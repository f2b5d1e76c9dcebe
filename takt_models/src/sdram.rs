//! SDRAM behavioral model.
//!
//! A single-active-bank SDRAM with a command-decoded state machine, cycle
//! counted timing constraints, and a byte-addressed backing store. No
//! interleaving: one bank is active at a time, which is enough to pin
//! down a simple controller's behavior.
//!
//! Bursts run with auto-precharge only and cannot be interrupted before
//! their end; burst terminate and full-page bursts are unavailable.
//!
//! The model asserts the wire protocol rather than tolerating deviations:
//! a command that is illegal in the current state, a missed refresh
//! deadline, or a disabled clock at a rising edge all abort the run.

use tracing::{debug, info};

use takt_common::signal::Pin;
use takt_core::model::Model;

use crate::command::{Command, decode_burst_length};
use crate::consts::{
    AUTO_PRECHARGE_BIT, BLOCK_BYTES, COL_BITS, COL_MASK, DEFAULT_BURST_LENGTH,
    DEFAULT_CAS_LATENCY, N_BLOCKS, ROW_BITS, SIZE_BYTES,
};
use crate::timing::{SdramTiming, WaitCycles};

bitflags::bitflags! {
    /// Initialization progress. The work states are reachable only once
    /// REFRESHED and MODE_SET are both present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct InitProgress: u8 {
        /// Refreshed at least twice during bring-up.
        const REFRESHED = 0b001;
        /// Mode register programmed.
        const MODE_SET  = 0b010;
        /// Bring-up complete; the refresh deadline is armed.
        const DONE      = 0b100;
    }
}

/// States of the command-decode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdramState {
    /// Sitting out the post-power-up delay.
    InitStartupDelay,
    /// Precharge-all during bring-up.
    InitPrecharge,
    /// First bring-up auto-refresh.
    InitRefresh1,
    /// Second bring-up auto-refresh.
    InitRefresh2,
    /// Mode-register-set during bring-up.
    InitMrs,
    /// All banks idle, ready for activate or refresh.
    Idle,
    /// A row is open, waiting for read or write.
    Active,
    /// Read burst in flight.
    Read,
    /// Write burst in flight.
    Write,
    /// Auto-refresh in flight.
    Refresh,
}

/// The SDRAM model.
///
/// IO pins are public indirections; wire every one of them (except `dqm`,
/// which this model ignores) before the first evaluation, or the model
/// aborts when it first runs.
pub struct Sdram {
    // Wire protocol pins. Inputs alias nets owned by the controller side;
    // `data_out` is wired to whatever net the controller reads from.
    /// Clock; sampled for rising edges.
    pub clk: Pin<u8>,
    /// Clock enable; must be high whenever the clock rises.
    pub cke: Pin<u8>,
    /// Chip select, active low.
    pub cs_n: Pin<u8>,
    /// Row address strobe, active low.
    pub ras_n: Pin<u8>,
    /// Column address strobe, active low.
    pub cas_n: Pin<u8>,
    /// Write enable, active low.
    pub we_n: Pin<u8>,
    /// Bank address.
    pub ba: Pin<u8>,
    /// Multiplexed address bus.
    pub addr: Pin<u16>,
    /// Write data.
    pub data_in: Pin<u32>,
    /// Byte mask. Accepted and ignored.
    pub dqm: Pin<u8>,
    /// Read data, driven during the burst window.
    pub data_out: Pin<u32>,

    waits: WaitCycles,

    // Mode register.
    cas_latency: u8,
    burst_length: u8,
    read_wait: u64,
    write_wait: u64,

    state: SdramState,
    init: InitProgress,
    wait_timer: u64,
    refresh_timer: u64,

    row_addr: u16,
    col_addr: u16,
    bank_active: u8,
    block_addr: u32,

    mem: Vec<u8>,

    last_clk: u8,
    wired_checked: bool,
}

impl Sdram {
    /// Create a model clocked at `freq_mhz` with explicit mode defaults
    /// and timing parameters.
    pub fn new(freq_mhz: f64, cas_latency: u8, burst_length: u8, timing: SdramTiming) -> Self {
        let waits = timing.cycles(freq_mhz);
        let read_wait = cas_latency as u64 + burst_length as u64;
        let write_wait = waits.write_recovery + burst_length as u64;
        Self {
            clk: Pin::new("clk"),
            cke: Pin::new("cke"),
            cs_n: Pin::new("cs_n"),
            ras_n: Pin::new("ras_n"),
            cas_n: Pin::new("cas_n"),
            we_n: Pin::new("we_n"),
            ba: Pin::new("ba"),
            addr: Pin::new("addr"),
            data_in: Pin::new("data_in"),
            dqm: Pin::new("dqm"),
            data_out: Pin::new("data_out"),
            waits,
            cas_latency,
            burst_length,
            read_wait,
            write_wait,
            state: SdramState::InitStartupDelay,
            init: InitProgress::empty(),
            wait_timer: waits.startup,
            refresh_timer: waits.max_refresh_interval,
            row_addr: 0,
            col_addr: 0,
            bank_active: 0,
            block_addr: 0,
            mem: vec![0u8; SIZE_BYTES],
            last_clk: 0,
            wired_checked: false,
        }
    }

    /// Create a model with the default mode register and datasheet timing.
    pub fn with_defaults(freq_mhz: f64) -> Self {
        Self::new(
            freq_mhz,
            DEFAULT_CAS_LATENCY,
            DEFAULT_BURST_LENGTH,
            SdramTiming::default(),
        )
    }

    /// Current state, for scenario assertions.
    pub fn state(&self) -> SdramState {
        self.state
    }

    /// Burst length currently in effect.
    pub fn burst_length(&self) -> u8 {
        self.burst_length
    }

    /// CAS latency currently in effect.
    pub fn cas_latency(&self) -> u8 {
        self.cas_latency
    }

    /// True once bring-up reached the work states.
    pub fn init_done(&self) -> bool {
        self.init.contains(InitProgress::DONE)
    }

    /// Cycles left until the refresh deadline.
    pub fn refresh_timer(&self) -> u64 {
        self.refresh_timer
    }

    /// The derived cycle counts this model runs with.
    pub fn waits(&self) -> &WaitCycles {
        &self.waits
    }

    fn check_wired(&mut self) {
        // dqm is deliberately absent: this model never reads it.
        assert!(self.clk.is_wired(), "sdram: clk pin unwired");
        assert!(self.cke.is_wired(), "sdram: cke pin unwired");
        assert!(self.cs_n.is_wired(), "sdram: cs_n pin unwired");
        assert!(self.ras_n.is_wired(), "sdram: ras_n pin unwired");
        assert!(self.cas_n.is_wired(), "sdram: cas_n pin unwired");
        assert!(self.we_n.is_wired(), "sdram: we_n pin unwired");
        assert!(self.ba.is_wired(), "sdram: ba pin unwired");
        assert!(self.addr.is_wired(), "sdram: addr pin unwired");
        assert!(self.data_in.is_wired(), "sdram: data_in pin unwired");
        assert!(self.data_out.is_wired(), "sdram: data_out pin unwired");
        self.wired_checked = true;
    }

    fn read_block(&self, block: u32) -> u32 {
        let base = block as usize * BLOCK_BYTES;
        u32::from_le_bytes(self.mem[base..base + BLOCK_BYTES].try_into().expect("block"))
    }

    fn write_block(&mut self, block: u32, value: u32) {
        let base = block as usize * BLOCK_BYTES;
        self.mem[base..base + BLOCK_BYTES].copy_from_slice(&value.to_le_bytes());
    }

    /// Commands other than NOP are illegal while a wait is pending.
    fn expect_nop(&self, cmd: Command) {
        if cmd != Command::Nop {
            panic!(
                "sdram::cycle: unexpected {cmd:?} in {:?} with {} wait cycles pending",
                self.state, self.wait_timer
            );
        }
    }

    /// Program CAS latency and burst length from the address bus.
    ///
    /// Mode register layout: A9 write burst mode, A8-7 test mode, A6-4 CAS
    /// latency, A3 burst type, A2-0 burst length.
    fn mode_register_set(&mut self) {
        let mode = self.addr.get();
        self.cas_latency = ((mode >> 4) & 0x7) as u8;
        let field = (mode & 0x7) as u8;
        self.burst_length = decode_burst_length(field).unwrap_or_else(|| {
            panic!("sdram::mode_register_set: unsupported burst field {field:#05b}")
        });
        self.read_wait = self.cas_latency as u64 + self.burst_length as u64;
        self.write_wait = self.waits.write_recovery + self.burst_length as u64;
        info!(
            mode,
            cas_latency = self.cas_latency,
            burst_length = self.burst_length,
            "sdram mode register set"
        );
    }

    fn enter_idle(&mut self) {
        self.state = SdramState::Idle;
        // The refresh deadline is armed from the moment bring-up ends.
        self.refresh_timer = self.waits.max_refresh_interval;
        self.init.insert(InitProgress::DONE);
        info!("sdram startup complete");
    }

    fn latch_activate(&mut self) {
        self.row_addr = self.addr.get();
        self.bank_active = self.ba.get();
        self.state = SdramState::Active;
        self.wait_timer = self.waits.active;
    }

    /// Latch the column, validate the full block address, and return it.
    fn latch_rw_address(&mut self) -> u32 {
        self.col_addr = self.addr.get() & COL_MASK;
        let bank = self.ba.get();
        assert!(
            bank == self.bank_active,
            "sdram::cycle: read/write bank {bank} does not match activated bank {}",
            self.bank_active
        );
        let block = (u32::from(bank) << (ROW_BITS + COL_BITS))
            | (u32::from(self.row_addr) << COL_BITS)
            | u32::from(self.col_addr);
        assert!(
            block + u32::from(self.burst_length) < N_BLOCKS,
            "sdram::cycle: block address {block} + burst {} out of range",
            self.burst_length
        );
        assert!(
            self.addr.get() & AUTO_PRECHARGE_BIT != 0,
            "sdram::cycle: read/write without auto-precharge (address bit 10 low)"
        );
        self.block_addr = block;
        block
    }

    /// One clock cycle. Runs on every rising edge of `clk`.
    fn cycle(&mut self) {
        assert!(
            self.cke.get() == 1,
            "sdram::cycle: CKE low at a rising clock edge"
        );
        if self.wait_timer > 0 {
            self.wait_timer -= 1;
        }
        // Once bring-up is done, going without refresh past the deadline
        // is data loss; abort instead of pretending.
        if self.init.contains(InitProgress::DONE) {
            assert!(
                self.refresh_timer > 0 || self.state == SdramState::Refresh,
                "sdram::cycle: refresh deadline missed in {:?} ({} cycle budget)",
                self.state,
                self.waits.max_refresh_interval
            );
            self.refresh_timer = self.refresh_timer.saturating_sub(1);
        }

        if self.cs_n.get() != 0 {
            return;
        }
        let cmd = Command::decode(self.ras_n.get(), self.cas_n.get(), self.we_n.get());

        match self.state {
            SdramState::InitStartupDelay => {
                if self.wait_timer == 0 {
                    match cmd {
                        Command::Precharge => {
                            assert!(
                                self.addr.get() & AUTO_PRECHARGE_BIT != 0,
                                "sdram::cycle: bring-up precharge must target all banks"
                            );
                            self.state = SdramState::InitPrecharge;
                            self.wait_timer = self.waits.precharge;
                        }
                        Command::Nop => {}
                        other => panic!(
                            "sdram::cycle: unexpected {other:?} at the end of the startup delay"
                        ),
                    }
                }
            }
            SdramState::InitPrecharge => {
                if self.wait_timer == 0 {
                    match cmd {
                        Command::AutoRefresh => {
                            self.state = SdramState::InitRefresh1;
                            self.wait_timer = self.waits.refresh;
                        }
                        Command::ModeRegisterSet => {
                            self.mode_register_set();
                            self.state = SdramState::InitMrs;
                            self.wait_timer = self.waits.load_mode;
                        }
                        Command::Nop => {}
                        other => {
                            panic!("sdram::cycle: unexpected {other:?} after bring-up precharge")
                        }
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::InitRefresh1 => {
                if self.wait_timer == 0 && cmd == Command::AutoRefresh {
                    self.state = SdramState::InitRefresh2;
                    self.wait_timer = self.waits.refresh;
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::InitRefresh2 => {
                if self.wait_timer == 0 {
                    self.init.insert(InitProgress::REFRESHED);
                    if self.init.contains(InitProgress::MODE_SET) {
                        self.enter_idle();
                    } else {
                        match cmd {
                            Command::ModeRegisterSet => {
                                self.mode_register_set();
                                self.state = SdramState::InitMrs;
                                self.wait_timer = self.waits.load_mode;
                            }
                            Command::Nop => {}
                            other => panic!(
                                "sdram::cycle: unexpected {other:?} after bring-up refresh"
                            ),
                        }
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::InitMrs => {
                if self.wait_timer == 0 {
                    self.init.insert(InitProgress::MODE_SET);
                    if self.init.contains(InitProgress::REFRESHED) {
                        self.enter_idle();
                    } else {
                        match cmd {
                            Command::AutoRefresh => {
                                self.state = SdramState::InitRefresh1;
                                self.wait_timer = self.waits.refresh;
                            }
                            Command::Nop => {}
                            other => panic!(
                                "sdram::cycle: unexpected {other:?} after bring-up mode set"
                            ),
                        }
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::Idle => match cmd {
                Command::AutoRefresh => {
                    self.state = SdramState::Refresh;
                    self.wait_timer = self.waits.refresh;
                    debug!("sdram: idle -> refresh");
                }
                Command::BankActive => {
                    self.latch_activate();
                    debug!(
                        row = self.row_addr,
                        bank = self.bank_active,
                        "sdram: idle -> active"
                    );
                }
                Command::Nop => {}
                other => panic!("sdram::cycle: unexpected {other:?} in Idle"),
            },
            SdramState::Active => {
                if self.wait_timer == 0 {
                    match cmd {
                        Command::Read => {
                            let block = self.latch_rw_address();
                            self.state = SdramState::Read;
                            self.wait_timer = self.read_wait;
                            debug!(block, "sdram: active -> read");
                        }
                        Command::Write => {
                            let block = self.latch_rw_address();
                            self.state = SdramState::Write;
                            self.wait_timer = self.write_wait;
                            // The first block goes in with the command.
                            let value = self.data_in.get();
                            self.write_block(block, value);
                            debug!(block, value, "sdram: active -> write");
                        }
                        Command::Nop => {}
                        other => panic!("sdram::cycle: unexpected {other:?} in Active"),
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::Read => {
                // Drive one block per cycle once the CAS latency is paid.
                if self.wait_timer <= u64::from(self.burst_length) && self.wait_timer > 0 {
                    let offset = u64::from(self.burst_length) - self.wait_timer;
                    let block = self.block_addr + offset as u32;
                    let value = self.read_block(block);
                    self.data_out.set(value);
                    debug!(block, value, "sdram: read burst");
                }
                if self.wait_timer == 0 {
                    match cmd {
                        Command::BankActive => {
                            self.latch_activate();
                            debug!("sdram: read -> active");
                        }
                        Command::AutoRefresh => {
                            self.state = SdramState::Refresh;
                            self.wait_timer = self.waits.refresh;
                            debug!("sdram: read -> refresh");
                        }
                        Command::Nop => {
                            self.state = SdramState::Idle;
                            debug!("sdram: read -> idle");
                        }
                        other => panic!("sdram::cycle: unexpected {other:?} ending a read burst"),
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::Write => {
                // Blocks after the first come in on consecutive cycles.
                if self.wait_timer > self.write_wait - u64::from(self.burst_length) {
                    let offset = self.write_wait - self.wait_timer;
                    let block = self.block_addr + offset as u32;
                    let value = self.data_in.get();
                    self.write_block(block, value);
                    debug!(block, value, "sdram: write burst");
                }
                if self.wait_timer == 0 {
                    match cmd {
                        Command::BankActive => {
                            self.latch_activate();
                            debug!("sdram: write -> active");
                        }
                        Command::AutoRefresh => {
                            self.state = SdramState::Refresh;
                            self.wait_timer = self.waits.refresh;
                            debug!("sdram: write -> refresh");
                        }
                        Command::Nop => {
                            self.state = SdramState::Idle;
                            debug!("sdram: write -> idle");
                        }
                        other => panic!("sdram::cycle: unexpected {other:?} ending a write burst"),
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
            SdramState::Refresh => {
                if self.wait_timer == 0 {
                    self.refresh_timer = self.waits.max_refresh_interval;
                    match cmd {
                        Command::BankActive => {
                            self.latch_activate();
                            debug!("sdram: refresh -> active");
                        }
                        Command::Nop => {
                            self.state = SdramState::Idle;
                            debug!("sdram: refresh -> idle");
                        }
                        other => panic!("sdram::cycle: unexpected {other:?} ending a refresh"),
                    }
                } else {
                    self.expect_nop(cmd);
                }
            }
        }
    }
}

impl Model for Sdram {
    /// Rising-edge detector around [`Sdram::cycle`]. Safe to call several
    /// times per instant: repeated calls at the same clock level do
    /// nothing.
    fn eval(&mut self) {
        if !self.wired_checked {
            self.check_wired();
        }
        if self.last_clk == 0 && self.clk.get() == 1 {
            self.cycle();
        }
        self.last_clk = self.clk.get();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use takt_common::signal::Net;

    /// Harness-side nets for driving a model directly in unit tests.
    struct Wires {
        clk: Net<u8>,
        cke: Net<u8>,
        cs_n: Net<u8>,
        ras_n: Net<u8>,
        cas_n: Net<u8>,
        we_n: Net<u8>,
        ba: Net<u8>,
        addr: Net<u16>,
        data_in: Net<u32>,
        data_out: Net<u32>,
    }

    impl Wires {
        fn hook_up(sdram: &mut Sdram) -> Self {
            let wires = Self {
                clk: Net::new(0),
                cke: Net::new(1),
                cs_n: Net::new(0),
                ras_n: Net::new(1),
                cas_n: Net::new(1),
                we_n: Net::new(1),
                ba: Net::new(0),
                addr: Net::new(0),
                data_in: Net::new(0),
                data_out: Net::new(0),
            };
            sdram.clk.wire(&wires.clk);
            sdram.cke.wire(&wires.cke);
            sdram.cs_n.wire(&wires.cs_n);
            sdram.ras_n.wire(&wires.ras_n);
            sdram.cas_n.wire(&wires.cas_n);
            sdram.we_n.wire(&wires.we_n);
            sdram.ba.wire(&wires.ba);
            sdram.addr.wire(&wires.addr);
            sdram.data_in.wire(&wires.data_in);
            sdram.data_out.wire(&wires.data_out);
            wires
        }

        fn drive(&self, cmd: Command) {
            let (ras_n, cas_n, we_n) = cmd.encode();
            self.ras_n.set(ras_n);
            self.cas_n.set(cas_n);
            self.we_n.set(we_n);
        }

        /// One full clock cycle with `cmd` on the bus.
        fn tick(&self, sdram: &mut Sdram, cmd: Command) {
            self.drive(cmd);
            self.clk.set(1);
            sdram.eval();
            self.clk.set(0);
            sdram.eval();
        }

        fn nops(&self, sdram: &mut Sdram, cycles: u64) {
            for _ in 0..cycles {
                self.tick(sdram, Command::Nop);
            }
        }

        /// Run the standard bring-up to Idle.
        fn bring_up(&self, sdram: &mut Sdram, cas_latency: u8, burst: u8) {
            let waits = *sdram.waits();
            self.nops(sdram, waits.startup);
            self.addr.set(AUTO_PRECHARGE_BIT);
            self.tick(sdram, Command::Precharge);
            self.nops(sdram, waits.precharge);
            self.tick(sdram, Command::AutoRefresh);
            self.nops(sdram, waits.refresh);
            self.tick(sdram, Command::AutoRefresh);
            self.nops(sdram, waits.refresh);
            let mode = (u16::from(cas_latency) << 4)
                | u16::from(crate::command::encode_burst_length(burst).expect("burst"));
            self.addr.set(mode);
            self.tick(sdram, Command::ModeRegisterSet);
            // InitMrs completes into Idle on the last wait cycle.
            self.nops(sdram, waits.load_mode);
        }
    }

    #[test]
    fn bring_up_reaches_idle_and_arms_refresh() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        assert_eq!(sdram.state(), SdramState::InitStartupDelay);

        wires.bring_up(&mut sdram, 3, 1);

        assert_eq!(sdram.state(), SdramState::Idle);
        assert!(sdram.init_done());
        assert_eq!(sdram.cas_latency(), 3);
        assert_eq!(sdram.burst_length(), 1);
        // The deadline is armed and already counting.
        assert!(sdram.refresh_timer() > 0);
        assert!(sdram.refresh_timer() <= sdram.waits().max_refresh_interval);
    }

    #[test]
    fn mode_register_reprograms_cas_and_burst() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 2, 4);
        assert_eq!(sdram.cas_latency(), 2);
        assert_eq!(sdram.burst_length(), 4);
    }

    #[test]
    #[should_panic(expected = "unexpected")]
    fn read_in_idle_is_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 1);
        wires.addr.set(AUTO_PRECHARGE_BIT);
        wires.tick(&mut sdram, Command::Read);
    }

    #[test]
    #[should_panic(expected = "CKE low")]
    fn clock_enable_low_is_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.cke.set(0);
        wires.tick(&mut sdram, Command::Nop);
    }

    #[test]
    #[should_panic(expected = "unwired")]
    fn unwired_pins_are_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        sdram.eval();
    }

    #[test]
    #[should_panic(expected = "bank")]
    fn bank_mismatch_is_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 1);

        wires.ba.set(1);
        wires.addr.set(5);
        wires.tick(&mut sdram, Command::BankActive);
        let active_wait = sdram.waits().active;
        wires.nops(&mut sdram, active_wait);
        // Read addressed to a different bank than the activated one.
        wires.ba.set(2);
        wires.addr.set(AUTO_PRECHARGE_BIT);
        wires.tick(&mut sdram, Command::Read);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn burst_past_the_last_block_is_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 8);

        // Last row and bank, last column: block + burst runs off the end.
        wires.ba.set(3);
        wires.addr.set((1 << ROW_BITS) - 1);
        wires.tick(&mut sdram, Command::BankActive);
        let active_wait = sdram.waits().active;
        wires.nops(&mut sdram, active_wait);
        wires.ba.set(3);
        wires.addr.set(AUTO_PRECHARGE_BIT | COL_MASK);
        wires.tick(&mut sdram, Command::Write);
    }

    #[test]
    fn write_then_read_round_trips_one_block() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 1);
        let waits = *sdram.waits();

        // Activate row 2 of bank 1, write one block at column 9.
        wires.ba.set(1);
        wires.addr.set(2);
        wires.tick(&mut sdram, Command::BankActive);
        wires.nops(&mut sdram, waits.active);
        wires.addr.set(AUTO_PRECHARGE_BIT | 9);
        wires.data_in.set(0x4F47_4F4C);
        wires.tick(&mut sdram, Command::Write);
        // Sit out the write wait, then let it settle back to idle.
        while sdram.state() == SdramState::Write {
            wires.tick(&mut sdram, Command::Nop);
        }
        assert_eq!(sdram.state(), SdramState::Idle);

        // Read it back: data lands CAS latency cycles after the command.
        wires.ba.set(1);
        wires.addr.set(2);
        wires.tick(&mut sdram, Command::BankActive);
        wires.nops(&mut sdram, waits.active);
        wires.addr.set(AUTO_PRECHARGE_BIT | 9);
        wires.tick(&mut sdram, Command::Read);
        wires.nops(&mut sdram, 2);
        // Nothing driven yet during the CAS wait.
        assert_eq!(wires.data_out.get(), 0);
        wires.tick(&mut sdram, Command::Nop);
        assert_eq!(wires.data_out.get(), 0x4F47_4F4C);
    }

    #[test]
    #[should_panic(expected = "refresh deadline")]
    fn missed_refresh_deadline_is_fatal() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 1);
        // Idle forever without a single auto-refresh.
        let refresh_wait = sdram.waits().max_refresh_interval + 1;
        wires.nops(&mut sdram, refresh_wait);
    }

    #[test]
    fn refresh_rearms_the_deadline() {
        let mut sdram = Sdram::with_defaults(143.0);
        let wires = Wires::hook_up(&mut sdram);
        wires.bring_up(&mut sdram, 3, 1);
        let waits = *sdram.waits();

        wires.nops(&mut sdram, waits.refresh_interval);
        wires.tick(&mut sdram, Command::AutoRefresh);
        assert_eq!(sdram.state(), SdramState::Refresh);
        wires.nops(&mut sdram, waits.refresh);
        wires.tick(&mut sdram, Command::Nop);
        assert_eq!(sdram.state(), SdramState::Idle);
        assert!(sdram.refresh_timer() > waits.refresh_interval);
    }
}
