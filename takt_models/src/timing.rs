//! SDRAM timing parameters and derived cycle counts.
//!
//! Datasheet timings are given in nanoseconds; the model and the host
//! controller both convert them to whole clock cycles for one concrete
//! frequency. Waits round up (a constraint is satisfied no earlier than
//! the datasheet says), refresh intervals round down (a deadline is never
//! relaxed by rounding).

/// Nanosecond timing parameters, datasheet style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdramTiming {
    /// Startup delay after power-up before the first command [ns].
    pub t_desl_ns: f64,
    /// Mode-register-set cycle time [ns].
    pub t_mrd_ns: f64,
    /// Row cycle time (refresh wait) [ns].
    pub t_rc_ns: f64,
    /// RAS-to-CAS delay (bank activate wait) [ns].
    pub t_rcd_ns: f64,
    /// Precharge wait [ns].
    pub t_rp_ns: f64,
    /// Write recovery time [ns].
    pub t_wr_ns: f64,
    /// Average refresh interval [ns].
    pub t_refi_ns: f64,
    /// Maximum refresh interval [ns].
    pub t_max_refi_ns: f64,
}

impl Default for SdramTiming {
    fn default() -> Self {
        Self {
            t_desl_ns: 200_000.0,
            t_mrd_ns: 14.0,
            t_rc_ns: 63.0,
            t_rcd_ns: 21.0,
            t_rp_ns: 21.0,
            t_wr_ns: 14.0,
            t_refi_ns: 15_600.0,
            t_max_refi_ns: 15_625.0,
        }
    }
}

/// Whole-cycle counts derived from an [`SdramTiming`] at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCycles {
    /// Cycles to sit out after power-up.
    pub startup: u64,
    /// Cycles per mode-register-set.
    pub load_mode: u64,
    /// Cycles from bank activate to the first read/write.
    pub active: u64,
    /// Cycles per auto-refresh.
    pub refresh: u64,
    /// Cycles per precharge.
    pub precharge: u64,
    /// Write recovery + precharge, the post-burst part of a write wait.
    pub write_recovery: u64,
    /// Target cycles between refreshes.
    pub refresh_interval: u64,
    /// Deadline in cycles between refreshes.
    pub max_refresh_interval: u64,
}

/// `t / period` rounded up, computed as `t * f` to keep exact datasheet
/// multiples exact in floating point.
fn cycles_ceil(t_ns: f64, freq_mhz: f64) -> u64 {
    (t_ns * freq_mhz / 1_000.0).ceil() as u64
}

fn cycles_floor(t_ns: f64, freq_mhz: f64) -> u64 {
    (t_ns * freq_mhz / 1_000.0).floor() as u64
}

impl SdramTiming {
    /// Derive the cycle counts for a clock at `freq_mhz`.
    pub fn cycles(&self, freq_mhz: f64) -> WaitCycles {
        WaitCycles {
            startup: cycles_ceil(self.t_desl_ns, freq_mhz),
            load_mode: cycles_ceil(self.t_mrd_ns, freq_mhz),
            active: cycles_ceil(self.t_rcd_ns, freq_mhz),
            refresh: cycles_ceil(self.t_rc_ns, freq_mhz),
            precharge: cycles_ceil(self.t_rp_ns, freq_mhz),
            write_recovery: cycles_ceil(self.t_wr_ns + self.t_rp_ns, freq_mhz),
            refresh_interval: cycles_floor(self.t_refi_ns, freq_mhz),
            max_refresh_interval: cycles_floor(self.t_max_refi_ns, freq_mhz),
        }
    }
}
