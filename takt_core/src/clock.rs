//! Picosecond-accurate clock domains.
//!
//! A domain is one (frequency, phase) pair with its own edge schedule.
//! The half period is rounded *up* to an integer picosecond count, so a
//! frequency that does not divide evenly is simulated slightly slow rather
//! than drifting; the normalized frequency and phase are re-derived from
//! the rounded values and reported back to the caller.
//!
//! Participants register their clock pins with the domain. Design clock
//! pins are owned nets the domain writes on every edge; model clock pins
//! are indirections wired to the domain's level cell, so a model observes
//! exactly the value the design observed during the same cycle.

use takt_common::signal::{Net, Pin};
use thiserror::Error;
use tracing::debug;

/// Setup-time clock configuration errors.
#[derive(Debug, Clone, Error)]
pub enum ClockError {
    /// Requested frequency outside the supported (0, 500] MHz window.
    #[error("frequency out of range (0, 500] MHz: {0}")]
    FrequencyOutOfRange(f64),

    /// Requested phase shift outside [0, 360] degrees.
    #[error("phase shift out of range [0, 360] deg: {0}")]
    PhaseOutOfRange(f64),
}

/// One clock domain: frequency, phase, edge schedule, and the clock pins
/// registered to it.
///
/// All queries take the absolute time owned by the bench. The last positive
/// edge never lags or leads the query time by more than one full cycle;
/// queries outside that window are harness bugs and abort.
#[derive(Debug)]
pub struct ClockDomain {
    half_period_ps: u64,
    period_ps: u64,
    /// Normalized frequency [MHz], re-derived from the rounded period.
    freq_mhz: f64,
    phase_delta_ps: u64,
    /// Normalized phase [deg], re-derived from the integer phase delay.
    phase_deg: f64,
    /// Timestamp of the most recent positive edge. With a phase shift this
    /// starts in the future (the first posedge), never more than one cycle
    /// ahead.
    last_posedge_ps: u64,
    /// Clock nets of registered designs; written on every edge.
    uut_clocks: Vec<Net<u8>>,
    /// Saved clock level. Model clock pins alias this cell.
    level: Net<u8>,
}

impl ClockDomain {
    /// Create a domain from a requested frequency [MHz] and phase shift
    /// [deg].
    ///
    /// # Errors
    ///
    /// Returns a `ClockError` when the frequency is outside (0, 500] MHz or
    /// the phase outside [0, 360] degrees.
    pub fn new(freq_mhz: f64, phase_deg: f64) -> Result<Self, ClockError> {
        if !(freq_mhz > 0.0 && freq_mhz <= 500.0) {
            return Err(ClockError::FrequencyOutOfRange(freq_mhz));
        }
        if !(0.0..=360.0).contains(&phase_deg) {
            return Err(ClockError::PhaseOutOfRange(phase_deg));
        }

        // Lock to 1 time unit = 1 ps. Rounding the half period up slows the
        // clock down to the nearest representable frequency.
        let half_period_ps = (500_000.0 / freq_mhz).ceil() as u64;
        let period_ps = 2 * half_period_ps;
        let norm_freq_mhz = 1_000_000.0 / period_ps as f64;

        // shift deg = 360 * f [MHz] * delta_t [ps] / 1e6, delta rounded down.
        let phase_delta_ps = (phase_deg * 1_000_000.0 / (360.0 * freq_mhz)) as u64;
        let norm_phase_deg = phase_delta_ps as f64 * 360.0 * norm_freq_mhz / 1_000_000.0;

        let (last_posedge_ps, initial_level) = if phase_deg == 0.0 || phase_deg == 360.0 {
            (0, 1)
        } else {
            // First posedge lands at the phase delay; the level at time 0
            // depends on which half of the cycle the shift starts in.
            let level = if norm_phase_deg <= 180.0 { 0 } else { 1 };
            (phase_delta_ps, level)
        };

        debug!(
            freq_request_mhz = freq_mhz,
            phase_request_deg = phase_deg,
            freq_mhz = norm_freq_mhz,
            period_ps,
            phase_deg = norm_phase_deg,
            first_posedge_ps = last_posedge_ps,
            initial_level,
            "clock domain initialized"
        );

        Ok(Self {
            half_period_ps,
            period_ps,
            freq_mhz: norm_freq_mhz,
            phase_delta_ps,
            phase_deg: norm_phase_deg,
            last_posedge_ps,
            uut_clocks: Vec::new(),
            level: Net::new(initial_level),
        })
    }

    /// Normalized frequency [MHz].
    pub fn freq_mhz(&self) -> f64 {
        self.freq_mhz
    }

    /// Normalized phase shift [deg].
    pub fn phase_deg(&self) -> f64 {
        self.phase_deg
    }

    /// Phase delay [ps] between time 0 and the first positive edge.
    pub fn phase_delta_ps(&self) -> u64 {
        self.phase_delta_ps
    }

    /// Full period [ps].
    pub fn period_ps(&self) -> u64 {
        self.period_ps
    }

    /// Half period [ps].
    pub fn half_period_ps(&self) -> u64 {
        self.half_period_ps
    }

    /// Timestamp of the most recent positive edge [ps].
    pub fn last_posedge_ps(&self) -> u64 {
        self.last_posedge_ps
    }

    /// Saved clock level, as the designs in this domain last saw it.
    pub fn level(&self) -> u8 {
        self.level.get()
    }

    /// True iff `time_ps` is exactly a positive-edge instant of this domain.
    ///
    /// The query must land on an edge within one cycle of the last positive
    /// edge; anything else means the bench advanced past an edge and aborts.
    pub fn is_posedge_at(&self, time_ps: u64) -> bool {
        let lp = self.last_posedge_ps;
        if time_ps > lp {
            if time_ps == lp + self.period_ps {
                true
            } else if time_ps == lp + self.half_period_ps {
                false
            } else {
                panic!(
                    "clock::is_posedge_at: {time_ps} ps is not an edge instant \
                     (last posedge {lp} ps, period {} ps)",
                    self.period_ps
                );
            }
        } else if time_ps < lp {
            if lp.checked_sub(self.period_ps) == Some(time_ps) {
                true
            } else if lp.checked_sub(self.half_period_ps) == Some(time_ps) {
                false
            } else {
                panic!(
                    "clock::is_posedge_at: {time_ps} ps is not an edge instant \
                     (last posedge {lp} ps, period {} ps)",
                    self.period_ps
                );
            }
        } else {
            true
        }
    }

    /// True iff the next edge strictly after `time_ps` is a positive edge.
    ///
    /// The complement of this is the clock level at `time_ps`, which is how
    /// [`Self::clock_value_at`] derives it.
    pub fn is_posedge_next(&self, time_ps: u64) -> bool {
        let lp = self.last_posedge_ps;
        if time_ps >= lp {
            if time_ps < lp + self.half_period_ps {
                false
            } else if time_ps < lp + self.period_ps {
                true
            } else {
                panic!(
                    "clock::is_posedge_next: {time_ps} ps is more than one cycle past \
                     the last posedge ({lp} ps, period {} ps)",
                    self.period_ps
                );
            }
        } else {
            // Before the first posedge of a phase-shifted domain.
            if time_ps >= lp.saturating_sub(self.half_period_ps) {
                true
            } else if time_ps >= lp.saturating_sub(self.period_ps) {
                false
            } else {
                panic!(
                    "clock::is_posedge_next: {time_ps} ps is more than one cycle before \
                     the last posedge ({lp} ps, period {} ps)",
                    self.period_ps
                );
            }
        }
    }

    /// Non-negative distance [ps] from `time_ps` to the next edge of this
    /// domain. The bench takes the minimum of this across all domains to
    /// decide how far time advances.
    pub fn time_to_next_edge(&self, time_ps: u64) -> u64 {
        let lp = self.last_posedge_ps;
        let posedge_next = self.is_posedge_next(time_ps);
        if time_ps >= lp {
            if posedge_next {
                lp + self.period_ps - time_ps
            } else {
                lp + self.half_period_ps - time_ps
            }
        } else if posedge_next {
            lp - time_ps
        } else {
            lp - self.half_period_ps - time_ps
        }
    }

    /// Logical clock level at `time_ps`.
    pub fn clock_value_at(&self, time_ps: u64) -> u8 {
        if self.is_posedge_next(time_ps) { 0 } else { 1 }
    }

    /// Register a design clock net with this domain.
    ///
    /// The domain becomes the exclusive writer of the net. Registering the
    /// same net twice is coalesced. The net is set to the current level
    /// right away so the design can be evaluated before any edge was taken.
    pub fn attach_uut_clock(&mut self, clk: &Net<u8>) {
        if !self.uut_clocks.iter().any(|existing| existing.same(clk)) {
            self.uut_clocks.push(clk.clone());
        }
        clk.set(self.level.get());
    }

    /// Wire a model clock pin to this domain's level cell.
    ///
    /// Models read edges through the shared cell instead of being pushed
    /// to, so a model attached here sees exactly what the designs saw.
    pub fn attach_model_clock(&self, clk: &mut Pin<u8>) {
        clk.wire(&self.level);
    }

    /// Apply the edge occurring at `edge_time_ps`.
    ///
    /// Must be called exactly at a positive or negative edge instant of
    /// this domain, after time has been advanced to it. Updates the saved
    /// level, records the positive-edge timestamp, and writes the level
    /// into every registered design clock net.
    pub fn apply_edge(&mut self, edge_time_ps: u64) {
        let level = u8::from(self.is_posedge_at(edge_time_ps));
        self.level.set(level);
        // The only time edge_time < last_posedge is before the first edge
        // of a phase-shifted domain; the shift is under one full cycle so
        // no extra range check is needed.
        if level == 1 {
            self.last_posedge_ps = edge_time_ps;
        }
        for clk in &self.uut_clocks {
            clk.set(level);
        }
    }
}
