//! SDRAM command-bus decode.
//!
//! A command is sampled on a rising clock edge while chip select is low,
//! and decoded from the (RASn, CASn, WEn) triple. Address bit 10
//! qualifies two of them: all-banks on precharge, auto-precharge on
//! read/write.

/// Commands of the SDRAM wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// No operation; legal in every state.
    Nop,
    /// Open a row in a bank.
    BankActive,
    /// Column read from the active row.
    Read,
    /// Column write to the active row.
    Write,
    /// Close the active row (all banks when address bit 10 is set).
    Precharge,
    /// Refresh one row counter's worth of cells.
    AutoRefresh,
    /// Program CAS latency and burst length from the address bus.
    ModeRegisterSet,
    /// Burst terminate. Decodable, but this model never accepts it.
    BurstTerminate,
}

impl Command {
    /// Decode the control triple. Only the low bit of each line counts.
    pub fn decode(ras_n: u8, cas_n: u8, we_n: u8) -> Self {
        match (ras_n & 1, cas_n & 1, we_n & 1) {
            (1, 1, 1) => Self::Nop,
            (1, 1, 0) => Self::BurstTerminate,
            (1, 0, 1) => Self::Read,
            (1, 0, 0) => Self::Write,
            (0, 1, 1) => Self::BankActive,
            (0, 1, 0) => Self::Precharge,
            (0, 0, 1) => Self::AutoRefresh,
            (0, 0, 0) => Self::ModeRegisterSet,
            _ => unreachable!("masked to one bit each"),
        }
    }

    /// The (RASn, CASn, WEn) levels that encode this command.
    pub fn encode(self) -> (u8, u8, u8) {
        match self {
            Self::Nop => (1, 1, 1),
            Self::BurstTerminate => (1, 1, 0),
            Self::Read => (1, 0, 1),
            Self::Write => (1, 0, 0),
            Self::BankActive => (0, 1, 1),
            Self::Precharge => (0, 1, 0),
            Self::AutoRefresh => (0, 0, 1),
            Self::ModeRegisterSet => (0, 0, 0),
        }
    }
}

/// Decode the mode-register burst-length field (address bits 2-0).
///
/// Returns `None` for the full-page encoding (111) and for the reserved
/// values; this model supports fixed-length bursts only.
pub fn decode_burst_length(field: u8) -> Option<u8> {
    match field & 0x7 {
        0b000 => Some(1),
        0b001 => Some(2),
        0b010 => Some(4),
        0b011 => Some(8),
        _ => None,
    }
}

/// Encode a burst length into the mode-register field.
pub fn encode_burst_length(burst: u8) -> Option<u8> {
    match burst {
        1 => Some(0b000),
        2 => Some(0b001),
        4 => Some(0b010),
        8 => Some(0b011),
        _ => None,
    }
}
