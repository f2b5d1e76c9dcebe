//! SDRAM geometry constants.
//!
//! These mirror the RTL configuration of the controller under test and
//! must be kept in sync with it: 64 Mbit organized as 4 banks of
//! 2048 rows x 256 columns x 32 bits.

use static_assertions::const_assert_eq;

/// Total capacity [bits].
pub const SIZE_BITS: u64 = 64 * 1024 * 1024;
/// Backing store size [bytes].
pub const SIZE_BYTES: usize = (SIZE_BITS / 8) as usize;
/// Data bus width [bits]. One block is one bus word.
pub const DATA_WIDTH: u32 = 32;
/// One block [bytes].
pub const BLOCK_BYTES: usize = (DATA_WIDTH / 8) as usize;
/// Number of addressable blocks.
pub const N_BLOCKS: u32 = (SIZE_BITS / DATA_WIDTH as u64) as u32;

/// Bank count and address widths.
pub const N_BANKS: u32 = 4;
/// Bank address width [bits].
pub const BANK_BITS: u32 = 2;
/// Row address width [bits].
pub const ROW_BITS: u32 = 11;
/// Column address width [bits].
pub const COL_BITS: u32 = 8;
/// Address bus width [bits].
pub const ADDR_BITS: u32 = 11;

/// Address bit 10: auto-precharge flag on read/write, all-banks flag on
/// precharge.
pub const AUTO_PRECHARGE_BIT: u16 = 1 << 10;
/// Mask of the column bits within the address bus.
pub const COL_MASK: u16 = (1 << COL_BITS) - 1;

/// Burst length before a mode-register-set programs one.
pub const DEFAULT_BURST_LENGTH: u8 = 1;
/// CAS latency before a mode-register-set programs one.
pub const DEFAULT_CAS_LATENCY: u8 = 3;

// The bank/row/column split must address the block store exactly.
const_assert_eq!(1u32 << BANK_BITS, N_BANKS);
const_assert_eq!(1u32 << (BANK_BITS + ROW_BITS + COL_BITS), N_BLOCKS);
const_assert_eq!(SIZE_BYTES, N_BLOCKS as usize * BLOCK_BYTES);
