#![no_std]

mod bits;
mod codec;
mod crc;
mod display;
mod field;
mod frame;
mod stuff;

// Standard data frame, ID 0x123, DLC 2, AB CD
// SOF | ID 00100100011 RTR 0 | IDE 0 r0 0 DLC 0010 | 10101011 11001101 | CRC | 1 1 1 | 1111111

/// Number of consecutive equal bits after which a stuff bit is inserted
pub const STUFF_RUN_LENGTH: usize = 5;

/// Start of frame, arbitration (11 + 1) and control (1 + 1 + 4) bits
const HEADER_BITS: usize = 1 + 12 + 6;
const MAX_DATA_BITS: usize = 8 * 8;

/// Longest unstuffed start-of-frame..data sequence (DLC = 8)
pub const MAX_UNSTUFFED_BITS: usize = HEADER_BITS + MAX_DATA_BITS;

/// One stuff bit after the first five bits and then at most one every four bits
pub const MAX_STUFF_BITS: usize =
    1 + (MAX_UNSTUFFED_BITS - STUFF_RUN_LENGTH) / (STUFF_RUN_LENGTH - 1);

/// CRC (15), CRC delimiter, ACK slot, ACK delimiter and end of frame (7)
pub const TRAILER_BITS: usize = 15 + 1 + 1 + 1 + 7;

pub const MAX_FRAME_BITS: usize = MAX_UNSTUFFED_BITS + MAX_STUFF_BITS + TRAILER_BITS;

pub use bits::*;
pub use codec::*;
pub use crc::*;
pub use display::*;
pub use field::*;
pub use frame::*;
pub use stuff::*;

pub use embedded_can::{Id, StandardId};
