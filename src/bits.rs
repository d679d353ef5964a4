use core::ops::Not;

use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::MAX_FRAME_BITS;

/// A single bus level. The discriminant is the logical bit value, so a
/// dominant bit is a `0` and a recessive bit is a `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = BitError, constructor = BitError::InvalidBitValue))]
#[repr(u8)]
pub enum Bit {
    Dominant = 0,
    Recessive = 1,
}

impl Bit {
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::Recessive
        } else {
            Self::Dominant
        }
    }

    pub const fn is_recessive(self) -> bool {
        matches!(self, Self::Recessive)
    }

    pub const fn is_dominant(self) -> bool {
        matches!(self, Self::Dominant)
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Dominant => '0',
            Self::Recessive => '1',
        }
    }
}

impl Not for Bit {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dominant => Self::Recessive,
            Self::Recessive => Self::Dominant,
        }
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        bit.is_recessive()
    }
}

/// A bit sequence in transmission order, large enough for any classic frame
pub type Bits = Vec<Bit, MAX_FRAME_BITS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitError {
    #[error("Tried to decode a bit but the value was neither 0 nor 1 ({0:?})")]
    InvalidBitValue(u8),
    #[error("Tried to decode a bit but the character was neither '0' nor '1' ({0:?})")]
    InvalidBitChar(char),
    #[error("Value ({value:?}) does not fit in {width:?} bits")]
    ValueTooWide { value: u32, width: usize },
    #[error("Tried to build an integer from {0:?} bits (at most 32 are supported)")]
    TooManyBits(usize),
    #[error("Bit sequence exceeded the maximum frame length ({0:?} bits)")]
    CapacityExceeded(usize),
    #[error("Expected a stuff bit at position ({position:?}) but found a sixth equal bit")]
    StuffViolation { position: usize },
}

/// Appends `bits` to `target`, failing if the result would exceed the capacity
pub fn extend_bits<const N: usize>(target: &mut Vec<Bit, N>, bits: &[Bit]) -> Result<(), BitError> {
    target
        .extend_from_slice(bits)
        .map_err(|_| BitError::CapacityExceeded(N))
}

/// Converts `value` into exactly `width` bits, most significant bit first
pub fn int_to_bits(value: u32, width: usize) -> Result<Bits, BitError> {
    if width > 32 || (width < 32 && value >> width != 0) {
        return Err(BitError::ValueTooWide { value, width });
    }

    let mut bits = Bits::new();

    for shift in (0..width).rev() {
        bits.push(Bit::from_bool((value >> shift) & 1 == 1))
            .map_err(|_| BitError::CapacityExceeded(MAX_FRAME_BITS))?;
    }

    Ok(bits)
}

/// Reads up to 32 bits back into an integer, most significant bit first
pub fn bits_to_int(bits: &[Bit]) -> Result<u32, BitError> {
    if bits.len() > 32 {
        return Err(BitError::TooManyBits(bits.len()));
    }

    Ok(bits
        .iter()
        .fold(0u32, |acc, bit| (acc << 1) | u8::from(*bit) as u32))
}

/// Expands each byte into 8 bits (MSB first) and concatenates them in order
pub fn bytes_to_bits(bytes: &[u8]) -> Result<Bits, BitError> {
    let mut bits = Bits::new();

    for byte in bytes {
        extend_bits(&mut bits, &int_to_bits(*byte as u32, 8)?)?;
    }

    Ok(bits)
}

pub fn concat(parts: &[&[Bit]]) -> Result<Bits, BitError> {
    let mut bits = Bits::new();

    for part in parts {
        extend_bits(&mut bits, part)?;
    }

    Ok(bits)
}

/// Parses a string of `0` and `1` characters into a bit sequence
pub fn parse_bit_str(text: &str) -> Result<Bits, BitError> {
    let mut bits = Bits::new();

    for c in text.chars() {
        let bit = match c {
            '0' => Bit::Dominant,
            '1' => Bit::Recessive,
            _ => return Err(BitError::InvalidBitChar(c)),
        };

        bits.push(bit)
            .map_err(|_| BitError::CapacityExceeded(MAX_FRAME_BITS))?;
    }

    Ok(bits)
}
