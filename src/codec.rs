use heapless::Vec;

use crate::{BitError, FrameDescriptor, FrameError, ShortDataPolicy, MAX_DLC};

/// Number base used when reading an identifier from text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdFormat {
    Decimal,
    #[default]
    Hexadecimal,
}

impl IdFormat {
    const fn radix(&self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hexadecimal => 16,
        }
    }
}

/* Digits */

pub fn hex_digit_to_u8(byte: u8) -> Option<u8> {
    Some(match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => return None,
    })
}

pub fn dec_digit_to_u8(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        _ => None,
    }
}

fn digit_in(format: IdFormat, byte: u8) -> Option<u8> {
    match format {
        IdFormat::Decimal => dec_digit_to_u8(byte),
        IdFormat::Hexadecimal => hex_digit_to_u8(byte),
    }
}

/* Fields */

/// Reads an 11 bit identifier. Hex input may carry a `0x` prefix.
pub fn parse_identifier(text: &str, format: IdFormat) -> Result<u16, FrameError> {
    let mut digits = text.trim().as_bytes();

    if format == IdFormat::Hexadecimal {
        if let Some(rest) = digits
            .strip_prefix(b"0x")
            .or_else(|| digits.strip_prefix(b"0X"))
        {
            digits = rest;
        }
    }

    if digits.is_empty() {
        return Err(FrameError::MalformedIdentifier);
    }

    let mut value = 0u32;

    for byte in digits {
        let digit = digit_in(format, *byte).ok_or(FrameError::MalformedIdentifier)?;

        value = value
            .saturating_mul(format.radix())
            .saturating_add(digit as u32);
    }

    u16::try_from(value)
        .ok()
        .filter(|id| embedded_can::StandardId::new(*id).is_some())
        .ok_or(FrameError::InvalidIdentifier(value))
}

pub fn parse_dlc(text: &str) -> Result<u8, FrameError> {
    let digits = text.trim().as_bytes();

    let dlc = match digits {
        [digit] => dec_digit_to_u8(*digit).ok_or(FrameError::MalformedDlc)?,
        [b'0', digit] => dec_digit_to_u8(*digit).ok_or(FrameError::MalformedDlc)?,
        [tens, ones] => {
            let tens = dec_digit_to_u8(*tens).ok_or(FrameError::MalformedDlc)?;
            let ones = dec_digit_to_u8(*ones).ok_or(FrameError::MalformedDlc)?;
            return Err(FrameError::InvalidDlc(tens * 10 + ones));
        }
        _ => return Err(FrameError::MalformedDlc),
    };

    if dlc > MAX_DLC {
        return Err(FrameError::InvalidDlc(dlc));
    }

    Ok(dlc)
}

/// Reads one or two hex digits as a byte
fn parse_hex_byte(token: &str) -> Option<u8> {
    match token.as_bytes() {
        [lsn] => hex_digit_to_u8(*lsn),
        [msn, lsn] => Some((hex_digit_to_u8(*msn)? << 4) | hex_digit_to_u8(*lsn)?),
        _ => None,
    }
}

/// Reads hex bytes separated by whitespace and/or commas.
///
/// Every token must be a valid byte, but only the first `dlc` are kept. When
/// fewer are given, `policy` decides between zero padding and an error.
pub fn parse_data_bytes(
    text: &str,
    dlc: u8,
    policy: ShortDataPolicy,
) -> Result<Vec<u8, 8>, FrameError> {
    if dlc > MAX_DLC {
        return Err(FrameError::InvalidDlc(dlc));
    }

    let mut bytes = [0u8; MAX_DLC as usize];
    let mut count = 0;

    for (index, token) in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .enumerate()
    {
        let byte = parse_hex_byte(token).ok_or(FrameError::InvalidDataByte { index })?;

        if let Some(slot) = bytes[..dlc as usize].get_mut(index) {
            *slot = byte;
        }

        count += 1;
    }

    if count < dlc as usize && policy == ShortDataPolicy::Reject {
        return Err(FrameError::InsufficientDataBytes {
            expected: dlc,
            actual: count,
        });
    }

    Vec::from_slice(&bytes[..dlc as usize])
        .map_err(|_| FrameError::Bits(BitError::CapacityExceeded(MAX_DLC as usize)))
}

/// Validates the textual form of a frame and builds its descriptor
pub fn parse_frame(
    id_text: &str,
    format: IdFormat,
    dlc_text: &str,
    data_text: &str,
    remote: bool,
    policy: ShortDataPolicy,
) -> Result<FrameDescriptor, FrameError> {
    let identifier = parse_identifier(id_text, format)?;
    let dlc = parse_dlc(dlc_text)?;
    let data = parse_data_bytes(data_text, dlc, policy)?;

    FrameDescriptor::with_policy(identifier, dlc, &data, remote, policy)
}
