use crate::{int_to_bits, Bit, BitError, Bits};

/// x^15 + x^14 + x^10 + x^8 + x^7 + x^4 + x^3 + 1 (the x^15 term is implicit)
pub const CRC15_POLY: u16 = 0x4599;

pub const CRC15_WIDTH: usize = 15;

const CRC15_MASK: u16 = 0x7FFF;

/// Shift register for the classic CAN CRC-15.
///
/// Bits are fed in transmission order starting with the start-of-frame bit.
/// The register starts at zero and the final value is sent MSB first without
/// any output XOR.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc15 {
    value: u16,
}

impl Crc15 {
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// One step of the CAN recurrence: the feedback is the incoming bit XOR
    /// the register's top bit, and the register is shifted before the
    /// polynomial is applied.
    pub fn update_bit(&mut self, bit: Bit) {
        let feedback = ((self.value >> (CRC15_WIDTH - 1)) & 1) ^ u8::from(bit) as u16;

        self.value = (self.value << 1) & CRC15_MASK;

        if feedback != 0 {
            self.value ^= CRC15_POLY;
        }
    }

    pub fn update(&mut self, bits: &[Bit]) {
        for bit in bits {
            self.update_bit(*bit);
        }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// The checksum as it is transmitted (15 bits, MSB first)
    pub fn to_bits(&self) -> Result<Bits, BitError> {
        int_to_bits(self.value as u32, CRC15_WIDTH)
    }
}

/// Computes the CAN CRC-15 over `bits` in one go
pub fn crc15(bits: &[Bit]) -> u16 {
    let mut crc = Crc15::new();
    crc.update(bits);
    crc.value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_bit_str;

    /// Reference remainder of `M(x) * x^15 / G(x)` by polynomial long division
    fn crc15_by_division(bits: &[Bit]) -> u16 {
        const GENERATOR: u32 = (1 << 15) | CRC15_POLY as u32;

        let mut remainder = 0u32;

        for bit in bits
            .iter()
            .copied()
            .chain(core::iter::repeat(Bit::Dominant).take(CRC15_WIDTH))
        {
            remainder = (remainder << 1) | u8::from(bit) as u32;

            if remainder & (1 << 15) != 0 {
                remainder ^= GENERATOR;
            }
        }

        remainder as u16
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(crc15(&[]), 0);
        assert_eq!(Crc15::new().value(), 0);
    }

    #[test]
    fn reference_vectors() {
        assert_eq!(crc15(&parse_bit_str("0").unwrap()), 0x0000);
        assert_eq!(crc15(&parse_bit_str("1").unwrap()), 0x4599);
        assert_eq!(crc15(&parse_bit_str("101").unwrap()), 0x1D56);
        assert_eq!(crc15(&parse_bit_str("111111111111111").unwrap()), 0x6806);
        assert_eq!(crc15(&[Bit::Dominant; 19]), 0x0000);

        // SOF, ID 0x123, RTR, IDE, r0, DLC 0
        assert_eq!(crc15(&parse_bit_str("0001001000110000000").unwrap()), 0x6858);
    }

    #[test]
    fn matches_polynomial_division() {
        for width in 0..=12usize {
            for value in 0..(1u32 << width) {
                let bits = int_to_bits(value, width).unwrap();
                assert_eq!(crc15(&bits), crc15_by_division(&bits), "{bits:?}");
            }
        }
    }

    #[test]
    fn incremental_update_matches_one_shot() {
        let bits = parse_bit_str("0001001000110000010101010111100110").unwrap();
        let (head, tail) = bits.split_at(13);

        let mut crc = Crc15::new();
        crc.update(head);
        crc.update(tail);

        assert_eq!(crc.value(), crc15(&bits));
    }

    #[test]
    fn leading_dominant_bits_do_not_change_the_crc() {
        let bits = parse_bit_str("1011001").unwrap();
        let mut padded = parse_bit_str("0000").unwrap();
        padded.extend_from_slice(&bits).unwrap();

        assert_eq!(crc15(&bits), crc15(&padded));
    }

    #[test]
    fn register_stays_within_fifteen_bits() {
        let mut crc = Crc15::new();

        for _ in 0..200 {
            crc.update_bit(Bit::Recessive);
            assert_eq!(crc.value() & !CRC15_MASK, 0);
        }
    }

    #[test]
    fn to_bits_is_fifteen_bits_msb_first() {
        let mut crc = Crc15::new();
        crc.update(&parse_bit_str("0001001000110000000").unwrap());

        assert_eq!(crc.to_bits(), parse_bit_str("110100001011000"));
    }
}
