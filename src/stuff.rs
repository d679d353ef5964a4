use heapless::Vec;

use crate::{Bit, BitError, Bits, MAX_FRAME_BITS, STUFF_RUN_LENGTH};

const MAX_STUFF_POSITIONS: usize = MAX_FRAME_BITS / (STUFF_RUN_LENGTH - 1);

/// Indices of inserted stuff bits in a stuffed sequence, ascending
pub type StuffPositions = Vec<usize, MAX_STUFF_POSITIONS>;

/// Tracks the run of equal bits on the wire. A stuff bit is part of the wire
/// stream, so it starts a new run of length one with its own value.
#[derive(Debug, Clone, Copy, Default)]
struct RunTracker {
    last: Option<Bit>,
    run: usize,
}

impl RunTracker {
    /// Records a transmitted bit and returns the stuff bit owed after it, if any
    fn push(&mut self, bit: Bit) -> Option<Bit> {
        if self.last == Some(bit) {
            self.run += 1;
        } else {
            self.last = Some(bit);
            self.run = 1;
        }

        if self.run == STUFF_RUN_LENGTH {
            let stuff = !bit;
            self.last = Some(stuff);
            self.run = 1;
            Some(stuff)
        } else {
            None
        }
    }
}

/// Output of [`stuff`]: the wire bits and which of them were inserted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stuffed {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    bits: Bits,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    stuff_positions: StuffPositions,
}

impl Stuffed {
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn stuff_positions(&self) -> &[usize] {
        &self.stuff_positions
    }

    pub fn is_stuff_bit(&self, index: usize) -> bool {
        self.stuff_positions.binary_search(&index).is_ok()
    }

    pub fn stuff_count(&self) -> usize {
        self.stuff_positions.len()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Removes every marked stuff bit, giving back the original input
    pub fn unstuffed(&self) -> Bits {
        self.bits
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_stuff_bit(*index))
            .map(|(_, bit)| *bit)
            .collect()
    }

    pub fn into_parts(self) -> (Bits, StuffPositions) {
        (self.bits, self.stuff_positions)
    }
}

/// Inserts a complementary bit after every five equal bits on the wire
pub fn stuff(bits: &[Bit]) -> Result<Stuffed, BitError> {
    let mut tracker = RunTracker::default();
    let mut stuffed = Stuffed::default();

    for bit in bits {
        push_bit(&mut stuffed.bits, *bit)?;

        if let Some(stuff_bit) = tracker.push(*bit) {
            stuffed
                .stuff_positions
                .push(stuffed.bits.len())
                .map_err(|_| BitError::CapacityExceeded(MAX_FRAME_BITS))?;
            push_bit(&mut stuffed.bits, stuff_bit)?;
        }
    }

    Ok(stuffed)
}

/// Length `bits` would have after [`stuff`], without building the output
pub fn stuffed_len(bits: &[Bit]) -> usize {
    let mut tracker = RunTracker::default();

    bits.iter()
        .map(|bit| match tracker.push(*bit) {
            Some(_) => 2,
            None => 1,
        })
        .sum()
}

/// Strips stuff bits from a received sequence, checking each one is present
/// and has the complementary value.
///
/// A sequence that ends right after five equal bits is accepted (the stuff
/// bit has simply not been received yet).
pub fn destuff(raw: &[Bit]) -> Result<Bits, BitError> {
    let mut tracker = RunTracker::default();
    let mut bits = Bits::new();
    let mut index = 0;

    while index < raw.len() {
        let bit = raw[index];
        push_bit(&mut bits, bit)?;
        index += 1;

        if let Some(expected) = tracker.push(bit) {
            match raw.get(index) {
                Some(received) if *received == expected => index += 1,
                Some(_) => return Err(BitError::StuffViolation { position: index }),
                None => {}
            }
        }
    }

    Ok(bits)
}

fn push_bit(bits: &mut Bits, bit: Bit) -> Result<(), BitError> {
    bits.push(bit)
        .map_err(|_| BitError::CapacityExceeded(MAX_FRAME_BITS))
}
