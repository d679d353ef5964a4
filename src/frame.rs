use embedded_can::{Id, StandardId};
use heapless::Vec;

use crate::{
    bits_to_int, bytes_to_bits, concat, crc15, extend_bits, int_to_bits, stuff, stuffed_len, Bit,
    BitError, Bits, FieldKind, FieldRange, StuffPositions, SubFieldKind, CRC15_WIDTH, HEADER_BITS,
};

/// Largest DLC of a classic CAN frame
pub const MAX_DLC: u8 = 8;

const CRC_DELIMITER: Bit = Bit::Recessive;
const ACK_SLOT: Bit = Bit::Recessive;
const ACK_DELIMITER: Bit = Bit::Recessive;
const END_OF_FRAME: [Bit; 7] = [Bit::Recessive; 7];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    #[error("CAN identifier ({0:?}) is out of the valid range (0..=0x7FF)")]
    InvalidIdentifier(u32),
    #[error("CAN identifier is not a valid number in the selected format")]
    MalformedIdentifier,
    #[error("Extended (29 bit) identifiers are not supported")]
    ExtendedIdentifier,
    #[error("DLC ({0:?}) is out of the valid range (0..=8)")]
    InvalidDlc(u8),
    #[error("DLC is not a decimal number between 0 and 8")]
    MalformedDlc,
    #[error("Data byte ({index:?}) is not a hex value between 00 and FF")]
    InvalidDataByte { index: usize },
    #[error("DLC ({expected:?}) requires more data bytes than were supplied ({actual:?})")]
    InsufficientDataBytes { expected: u8, actual: usize },
    #[error("Failed to build the frame bits")]
    Bits(#[from] BitError),
}

/// What to do when fewer data bytes than the DLC are supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShortDataPolicy {
    /// Missing trailing bytes are sent as 0x00
    #[default]
    ZeroPad,
    Reject,
}

/// A validated standard (11 bit identifier) data or remote frame.
///
/// Remote frames set RTR and still carry `dlc` data bytes, zero padded when
/// none are given.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameDescriptor {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: StandardId,
    dlc: u8,
    data: [u8; 8],
    remote: bool,
}

impl FrameDescriptor {
    /// Validates raw frame fields, zero padding missing data bytes. Bytes
    /// beyond `dlc` are ignored.
    pub fn new(identifier: u16, dlc: u8, data: &[u8], remote: bool) -> Result<Self, FrameError> {
        Self::with_policy(identifier, dlc, data, remote, ShortDataPolicy::default())
    }

    pub fn with_policy(
        identifier: u16,
        dlc: u8,
        data: &[u8],
        remote: bool,
        policy: ShortDataPolicy,
    ) -> Result<Self, FrameError> {
        let id = StandardId::new(identifier)
            .ok_or(FrameError::InvalidIdentifier(identifier as u32))?;

        if dlc > MAX_DLC {
            return Err(FrameError::InvalidDlc(dlc));
        }

        let used = data.len().min(dlc as usize);

        if used < dlc as usize && policy == ShortDataPolicy::Reject {
            return Err(FrameError::InsufficientDataBytes {
                expected: dlc,
                actual: data.len(),
            });
        }

        let mut copy = [0u8; 8];
        copy[..used].copy_from_slice(&data[..used]);

        Ok(Self {
            id,
            dlc,
            data: copy,
            remote,
        })
    }

    /// Creates a data frame whose DLC is the length of `data` (at most 8)
    pub fn new_data(id: StandardId, data: &[u8]) -> Result<Self, FrameError> {
        Self::with_policy(
            id.as_raw(),
            clamp_dlc(data.len()),
            data,
            false,
            ShortDataPolicy::Reject,
        )
    }

    pub fn new_remote(id: StandardId, dlc: u8) -> Result<Self, FrameError> {
        Self::with_policy(id.as_raw(), dlc, &[], true, ShortDataPolicy::ZeroPad)
    }

    pub fn id(&self) -> StandardId {
        self.id
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// The transmitted payload, always `dlc` bytes long
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Start of frame through the end of the data field, before stuffing
    pub fn unstuffed_bits(&self) -> Result<Bits, BitError> {
        let identifier = int_to_bits(self.id.as_raw() as u32, SubFieldKind::Identifier.width())?;
        let dlc = int_to_bits(self.dlc as u32, SubFieldKind::Dlc.width())?;
        let data = bytes_to_bits(self.data())?;

        concat(&[
            &[Bit::Dominant][..],
            &identifier[..],
            &[Bit::from_bool(self.remote)][..],
            // IDE (standard format) and r0
            &[Bit::Dominant, Bit::Dominant][..],
            &dlc[..],
            &data[..],
        ])
    }

    /// Builds the on-wire bit stream and its field map
    pub fn encode(&self) -> Result<EncodedFrame, FrameError> {
        let unstuffed = self.unstuffed_bits()?;
        let crc = crc15(&unstuffed);
        let (payload, stuff_positions) = stuff(&unstuffed)?.into_parts();

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "Encoding ID {=u16:#x}: {=usize} bits, {=usize} stuff bits, CRC {=u16:#x}",
            self.id.as_raw(),
            unstuffed.len(),
            stuff_positions.len(),
            crc
        );

        let mut bits = payload;
        extend_bits(&mut bits, &int_to_bits(crc as u32, CRC15_WIDTH)?)?;
        extend_bits(&mut bits, &[CRC_DELIMITER, ACK_SLOT, ACK_DELIMITER])?;
        extend_bits(&mut bits, &END_OF_FRAME)?;

        let fields = field_ranges(&unstuffed)?;
        let sub_fields = sub_field_ranges(&unstuffed)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Encoded frame is {=usize} bits long", bits.len());

        Ok(EncodedFrame {
            descriptor: self.clone(),
            bits,
            stuff_positions,
            fields,
            sub_fields,
            crc,
        })
    }
}

impl embedded_can::Frame for FrameDescriptor {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Self::new_data(id, data).ok(),
            Id::Extended(_) => None,
        }
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Self::new_remote(id, clamp_dlc(dlc)).ok(),
            Id::Extended(_) => None,
        }
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        Id::Standard(self.id)
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        FrameDescriptor::data(self)
    }
}

/// Encodes a standard identifier frame given in raw fields
pub fn assemble(
    identifier: u16,
    dlc: u8,
    data: &[u8],
    remote: bool,
) -> Result<EncodedFrame, FrameError> {
    FrameDescriptor::new(identifier, dlc, data, remote)?.encode()
}

/// Encodes any [`embedded_can::Frame`] with a standard identifier.
///
/// Drivers usually report no data for remote frames, so their payload is zero
/// padded; data frames must supply all `dlc` bytes.
pub fn encode_frame<F: embedded_can::Frame>(frame: &F) -> Result<EncodedFrame, FrameError> {
    let id = match frame.id() {
        Id::Standard(id) => id,
        Id::Extended(_) => return Err(FrameError::ExtendedIdentifier),
    };

    let policy = if frame.is_remote_frame() {
        ShortDataPolicy::ZeroPad
    } else {
        ShortDataPolicy::Reject
    };

    FrameDescriptor::with_policy(
        id.as_raw(),
        clamp_dlc(frame.dlc()),
        frame.data(),
        frame.is_remote_frame(),
        policy,
    )?
    .encode()
}

/// Narrows a length to a DLC candidate; anything over 255 still fails validation
fn clamp_dlc(len: usize) -> u8 {
    u8::try_from(len).unwrap_or(u8::MAX)
}

/// Maps an end position in the unstuffed sequence to the stuffed stream by
/// stuffing the prefix, so a stuff bit owed at a boundary stays with the
/// field before it.
fn stuffed_boundary(unstuffed: &[Bit], end: usize) -> usize {
    stuffed_len(&unstuffed[..end])
}

fn field_ranges(unstuffed: &[Bit]) -> Result<Vec<FieldRange<FieldKind>, 9>, BitError> {
    let logical_ends = [
        (FieldKind::StartOfFrame, 1),
        (FieldKind::Arbitration, 1 + 12),
        (FieldKind::Control, HEADER_BITS),
        (FieldKind::Data, unstuffed.len()),
    ];

    let mut ranges = Vec::new();
    let mut start = 0;

    for (kind, end) in logical_ends {
        let end = stuffed_boundary(unstuffed, end);
        push_range(&mut ranges, FieldRange::new(kind, start, end))?;
        start = end;
    }

    for kind in FieldKind::ALL.into_iter().filter(|kind| !kind.is_stuffed()) {
        let end = start + kind.fixed_len().unwrap_or_default();
        push_range(&mut ranges, FieldRange::new(kind, start, end))?;
        start = end;
    }

    Ok(ranges)
}

fn sub_field_ranges(unstuffed: &[Bit]) -> Result<Vec<FieldRange<SubFieldKind>, 5>, BitError> {
    let mut ranges = Vec::new();
    let mut logical_end = 1;
    let mut start = stuffed_boundary(unstuffed, logical_end);

    for kind in SubFieldKind::ALL {
        logical_end += kind.width();
        let end = stuffed_boundary(unstuffed, logical_end);
        push_range(&mut ranges, FieldRange::new(kind, start, end))?;
        start = end;
    }

    Ok(ranges)
}

fn push_range<K, const N: usize>(
    ranges: &mut Vec<FieldRange<K>, N>,
    range: FieldRange<K>,
) -> Result<(), BitError> {
    ranges
        .push(range)
        .map_err(|_| BitError::CapacityExceeded(N))
}

/// The on-wire bits of one frame together with the position of every field
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodedFrame {
    descriptor: FrameDescriptor,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    bits: Bits,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    stuff_positions: StuffPositions,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    fields: Vec<FieldRange<FieldKind>, 9>,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    sub_fields: Vec<FieldRange<SubFieldKind>, 5>,
    crc: u16,
}

impl EncodedFrame {
    pub fn descriptor(&self) -> &FrameDescriptor {
        &self.descriptor
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Total number of transmitted bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Ranges of all nine fields in transmission order, covering every bit
    pub fn fields(&self) -> &[FieldRange<FieldKind>] {
        &self.fields
    }

    pub fn field(&self, kind: FieldKind) -> Option<&FieldRange<FieldKind>> {
        self.fields.iter().find(|range| range.kind == kind)
    }

    /// The wire bits of one field, stuff bits included
    pub fn field_bits(&self, kind: FieldKind) -> &[Bit] {
        self.field(kind)
            .map(|range| &self.bits[range.range()])
            .unwrap_or(&[])
    }

    /// Identifier, RTR, IDE, r0 and DLC ranges, each inside its parent field
    pub fn sub_fields(&self) -> &[FieldRange<SubFieldKind>] {
        &self.sub_fields
    }

    pub fn sub_field(&self, kind: SubFieldKind) -> Option<&FieldRange<SubFieldKind>> {
        self.sub_fields.iter().find(|range| range.kind == kind)
    }

    /// The combined ACK slot and ACK delimiter range
    pub fn ack_field(&self) -> Option<FieldRange<FieldKind>> {
        let slot = self.field(FieldKind::AckSlot)?;
        let delimiter = self.field(FieldKind::AckDelimiter)?;

        Some(FieldRange::new(FieldKind::AckSlot, slot.start, delimiter.end))
    }

    /// Indices of inserted stuff bits (all before the CRC field)
    pub fn stuff_positions(&self) -> &[usize] {
        &self.stuff_positions
    }

    pub fn is_stuff_bit(&self, index: usize) -> bool {
        self.stuff_positions.binary_search(&index).is_ok()
    }

    pub fn crc(&self) -> u16 {
        self.crc
    }

    /// Reads the transmitted CRC field back as an integer
    pub fn transmitted_crc(&self) -> Result<u16, BitError> {
        Ok(bits_to_int(self.field_bits(FieldKind::Crc))? as u16)
    }

    /// Start of frame through data with the stuff bits removed
    pub fn unstuffed_payload(&self) -> Bits {
        let payload_end = self
            .field(FieldKind::Data)
            .map(|range| range.end)
            .unwrap_or_default();

        self.bits[..payload_end]
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_stuff_bit(*index))
            .map(|(_, bit)| *bit)
            .collect()
    }
}
