use core::ops::Range;

use num_enum::IntoPrimitive;

/// Top level fields of a standard data or remote frame, in transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FieldKind {
    StartOfFrame,
    Arbitration,
    Control,
    Data,
    Crc,
    CrcDelimiter,
    AckSlot,
    AckDelimiter,
    EndOfFrame,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        Self::StartOfFrame,
        Self::Arbitration,
        Self::Control,
        Self::Data,
        Self::Crc,
        Self::CrcDelimiter,
        Self::AckSlot,
        Self::AckDelimiter,
        Self::EndOfFrame,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::StartOfFrame => "Start of Frame",
            Self::Arbitration => "Arbitration Field",
            Self::Control => "Control Field",
            Self::Data => "Data Field",
            Self::Crc => "CRC Field",
            Self::CrcDelimiter => "CRC Delimiter",
            Self::AckSlot => "ACK Slot",
            Self::AckDelimiter => "ACK Delimiter",
            Self::EndOfFrame => "End of Frame",
        }
    }

    /// Whether the field is subject to bit stuffing (start of frame through data)
    pub const fn is_stuffed(&self) -> bool {
        matches!(
            self,
            Self::StartOfFrame | Self::Arbitration | Self::Control | Self::Data
        )
    }

    /// Length on the wire of the fields that follow the stuffed section
    pub const fn fixed_len(&self) -> Option<usize> {
        match self {
            Self::Crc => Some(15),
            Self::CrcDelimiter | Self::AckSlot | Self::AckDelimiter => Some(1),
            Self::EndOfFrame => Some(7),
            _ => None,
        }
    }
}

/// Parts of the arbitration and control fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SubFieldKind {
    Identifier,
    Rtr,
    Ide,
    Reserved0,
    Dlc,
}

impl SubFieldKind {
    pub const ALL: [SubFieldKind; 5] = [
        Self::Identifier,
        Self::Rtr,
        Self::Ide,
        Self::Reserved0,
        Self::Dlc,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Rtr => "RTR",
            Self::Ide => "IDE",
            Self::Reserved0 => "r0",
            Self::Dlc => "DLC",
        }
    }

    pub const fn parent(&self) -> FieldKind {
        match self {
            Self::Identifier | Self::Rtr => FieldKind::Arbitration,
            Self::Ide | Self::Reserved0 | Self::Dlc => FieldKind::Control,
        }
    }

    /// Number of logical (unstuffed) bits
    pub const fn width(&self) -> usize {
        match self {
            Self::Identifier => 11,
            Self::Rtr | Self::Ide | Self::Reserved0 => 1,
            Self::Dlc => 4,
        }
    }
}

/// A half-open range `start..end` of bit indices in an encoded frame. Stuff
/// bits inserted inside a field belong to that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldRange<K> {
    pub kind: K,
    pub start: usize,
    pub end: usize,
}

impl<K: Copy> FieldRange<K> {
    pub const fn new(kind: K, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl FieldRange<FieldKind> {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

impl FieldRange<SubFieldKind> {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_in_transmission_order() {
        for pair in FieldKind::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(u8::from(pair[0]) + 1, u8::from(pair[1]));
        }

        for pair in SubFieldKind::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].parent() <= pair[1].parent());
        }
    }

    #[test]
    fn labels() {
        assert_eq!(FieldKind::StartOfFrame.label(), "Start of Frame");
        assert_eq!(FieldKind::AckDelimiter.label(), "ACK Delimiter");
        assert_eq!(SubFieldKind::Reserved0.label(), "r0");
        assert_eq!(SubFieldKind::Rtr.parent(), FieldKind::Arbitration);
        assert_eq!(SubFieldKind::Dlc.parent(), FieldKind::Control);
    }

    #[test]
    fn sub_field_widths_fill_their_parents() {
        let arbitration: usize = SubFieldKind::ALL
            .iter()
            .filter(|kind| kind.parent() == FieldKind::Arbitration)
            .map(SubFieldKind::width)
            .sum();
        let control: usize = SubFieldKind::ALL
            .iter()
            .filter(|kind| kind.parent() == FieldKind::Control)
            .map(SubFieldKind::width)
            .sum();

        assert_eq!(arbitration, 12);
        assert_eq!(control, 6);
    }

    #[test]
    fn fixed_lengths_cover_the_trailer() {
        let trailer: usize = FieldKind::ALL
            .iter()
            .filter_map(FieldKind::fixed_len)
            .sum();

        assert_eq!(trailer, crate::TRAILER_BITS);
        assert!(FieldKind::ALL
            .iter()
            .all(|kind| kind.is_stuffed() != kind.fixed_len().is_some()));
    }

    #[test]
    fn range_helpers() {
        let range = FieldRange::new(FieldKind::Data, 20, 36);

        assert_eq!(range.len(), 16);
        assert!(range.contains(20));
        assert!(!range.contains(36));
        assert_eq!(range.range(), 20..36);
        assert_eq!(range.label(), "Data Field");
        assert!(FieldRange::new(FieldKind::Data, 20, 20).is_empty());
    }
}
