//! Rendering helpers. Nothing here feeds back into the encoder; flipping only
//! changes how a bit is shown, never the encoded frame.

use heapless::String;

use crate::{Bit, EncodedFrame, FieldKind, MAX_FRAME_BITS};

/// `raw XOR flip`: shows the bit inverted when `flip` is set
pub fn display_bit(raw: Bit, flip: bool) -> Bit {
    if flip {
        !raw
    } else {
        raw
    }
}

/// Renders bits as a string of `0`/`1` characters
pub fn render_bits(bits: &[Bit], flip: bool) -> String<MAX_FRAME_BITS> {
    bits.iter()
        .map(|bit| display_bit(*bit, flip).as_char())
        .take(MAX_FRAME_BITS)
        .collect()
}

impl EncodedFrame {
    /// The whole frame as a bit string
    pub fn render(&self, flip: bool) -> String<MAX_FRAME_BITS> {
        render_bits(self.bits(), flip)
    }

    /// One field as a bit string
    pub fn render_field(&self, kind: FieldKind, flip: bool) -> String<MAX_FRAME_BITS> {
        render_bits(self.field_bits(kind), flip)
    }
}
