//! Bit-precise field layout.
//!
//! Turns a header field and its bit offset into the byte range and bit
//! positions Wireshark needs to display it. Fields narrower than a byte are
//! rendered as a bit string of their containing byte; wider fields are
//! rendered as zero-padded hex read through `bitfield`.
//!
//! The two modes count bits differently. Binary positions are 1-based inside
//! the displayed byte, so a field that ends on a byte boundary reports bit 8
//! rather than 0. Hex positions start at the field's own offset within its
//! first byte and span the field width.

use crate::graph::Field;

pub const BITS_PER_BYTE: u64 = 8;
const BITS_PER_HEX_DIGIT: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Binary,
    Hex { digits: u64 },
}

impl RenderMode {
    pub fn tag(&self) -> &'static str {
        match self {
            RenderMode::Binary => "Binary",
            RenderMode::Hex { .. } => "Hex",
        }
    }
}

/// Display layout of one field.
///
/// # Examples
/// ```
/// use p4shark_core::{Field, RenderMode, describe_field};
///
/// let descriptor = describe_field(&Field::new("ihl", 4), 4);
/// assert_eq!(descriptor.byte_offset, 0);
/// assert_eq!((descriptor.start_bit, descriptor.end_bit), (5, 8));
/// assert_eq!(descriptor.mode, RenderMode::Binary);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub byte_offset: u64,
    pub byte_width: u64,
    pub start_bit: u64,
    pub end_bit: u64,
    pub mode: RenderMode,
    /// `"<name> (<width> bits)"`.
    pub label: String,
}

impl FieldDescriptor {
    pub fn buffer_ref(&self) -> String {
        format!("buffer({},{})", self.byte_offset, self.byte_width)
    }

    pub fn format_expression(&self) -> String {
        let buffer = self.buffer_ref();
        match self.mode {
            RenderMode::Binary => format!(
                "tobits({buffer}:uint(), 8, {}, {})",
                self.start_bit, self.end_bit
            ),
            RenderMode::Hex { digits } => format!(
                "string.format(\"%0{digits}X\", {buffer}:bitfield({}, {}))",
                self.start_bit, self.end_bit
            ),
        }
    }

    /// Subtree statement for this field, newline terminated.
    pub fn display_line(&self) -> String {
        format!(
            "    subtree:add({}, \"{} - {}: \" .. {})\n",
            self.buffer_ref(),
            self.label,
            self.mode.tag(),
            self.format_expression()
        )
    }
}

/// Lay out `field` starting `offset` bits into its header.
///
/// `field.width` must be at least 1; the graph loader rejects zero widths.
pub fn describe_field(field: &Field, offset: u64) -> FieldDescriptor {
    let width = u64::from(field.width);
    let byte_offset = offset / BITS_PER_BYTE;
    let byte_width = width.div_ceil(BITS_PER_BYTE);
    let label = format!("{} ({} bits)", field.name, field.width);

    if width < BITS_PER_BYTE {
        let start_bit = (offset + 1) % BITS_PER_BYTE;
        let end_bit = match (offset + width) % BITS_PER_BYTE {
            0 => BITS_PER_BYTE,
            bit => bit,
        };
        FieldDescriptor {
            byte_offset,
            byte_width,
            start_bit,
            end_bit,
            mode: RenderMode::Binary,
            label,
        }
    } else {
        FieldDescriptor {
            byte_offset,
            byte_width,
            start_bit: offset % BITS_PER_BYTE,
            end_bit: width,
            mode: RenderMode::Hex {
                digits: width.div_ceil(BITS_PER_HEX_DIGIT),
            },
            label,
        }
    }
}

/// Lay out a header's fields in order, with a running bit offset from 0.
pub fn layout_fields(fields: &[Field]) -> Vec<FieldDescriptor> {
    let mut offset = 0u64;
    fields
        .iter()
        .map(|field| {
            let descriptor = describe_field(field, offset);
            offset += u64::from(field.width);
            descriptor
        })
        .collect()
}
