// SPDX-License-Identifier: MIT

//! The fields a [Report](crate::Report) is made of.
//!
//! Every Input, Output or Feature item in a report descriptor results in one
//! or more [Field]s, see [ReportDescriptor](crate::ReportDescriptor). Each field
//! knows its bit offset within the report body (excluding a leading Report ID
//! byte) and its per-control width.

use crate::types::*;

/// The flags of an Input, Output or Feature item, see Section 6.2.2.5.
///
/// Bits 1 and up are only meaningful for data items (bit 0 clear).
///
/// ```
/// # use hiddecode::*;
/// let flags = MainItemFlags::from(0b0000_0010u32);
/// assert!(flags.is_data());
/// assert!(flags.is_variable());
/// assert!(flags.is_absolute());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainItemFlags(pub u32);

impl MainItemFlags {
    fn bit(&self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn is_constant(&self) -> bool {
        self.bit(0)
    }

    pub fn is_data(&self) -> bool {
        !self.is_constant()
    }

    pub fn is_variable(&self) -> bool {
        self.bit(1)
    }

    pub fn is_array(&self) -> bool {
        !self.is_variable()
    }

    pub fn is_relative(&self) -> bool {
        self.bit(2)
    }

    pub fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    pub fn wraps(&self) -> bool {
        self.bit(3)
    }

    pub fn is_linear(&self) -> bool {
        !self.bit(4)
    }

    /// Bit 5 is "No Preferred", so a clear bit means the control has a
    /// preferred state it returns to when the user stops interacting.
    pub fn has_preferred_state(&self) -> bool {
        !self.bit(5)
    }

    pub fn has_null_state(&self) -> bool {
        self.bit(6)
    }

    /// Output and Feature items only, always false for Input items.
    pub fn is_volatile(&self) -> bool {
        self.bit(7)
    }

    pub fn is_buffered_bytes(&self) -> bool {
        self.bit(8)
    }
}

impl From<u32> for MainItemFlags {
    fn from(v: u32) -> MainItemFlags {
        MainItemFlags(v)
    }
}

impl From<MainItemFlags> for u32 {
    fn from(f: MainItemFlags) -> u32 {
        f.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalRange {
    pub minimum: LogicalMinimum,
    pub maximum: LogicalMaximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalRange {
    pub minimum: PhysicalMinimum,
    pub maximum: PhysicalMaximum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Constant bits, typically used to byte-align the following field.
    Padding(PaddingField),
    /// One control bound to exactly one [Usage].
    Variable(VariableField),
    /// `count` slots, each holding a selector of one of the [Usage]s.
    Array(ArrayField),
}

impl Field {
    /// The bit offset of this field within the report body.
    pub fn offset(&self) -> BitNumber {
        match self {
            Field::Padding(f) => f.offset,
            Field::Variable(f) => f.offset,
            Field::Array(f) => f.offset,
        }
    }

    /// The width of a single control of this field.
    pub fn size(&self) -> BitNumber {
        match self {
            Field::Padding(f) => f.size,
            Field::Variable(f) => f.size,
            Field::Array(f) => f.size,
        }
    }

    /// The total number of bits this field occupies in the report.
    /// For an [ArrayField] this is the slot size times the slot count.
    pub fn width(&self) -> BitNumber {
        match self {
            Field::Array(f) => BitNumber(f.size.0 * f.count),
            _ => self.size(),
        }
    }

    /// The flags of the Main item this field was created from, if any.
    pub fn flags(&self) -> Option<MainItemFlags> {
        match self {
            Field::Padding(_) => None,
            Field::Variable(f) => Some(f.flags),
            Field::Array(f) => Some(f.flags),
        }
    }

    pub fn logical_range(&self) -> Option<LogicalRange> {
        match self {
            Field::Padding(_) => None,
            Field::Variable(f) => Some(f.logical_range),
            Field::Array(f) => Some(f.logical_range),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingField {
    pub offset: BitNumber,
    pub size: BitNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableField {
    pub offset: BitNumber,
    pub size: BitNumber,
    pub usage: Usage,
    pub flags: MainItemFlags,
    pub logical_range: LogicalRange,
    pub physical_range: Option<PhysicalRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayField {
    pub offset: BitNumber,
    /// The size of one slot
    pub size: BitNumber,
    /// The number of slots
    pub count: usize,
    /// The usage page shared by all [ArrayField::usages]
    pub usage_page: UsagePage,
    pub usages: Vec<Usage>,
    pub flags: MainItemFlags,
    pub logical_range: LogicalRange,
    pub physical_range: Option<PhysicalRange>,
}

impl ArrayField {
    /// The bit offset of slot `index`. Slots start on consecutive bytes
    /// from the field offset, whatever the [ArrayField::size].
    pub fn slot_offset(&self, index: usize) -> BitNumber {
        self.offset + BitNumber(index * 8)
    }
}
