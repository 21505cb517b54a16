// SPDX-License-Identifier: MIT

//! A tokenizer for the HID Core items. This module handles splitting
//! a report descriptor byte stream into its individual items.
//! Interpretation of the resulting [Token]s is left to the caller,
//! see [ReportDescriptor](crate::ReportDescriptor).
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Tokenizing HID Report Descriptors
//!
//! Entry point is [tokenize()]:
//!
//! ```
//! # use hiddecode::hid::*;
//! # fn parse(bytes: &[u8]) -> Result<(), HidError> {
//! for token in tokenize(bytes) {
//!     let token = token?;
//!     println!("Item at offset {:02x}", token.offset);
//!     if token.item_type == ItemType::Main {
//!         if let Ok(MainTag::Output) = MainTag::try_from(token.tag) {
//!             println!("This is an output item");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// The header byte of a Long Item, see Section 6.2.2.3.
pub const LONG_ITEM_HEADER: u8 = 0xFE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidError {
    #[error("Item at offset {offset} needs {expected} data bytes, only {available} available")]
    Truncated {
        offset: usize,
        expected: usize,
        available: usize,
    },
    #[error("Reserved item type in header {header:#04x} at offset {offset}")]
    ReservedItemType { offset: usize, header: u8 },
}

type Result<T> = std::result::Result<T, HidError>;

/// The type of a HID item, see Section 6.2.2.2.
///
/// [ItemType::Long] is a placeholder for Long Items (Section 6.2.2.3);
/// no long item tags are defined and the tokenizer only skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Main,
    Global,
    Local,
    Long,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemType::Main => "Main",
            ItemType::Global => "Global",
            ItemType::Local => "Local",
            ItemType::Long => "Long",
        };
        write!(f, "{s}")
    }
}

/// Creates an enum of item tags with a `TryFrom<u8>` that fails with the
/// unknown tag value and a `name()` as used in the HID specification.
macro_rules! impl_tags {
    ($name:ident { $($variant:ident = $value:literal => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(tag: u8) -> std::result::Result<$name, u8> {
                match tag {
                    $($value => Ok($name::$variant),)+
                    _ => Err(tag),
                }
            }
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

// Section 6.2.2.4
impl_tags!(MainTag {
    Input = 0x8 => "Input",
    Output = 0x9 => "Output",
    Collection = 0xA => "Collection",
    Feature = 0xB => "Feature",
    EndCollection = 0xC => "End Collection",
});

// Section 6.2.2.7
impl_tags!(GlobalTag {
    UsagePage = 0x0 => "Usage Page",
    LogicalMinimum = 0x1 => "Logical Minimum",
    LogicalMaximum = 0x2 => "Logical Maximum",
    PhysicalMinimum = 0x3 => "Physical Minimum",
    PhysicalMaximum = 0x4 => "Physical Maximum",
    UnitExponent = 0x5 => "Unit Exponent",
    Unit = 0x6 => "Unit",
    ReportSize = 0x7 => "Report Size",
    ReportId = 0x8 => "Report ID",
    ReportCount = 0x9 => "Report Count",
    Push = 0xA => "Push",
    Pop = 0xB => "Pop",
});

// Section 6.2.2.8
impl_tags!(LocalTag {
    Usage = 0x0 => "Usage",
    UsageMinimum = 0x1 => "Usage Minimum",
    UsageMaximum = 0x2 => "Usage Maximum",
    DesignatorIndex = 0x3 => "Designator Index",
    DesignatorMinimum = 0x4 => "Designator Minimum",
    DesignatorMaximum = 0x5 => "Designator Maximum",
    StringIndex = 0x7 => "String Index",
    StringMinimum = 0x8 => "String Minimum",
    StringMaximum = 0x9 => "String Maximum",
    Delimiter = 0xA => "Delimiter",
});

/// Returns true if the data of the given item is a two's complement
/// signed value. Only the Logical/Physical Minimum/Maximum and the
/// Unit Exponent are signed, everything else is unsigned.
pub fn is_signed(item_type: ItemType, tag: u8) -> bool {
    item_type == ItemType::Global
        && matches!(
            GlobalTag::try_from(tag),
            Ok(GlobalTag::LogicalMinimum
                | GlobalTag::LogicalMaximum
                | GlobalTag::PhysicalMinimum
                | GlobalTag::PhysicalMaximum
                | GlobalTag::UnitExponent)
        )
}

/// Represents one value extracted from a set of (LE) data bytes.
///
/// The length of the value in bytes is required to determine the
/// actual value if it is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidValue {
    value: u32,
    nbytes: usize,
    signed: bool,
}

impl HidValue {
    pub fn new(bytes: &[u8], signed: bool) -> HidValue {
        let value = bytes
            .iter()
            .take(4)
            .enumerate()
            .fold(0u32, |acc, (i, b)| acc | (*b as u32) << (8 * i));
        HidValue {
            value,
            nbytes: bytes.len().min(4),
            signed,
        }
    }

    /// The number of data bytes, 0, 1, 2 or 4.
    pub fn len(&self) -> usize {
        self.nbytes
    }

    pub fn is_empty(&self) -> bool {
        self.nbytes == 0
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The data bytes as unsigned value, regardless of signedness.
    pub fn unsigned(&self) -> u32 {
        self.value
    }

    /// The data bytes as two's complement value of [HidValue::len] bytes,
    /// regardless of signedness.
    pub fn signed(&self) -> i32 {
        match self.nbytes {
            0 => 0,
            1 => (self.value as u8 as i8) as i32,
            2 => (self.value as u16 as i16) as i32,
            _ => self.value as i32,
        }
    }

    /// The value according to the item's signedness.
    pub fn value(&self) -> i64 {
        if self.signed {
            self.signed() as i64
        } else {
            self.unsigned() as i64
        }
    }
}

impl From<&HidValue> for u32 {
    fn from(v: &HidValue) -> u32 {
        v.unsigned()
    }
}

impl From<HidValue> for u32 {
    fn from(v: HidValue) -> u32 {
        u32::from(&v)
    }
}

impl From<&HidValue> for i64 {
    fn from(v: &HidValue) -> i64 {
        v.value()
    }
}

impl From<HidValue> for i64 {
    fn from(v: HidValue) -> i64 {
        i64::from(&v)
    }
}

/// A single item in a report descriptor, as extracted but not yet
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The offset of this item in the report descriptor
    pub offset: usize,
    pub item_type: ItemType,
    /// The tag of this item as shifted-down numeric value in the range 0..15.
    /// For long items this is the 8-bit long item tag.
    pub tag: u8,
    /// The item's data. Main items without data bytes have a data value
    /// of 0, Global and Local items without data bytes have no data.
    /// Long items never have data here.
    pub value: Option<HidValue>,
    /// All bytes of this item, inclusive of the header byte.
    pub bytes: &'a [u8],
}

impl Token<'_> {
    /// The header byte of this item.
    pub fn header(&self) -> u8 {
        self.bytes[0]
    }

    /// The length of this item in bytes, inclusive of the header byte.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A lazy iterator over the [Token]s of a report descriptor, see [tokenize()].
///
/// After the first error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

/// Split the HID Report Descriptor represented by bytes into its set of
/// items. Items are extracted on demand, a truncated item at the end of the
/// descriptor only results in an error once the iterator reaches it.
///
/// ```
/// # use hiddecode::hid::*;
/// let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
/// let tokens: Vec<Token> = tokenize(&bytes).collect::<Result<_, _>>().unwrap();
/// assert_eq!(tokens.len(), 4);
/// assert_eq!(tokens[1].item_type, ItemType::Local);
/// assert_eq!(tokens[1].value.unwrap().unsigned(), 0x02);
/// ```
pub fn tokenize(bytes: &[u8]) -> Tokens<'_> {
    Tokens {
        bytes,
        offset: 0,
        failed: false,
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let result = next_token(self.bytes, self.offset);
        match &result {
            Ok(token) => self.offset += token.len(),
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

fn next_token(bytes: &[u8], offset: usize) -> Result<Token<'_>> {
    let item = &bytes[offset..];
    let header = item[0];
    let available = item.len() - 1;

    if header == LONG_ITEM_HEADER {
        // header, bDataSize, bLongItemTag, data
        ensure!(
            available >= 2,
            HidError::Truncated {
                offset,
                expected: 2,
                available,
            }
        );
        let expected = 2 + item[1] as usize;
        ensure!(
            available >= expected,
            HidError::Truncated {
                offset,
                expected,
                available,
            }
        );
        return Ok(Token {
            offset,
            item_type: ItemType::Long,
            tag: item[2],
            value: None,
            bytes: &item[..=expected],
        });
    }

    let item_type = match (header >> 2) & 0b11 {
        0 => ItemType::Main,
        1 => ItemType::Global,
        2 => ItemType::Local,
        _ => return Err(HidError::ReservedItemType { offset, header }),
    };
    let nbytes = match header & 0b11 {
        3 => 4,
        n => n as usize,
    };
    ensure!(
        available >= nbytes,
        HidError::Truncated {
            offset,
            expected: nbytes,
            available,
        }
    );

    let tag = header >> 4;
    let value = match (item_type, nbytes) {
        (ItemType::Global | ItemType::Local, 0) => None,
        _ => Some(HidValue::new(
            &item[1..=nbytes],
            is_signed(item_type, tag),
        )),
    };

    Ok(Token {
        offset,
        item_type,
        tag,
        value,
        bytes: &item[..=nbytes],
    })
}
