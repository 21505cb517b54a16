// SPDX-License-Identifier: MIT

//! A collection of standalone HID types that exist for type safety only.
//! Most of these are simple wrappers around their underlying integer data type.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

use crate::registry::{RegistryError, UsageRegistry, UsageType};

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just converts into the underlying number.
/// Use like this: `impl_fmt(Foo, u32)`.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, UsagePage, u16);
impl_fmt!(UsagePage, u16);

impl UsagePage {
    /// Returns true if this page lies in the vendor-defined range `0xFF00..=0xFFFF`
    /// (HID Usage Tables, Section 3).
    pub fn is_vendor_defined(&self) -> bool {
        self.0 >= 0xFF00
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogicalMaximum(pub i64);

impl_from!(LogicalMaximum, LogicalMaximum, i64);
impl_fmt!(LogicalMaximum, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalMaximum(pub i64);

impl_from!(PhysicalMaximum, PhysicalMaximum, i64);
impl_fmt!(PhysicalMaximum, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSize(pub usize);

impl_from!(ReportSize, ReportSize, usize);
impl_fmt!(ReportSize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub u8);

impl From<&ReportId> for ReportId {
    fn from(report_id: &ReportId) -> ReportId {
        ReportId(u8::from(report_id))
    }
}

impl_from!(ReportId, ReportId, u8);
impl_fmt!(ReportId, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCount(pub usize);

impl_from!(ReportCount, ReportCount, usize);
impl_fmt!(ReportCount, usize);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageId(pub u16);

impl_from!(UsageId, UsageId, u16);
impl_fmt!(UsageId, u16);

/// A HID Usage, the combination of a [UsagePage] and a [UsageId].
///
/// A Usage is equivalent to the 32-bit "extended usage" value
/// `usage_page << 16 | usage_id`, see Section 6.2.2.8, and converts
/// from and into that value.
///
/// ```
/// # use hiddecode::*;
/// let usage = Usage::from(0x0001_0030u32);
/// assert_eq!(usage, Usage::new(0x01, 0x30));
/// assert_eq!(u32::from(usage), 0x0001_0030);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Usage {
    pub usage_page: UsagePage,
    pub usage_id: UsageId,
}

impl Usage {
    pub fn new(usage_page: u16, usage_id: u16) -> Usage {
        Usage {
            usage_page: UsagePage(usage_page),
            usage_id: UsageId(usage_id),
        }
    }

    /// The [UsageType]s the registry lists for this usage.
    ///
    /// Fails with [RegistryError] if the registry does not know the usage
    /// or does not classify it.
    pub fn usage_types(&self, registry: &UsageRegistry) -> Result<&'static [UsageType], RegistryError> {
        registry.usage_types(*self)
    }

    pub fn is_vendor_defined(&self) -> bool {
        self.usage_page.is_vendor_defined()
    }
}

impl From<u32> for Usage {
    fn from(extended_usage: u32) -> Usage {
        Usage::new((extended_usage >> 16) as u16, (extended_usage & 0xFFFF) as u16)
    }
}

impl From<Usage> for u32 {
    fn from(usage: Usage) -> u32 {
        ((usage.usage_page.0 as u32) << 16) | usage.usage_id.0 as u32
    }
}

impl From<&Usage> for u32 {
    fn from(usage: &Usage) -> u32 {
        u32::from(*usage)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = UsageRegistry::builtin();
        match registry.page_label(self.usage_page) {
            Ok(page) => write!(f, "{page}")?,
            Err(_) => write!(f, "{:#06x}", self.usage_page.0)?,
        }
        match registry.usage_label(*self) {
            Ok(label) => write!(f, " / {label}"),
            Err(_) => write!(f, " / {:#06x}", self.usage_id.0),
        }
    }
}

/// A number of bits, typically an offset or a length within a report.
///
/// ```
/// # use hiddecode::*;
/// let n = BitNumber::from(13);
/// assert_eq!(n.byte(), 1);
/// assert_eq!(n.bit(), 5);
/// assert_eq!(format!("{n}"), "1byte 5bits");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitNumber(pub usize);

impl BitNumber {
    /// The number of full bytes.
    pub fn byte(&self) -> usize {
        self.0 / 8
    }

    /// The number of bits beyond the last full byte, so that
    /// `n.byte() * 8 + n.bit() == n`.
    pub fn bit(&self) -> usize {
        self.0 % 8
    }
}

impl_from!(BitNumber, BitNumber, usize);

impl std::ops::Add for BitNumber {
    type Output = BitNumber;

    fn add(self, other: BitNumber) -> BitNumber {
        BitNumber(self.0 + other.0)
    }
}

impl std::fmt::Display for BitNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn plural(n: usize, unit: &str) -> String {
            if n == 1 {
                format!("{n}{unit}")
            } else {
                format!("{n}{unit}s")
            }
        }
        match (self.byte(), self.bit()) {
            (0, bit) => write!(f, "{}", plural(bit, "bit")),
            (byte, 0) => write!(f, "{}", plural(byte, "byte")),
            (byte, bit) => write!(f, "{} {}", plural(byte, "byte"), plural(bit, "bit")),
        }
    }
}
