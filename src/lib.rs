// SPDX-License-Identifier: MIT

//! A parser for HID Report Descriptors and a decoder for the HID Reports
//! they describe.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! A [ReportDescriptor] is built once from the descriptor bytes. Construction
//! either succeeds fully or fails with a [ParserError], there is no partially
//! parsed descriptor. Non-fatal problems are collected as [Warning]s.
//!
//! ```
//! # use hiddecode::*;
//! let bytes = [
//!     0x05, 0x01, // Usage Page (Generic Desktop)
//!     0x09, 0x02, // Usage (Mouse)
//!     0xa1, 0x01, // Collection (Application)
//!     0x05, 0x09, //   Usage Page (Button)
//!     0x19, 0x01, //   Usage Minimum (1)
//!     0x29, 0x03, //   Usage Maximum (3)
//!     0x15, 0x00, //   Logical Minimum (0)
//!     0x25, 0x01, //   Logical Maximum (1)
//!     0x75, 0x01, //   Report Size (1)
//!     0x95, 0x03, //   Report Count (3)
//!     0x81, 0x02, //   Input (Data,Var,Abs)
//!     0x75, 0x05, //   Report Size (5)
//!     0x95, 0x01, //   Report Count (1)
//!     0x81, 0x01, //   Input (Cnst,Arr,Abs)
//!     0x05, 0x01, //   Usage Page (Generic Desktop)
//!     0x09, 0x30, //   Usage (X)
//!     0x09, 0x31, //   Usage (Y)
//!     0x15, 0x81, //   Logical Minimum (-127)
//!     0x25, 0x7f, //   Logical Maximum (127)
//!     0x75, 0x08, //   Report Size (8)
//!     0x95, 0x02, //   Report Count (2)
//!     0x81, 0x06, //   Input (Data,Var,Rel)
//!     0xc0,       // End Collection
//! ];
//! let rdesc = ReportDescriptor::try_from(&bytes[..]).unwrap();
//! assert_eq!(rdesc.report_size(Direction::Input, None), Some(BitNumber(24)));
//!
//! let report = rdesc.decode(Direction::Input, &[0b101, 10, 251]).unwrap();
//! assert_eq!(report.get(&Usage::new(0x09, 1)), Some(&DecodedValue::Boolean(true)));
//! assert_eq!(report.get(&Usage::new(0x09, 2)), Some(&DecodedValue::Boolean(false)));
//! assert_eq!(report.get(&Usage::new(0x01, 0x31)), Some(&DecodedValue::Integer(-5)));
//! ```

use thiserror::Error;

/// Return early with the given error if the condition does not hold.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

pub mod bits;
pub mod decode;
mod dump;
pub mod fields;
pub mod hid;
#[cfg(feature = "hut")]
pub mod hut;
pub mod parser;
pub mod registry;
pub mod types;

pub use decode::{
    DecodeError, DecodeWarning, DecodedReport, DecodedValue, Decoder, FirstWriterWins,
    LastWriterWins, MergePolicy,
};
pub use fields::*;
pub use registry::{RegistryError, UsageRegistry, UsageType};
pub use types::*;

use hid::{HidError, ItemType, Tokens};

#[derive(Debug, Default, Clone)]
pub struct ReportDescriptor {
    data: Vec<u8>,
    input_reports: Vec<Report>,
    output_reports: Vec<Report>,
    feature_reports: Vec<Report>,
    warnings: Vec<Warning>,
}

impl ReportDescriptor {
    /// Parse the given bytes with the given [ParserOptions].
    /// [ReportDescriptor::try_from()] uses the default options.
    pub fn parse_with(bytes: &[u8], options: &ParserOptions) -> Result<ReportDescriptor> {
        parser::parse_report_descriptor(bytes, options)
    }

    /// Parse a report descriptor given as a sequence of integers, each of
    /// which must be a byte value in the range `0..=255`.
    ///
    /// ```
    /// # use hiddecode::*;
    /// assert!(ReportDescriptor::from_ints(&[0x05, 0x01, 0x09, 0x02]).is_ok());
    /// let err = ReportDescriptor::from_ints(&[0x05, 256]).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::InvalidInput);
    /// ```
    pub fn from_ints<T: Copy + Into<i64>>(values: &[T]) -> Result<ReportDescriptor> {
        let bytes = values
            .iter()
            .enumerate()
            .map(|(index, v)| {
                let value: i64 = (*v).into();
                u8::try_from(value).map_err(|_| ParserError::InvalidInput { index, value })
            })
            .collect::<Result<Vec<u8>>>()?;
        ReportDescriptor::try_from(bytes.as_slice())
    }

    /// The raw bytes this report descriptor was parsed from.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Re-tokenize the raw bytes of this report descriptor.
    pub fn tokens(&self) -> Tokens<'_> {
        hid::tokenize(&self.data)
    }

    /// The non-fatal issues found while parsing, in descriptor order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn input_reports(&self) -> &[Report] {
        &self.input_reports
    }

    pub fn output_reports(&self) -> &[Report] {
        &self.output_reports
    }

    pub fn feature_reports(&self) -> &[Report] {
        &self.feature_reports
    }

    pub fn reports(&self, direction: Direction) -> &[Report] {
        match direction {
            Direction::Input => &self.input_reports,
            Direction::Output => &self.output_reports,
            Direction::Feature => &self.feature_reports,
        }
    }

    fn reports_mut(&mut self, direction: Direction) -> &mut Vec<Report> {
        match direction {
            Direction::Input => &mut self.input_reports,
            Direction::Output => &mut self.output_reports,
            Direction::Feature => &mut self.feature_reports,
        }
    }

    /// The report IDs in use for the given direction, in the order the
    /// reports first appear in the descriptor. A report without a
    /// report ID is listed as `None`.
    pub fn report_ids(&self, direction: Direction) -> Vec<Option<ReportId>> {
        self.reports(direction).iter().map(|r| r.id).collect()
    }

    /// Find the report with the given report ID, or the report without
    /// a report ID if `id` is `None`.
    pub fn find_report(&self, direction: Direction, id: Option<ReportId>) -> Option<&Report> {
        self.reports(direction).iter().find(|r| r.id == id)
    }

    /// The fields of the given report in declaration order, which is also
    /// their order within the report.
    pub fn items(&self, direction: Direction, id: Option<ReportId>) -> Option<&[Field]> {
        self.find_report(direction, id).map(|r| r.items.as_slice())
    }

    /// The size of the given report, excluding the report ID byte.
    pub fn report_size(&self, direction: Direction, id: Option<ReportId>) -> Option<BitNumber> {
        self.find_report(direction, id).map(|r| r.size)
    }

    /// Decode the given report bytes with a default [Decoder].
    ///
    /// If this descriptor uses report IDs for the given direction, the first
    /// byte of `bytes` must be the report ID.
    pub fn decode(
        &self,
        direction: Direction,
        bytes: &[u8],
    ) -> std::result::Result<DecodedReport, DecodeError> {
        Decoder::new().decode(self, direction, bytes)
    }
}

impl TryFrom<&[u8]> for ReportDescriptor {
    type Error = ParserError;

    fn try_from(bytes: &[u8]) -> Result<ReportDescriptor> {
        ReportDescriptor::parse_with(bytes, &ParserOptions::default())
    }
}

impl TryFrom<&Vec<u8>> for ReportDescriptor {
    type Error = ParserError;

    fn try_from(bytes: &Vec<u8>) -> Result<ReportDescriptor> {
        ReportDescriptor::try_from(bytes.as_slice())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    Feature,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Input => "Input",
            Direction::Output => "Output",
            Direction::Feature => "Feature",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The report ID, if any
    pub id: Option<ReportId>,
    /// The size of this report in bits, excluding the report ID
    pub size: BitNumber,
    /// The fields present in this report
    pub items: Vec<Field>,
    /// The "direction" of this report
    pub direction: Direction,
}

/// Bounds on the work done while parsing a report descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// The maximum number of usages across the whole descriptor, including
    /// those expanded from Usage Minimum/Maximum ranges.
    pub max_usages: usize,
    /// The maximum number of fields across all reports.
    pub max_fields: usize,
}

impl Default for ParserOptions {
    fn default() -> ParserOptions {
        ParserOptions {
            max_usages: 1 << 20,
            max_fields: 1 << 20,
        }
    }
}

/// The category of a [ParserError].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The descriptor is malformed
    Structural,
    /// The descriptor violates the HID specification in a way that
    /// prevents indexing reports
    Compliance,
    /// The descriptor exceeds the bounds in [ParserOptions]
    ResourceLimit,
    /// The input is not a byte sequence
    InvalidInput,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Invalid item: {0}")]
    Item(#[from] HidError),
    #[error("Unknown {item_type} item tag {tag:#x} at offset {offset}")]
    UnknownTag {
        offset: usize,
        item_type: ItemType,
        tag: u8,
    },
    #[error("Missing {missing} for item at offset {offset}")]
    MissingContext {
        offset: usize,
        missing: &'static str,
    },
    #[error("Item at offset {offset} has no data")]
    MissingData { offset: usize },
    #[error("Invalid Report ID {value} at offset {offset}")]
    InvalidReportId { offset: usize, value: u32 },
    #[error("Report ID at offset {offset} but reports without a Report ID exist")]
    MixedReportIds { offset: usize },
    #[error("More than {limit} {what} at offset {offset}")]
    ResourceLimitExceeded {
        offset: usize,
        what: &'static str,
        limit: usize,
    },
    #[error("Value {value} at index {index} is not a byte")]
    InvalidInput { index: usize, value: i64 },
}

impl ParserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::Item(_)
            | ParserError::UnknownTag { .. }
            | ParserError::MissingContext { .. }
            | ParserError::MissingData { .. }
            | ParserError::InvalidReportId { .. } => ErrorKind::Structural,
            ParserError::MixedReportIds { .. } => ErrorKind::Compliance,
            ParserError::ResourceLimitExceeded { .. } => ErrorKind::ResourceLimit,
            ParserError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }
}

type Result<T> = std::result::Result<T, ParserError>;

/// The encoding of a data field, see Section 6.2.2.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Variable,
    Array,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Variable => write!(f, "variable"),
            Encoding::Array => write!(f, "array"),
        }
    }
}

/// A non-fatal issue found while parsing a report descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error(transparent)]
    Compliance(#[from] ComplianceWarning),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeature),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplianceWarning {
    /// A variable item declares a different number of usages than its
    /// Report Count.
    #[error("Expected {report_count} usages but got {usages} at offset {offset}")]
    UsageCountMismatch {
        offset: usize,
        usages: usize,
        report_count: usize,
    },
    /// None of the usage's types is valid for the item's encoding.
    #[error("{usage} has no usage type compatible with {encoding} items at offset {offset}")]
    IncompatibleUsageType {
        offset: usize,
        usage: Usage,
        encoding: Encoding,
    },
    /// An array item with usages from more than one usage page.
    #[error("Array item at offset {offset} mixes usage pages {expected} and {found}")]
    MixedUsagePages {
        offset: usize,
        expected: UsagePage,
        found: UsagePage,
    },
}

/// Items that are recognized but have no effect on the parsed reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFeature {
    #[error("Unit at offset {offset} is not supported")]
    Unit { offset: usize },
    #[error("Unit Exponent at offset {offset} is not supported")]
    UnitExponent { offset: usize },
    #[error("Push at offset {offset} is not supported")]
    Push { offset: usize },
    #[error("Pop at offset {offset} is not supported")]
    Pop { offset: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let err = ParserError::from(HidError::Truncated {
            offset: 0,
            expected: 1,
            available: 0,
        });
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(
            ParserError::MixedReportIds { offset: 3 }.kind(),
            ErrorKind::Compliance
        );
        assert_eq!(
            ParserError::ResourceLimitExceeded {
                offset: 3,
                what: "usages",
                limit: 1
            }
            .kind(),
            ErrorKind::ResourceLimit
        );
    }

    #[test]
    fn from_ints() {
        let rdesc = ReportDescriptor::from_ints(&[0x05u16, 0x01, 0x09, 0x02]).unwrap();
        assert_eq!(rdesc.data(), &[0x05, 0x01, 0x09, 0x02]);
        assert_eq!(rdesc.tokens().count(), 2);

        assert_eq!(
            ReportDescriptor::from_ints(&[0x05i32, -1]).unwrap_err(),
            ParserError::InvalidInput {
                index: 1,
                value: -1
            }
        );
        assert_eq!(
            ReportDescriptor::from_ints(&[0x05i64, 0x01, 300]).unwrap_err(),
            ParserError::InvalidInput {
                index: 2,
                value: 300
            }
        );
    }

    #[test]
    fn empty_descriptor() {
        let bytes: [u8; 0] = [];
        let rdesc = ReportDescriptor::try_from(&bytes[..]).unwrap();
        assert!(rdesc.input_reports().is_empty());
        assert!(rdesc.report_ids(Direction::Output).is_empty());
        assert!(rdesc.items(Direction::Feature, None).is_none());
        assert!(rdesc.warnings().is_empty());
    }

    #[test]
    fn warning_display() {
        let w = Warning::from(ComplianceWarning::UsageCountMismatch {
            offset: 4,
            usages: 2,
            report_count: 3,
        });
        assert_eq!(format!("{w}"), "Expected 3 usages but got 2 at offset 4");
        let w = Warning::from(UnsupportedFeature::Unit { offset: 7 });
        assert_eq!(format!("{w}"), "Unit at offset 7 is not supported");
    }
}
