// SPDX-License-Identifier: MIT

//! Decoding of HID Reports.
//!
//! A [Decoder] applies the [Field]s of one [Report] to the bytes of a
//! HID Report and returns the value of each [Usage] present in the report.
//!
//! ```
//! # use hiddecode::*;
//! # fn decode(rdesc: &ReportDescriptor, bytes: &[u8]) -> Result<(), DecodeError> {
//! let decoder = Decoder::new()
//!     .ignore_selector(Usage::new(0x09, 0x00))
//!     .with_policy(FirstWriterWins);
//! let report = decoder.decode(rdesc, Direction::Input, bytes)?;
//! for (usage, value) in report.values.iter() {
//!     println!("{usage}: {value:?}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::bits::{self, SliceError};
use crate::fields::*;
use crate::registry::{UsageRegistry, UsageType};
use crate::types::*;
use crate::{Direction, Report, ReportDescriptor};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No report with Report ID {0}")]
    UnknownReportId(ReportId),
    #[error("Report is empty")]
    EmptyReport,
    #[error("Report descriptor has no {0} reports")]
    NoReports(Direction),
    #[error("Report is too short: {0}")]
    Slice(#[from] SliceError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    #[error("Usage {usage} is set by more than one field")]
    DuplicateUsage { usage: Usage },
}

/// The value of one [Usage] in a decoded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// A digital control, e.g. a button
    Boolean(bool),
    /// A linear control or data value, e.g. an axis
    Integer(i64),
    /// Raw values: the bytes of a variable field wider than 64 bits,
    /// or each selector seen for a vendor-defined usage in an array
    RawList(Vec<u64>),
}

impl DecodedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[u64]> {
        match self {
            DecodedValue::RawList(v) => Some(v),
            _ => None,
        }
    }
}

/// Resolves the value of a [Usage] set by more than one field of a report.
pub trait MergePolicy {
    fn merge(&self, usage: Usage, existing: DecodedValue, incoming: DecodedValue) -> DecodedValue;
}

/// The later field wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

impl MergePolicy for LastWriterWins {
    fn merge(&self, _: Usage, _: DecodedValue, incoming: DecodedValue) -> DecodedValue {
        incoming
    }
}

/// The earlier field wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstWriterWins;

impl MergePolicy for FirstWriterWins {
    fn merge(&self, _: Usage, existing: DecodedValue, _: DecodedValue) -> DecodedValue {
        existing
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedReport {
    pub report_id: Option<ReportId>,
    /// The value of each usage present in the report. Array usages not
    /// selected by any slot are absent.
    pub values: HashMap<Usage, DecodedValue>,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedReport {
    pub fn get(&self, usage: &Usage) -> Option<&DecodedValue> {
        self.values.get(usage)
    }
}

/// Returns true if a variable field with the given usage types decodes to
/// an integer: a Linear Control or any data type other than Selector.
pub fn is_integer_control(types: &[UsageType]) -> bool {
    types
        .iter()
        .any(|t| *t == UsageType::LinearControl || (t.is_data() && *t != UsageType::Selector))
}

/// Returns true for an On/Off Control with a preferred state (the No
/// Preferred bit is clear) and a logical range of exactly `-1..=1`, where
/// only a value of 1 means "on" and both 0 and -1 mean "off".
pub fn on_off_minus_one_is_false(
    types: &[UsageType],
    flags: MainItemFlags,
    logical_range: &LogicalRange,
) -> bool {
    types.contains(&UsageType::OnOffControl)
        && flags.has_preferred_state()
        && logical_range.minimum == LogicalMinimum(-1)
        && logical_range.maximum == LogicalMaximum(1)
}

/// Collects the values of one report, routing duplicates through
/// the [MergePolicy].
struct Collector<'p, P: MergePolicy> {
    policy: &'p P,
    values: HashMap<Usage, DecodedValue>,
    /// The index of the field that first set a usage
    origins: HashMap<Usage, usize>,
    warnings: Vec<DecodeWarning>,
}

impl<P: MergePolicy> Collector<'_, P> {
    fn insert(&mut self, index: usize, usage: Usage, value: DecodedValue) {
        let merged = match self.values.remove(&usage) {
            None => {
                self.origins.insert(usage, index);
                value
            }
            // Repeated selectors within the same array field
            Some(existing) if self.origins.get(&usage) == Some(&index) => match (existing, value) {
                (DecodedValue::RawList(mut list), DecodedValue::RawList(more)) => {
                    list.extend(more);
                    DecodedValue::RawList(list)
                }
                (_, value) => value,
            },
            Some(existing) => {
                tracing::warn!("Usage {usage} set by more than one field");
                self.warnings.push(DecodeWarning::DuplicateUsage { usage });
                self.policy.merge(usage, existing, value)
            }
        };
        self.values.insert(usage, merged);
    }
}

/// Decodes HID Reports, see the module documentation.
///
/// By default the Keyboard/Keypad "No Event" selector is ignored in array
/// fields, the built-in [UsageRegistry] classifies variable fields, and
/// where two fields set the same usage the later one wins.
#[derive(Debug, Clone)]
pub struct Decoder<'r, P: MergePolicy = LastWriterWins> {
    ignored_selectors: Vec<Usage>,
    registry: &'r UsageRegistry,
    policy: P,
}

impl Default for Decoder<'static, LastWriterWins> {
    fn default() -> Self {
        Decoder {
            ignored_selectors: vec![Usage::new(0x07, 0x00)],
            registry: UsageRegistry::builtin(),
            policy: LastWriterWins,
        }
    }
}

impl Decoder<'static, LastWriterWins> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'r, P: MergePolicy> Decoder<'r, P> {
    /// Ignore the given usage when an array slot selects it.
    pub fn ignore_selector(mut self, usage: Usage) -> Self {
        self.ignored_selectors.push(usage);
        self
    }

    /// Use the given registry to classify variable fields.
    pub fn with_registry(self, registry: &UsageRegistry) -> Decoder<'_, P> {
        Decoder {
            ignored_selectors: self.ignored_selectors,
            registry,
            policy: self.policy,
        }
    }

    /// Use the given policy to resolve usages set by more than one field.
    pub fn with_policy<Q: MergePolicy>(self, policy: Q) -> Decoder<'r, Q> {
        Decoder {
            ignored_selectors: self.ignored_selectors,
            registry: self.registry,
            policy,
        }
    }

    /// Decode the bytes of one report. If the report descriptor uses
    /// Report IDs for this direction, the first byte is the Report ID.
    pub fn decode(
        &self,
        rdesc: &ReportDescriptor,
        direction: Direction,
        bytes: &[u8],
    ) -> Result<DecodedReport, DecodeError> {
        let reports = rdesc.reports(direction);
        ensure!(!reports.is_empty(), DecodeError::NoReports(direction));

        let (report, body) = match reports.iter().find(|r| r.id.is_none()) {
            Some(report) => (report, bytes),
            None => {
                let (id, body) = bytes.split_first().ok_or(DecodeError::EmptyReport)?;
                let id = ReportId(*id);
                let report = reports
                    .iter()
                    .find(|r| r.id == Some(id))
                    .ok_or(DecodeError::UnknownReportId(id))?;
                (report, body)
            }
        };

        self.decode_report(report, body)
    }

    /// Decode the report body (excluding any Report ID byte) against
    /// the fields of the given report.
    pub fn decode_report(&self, report: &Report, body: &[u8]) -> Result<DecodedReport, DecodeError> {
        let mut collector = Collector {
            policy: &self.policy,
            values: HashMap::new(),
            origins: HashMap::new(),
            warnings: vec![],
        };

        for (index, field) in report.items.iter().enumerate() {
            match field {
                Field::Padding(_) => {}
                Field::Variable(v) => {
                    let value = self.decode_variable(v, body)?;
                    collector.insert(index, v.usage, value);
                }
                Field::Array(a) => {
                    for (usage, value) in self.decode_array(a, body)? {
                        collector.insert(index, usage, value);
                    }
                }
            }
        }

        Ok(DecodedReport {
            report_id: report.id,
            values: collector.values,
            warnings: collector.warnings,
        })
    }

    fn decode_variable(
        &self,
        field: &VariableField,
        body: &[u8],
    ) -> Result<DecodedValue, DecodeError> {
        let bytes = bits::slice(body, field.offset.0, field.size.0)?;
        if field.size.0 > 64 {
            return Ok(DecodedValue::RawList(
                bytes.iter().map(|b| *b as u64).collect(),
            ));
        }

        let raw = bits::le_to_u64(&bytes);
        let integer = || {
            if field.logical_range.minimum.0 < 0 {
                bits::sign_extend(raw, field.size.0)
            } else {
                raw as i64
            }
        };

        let value = match self.registry.usage_types(field.usage) {
            Ok(types) if is_integer_control(types) => DecodedValue::Integer(integer()),
            Ok(types) if on_off_minus_one_is_false(types, field.flags, &field.logical_range) => {
                DecodedValue::Boolean(raw == 1)
            }
            Ok(_) => DecodedValue::Boolean(raw != 0),
            // Unknown usages: single bits are buttons, anything wider is a value
            Err(_) if field.size.0 > 1 => DecodedValue::Integer(integer()),
            Err(_) => DecodedValue::Boolean(raw != 0),
        };
        Ok(value)
    }

    fn decode_array(
        &self,
        field: &ArrayField,
        body: &[u8],
    ) -> Result<Vec<(Usage, DecodedValue)>, DecodeError> {
        let mut values = vec![];
        for slot in 0..field.count {
            let bytes = bits::slice(body, field.slot_offset(slot).0, field.size.0)?;
            let raw = bits::le_to_u64(&bytes);
            let Ok(usage_id) = u16::try_from(raw) else {
                continue;
            };
            let usage = Usage {
                usage_page: field.usage_page,
                usage_id: UsageId(usage_id),
            };
            if self.ignored_selectors.contains(&usage) {
                continue;
            }
            if usage.is_vendor_defined() {
                values.push((usage, DecodedValue::RawList(vec![raw])));
            } else if field.usages.contains(&usage) {
                values.push((usage, DecodedValue::Boolean(true)));
            }
        }
        Ok(values)
    }
}
