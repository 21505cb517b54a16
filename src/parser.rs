// SPDX-License-Identifier: MIT

//! The state machine that turns a stream of [Token]s into the
//! [Report]s of a [ReportDescriptor].
//!
//! Global items (Section 6.2.2.7) update the [Globals], Local items
//! (Section 6.2.2.8) update the [Locals], and each Input, Output or
//! Feature item creates [Field]s from the current state and appends
//! them to the report for its direction and the current Report ID.
//! Local state is cleared after every Main item.

use crate::fields::*;
use crate::hid::{tokenize, GlobalTag, HidValue, ItemType, LocalTag, MainTag, Token};
use crate::registry::{UsageRegistry, UsageType};
use crate::types::*;
use crate::{
    ComplianceWarning, Direction, Encoding, ParserError, ParserOptions, Report, ReportDescriptor,
    UnsupportedFeature, Warning,
};

type Result<T> = std::result::Result<T, ParserError>;

/// Usage types that cannot describe a variable item.
const VARIABLE_INCOMPATIBLE: &[UsageType] = &[
    UsageType::Selector,
    UsageType::NamedArray,
    UsageType::CollectionApplication,
    UsageType::CollectionLogical,
    UsageType::CollectionPhysical,
    UsageType::UsageSwitch,
    UsageType::UsageModifier,
];

/// Usage types that cannot describe an array item, everything but
/// [UsageType::Selector].
const ARRAY_INCOMPATIBLE: &[UsageType] = &[
    UsageType::LinearControl,
    UsageType::OnOffControl,
    UsageType::MomentaryControl,
    UsageType::OneShotControl,
    UsageType::ReTriggerControl,
    UsageType::StaticValue,
    UsageType::StaticFlag,
    UsageType::DynamicValue,
    UsageType::DynamicFlag,
    UsageType::NamedArray,
    UsageType::CollectionApplication,
    UsageType::CollectionLogical,
    UsageType::CollectionPhysical,
    UsageType::UsageSwitch,
    UsageType::UsageModifier,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Globals {
    pub usage_page: Option<UsagePage>,
    pub logical_minimum: Option<LogicalMinimum>,
    pub logical_maximum: Option<LogicalMaximum>,
    pub physical_minimum: Option<PhysicalMinimum>,
    pub physical_maximum: Option<PhysicalMaximum>,
    pub report_size: Option<ReportSize>,
    pub report_count: Option<ReportCount>,
    pub report_id: Option<ReportId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Locals {
    /// The usages in declaration order
    pub usages: Vec<Usage>,
    /// A Usage Minimum waiting for its Usage Maximum
    pub usage_minimum: Option<HidValue>,
}

/// The parser state while walking through a report descriptor.
#[derive(Debug)]
pub struct ParserContext<'a> {
    pub globals: Globals,
    pub locals: Locals,
    /// The Push/Pop stack of [Globals]. Push and Pop are accepted
    /// but have no effect, so this stack is always empty.
    pub stack: Vec<Globals>,
    options: &'a ParserOptions,
    registry: &'static UsageRegistry,
    nusages: usize,
    nfields: usize,
}

/// Reconcile the Report Count of a variable item with its number of
/// usages. If there are more usages than controls, the Report Count
/// grows to the number of usages. If there are fewer, the last usage
/// is repeated for the remaining controls.
///
/// Either way the result is the number of [VariableField]s to create.
pub fn reconcile_report_count(report_count: usize, nusages: usize) -> usize {
    report_count.max(nusages)
}

/// Re-read a Logical or Physical Maximum as unsigned value if its minimum
/// is non-negative but the maximum would be negative when read as signed.
///
/// Many devices declare e.g. a Logical Maximum of 255 as a single byte
/// `0xff` which strictly is -1.
pub fn maximum_value(minimum: i32, maximum: &HidValue) -> i64 {
    let signed = maximum.signed() as i64;
    if minimum >= 0 && signed < 0 {
        maximum.unsigned() as i64
    } else {
        signed
    }
}

/// The usages from `minimum` to `maximum` inclusive, in ascending order,
/// all on the usage page of `minimum`.
pub fn expand_usage_range(minimum: Usage, maximum: UsageId) -> impl Iterator<Item = Usage> {
    (minimum.usage_id.0..=maximum.0).map(move |id| Usage {
        usage_page: minimum.usage_page,
        usage_id: UsageId(id),
    })
}

/// The running bit offset within one report.
struct Cursor {
    position: usize,
    offset: usize,
}

impl Cursor {
    /// Reserve `width` bits and return the offset of the reserved bits.
    fn advance(&mut self, width: usize) -> Result<BitNumber> {
        let start = self.position;
        self.position = start
            .checked_add(width)
            .ok_or(ParserError::ResourceLimitExceeded {
                offset: self.offset,
                what: "report bits",
                limit: usize::MAX,
            })?;
        Ok(BitNumber(start))
    }
}

fn warn(rdesc: &mut ReportDescriptor, warning: impl Into<Warning>) {
    let warning = warning.into();
    tracing::warn!("{warning}");
    rdesc.warnings.push(warning);
}

fn report_mut(
    rdesc: &mut ReportDescriptor,
    direction: Direction,
    id: Option<ReportId>,
) -> &mut Report {
    let reports = rdesc.reports_mut(direction);
    let idx = match reports.iter().position(|r| r.id == id) {
        Some(idx) => idx,
        None => {
            tracing::debug!("New {direction} report with ID {id:?}");
            reports.push(Report {
                id,
                size: BitNumber(0),
                items: vec![],
                direction,
            });
            reports.len() - 1
        }
    };
    &mut reports[idx]
}

impl<'a> ParserContext<'a> {
    pub fn new(options: &'a ParserOptions) -> ParserContext<'a> {
        ParserContext {
            globals: Globals::default(),
            locals: Locals::default(),
            stack: vec![],
            options,
            registry: UsageRegistry::builtin(),
            nusages: 0,
            nfields: 0,
        }
    }

    /// Process one item, updating the state and the report descriptor.
    pub fn process(&mut self, token: &Token, rdesc: &mut ReportDescriptor) -> Result<()> {
        tracing::trace!(
            "{:04x}: {} item tag {:#x} data {:?}",
            token.offset,
            token.item_type,
            token.tag,
            token.value.map(|v| v.value())
        );
        match token.item_type {
            ItemType::Main => self.main_item(token, rdesc),
            ItemType::Global => self.global_item(token, rdesc),
            ItemType::Local => self.local_item(token),
            ItemType::Long => Ok(()),
        }
    }

    fn unknown_tag(token: &Token) -> ParserError {
        ParserError::UnknownTag {
            offset: token.offset,
            item_type: token.item_type,
            tag: token.tag,
        }
    }

    fn require_data(token: &Token) -> Result<HidValue> {
        token.value.ok_or(ParserError::MissingData {
            offset: token.offset,
        })
    }

    /// Resolve the data of a Usage, Usage Minimum or Usage Maximum item.
    /// Four data bytes are an extended usage that includes the usage page,
    /// otherwise the current Usage Page applies.
    fn usage(&self, value: &HidValue, offset: usize) -> Result<Usage> {
        match value.len() {
            4 => Ok(Usage::from(value.unsigned())),
            _ => {
                let usage_page = self.globals.usage_page.ok_or(ParserError::MissingContext {
                    offset,
                    missing: "Usage Page",
                })?;
                Ok(Usage {
                    usage_page,
                    usage_id: UsageId(value.unsigned() as u16),
                })
            }
        }
    }

    fn reserve_usages(&mut self, n: usize, offset: usize) -> Result<()> {
        let limit = self.options.max_usages;
        self.nusages = self
            .nusages
            .checked_add(n)
            .filter(|total| *total <= limit)
            .ok_or(ParserError::ResourceLimitExceeded {
                offset,
                what: "usages",
                limit,
            })?;
        Ok(())
    }

    fn reserve_fields(&mut self, n: usize, offset: usize) -> Result<()> {
        let limit = self.options.max_fields;
        self.nfields = self
            .nfields
            .checked_add(n)
            .filter(|total| *total <= limit)
            .ok_or(ParserError::ResourceLimitExceeded {
                offset,
                what: "fields",
                limit,
            })?;
        Ok(())
    }

    fn global_item(&mut self, token: &Token, rdesc: &mut ReportDescriptor) -> Result<()> {
        let offset = token.offset;
        let tag = GlobalTag::try_from(token.tag).map_err(|_| Self::unknown_tag(token))?;
        let value = token.value;
        let globals = &mut self.globals;

        match tag {
            GlobalTag::UsagePage => {
                globals.usage_page = value.map(|v| UsagePage(v.unsigned() as u16));
            }
            GlobalTag::LogicalMinimum => {
                globals.logical_minimum = value.map(|v| LogicalMinimum(v.signed()));
            }
            GlobalTag::LogicalMaximum => {
                let minimum = globals.logical_minimum.unwrap_or_default().0;
                globals.logical_maximum = value.map(|v| LogicalMaximum(maximum_value(minimum, &v)));
            }
            GlobalTag::PhysicalMinimum => {
                globals.physical_minimum = value.map(|v| PhysicalMinimum(v.signed()));
            }
            GlobalTag::PhysicalMaximum => {
                let minimum = globals.physical_minimum.unwrap_or_default().0;
                globals.physical_maximum =
                    value.map(|v| PhysicalMaximum(maximum_value(minimum, &v)));
            }
            GlobalTag::ReportSize => {
                globals.report_size = value.map(|v| ReportSize(v.unsigned() as usize));
            }
            GlobalTag::ReportCount => {
                globals.report_count = value.map(|v| ReportCount(v.unsigned() as usize));
            }
            GlobalTag::ReportId => {
                let value = Self::require_data(token)?.unsigned();
                let id = u8::try_from(value)
                    .ok()
                    .filter(|id| *id != 0)
                    .ok_or(ParserError::InvalidReportId { offset, value })?;
                let unnumbered = [Direction::Input, Direction::Output, Direction::Feature]
                    .iter()
                    .any(|d| !rdesc.reports(*d).is_empty());
                ensure!(
                    globals.report_id.is_some() || !unnumbered,
                    ParserError::MixedReportIds { offset }
                );
                globals.report_id = Some(ReportId(id));
            }
            GlobalTag::Unit => warn(rdesc, UnsupportedFeature::Unit { offset }),
            GlobalTag::UnitExponent => warn(rdesc, UnsupportedFeature::UnitExponent { offset }),
            GlobalTag::Push => warn(rdesc, UnsupportedFeature::Push { offset }),
            GlobalTag::Pop => warn(rdesc, UnsupportedFeature::Pop { offset }),
        }
        Ok(())
    }

    fn local_item(&mut self, token: &Token) -> Result<()> {
        let offset = token.offset;
        let tag = LocalTag::try_from(token.tag).map_err(|_| Self::unknown_tag(token))?;

        match tag {
            LocalTag::Usage => {
                let value = Self::require_data(token)?;
                let usage = self.usage(&value, offset)?;
                self.reserve_usages(1, offset)?;
                self.locals.usages.push(usage);
            }
            LocalTag::UsageMinimum => {
                self.locals.usage_minimum = Some(Self::require_data(token)?);
            }
            LocalTag::UsageMaximum => {
                let value = Self::require_data(token)?;
                let minimum = self.locals.usage_minimum.take().ok_or(
                    ParserError::MissingContext {
                        offset,
                        missing: "Usage Minimum",
                    },
                )?;
                let minimum = self.usage(&minimum, offset)?;
                let maximum = self.usage(&value, offset)?;
                let n = (maximum.usage_id.0 as usize + 1).saturating_sub(minimum.usage_id.0 as usize);
                self.reserve_usages(n, offset)?;
                self.locals
                    .usages
                    .extend(expand_usage_range(minimum, maximum.usage_id));
            }
            // No effect on the report layout
            LocalTag::DesignatorIndex
            | LocalTag::DesignatorMinimum
            | LocalTag::DesignatorMaximum
            | LocalTag::StringIndex
            | LocalTag::StringMinimum
            | LocalTag::StringMaximum
            | LocalTag::Delimiter => {}
        }
        Ok(())
    }

    fn main_item(&mut self, token: &Token, rdesc: &mut ReportDescriptor) -> Result<()> {
        let offset = token.offset;
        let tag = MainTag::try_from(token.tag).map_err(|_| Self::unknown_tag(token))?;

        let direction = match tag {
            MainTag::Input => Direction::Input,
            MainTag::Output => Direction::Output,
            MainTag::Feature => Direction::Feature,
            // A pending Usage Minimum carries across collection boundaries
            MainTag::Collection | MainTag::EndCollection => {
                self.locals.usages.clear();
                return Ok(());
            }
        };
        let locals = std::mem::take(&mut self.locals);

        let report_size = self
            .globals
            .report_size
            .ok_or(ParserError::MissingContext {
                offset,
                missing: "Report Size",
            })?;
        let report_count = self
            .globals
            .report_count
            .ok_or(ParserError::MissingContext {
                offset,
                missing: "Report Count",
            })?;
        let flags = MainItemFlags(token.value.map(|v| v.unsigned()).unwrap_or(0));

        let report_id = self.globals.report_id;
        let position = rdesc
            .find_report(direction, report_id)
            .map_or(0, |r| r.size.0);
        let mut cursor = Cursor { position, offset };
        let mut warnings: Vec<Warning> = vec![];
        let fields = self.build_fields(
            &mut cursor,
            flags,
            report_size.0,
            report_count.0,
            locals.usages,
            &mut warnings,
        )?;

        // Zero-count items leave no trace, not even an empty report
        if !fields.is_empty() {
            let report = report_mut(rdesc, direction, report_id);
            report.size = BitNumber(cursor.position);
            report.items.extend(fields);
        }

        for warning in warnings {
            warn(rdesc, warning);
        }

        Ok(())
    }

    fn incompatible(&self, usage: &Usage, incompatible: &[UsageType]) -> bool {
        self.registry
            .usage_types(*usage)
            .is_ok_and(|types| types.iter().all(|t| incompatible.contains(t)))
    }

    /// Create the fields for one Input, Output or Feature item.
    fn build_fields(
        &mut self,
        cursor: &mut Cursor,
        flags: MainItemFlags,
        size: usize,
        count: usize,
        usages: Vec<Usage>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Field>> {
        let offset = cursor.offset;
        let globals = &self.globals;
        let logical_range = LogicalRange {
            minimum: globals.logical_minimum.unwrap_or_default(),
            maximum: globals.logical_maximum.unwrap_or_default(),
        };
        let physical_range = match (globals.physical_minimum, globals.physical_maximum) {
            (Some(minimum), Some(maximum)) => Some(PhysicalRange { minimum, maximum }),
            _ => None,
        };

        match usages.first() {
            // No usages: constant padding, one field per control
            None => {
                self.reserve_fields(count, offset)?;
                (0..count)
                    .map(|_| -> Result<Field> {
                        Ok(Field::Padding(PaddingField {
                            offset: cursor.advance(size)?,
                            size: BitNumber(size),
                        }))
                    })
                    .collect()
            }
            Some(first) if flags.is_array() => {
                let usage_page = first.usage_page;
                if let Some(other) = usages.iter().find(|u| u.usage_page != usage_page) {
                    warnings.push(
                        ComplianceWarning::MixedUsagePages {
                            offset,
                            expected: usage_page,
                            found: other.usage_page,
                        }
                        .into(),
                    );
                }
                for usage in usages.iter().filter(|u| self.incompatible(u, ARRAY_INCOMPATIBLE)) {
                    warnings.push(
                        ComplianceWarning::IncompatibleUsageType {
                            offset,
                            usage: *usage,
                            encoding: Encoding::Array,
                        }
                        .into(),
                    );
                }
                let width = size
                    .checked_mul(count)
                    .ok_or(ParserError::ResourceLimitExceeded {
                        offset,
                        what: "report bits",
                        limit: usize::MAX,
                    })?;
                self.reserve_fields(1, offset)?;
                Ok(vec![Field::Array(ArrayField {
                    offset: cursor.advance(width)?,
                    size: BitNumber(size),
                    count,
                    usage_page,
                    usages,
                    flags,
                    logical_range,
                    physical_range,
                })])
            }
            Some(_) => {
                if usages.len() != count {
                    warnings.push(
                        ComplianceWarning::UsageCountMismatch {
                            offset,
                            usages: usages.len(),
                            report_count: count,
                        }
                        .into(),
                    );
                }
                for usage in usages
                    .iter()
                    .filter(|u| self.incompatible(u, VARIABLE_INCOMPATIBLE))
                {
                    warnings.push(
                        ComplianceWarning::IncompatibleUsageType {
                            offset,
                            usage: *usage,
                            encoding: Encoding::Variable,
                        }
                        .into(),
                    );
                }
                let count = reconcile_report_count(count, usages.len());
                self.reserve_fields(count, offset)?;
                let last = usages.len() - 1;
                (0..count)
                    .map(|i| -> Result<Field> {
                        Ok(Field::Variable(VariableField {
                            offset: cursor.advance(size)?,
                            size: BitNumber(size),
                            usage: usages[i.min(last)],
                            flags,
                            logical_range,
                            physical_range,
                        }))
                    })
                    .collect()
            }
        }
    }
}

pub(crate) fn parse_report_descriptor(
    bytes: &[u8],
    options: &ParserOptions,
) -> Result<ReportDescriptor> {
    let mut rdesc = ReportDescriptor {
        data: bytes.to_vec(),
        ..Default::default()
    };
    let mut ctx = ParserContext::new(options);

    for token in tokenize(bytes) {
        ctx.process(&token?, &mut rdesc)?;
    }

    Ok(rdesc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn parse(bytes: &[u8]) -> Result<ReportDescriptor> {
        ReportDescriptor::try_from(bytes)
    }

    fn widths(rdesc: &ReportDescriptor, direction: Direction, id: Option<ReportId>) -> usize {
        rdesc
            .items(direction, id)
            .unwrap()
            .iter()
            .map(|f| f.width().0)
            .sum()
    }

    #[test]
    fn policies() {
        assert_eq!(reconcile_report_count(3, 2), 3);
        // more usages than Report Count grows the count, this is an
        // interpretation and not mandated by HID 1.11
        assert_eq!(reconcile_report_count(2, 5), 5);
        assert_eq!(reconcile_report_count(4, 4), 4);

        let ff = HidValue::new(&[0xff], true);
        assert_eq!(maximum_value(0, &ff), 255);
        assert_eq!(maximum_value(-1, &ff), -1);
        let v = HidValue::new(&[0xff, 0x7f], true);
        assert_eq!(maximum_value(0, &v), 0x7fff);
        let v = HidValue::new(&[0x00, 0x80], true);
        assert_eq!(maximum_value(0, &v), 0x8000);
    }

    #[test]
    fn usage_range_expansion() {
        let usages: Vec<Usage> = expand_usage_range(Usage::new(0x09, 1), UsageId(5)).collect();
        assert_eq!(
            usages,
            (1..=5).map(|id| Usage::new(0x09, id)).collect::<Vec<_>>()
        );
        assert_eq!(
            expand_usage_range(Usage::new(0x09, 5), UsageId(1)).count(),
            0
        );
        assert_eq!(
            expand_usage_range(Usage::new(0x09, 0), UsageId(0xffff)).count(),
            0x10000
        );
    }

    #[test]
    fn usage_minimum_maximum() {
        let bytes = [
            0x05, 0x09, // Usage Page (Button)
            0x19, 0x01, // Usage Minimum (1)
            0x29, 0x05, // Usage Maximum (5)
            0x75, 0x01, // Report Size (1)
            0x95, 0x05, // Report Count (5)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        let usages: Vec<Usage> = rdesc
            .items(Direction::Input, None)
            .unwrap()
            .iter()
            .map(|f| match f {
                Field::Variable(v) => v.usage,
                _ => panic!("Expected a variable field"),
            })
            .collect();
        assert_eq!(
            usages,
            (1..=5).map(|id| Usage::new(0x09, id)).collect::<Vec<_>>()
        );
        assert!(rdesc.warnings().is_empty());
    }

    #[test]
    fn extended_usages() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x0b, 0x01, 0x00, 0x09, 0x00, // Usage (Button 1)
            0x09, 0x30, // Usage (X)
            0x75, 0x08, // Report Size (8)
            0x95, 0x02, // Report Count (2)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        let items = rdesc.items(Direction::Input, None).unwrap();
        assert!(matches!(&items[0], Field::Variable(v) if v.usage == Usage::new(0x09, 0x01)));
        assert!(matches!(&items[1], Field::Variable(v) if v.usage == Usage::new(0x01, 0x30)));
    }

    #[test]
    fn usage_count_mismatch() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x09, 0x31, // Usage (Y)
            0x75, 0x08, // Report Size (8)
            0x95, 0x03, // Report Count (3)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(
            rdesc.warnings(),
            &[Warning::Compliance(ComplianceWarning::UsageCountMismatch {
                offset: 10,
                usages: 2,
                report_count: 3
            })]
        );
        let items = rdesc.items(Direction::Input, None).unwrap();
        assert_eq!(items.len(), 3);
        // the last usage is repeated
        assert!(matches!(&items[2], Field::Variable(v) if v.usage == Usage::new(0x01, 0x31)));
        assert_eq!(rdesc.report_size(Direction::Input, None), Some(BitNumber(24)));
    }

    #[test]
    fn more_usages_than_report_count() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x09, 0x31, // Usage (Y)
            0x09, 0x32, // Usage (Z)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(rdesc.warnings().len(), 1);
        // grows to three fields
        assert_eq!(rdesc.items(Direction::Input, None).unwrap().len(), 3);
        assert_eq!(rdesc.report_size(Direction::Input, None), Some(BitNumber(24)));
    }

    #[test]
    fn padding_and_arrays() {
        let bytes = [
            0x75, 0x01, // Report Size (1)
            0x95, 0x03, // Report Count (3)
            0x81, 0x03, // Input (Cnst,Var,Abs)
            0x05, 0x07, // Usage Page (Keyboard)
            0x19, 0x00, // Usage Minimum (0)
            0x29, 0x65, // Usage Maximum (101)
            0x15, 0x00, // Logical Minimum (0)
            0x26, 0xff, 0x00, // Logical Maximum (255)
            0x75, 0x08, // Report Size (8)
            0x95, 0x06, // Report Count (6)
            0x81, 0x00, // Input (Data,Arr,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        let items = rdesc.items(Direction::Input, None).unwrap();
        assert_eq!(items.len(), 4);
        for (i, item) in items.iter().take(3).enumerate() {
            assert_eq!(
                item,
                &Field::Padding(PaddingField {
                    offset: BitNumber(i),
                    size: BitNumber(1)
                })
            );
        }
        match &items[3] {
            Field::Array(a) => {
                assert_eq!(a.offset, BitNumber(3));
                assert_eq!(a.size, BitNumber(8));
                assert_eq!(a.count, 6);
                assert_eq!(a.usage_page, UsagePage(0x07));
                assert_eq!(a.usages.len(), 102);
                assert_eq!(a.logical_range.maximum, LogicalMaximum(255));
            }
            _ => panic!("Expected an array field"),
        }
        assert_eq!(rdesc.report_size(Direction::Input, None), Some(BitNumber(51)));
        assert_eq!(widths(&rdesc, Direction::Input, None), 51);
        assert!(rdesc.warnings().is_empty());
    }

    #[test]
    fn mixed_usage_pages_in_array() {
        let bytes = [
            0x05, 0x0c, // Usage Page (Consumer)
            0x0a, 0x23, 0x02, // Usage (AC Home)
            0x05, 0x07, // Usage Page (Keyboard)
            0x09, 0x28, // Usage (Keyboard Return)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x00, // Input (Data,Arr,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(
            rdesc.warnings(),
            &[Warning::Compliance(ComplianceWarning::MixedUsagePages {
                offset: 13,
                expected: UsagePage(0x0c),
                found: UsagePage(0x07)
            })]
        );
    }

    #[test]
    fn incompatible_usage_types() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x02, // Usage (Mouse)
            0x09, 0x30, // Usage (X)
            0x75, 0x08, // Report Size (8)
            0x95, 0x02, // Report Count (2)
            0x81, 0x02, // Input (Data,Var,Abs)
            0x09, 0x30, // Usage (X)
            0x95, 0x01, // Report Count (1)
            0x81, 0x00, // Input (Data,Arr,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(
            rdesc.warnings(),
            &[
                Warning::Compliance(ComplianceWarning::IncompatibleUsageType {
                    offset: 10,
                    usage: Usage::new(0x01, 0x02),
                    encoding: Encoding::Variable,
                }),
                Warning::Compliance(ComplianceWarning::IncompatibleUsageType {
                    offset: 16,
                    usage: Usage::new(0x01, 0x30),
                    encoding: Encoding::Array,
                })
            ]
        );
    }

    #[test]
    fn unsupported_items() {
        let bytes = [
            0x65, 0x11, // Unit (SI Lin: cm)
            0x55, 0x0e, // Unit Exponent (-2)
            0xa4, // Push
            0xb4, // Pop
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(
            rdesc.warnings(),
            &[
                Warning::Unsupported(UnsupportedFeature::Unit { offset: 0 }),
                Warning::Unsupported(UnsupportedFeature::UnitExponent { offset: 2 }),
                Warning::Unsupported(UnsupportedFeature::Push { offset: 4 }),
                Warning::Unsupported(UnsupportedFeature::Pop { offset: 5 }),
            ]
        );
    }

    #[test]
    fn report_ids() {
        let bytes = [
            0x85, 0x01, // Report ID (1)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x01, // Input (Cnst)
            0x91, 0x01, // Output (Cnst)
            0x85, 0x02, // Report ID (2)
            0x95, 0x02, // Report Count (2)
            0x81, 0x01, // Input (Cnst)
            0x85, 0x01, // Report ID (1)
            0x81, 0x01, // Input (Cnst)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(
            rdesc.report_ids(Direction::Input),
            vec![Some(ReportId(1)), Some(ReportId(2))]
        );
        assert_eq!(rdesc.report_ids(Direction::Output), vec![Some(ReportId(1))]);
        assert!(rdesc.report_ids(Direction::Feature).is_empty());
        // report 1 continues where it left off
        assert_eq!(
            rdesc.report_size(Direction::Input, Some(ReportId(1))),
            Some(BitNumber(24))
        );
        assert_eq!(
            rdesc.report_size(Direction::Input, Some(ReportId(2))),
            Some(BitNumber(16))
        );
        assert_eq!(rdesc.report_size(Direction::Input, None), None);
        let items = rdesc.items(Direction::Input, Some(ReportId(1))).unwrap();
        assert_eq!(items[1].offset(), BitNumber(8));
    }

    #[test]
    fn mixed_report_ids() {
        let bytes = [
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0xb1, 0x01, // Feature (Cnst)
            0x85, 0x01, // Report ID (1)
            0x81, 0x01, // Input (Cnst)
        ];
        let err = parse(&bytes).unwrap_err();
        assert_eq!(err, ParserError::MixedReportIds { offset: 6 });
        assert_eq!(err.kind(), ErrorKind::Compliance);
    }

    #[test]
    fn zero_count_items_create_no_report() {
        let bytes = [
            0x75, 0x08, // Report Size (8)
            0x95, 0x00, // Report Count (0)
            0x81, 0x01, // Input (Cnst)
            0x85, 0x01, // Report ID (1)
            0x95, 0x01, // Report Count (1)
            0x81, 0x01, // Input (Cnst)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(rdesc.report_ids(Direction::Input), vec![Some(ReportId(1))]);
        assert!(rdesc.find_report(Direction::Input, None).is_none());
        assert_eq!(rdesc.report_size(Direction::Input, Some(ReportId(1))), Some(BitNumber(8)));
    }

    #[test]
    fn invalid_report_ids() {
        assert_eq!(
            parse(&[0x85, 0x00]).unwrap_err(),
            ParserError::InvalidReportId {
                offset: 0,
                value: 0
            }
        );
        assert_eq!(
            parse(&[0x86, 0x00, 0x01]).unwrap_err(),
            ParserError::InvalidReportId {
                offset: 0,
                value: 256
            }
        );
        assert_eq!(
            parse(&[0x84]).unwrap_err(),
            ParserError::MissingData { offset: 0 }
        );
    }

    #[test]
    fn missing_context() {
        // Usage without Usage Page
        assert_eq!(
            parse(&[0x09, 0x01]).unwrap_err(),
            ParserError::MissingContext {
                offset: 0,
                missing: "Usage Page"
            }
        );
        // Usage Maximum without Usage Minimum
        assert_eq!(
            parse(&[0x05, 0x09, 0x29, 0x03]).unwrap_err(),
            ParserError::MissingContext {
                offset: 2,
                missing: "Usage Minimum"
            }
        );
        // Input without Report Size
        assert_eq!(
            parse(&[0x95, 0x01, 0x81, 0x02]).unwrap_err(),
            ParserError::MissingContext {
                offset: 2,
                missing: "Report Size"
            }
        );
        // Input without Report Count
        let err = parse(&[0x75, 0x01, 0x81, 0x02]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn locals_are_cleared() {
        let bytes = [
            0x05, 0x09, // Usage Page (Button)
            0x09, 0x08, // Usage (Button 8)
            0x19, 0x01, // Usage Minimum (1)
            0xa1, 0x01, // Collection (Application)
            0x29, 0x03, // Usage Maximum (3)
            0x75, 0x01, // Report Size (1)
            0x95, 0x03, // Report Count (3)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        // The collection drops Button 8 but not the Usage Minimum
        let rdesc = parse(&bytes).unwrap();
        let usages: Vec<Usage> = rdesc
            .items(Direction::Input, None)
            .unwrap()
            .iter()
            .filter_map(|f| match f {
                Field::Variable(v) => Some(v.usage),
                _ => None,
            })
            .collect();
        assert_eq!(
            usages,
            vec![Usage::new(0x09, 1), Usage::new(0x09, 2), Usage::new(0x09, 3)]
        );

        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x02, // Input (Data,Var,Abs)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        let items = rdesc.items(Direction::Input, None).unwrap();
        assert!(matches!(items[0], Field::Variable(_)));
        // no usage left for the second item
        assert!(matches!(items[1], Field::Padding(_)));
    }

    #[test]
    fn unknown_tags() {
        assert_eq!(
            parse(&[0xd4]).unwrap_err(),
            ParserError::UnknownTag {
                offset: 0,
                item_type: ItemType::Global,
                tag: 0xd
            }
        );
        assert!(matches!(
            parse(&[0x68]).unwrap_err(),
            ParserError::UnknownTag {
                item_type: ItemType::Local,
                tag: 0x6,
                ..
            }
        ));
        assert!(matches!(
            parse(&[0x00]).unwrap_err(),
            ParserError::UnknownTag {
                item_type: ItemType::Main,
                ..
            }
        ));
    }

    #[test]
    fn truncated() {
        let err = parse(&[0x05, 0x01, 0x26, 0xff]).unwrap_err();
        assert!(matches!(err, ParserError::Item(_)));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn resource_limits() {
        let options = ParserOptions {
            max_usages: 100,
            ..Default::default()
        };
        let bytes = [
            0x05, 0x09, // Usage Page (Button)
            0x19, 0x00, // Usage Minimum (0)
            0x2a, 0xff, 0xff, // Usage Maximum (65535)
        ];
        assert_eq!(
            ReportDescriptor::parse_with(&bytes, &options).unwrap_err(),
            ParserError::ResourceLimitExceeded {
                offset: 4,
                what: "usages",
                limit: 100
            }
        );

        let options = ParserOptions {
            max_fields: 10,
            ..Default::default()
        };
        let bytes = [
            0x75, 0x01, // Report Size (1)
            0x97, 0xff, 0xff, 0xff, 0xff, // Report Count (4294967295)
            0x81, 0x01, // Input (Cnst)
        ];
        let err = ReportDescriptor::parse_with(&bytes, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceLimit);
    }

    #[test]
    fn unsigned_maximum() {
        let bytes = [
            0x15, 0x00, // Logical Minimum (0)
            0x25, 0xff, // Logical Maximum (255 as unsigned)
            0x35, 0x81, // Physical Minimum (-127)
            0x45, 0x7f, // Physical Maximum (127)
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x02, // Input (Data,Var,Abs)
        ];
        let rdesc = parse(&bytes).unwrap();
        let items = rdesc.items(Direction::Input, None).unwrap();
        assert_eq!(
            items[0].logical_range(),
            Some(LogicalRange {
                minimum: LogicalMinimum(0),
                maximum: LogicalMaximum(255)
            })
        );
        match &items[0] {
            Field::Variable(v) => assert_eq!(
                v.physical_range,
                Some(PhysicalRange {
                    minimum: PhysicalMinimum(-127),
                    maximum: PhysicalMaximum(127)
                })
            ),
            _ => panic!("Expected a variable field"),
        }
    }

    #[test]
    fn long_items_are_skipped() {
        let bytes = [
            0xfe, 0x02, 0xf1, 0xaa, 0xbb, // Long item
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x81, 0x01, // Input (Cnst)
        ];
        let rdesc = parse(&bytes).unwrap();
        assert_eq!(rdesc.report_size(Direction::Input, None), Some(BitNumber(8)));
    }
}
