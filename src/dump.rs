// SPDX-License-Identifier: MIT

//! A human-readable listing of the items in a report descriptor.

use crate::fields::MainItemFlags;
use crate::hid::{GlobalTag, ItemType, LocalTag, MainTag, Token};
use crate::registry::UsageRegistry;
use crate::types::*;
use crate::ReportDescriptor;
use std::fmt::{self, Write};

fn collection_type(value: u32) -> &'static str {
    match value {
        0x00 => "Physical",
        0x01 => "Application",
        0x02 => "Logical",
        0x03 => "Report",
        0x04 => "Named Array",
        0x05 => "Usage Switch",
        0x06 => "Usage Modifier",
        0x80..=0xff => "Vendor Defined",
        _ => "Reserved",
    }
}

fn main_item_flags(flags: MainItemFlags) -> String {
    let mut desc = vec![
        if flags.is_constant() { "Constant" } else { "Data" },
        if flags.is_variable() { "Variable" } else { "Array" },
        if flags.is_relative() { "Relative" } else { "Absolute" },
    ];
    if flags.is_variable() {
        desc.extend([
            if flags.wraps() { "Wrap" } else { "No Wrap" },
            if flags.is_linear() { "Linear" } else { "Non Linear" },
            if flags.has_preferred_state() {
                "Preferred State"
            } else {
                "No Preferred State"
            },
            if flags.has_null_state() {
                "Null State"
            } else {
                "No Null Position"
            },
            if flags.is_buffered_bytes() {
                "Buffered Bytes"
            } else {
                "Bit Field"
            },
        ]);
    }
    desc.join(", ")
}

struct Dump<'a> {
    rdesc: &'a ReportDescriptor,
    registry: &'static UsageRegistry,
}

impl Dump<'_> {
    fn usage(&self, usage_page: Option<UsagePage>, token: &Token) -> String {
        let Some(value) = token.value else {
            return String::new();
        };
        let usage = match (value.len(), usage_page) {
            (4, _) => Usage::from(value.unsigned()),
            (_, Some(page)) => Usage {
                usage_page: page,
                usage_id: UsageId(value.unsigned() as u16),
            },
            (_, None) => return format!("{:#06x}", value.unsigned()),
        };
        match (value.len(), self.registry.usage_label(usage)) {
            (4, _) => format!("{usage}"),
            (_, Ok(label)) => label,
            (_, Err(_)) => format!("{:#06x}", usage.usage_id.0),
        }
    }
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut indent = 0usize;
        let mut usage_page: Option<UsagePage> = None;

        for token in self.rdesc.tokens().map_while(Result::ok) {
            let data = token.value.map(|v| v.value());
            let data_str = data.map(|v| v.to_string()).unwrap_or_default();
            let line = match token.item_type {
                ItemType::Main => match MainTag::try_from(token.tag) {
                    Ok(MainTag::Collection) => {
                        let s = format!(
                            "Collection ({})",
                            collection_type(data.unwrap_or(0) as u32)
                        );
                        writeln!(f, "{:indent$}{s}", "", indent = indent * 2)?;
                        indent += 1;
                        continue;
                    }
                    Ok(MainTag::EndCollection) => {
                        indent = indent.saturating_sub(1);
                        "End Collection".to_string()
                    }
                    Ok(tag) => format!(
                        "{} ({})",
                        tag.name(),
                        main_item_flags(MainItemFlags(data.unwrap_or(0) as u32))
                    ),
                    Err(tag) => format!("Unknown Main item {tag:#x}"),
                },
                ItemType::Global => match GlobalTag::try_from(token.tag) {
                    Ok(GlobalTag::UsagePage) => {
                        usage_page = token.value.map(|v| UsagePage(v.unsigned() as u16));
                        match usage_page {
                            Some(page) => match self.registry.page_label(page) {
                                Ok(label) => format!("Usage Page ({label})"),
                                Err(_) => format!("Usage Page (Unknown {:#06x})", page.0),
                            },
                            None => "Usage Page ()".to_string(),
                        }
                    }
                    Ok(tag @ (GlobalTag::Unit | GlobalTag::UnitExponent)) => {
                        let raw = token.value.map(|v| v.unsigned()).unwrap_or(0);
                        format!("{} ({raw:#06x})", tag.name())
                    }
                    Ok(GlobalTag::ReportId) => {
                        let raw = token.value.map(|v| v.unsigned()).unwrap_or(0);
                        format!("Report ID ({raw:#04x})")
                    }
                    Ok(tag) => format!("{} ({data_str})", tag.name()),
                    Err(tag) => format!("Unknown Global item {tag:#x}"),
                },
                ItemType::Local => match LocalTag::try_from(token.tag) {
                    Ok(LocalTag::Usage) => format!("Usage ({})", self.usage(usage_page, &token)),
                    Ok(tag) => format!("{} ({data_str})", tag.name()),
                    Err(tag) => format!("Unknown Local item {tag:#x}"),
                },
                ItemType::Long => format!("Long Item ({:#04x}, {} bytes)", token.tag, token.len()),
            };
            writeln!(f, "{:indent$}{line}", "", indent = indent * 2)?;
        }
        Ok(())
    }
}

impl ReportDescriptor {
    /// A human-readable listing of the items of this report descriptor,
    /// one item per line and indented by collection. The listing stops at
    /// the first malformed item.
    ///
    /// ```
    /// # use hiddecode::*;
    /// let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x05, 0x09, 0xc0];
    /// let rdesc = ReportDescriptor::try_from(&bytes[..]).unwrap();
    /// assert_eq!(
    ///     rdesc.dump(),
    ///     "Usage Page (Generic Desktop)\n\
    ///      Usage (Mouse)\n\
    ///      Collection (Application)\n  \
    ///        Usage Page (Button)\n\
    ///      End Collection\n"
    /// );
    /// ```
    pub fn dump(&self) -> String {
        let mut s = String::new();
        let dump = Dump {
            rdesc: self,
            registry: UsageRegistry::builtin(),
        };
        match write!(s, "{dump}") {
            Ok(()) => s,
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(main_item_flags(MainItemFlags(0x01)), "Constant, Array, Absolute");
        assert_eq!(
            main_item_flags(MainItemFlags(0x02)),
            "Data, Variable, Absolute, No Wrap, Linear, Preferred State, No Null Position, Bit Field"
        );
        assert_eq!(
            main_item_flags(MainItemFlags(0x06)),
            "Data, Variable, Relative, No Wrap, Linear, Preferred State, No Null Position, Bit Field"
        );
    }

    #[test]
    fn dump_mouse() {
        let bytes = [
            0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x09, 0x01, 0xa1, 0x00, 0x05, 0x09, 0x19, 0x01,
            0x29, 0x03, 0x15, 0x00, 0x25, 0x01, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02, 0x95, 0x01,
            0x75, 0x05, 0x81, 0x01, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x81, 0x25, 0x7f,
            0x75, 0x08, 0x95, 0x02, 0x81, 0x06, 0xc0, 0xc0,
        ];
        let rdesc = ReportDescriptor::try_from(&bytes[..]).unwrap();
        let dump = rdesc.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Usage Page (Generic Desktop)");
        assert_eq!(lines[1], "Usage (Mouse)");
        assert_eq!(lines[2], "Collection (Application)");
        assert_eq!(lines[3], "  Usage (Pointer)");
        assert_eq!(lines[4], "  Collection (Physical)");
        assert_eq!(lines[5], "    Usage Page (Button)");
        assert_eq!(lines[6], "    Usage Minimum (1)");
        assert_eq!(lines[9], "    Logical Maximum (1)");
        assert_eq!(lines[17], "    Usage (X)");
        assert_eq!(lines[18], "    Usage (Y)");
        assert_eq!(lines[19], "    Logical Minimum (-127)");
        assert_eq!(lines[lines.len() - 2], "  End Collection");
        assert_eq!(lines[lines.len() - 1], "End Collection");
    }

    #[test]
    fn dump_unknown_values() {
        let bytes = [
            0x06, 0x34, 0x12, // Usage Page (0x1234)
            0x09, 0x05, // Usage (5)
            0x65, 0x11, // Unit
            0x85, 0x02, // Report ID (2)
            0x0b, 0x30, 0x00, 0x01, 0x00, // Usage (Generic Desktop X)
        ];
        let rdesc = ReportDescriptor::try_from(&bytes[..]).unwrap();
        assert_eq!(
            rdesc.dump(),
            "Usage Page (Unknown 0x1234)\n\
             Usage (0x0005)\n\
             Unit (0x0011)\n\
             Report ID (0x02)\n\
             Usage (Generic Desktop / X)\n"
        );
    }
}
