// SPDX-License-Identifier: MIT

//! A static lookup of Usage Pages and Usages, see the
//! [HID Usage Tables](https://usb.org/document-library/hid-usage-tables-15).
//!
//! The registry is a tree of [UsageTable]s. The root table is keyed by
//! Usage Page, each page entry may carry a table of Usages keyed by Usage ID,
//! and each Usage entry may carry its [UsageType]s. Keys are either a single
//! value or an inclusive range. Entries of one table must not overlap;
//! this is checked once when a [UsageRegistry] is created.
//!
//! The built-in tables only cover the pages needed to classify common
//! controls. Anything not listed results in a [RegistryError].

use crate::types::{Usage, UsagePage};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown usage page {0:#06x}")]
    PageNotFound(u16),
    #[error("Unknown usage {0:#010x}")]
    UsageNotFound(u32),
    #[error("Usage {0:#010x} has no usage types")]
    NoClassification(u32),
    #[error("Overlapping entries {first:#x} and {second:#x} in table {table}")]
    Overlap {
        table: &'static str,
        first: u32,
        second: u32,
    },
}

/// Usage Types, see HID Usage Tables Section 3.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageType {
    // controls
    LinearControl,
    OnOffControl,
    MomentaryControl,
    OneShotControl,
    ReTriggerControl,
    // data
    Selector,
    StaticValue,
    StaticFlag,
    DynamicFlag,
    DynamicValue,
    // collections
    NamedArray,
    CollectionApplication,
    CollectionLogical,
    CollectionPhysical,
    UsageSwitch,
    UsageModifier,
}

impl UsageType {
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            UsageType::LinearControl
                | UsageType::OnOffControl
                | UsageType::MomentaryControl
                | UsageType::OneShotControl
                | UsageType::ReTriggerControl
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(
            self,
            UsageType::Selector
                | UsageType::StaticValue
                | UsageType::StaticFlag
                | UsageType::DynamicFlag
                | UsageType::DynamicValue
        )
    }

    pub fn is_collection(&self) -> bool {
        !self.is_control() && !self.is_data()
    }
}

/// The key of an [Entry].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Single(u16),
    Range(u16, u16),
}

impl Key {
    pub fn bounds(&self) -> (u16, u16) {
        match self {
            Key::Single(v) => (*v, *v),
            Key::Range(min, max) => (*min, *max),
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&value)
    }
}

/// The optional classification hanging off an [Entry]: a nested table
/// (for Usage Pages) or the list of [UsageType]s (for Usages).
#[derive(Debug)]
pub enum Sub {
    Table(&'static UsageTable),
    Types(&'static [UsageType]),
}

#[derive(Debug)]
pub struct Entry {
    pub key: Key,
    pub label: &'static str,
    /// If set, the label of a value is generated as `label` followed by
    /// `value - min + n`, e.g. "Button 3".
    pub numbered: Option<u16>,
    pub sub: Option<Sub>,
}

#[derive(Debug)]
pub struct UsageTable {
    pub name: &'static str,
    pub entries: &'static [Entry],
}

impl UsageTable {
    pub fn find(&self, value: u16) -> Option<&'static Entry> {
        self.entries.iter().find(|e| e.key.contains(value))
    }

    fn validate(&'static self) -> Result<(), RegistryError> {
        for (i, a) in self.entries.iter().enumerate() {
            let (amin, amax) = a.key.bounds();
            if let Some(b) = self.entries[i + 1..].iter().find(|b| {
                let (bmin, bmax) = b.key.bounds();
                amin <= bmax && bmin <= amax
            }) {
                return Err(RegistryError::Overlap {
                    table: self.name,
                    first: amin as u32,
                    second: b.key.bounds().0 as u32,
                });
            }
            if let Some(Sub::Table(table)) = a.sub {
                table.validate()?;
            }
        }
        Ok(())
    }
}

/// Usage Page and Usage lookup.
///
/// ```
/// # use hiddecode::*;
/// let registry = UsageRegistry::builtin();
/// assert_eq!(registry.page_label(UsagePage(0x09)).unwrap(), "Button");
/// assert_eq!(registry.usage_label(Usage::new(0x09, 5)).unwrap(), "Button 5");
/// assert!(registry.usage_types(Usage::new(0x01, 0x30)).unwrap().contains(&UsageType::DynamicValue));
/// ```
#[derive(Debug)]
pub struct UsageRegistry {
    pages: &'static UsageTable,
}

impl UsageRegistry {
    /// Create a registry from the given root table of Usage Pages,
    /// validating that no two entries of any table overlap.
    pub fn new(pages: &'static UsageTable) -> Result<UsageRegistry, RegistryError> {
        pages.validate()?;
        Ok(UsageRegistry { pages })
    }

    /// The registry of the tables shipped with this crate.
    ///
    /// # Panics
    ///
    /// Only if the built-in tables overlap, which the crate's own tests
    /// rule out.
    pub fn builtin() -> &'static UsageRegistry {
        static BUILTIN: OnceLock<UsageRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            UsageRegistry::new(&USAGE_PAGES).expect("Built-in usage tables must not overlap")
        })
    }

    fn page_entry(&self, page: UsagePage) -> Result<&'static Entry, RegistryError> {
        self.pages
            .find(page.0)
            .ok_or(RegistryError::PageNotFound(page.0))
    }

    fn usage_entry(&self, usage: Usage) -> Result<&'static Entry, RegistryError> {
        let not_found = RegistryError::UsageNotFound(u32::from(usage));
        match self.page_entry(usage.usage_page)?.sub {
            Some(Sub::Table(table)) => table.find(usage.usage_id.0).ok_or(not_found),
            _ => Err(not_found),
        }
    }

    pub fn page_label(&self, page: UsagePage) -> Result<&'static str, RegistryError> {
        self.page_entry(page).map(|e| e.label)
    }

    pub fn usage_label(&self, usage: Usage) -> Result<String, RegistryError> {
        let entry = self.usage_entry(usage)?;
        let id = usage.usage_id.0;
        Ok(match entry.numbered {
            Some(first) => {
                let (min, _) = entry.key.bounds();
                format!("{}{}", entry.label, (id - min) as u32 + first as u32)
            }
            None => entry.label.to_string(),
        })
    }

    pub fn usage_types(&self, usage: Usage) -> Result<&'static [UsageType], RegistryError> {
        match self.usage_entry(usage)?.sub {
            Some(Sub::Types(types)) => Ok(types),
            _ => Err(RegistryError::NoClassification(u32::from(usage))),
        }
    }
}

// ---------------------- TABLES ----------------------

const LC: &[UsageType] = &[UsageType::LinearControl];
const OOC: &[UsageType] = &[UsageType::OnOffControl];
const MC: &[UsageType] = &[UsageType::MomentaryControl];
const OSC: &[UsageType] = &[UsageType::OneShotControl];
const RTC: &[UsageType] = &[UsageType::ReTriggerControl];
const SEL: &[UsageType] = &[UsageType::Selector];
const SV: &[UsageType] = &[UsageType::StaticValue];
const DV: &[UsageType] = &[UsageType::DynamicValue];
const NARY: &[UsageType] = &[UsageType::NamedArray];
const CA: &[UsageType] = &[UsageType::CollectionApplication];
const CL: &[UsageType] = &[UsageType::CollectionLogical];
const CP: &[UsageType] = &[UsageType::CollectionPhysical];
const US: &[UsageType] = &[UsageType::UsageSwitch];
const UM: &[UsageType] = &[UsageType::UsageModifier];
const BUTTON: &[UsageType] = &[
    UsageType::Selector,
    UsageType::OnOffControl,
    UsageType::MomentaryControl,
    UsageType::OneShotControl,
];

const fn usage(id: u16, label: &'static str, types: &'static [UsageType]) -> Entry {
    Entry {
        key: Key::Single(id),
        label,
        numbered: None,
        sub: Some(Sub::Types(types)),
    }
}

const fn usages(min: u16, max: u16, label: &'static str, types: &'static [UsageType]) -> Entry {
    Entry {
        key: Key::Range(min, max),
        label,
        numbered: None,
        sub: Some(Sub::Types(types)),
    }
}

const fn numbered(
    min: u16,
    max: u16,
    label: &'static str,
    first: u16,
    types: &'static [UsageType],
) -> Entry {
    Entry {
        key: Key::Range(min, max),
        label,
        numbered: Some(first),
        sub: Some(Sub::Types(types)),
    }
}

const fn page(id: u16, label: &'static str) -> Entry {
    Entry {
        key: Key::Single(id),
        label,
        numbered: None,
        sub: None,
    }
}

const fn page_with(id: u16, label: &'static str, table: &'static UsageTable) -> Entry {
    Entry {
        key: Key::Single(id),
        label,
        numbered: None,
        sub: Some(Sub::Table(table)),
    }
}

static GENERIC_DESKTOP: UsageTable = UsageTable {
    name: "Generic Desktop",
    entries: &[
        usage(0x01, "Pointer", CP),
        usage(0x02, "Mouse", CA),
        usage(0x04, "Joystick", CA),
        usage(0x05, "Game Pad", CA),
        usage(0x06, "Keyboard", CA),
        usage(0x07, "Keypad", CA),
        usage(0x08, "Multi-axis Controller", CA),
        usage(0x09, "Tablet PC System Controls", CA),
        usage(0x30, "X", DV),
        usage(0x31, "Y", DV),
        usage(0x32, "Z", DV),
        usage(0x33, "Rx", DV),
        usage(0x34, "Ry", DV),
        usage(0x35, "Rz", DV),
        usage(0x36, "Slider", DV),
        usage(0x37, "Dial", DV),
        usage(0x38, "Wheel", DV),
        usage(0x39, "Hat Switch", DV),
        usage(0x3A, "Counted Buffer", CL),
        usage(0x3B, "Byte Count", DV),
        usage(0x3C, "Motion Wakeup", OSC),
        usage(0x3D, "Start", OOC),
        usage(0x3E, "Select", OOC),
        usages(0x40, 0x46, "Vector", DV),
        usage(0x47, "Feature Notification", DV),
        usage(0x48, "Resolution Multiplier", DV),
        usage(0x80, "System Control", CA),
        usages(0x81, 0x83, "System Power", OSC),
        usages(0x84, 0x89, "System Menu", OSC),
        usages(0x8A, 0x8D, "System Menu Direction", RTC),
        usages(0x8E, 0x8F, "System Restart", OSC),
        usage(0x90, "D-pad Up", OOC),
        usage(0x91, "D-pad Down", OOC),
        usage(0x92, "D-pad Right", OOC),
        usage(0x93, "D-pad Left", OOC),
        usages(0xA0, 0xA8, "System Dock and Break", OSC),
        usages(0xB0, 0xB7, "System Display", OSC),
    ],
};

static KEYBOARD_KEYPAD: UsageTable = UsageTable {
    name: "Keyboard/Keypad",
    entries: &[
        usage(0x00, "No Event Indicated", SEL),
        usage(0x01, "Keyboard ErrorRollOver", SEL),
        usage(0x02, "Keyboard POSTFail", SEL),
        usage(0x03, "Keyboard ErrorUndefined", SEL),
        usage(0x04, "Keyboard a and A", SEL),
        usage(0x05, "Keyboard b and B", SEL),
        usage(0x06, "Keyboard c and C", SEL),
        usage(0x07, "Keyboard d and D", SEL),
        usage(0x08, "Keyboard e and E", SEL),
        usage(0x09, "Keyboard f and F", SEL),
        usage(0x0A, "Keyboard g and G", SEL),
        usage(0x0B, "Keyboard h and H", SEL),
        usage(0x0C, "Keyboard i and I", SEL),
        usage(0x0D, "Keyboard j and J", SEL),
        usage(0x0E, "Keyboard k and K", SEL),
        usage(0x0F, "Keyboard l and L", SEL),
        usage(0x10, "Keyboard m and M", SEL),
        usage(0x11, "Keyboard n and N", SEL),
        usage(0x12, "Keyboard o and O", SEL),
        usage(0x13, "Keyboard p and P", SEL),
        usage(0x14, "Keyboard q and Q", SEL),
        usage(0x15, "Keyboard r and R", SEL),
        usage(0x16, "Keyboard s and S", SEL),
        usage(0x17, "Keyboard t and T", SEL),
        usage(0x18, "Keyboard u and U", SEL),
        usage(0x19, "Keyboard v and V", SEL),
        usage(0x1A, "Keyboard w and W", SEL),
        usage(0x1B, "Keyboard x and X", SEL),
        usage(0x1C, "Keyboard y and Y", SEL),
        usage(0x1D, "Keyboard z and Z", SEL),
        numbered(0x1E, 0x26, "Keyboard ", 1, SEL),
        usage(0x27, "Keyboard 0", SEL),
        usage(0x28, "Keyboard Return (ENTER)", SEL),
        usage(0x29, "Keyboard ESCAPE", SEL),
        usage(0x2A, "Keyboard DELETE (Backspace)", SEL),
        usage(0x2B, "Keyboard Tab", SEL),
        usage(0x2C, "Keyboard Spacebar", SEL),
        usages(0x2D, 0x38, "Keyboard Punctuation", SEL),
        usage(0x39, "Keyboard Caps Lock", SEL),
        numbered(0x3A, 0x45, "Keyboard F", 1, SEL),
        usage(0x46, "Keyboard PrintScreen", SEL),
        usage(0x47, "Keyboard Scroll Lock", SEL),
        usage(0x48, "Keyboard Pause", SEL),
        usage(0x49, "Keyboard Insert", SEL),
        usage(0x4A, "Keyboard Home", SEL),
        usage(0x4B, "Keyboard PageUp", SEL),
        usage(0x4C, "Keyboard Delete Forward", SEL),
        usage(0x4D, "Keyboard End", SEL),
        usage(0x4E, "Keyboard PageDown", SEL),
        usage(0x4F, "Keyboard RightArrow", SEL),
        usage(0x50, "Keyboard LeftArrow", SEL),
        usage(0x51, "Keyboard DownArrow", SEL),
        usage(0x52, "Keyboard UpArrow", SEL),
        usage(0x53, "Keypad Num Lock and Clear", SEL),
        usages(0x54, 0x63, "Keypad Key", SEL),
        usage(0x64, "Keyboard Non-US \\ and |", SEL),
        usage(0x65, "Keyboard Application", SEL),
        usage(0x66, "Keyboard Power", SEL),
        usage(0x67, "Keypad =", SEL),
        numbered(0x68, 0x73, "Keyboard F", 13, SEL),
        usages(0x74, 0xA4, "Keyboard Extended Key", SEL),
        usages(0xB0, 0xDD, "Keypad Extended Key", SEL),
        usage(0xE0, "Keyboard LeftControl", DV),
        usage(0xE1, "Keyboard LeftShift", DV),
        usage(0xE2, "Keyboard LeftAlt", DV),
        usage(0xE3, "Keyboard Left GUI", DV),
        usage(0xE4, "Keyboard RightControl", DV),
        usage(0xE5, "Keyboard RightShift", DV),
        usage(0xE6, "Keyboard RightAlt", DV),
        usage(0xE7, "Keyboard Right GUI", DV),
    ],
};

static LED: UsageTable = UsageTable {
    name: "LED",
    entries: &[
        usage(0x01, "Num Lock", OOC),
        usage(0x02, "Caps Lock", OOC),
        usage(0x03, "Scroll Lock", OOC),
        usage(0x04, "Compose", OOC),
        usage(0x05, "Kana", OOC),
        usage(0x06, "Power", OOC),
        usage(0x07, "Shift", OOC),
        usage(0x08, "Do Not Disturb", OOC),
        usage(0x09, "Mute", OOC),
        usages(0x0A, 0x39, "Indicator", OOC),
        usage(0x3A, "Usage Selected Indicator", US),
        usage(0x3B, "Usage In Use Indicator", US),
        usage(0x3C, "Usage Multi Mode Indicator", UM),
        usages(0x3D, 0x41, "Indicator State", SEL),
        usages(0x42, 0x46, "Indicator Timing", DV),
        usage(0x47, "Usage Indicator Color", UM),
        usages(0x48, 0x4A, "Indicator Color", SEL),
        usage(0x4B, "Generic Indicator", OOC),
        usage(0x4C, "System Suspend", OOC),
        usage(0x4D, "External Power Connected", OOC),
    ],
};

static BUTTONS: UsageTable = UsageTable {
    name: "Button",
    entries: &[
        usage(0x00, "No Button Pressed", SEL),
        numbered(0x01, 0xFFFF, "Button ", 1, BUTTON),
    ],
};

static CONSUMER: UsageTable = UsageTable {
    name: "Consumer",
    entries: &[
        usage(0x01, "Consumer Control", CA),
        usage(0x02, "Numeric Key Pad", NARY),
        usage(0x03, "Programmable Buttons", NARY),
        usage(0x04, "Microphone", CA),
        usage(0x05, "Headphone", CA),
        usage(0x06, "Graphic Equalizer", CA),
        usage(0x30, "Power", OOC),
        usage(0x40, "Menu", OOC),
        usage(0xB0, "Play", OOC),
        usage(0xB1, "Pause", OOC),
        usage(0xB2, "Record", OOC),
        usage(0xB5, "Scan Next Track", OSC),
        usage(0xB6, "Scan Previous Track", OSC),
        usage(0xB7, "Stop", OSC),
        usage(0xCD, "Play/Pause", OSC),
        usage(0xE0, "Volume", LC),
        usage(0xE2, "Mute", OOC),
        usage(0xE9, "Volume Increment", RTC),
        usage(0xEA, "Volume Decrement", RTC),
        usage(0x183, "AL Consumer Control Configuration", SEL),
        usage(0x223, "AC Home", SEL),
        usage(0x224, "AC Back", SEL),
        usage(0x238, "AC Pan", LC),
    ],
};

static DIGITIZER: UsageTable = UsageTable {
    name: "Digitizer",
    entries: &[
        usage(0x01, "Digitizer", CA),
        usage(0x02, "Pen", CA),
        usage(0x04, "Touch Screen", CA),
        usage(0x05, "Touch Pad", CA),
        usage(0x20, "Stylus", CL),
        usage(0x22, "Finger", CL),
        usage(0x30, "Tip Pressure", DV),
        usage(0x32, "In Range", MC),
        usage(0x42, "Tip Switch", MC),
        usage(0x47, "Confidence", DV),
        usage(0x48, "Width", DV),
        usage(0x49, "Height", DV),
        usage(0x51, "Contact Identifier", DV),
        usage(0x54, "Contact Count", DV),
        usage(0x55, "Contact Count Maximum", SV),
    ],
};

static FIDO: UsageTable = UsageTable {
    name: "FIDO Alliance",
    entries: &[
        usage(0x01, "U2F Authenticator Device", CA),
        usage(0x20, "Input Report Data", DV),
        usage(0x21, "Output Report Data", DV),
    ],
};

static USAGE_PAGES: UsageTable = UsageTable {
    name: "Usage Pages",
    entries: &[
        page_with(0x01, "Generic Desktop", &GENERIC_DESKTOP),
        page(0x02, "Simulation Controls"),
        page(0x03, "VR Controls"),
        page(0x04, "Sport Controls"),
        page(0x05, "Game Controls"),
        page(0x06, "Generic Device Controls"),
        page_with(0x07, "Keyboard/Keypad", &KEYBOARD_KEYPAD),
        page_with(0x08, "LED", &LED),
        page_with(0x09, "Button", &BUTTONS),
        page(0x0A, "Ordinal"),
        page(0x0B, "Telephony Device"),
        page_with(0x0C, "Consumer", &CONSUMER),
        page_with(0x0D, "Digitizers", &DIGITIZER),
        page(0x0E, "Haptics"),
        page(0x0F, "Physical Input Device"),
        page(0x10, "Unicode"),
        page(0x12, "Eye and Head Trackers"),
        page(0x14, "Auxiliary Display"),
        page(0x20, "Sensors"),
        page(0x40, "Medical Instrument"),
        page(0x41, "Braille Display"),
        page(0x59, "Lighting And Illumination"),
        page(0x80, "Monitor"),
        page(0x81, "Monitor Enumerated"),
        page(0x82, "VESA Virtual Controls"),
        page(0x84, "Power"),
        page(0x85, "Battery System"),
        page(0x8C, "Barcode Scanner"),
        page(0x8D, "Scales"),
        page(0x8E, "Magnetic Stripe Reader"),
        page(0x90, "Camera Control"),
        page(0x91, "Arcade"),
        page(0x92, "Gaming Device"),
        page_with(0xF1D0, "FIDO Alliance", &FIDO),
        Entry {
            key: Key::Range(0xFF00, 0xFFFF),
            label: "Vendor Defined",
            numbered: None,
            sub: None,
        },
    ],
};
