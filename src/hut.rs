// SPDX-License-Identifier: MIT

//! Conversions from the [`hut`] crate's usage tables.
//!
//! The builtin [`UsageRegistry`](crate::UsageRegistry) only carries the
//! pages needed to classify report values. Callers that already use
//! [`hut`] for naming can convert its usages into this crate's types:
//!
//! ```
//! # use hiddecode::*;
//! let usage = Usage::from_hut(&::hut::GenericDesktop::X);
//! assert_eq!(usage, Usage::new(0x01, 0x30));
//! ```

use crate::types::*;

impl Usage {
    /// Convert any [`hut::AsUsage`] into a [`Usage`].
    pub fn from_hut(usage: &impl ::hut::AsUsage) -> Self {
        Usage::from(usage.usage_value())
    }
}

impl UsagePage {
    /// Convert any [`hut::AsUsagePage`] into a [`UsagePage`].
    pub fn from_hut(page: &impl ::hut::AsUsagePage) -> Self {
        UsagePage(page.usage_page_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_from_hut() {
        let usage = Usage::from_hut(&::hut::GenericDesktop::Y);
        assert_eq!(usage.usage_page, UsagePage(0x01));
        assert_eq!(usage.usage_id, UsageId(0x31));
        assert_eq!(format!("{usage}"), "Generic Desktop / Y");
    }

    #[test]
    fn page_from_hut() {
        assert_eq!(
            UsagePage::from_hut(&::hut::UsagePage::GenericDesktop),
            UsagePage(0x01)
        );
        assert_eq!(UsagePage::from_hut(&::hut::UsagePage::Button), UsagePage(0x09));
    }
}
