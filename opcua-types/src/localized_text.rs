// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `LocalizedText`: a (locale, text) pair.

use crate::{binary_struct, string::UAString, UaNullable};

/// Text tagged with the locale it is written in.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct LocalizedText {
    /// BCP-47 locale, e.g. `en-US`. Null if unspecified.
    pub locale: UAString,
    /// The text itself.
    pub text: UAString,
}

impl UaNullable for LocalizedText {
    fn is_ua_null(&self) -> bool {
        self.locale.is_null() && self.text.is_null()
    }
}

impl LocalizedText {
    /// Build a localized text value.
    pub fn new(locale: impl Into<UAString>, text: impl Into<UAString>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        LocalizedText::new(UAString::null(), value)
    }
}

binary_struct!(LocalizedText {
    locale: UAString,
    text: UAString,
});
