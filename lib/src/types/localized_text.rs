// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `LocalizedText`.

use std::fmt;

use crate::types::string::UAString;

/// Human readable text with an optional locale identifier.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Serialize, Deserialize, Default)]
pub struct LocalizedText {
    /// The locale. Omitted from stream if null or empty
    pub locale: UAString,
    /// The text in the specified locale. Omitted from stream if null or empty.
    pub text: UAString,
}

impl<'a> From<&'a str> for LocalizedText {
    fn from(value: &'a str) -> Self {
        Self::new("", value)
    }
}

impl From<&String> for LocalizedText {
    fn from(value: &String) -> Self {
        Self::new("", value)
    }
}

impl From<String> for LocalizedText {
    fn from(value: String) -> Self {
        Self::new("", value)
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl LocalizedText {
    pub fn new<L, T>(locale: L, text: T) -> LocalizedText
    where
        L: Into<UAString>,
        T: Into<UAString>,
    {
        LocalizedText {
            locale: locale.into(),
            text: text.into(),
        }
    }

    pub fn null() -> LocalizedText {
        LocalizedText {
            locale: UAString::null(),
            text: UAString::null(),
        }
    }
}
