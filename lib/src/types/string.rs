// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `UAString`.

use std::fmt;

/// The OPC UA String type, named `UAString` so it does not collide with the Rust `String`.
///
/// A null string is distinct from an empty string, so the value is held as an `Option<String>`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize, Default)]
pub struct UAString {
    value: Option<String>,
}

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(ref value) => write!(f, "{}", value),
            None => write!(f, "[null]"),
        }
    }
}

impl From<UAString> for String {
    fn from(value: UAString) -> Self {
        value.value.unwrap_or_default()
    }
}

impl AsRef<str> for UAString {
    fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl<'a> From<&'a str> for UAString {
    fn from(value: &'a str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<&String> for UAString {
    fn from(value: &String) -> Self {
        Self::from(value.clone())
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        UAString { value: Some(value) }
    }
}

impl PartialEq<str> for UAString {
    fn eq(&self, other: &str) -> bool {
        matches!(self.value, Some(ref v) if v == other)
    }
}

impl PartialEq<&str> for UAString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl UAString {
    pub fn value(&self) -> &Option<String> {
        &self.value
    }

    /// Returns true if the string is null or has no characters.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }

    /// Returns the length in bytes, or -1 for a null string.
    pub fn len(&self) -> isize {
        self.value.as_ref().map(|v| v.len() as isize).unwrap_or(-1)
    }

    pub fn null() -> UAString {
        UAString { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

#[test]
fn string_null_vs_empty() {
    let null = UAString::null();
    assert!(null.is_null());
    assert!(null.is_empty());
    assert_eq!(null.len(), -1);
    assert_eq!(null.as_ref(), "");
    assert_eq!(null.to_string(), "[null]");

    let empty = UAString::from("");
    assert!(!empty.is_null());
    assert!(empty.is_empty());
    assert_eq!(empty.len(), 0);
    assert_ne!(null, empty);

    let s = UAString::from("Hello");
    assert_eq!(s, "Hello");
    assert_eq!(String::from(s), "Hello");
}
