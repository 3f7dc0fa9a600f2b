// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `ByteString`.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A sequence of octets, or null. Used for opaque node identifiers, which are written as
/// `b=<base64>` in their string form.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    pub value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Some(_) => serializer.serialize_str(&self.as_base64()),
            None => serializer.serialize_none(),
        }
    }
}

struct ByteStringVisitor;

impl<'de> de::Visitor<'de> for ByteStringVisitor {
    type Value = ByteString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a base64 encoded string value or null")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ByteString::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        ByteString::from_base64(v).ok_or_else(|| de::Error::custom("Cannot decode base64 bytestring"))
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<ByteString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(ByteStringVisitor)
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        ByteString::from(value.to_vec())
    }
}

impl ByteString {
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }

    /// Decodes a base64 string into bytes. Returns `None` if the input is not valid base64.
    pub fn from_base64(data: &str) -> Option<ByteString> {
        STANDARD.decode(data).ok().map(ByteString::from)
    }

    pub fn as_base64(&self) -> String {
        STANDARD.encode(self.as_ref())
    }
}

#[test]
fn byte_string_base64() {
    let b = ByteString::from(vec![0x10, 0x20, 0xff, 0xaa]);
    assert_eq!(b.as_base64(), "ECD/qg==");
    assert_eq!(ByteString::from_base64("ECD/qg==").unwrap(), b);
    assert!(ByteString::from_base64("not base64!").is_none());
    assert!(ByteString::null().is_null());
    assert!(ByteString::null().is_empty());
}
