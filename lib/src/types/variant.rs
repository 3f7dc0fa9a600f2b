// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `Variant`.

use std::fmt;

use crate::types::{
    byte_string::ByteString, date_time::DateTime, guid::Guid, localized_text::LocalizedText,
    node_id::NodeId, node_ids::DataTypeId, qualified_name::QualifiedName,
    status_code::StatusCode, string::UAString,
};

/// A `Variant` holds the built-in value types an attribute can hold. Larger variants are boxed to
/// keep the size of the enum down.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Empty type has no value. It is equivalent to a Null value
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(UAString),
    DateTime(Box<DateTime>),
    Guid(Box<Guid>),
    StatusCode(StatusCode),
    ByteString(ByteString),
    NodeId(Box<NodeId>),
    QualifiedName(Box<QualifiedName>),
    LocalizedText(Box<LocalizedText>),
    /// Single dimension array of values of the same type
    Array(Vec<Variant>),
}

macro_rules! from_scalar {
    ( $( $t:ty => $v:ident, )* ) => {
        $(
            impl From<$t> for Variant {
                fn from(v: $t) -> Self {
                    Variant::$v(v)
                }
            }
        )*
    };
}

from_scalar! {
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    UAString => String,
    StatusCode => StatusCode,
    ByteString => ByteString,
}

impl<'a> From<&'a str> for Variant {
    fn from(v: &'a str) -> Self {
        Variant::String(UAString::from(v))
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(UAString::from(v))
    }
}

impl From<DateTime> for Variant {
    fn from(v: DateTime) -> Self {
        Variant::DateTime(Box::new(v))
    }
}

impl From<Guid> for Variant {
    fn from(v: Guid) -> Self {
        Variant::Guid(Box::new(v))
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Variant::NodeId(Box::new(v))
    }
}

impl From<QualifiedName> for Variant {
    fn from(v: QualifiedName) -> Self {
        Variant::QualifiedName(Box::new(v))
    }
}

impl From<LocalizedText> for Variant {
    fn from(v: LocalizedText) -> Self {
        Variant::LocalizedText(Box::new(v))
    }
}

impl<T> From<Vec<T>> for Variant
where
    T: Into<Variant>,
{
    fn from(v: Vec<T>) -> Self {
        Variant::Array(v.into_iter().map(|v| v.into()).collect())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "Empty"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::SByte(v) => write!(f, "{}", v),
            Variant::Byte(v) => write!(f, "{}", v),
            Variant::Int16(v) => write!(f, "{}", v),
            Variant::UInt16(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::String(v) => write!(f, "{}", v),
            Variant::DateTime(v) => write!(f, "{}", v),
            Variant::Guid(v) => write!(f, "{}", v),
            Variant::StatusCode(v) => write!(f, "{}", v),
            Variant::ByteString(v) => write!(f, "{}", v.as_base64()),
            Variant::NodeId(v) => write!(f, "{}", v),
            Variant::QualifiedName(v) => write!(f, "{}", v),
            Variant::LocalizedText(v) => write!(f, "{}", v),
            Variant::Array(v) => {
                write!(f, "[")?;
                for (i, e) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Variant {
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Returns the value as a double for numeric variants. Used by deadband filters, which
    /// compare the magnitude of a change.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Variant::SByte(v) => Some(v as f64),
            Variant::Byte(v) => Some(v as f64),
            Variant::Int16(v) => Some(v as f64),
            Variant::UInt16(v) => Some(v as f64),
            Variant::Int32(v) => Some(v as f64),
            Variant::UInt32(v) => Some(v as f64),
            Variant::Int64(v) => Some(v as f64),
            Variant::UInt64(v) => Some(v as f64),
            Variant::Float(v) => Some(v as f64),
            Variant::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the data type of a scalar variant, or `None` for empty and array values.
    pub fn data_type(&self) -> Option<DataTypeId> {
        let data_type = match self {
            Variant::Boolean(_) => DataTypeId::Boolean,
            Variant::SByte(_) => DataTypeId::SByte,
            Variant::Byte(_) => DataTypeId::Byte,
            Variant::Int16(_) => DataTypeId::Int16,
            Variant::UInt16(_) => DataTypeId::UInt16,
            Variant::Int32(_) => DataTypeId::Int32,
            Variant::UInt32(_) => DataTypeId::UInt32,
            Variant::Int64(_) => DataTypeId::Int64,
            Variant::UInt64(_) => DataTypeId::UInt64,
            Variant::Float(_) => DataTypeId::Float,
            Variant::Double(_) => DataTypeId::Double,
            Variant::String(_) => DataTypeId::String,
            Variant::DateTime(_) => DataTypeId::DateTime,
            Variant::Guid(_) => DataTypeId::Guid,
            Variant::StatusCode(_) => DataTypeId::StatusCode,
            Variant::ByteString(_) => DataTypeId::ByteString,
            Variant::NodeId(_) => DataTypeId::NodeId,
            Variant::QualifiedName(_) => DataTypeId::QualifiedName,
            Variant::LocalizedText(_) => DataTypeId::LocalizedText,
            Variant::Empty | Variant::Array(_) => return None,
        };
        Some(data_type)
    }
}

#[test]
fn variant_as_f64() {
    assert_eq!(Variant::from(10i32).as_f64(), Some(10.0));
    assert_eq!(Variant::from(2.5f32).as_f64(), Some(2.5));
    assert_eq!(Variant::from(u64::MAX).as_f64(), Some(u64::MAX as f64));
    assert_eq!(Variant::from("x").as_f64(), None);
    assert_eq!(Variant::Empty.as_f64(), None);
    assert!(Variant::from(true).data_type() == Some(DataTypeId::Boolean));
    assert_eq!(Variant::from(vec![1u32, 2, 3]).to_string(), "[1, 2, 3]");
}
