// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `DataValue`.

use crate::types::{
    basic_types::TimestampsToReturn, byte_string::ByteString, date_time::DateTime, guid::Guid,
    localized_text::LocalizedText, node_id::NodeId, qualified_name::QualifiedName,
    status_code::StatusCode, string::UAString, variant::Variant,
};

/// A value with its status and the timestamps of when the source produced it and when the
/// server saw it. Every field is optional, an absent status means Good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    /// The value. BaseDataType
    /// Not present if the Value bit in the EncodingMask is False.
    pub value: Option<Variant>,
    /// The status associated with the value.
    pub status: Option<StatusCode>,
    /// The source timestamp associated with the value.
    pub source_timestamp: Option<DateTime>,
    /// The server timestamp associated with the value.
    pub server_timestamp: Option<DateTime>,
}

impl Default for DataValue {
    fn default() -> Self {
        Self::null()
    }
}

macro_rules! data_value_from {
    ( $( $t:ty, )* ) => {
        $(
            impl From<$t> for DataValue {
                fn from(v: $t) -> Self {
                    DataValue::value_only(v)
                }
            }
        )*
    };
}

data_value_from! {
    bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64,
    String, UAString, DateTime, Guid, StatusCode, ByteString,
    NodeId, QualifiedName, LocalizedText, Variant,
}

impl<'a> From<&'a str> for DataValue {
    fn from(v: &'a str) -> Self {
        DataValue::value_only(v)
    }
}

impl From<(Variant, StatusCode)> for DataValue {
    fn from(v: (Variant, StatusCode)) -> Self {
        DataValue {
            value: Some(v.0),
            status: Some(v.1),
            source_timestamp: None,
            server_timestamp: None,
        }
    }
}

impl DataValue {
    /// Creates a `DataValue` from the supplied value with nothing else.
    pub fn value_only<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        DataValue {
            value: Some(value.into()),
            status: None,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    /// Creates a `DataValue` from the supplied value with a Good status and both timestamps
    /// set to now.
    pub fn new_now<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        let now = DateTime::now();
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            server_timestamp: Some(now),
        }
    }

    /// Creates a value-less `DataValue` carrying only a status, e.g. the result of a read that
    /// failed. The server timestamp is set to now.
    pub fn from_status(status: StatusCode) -> DataValue {
        DataValue {
            value: None,
            status: Some(status),
            source_timestamp: None,
            server_timestamp: Some(DateTime::now()),
        }
    }

    /// Creates an empty DataValue
    pub fn null() -> DataValue {
        DataValue {
            value: None,
            status: None,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    /// Sets the value of the data value, updating the timestamps at the same point
    pub fn set_value<V>(&mut self, value: V, source_timestamp: &DateTime, server_timestamp: &DateTime)
    where
        V: Into<Variant>,
    {
        self.value = Some(value.into());
        self.source_timestamp = Some(*source_timestamp);
        self.server_timestamp = Some(*server_timestamp);
    }

    /// Drops the timestamps the caller did not ask for.
    pub fn trim_timestamps(&mut self, timestamps_to_return: TimestampsToReturn) {
        match timestamps_to_return {
            TimestampsToReturn::Source => self.server_timestamp = None,
            TimestampsToReturn::Server => self.source_timestamp = None,
            TimestampsToReturn::Both => {}
            TimestampsToReturn::Neither => {
                self.source_timestamp = None;
                self.server_timestamp = None;
            }
        }
    }

    /// Returns the status code or Good if there is no code on the value
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }

    /// Test if the value held by this data value is known to be good
    pub fn is_valid(&self) -> bool {
        self.status().status().is_good()
    }

    /// The value as a variant, treating an absent value as `Variant::Empty`.
    pub fn variant(&self) -> &Variant {
        const EMPTY: &Variant = &Variant::Empty;
        self.value.as_ref().unwrap_or(EMPTY)
    }
}

#[test]
fn data_value_trim_timestamps() {
    let dv = DataValue::new_now(100i32);
    assert!(dv.source_timestamp.is_some() && dv.server_timestamp.is_some());

    let mut v = dv.clone();
    v.trim_timestamps(TimestampsToReturn::Source);
    assert!(v.source_timestamp.is_some() && v.server_timestamp.is_none());

    let mut v = dv.clone();
    v.trim_timestamps(TimestampsToReturn::Server);
    assert!(v.source_timestamp.is_none() && v.server_timestamp.is_some());

    let mut v = dv.clone();
    v.trim_timestamps(TimestampsToReturn::Neither);
    assert!(v.source_timestamp.is_none() && v.server_timestamp.is_none());

    let mut v = dv.clone();
    v.trim_timestamps(TimestampsToReturn::Both);
    assert_eq!(v, dv);
}

#[test]
fn data_value_status() {
    assert_eq!(DataValue::value_only(1u8).status(), StatusCode::Good);
    let dv = DataValue::from_status(StatusCode::BadNotReadable);
    assert_eq!(dv.status(), StatusCode::BadNotReadable);
    assert!(!dv.is_valid());
    assert_eq!(*dv.variant(), Variant::Empty);
}
