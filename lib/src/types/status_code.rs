// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the `StatusCode` type. A status code is both a value carried in data (e.g. the status
//! of a `DataValue`) and the error type of every fallible engine call.

#![allow(non_upper_case_globals)]

use std::{error::Error, fmt, fmt::Formatter};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

macro_rules! status_codes {
    ( $( $name:ident = $value:expr, $description:expr; )* ) => {
        bitflags! {
            /// A 32-bit OPC UA status code. The top 16 bits hold the severity and the code
            /// itself, the bottom 16 bits hold informational flags such as `OVERFLOW`.
            pub struct StatusCode: u32 {
                /// Mask for the status code section
                const STATUS_MASK = 0xffff_0000;
                /// Mask for the bits section
                const BIT_MASK = 0x0000_ffff;

                /// Severity bits
                const IS_ERROR = 0x8000_0000;
                const IS_UNCERTAIN = 0x4000_0000;

                /// Info type bits 10:11, set when the info bits describe a data value
                const INFO_TYPE_DATA_VALUE = 0x0000_0400;
                /// Overflow bit 7, set when a monitored item queue lost values
                const OVERFLOW = 0x0000_0080;

                $( const $name = $value; )*
            }
        }

        impl StatusCode {
            /// Returns the name of the status, ignoring any bit flags.
            pub fn name(&self) -> &'static str {
                match self.status().bits() {
                    $( v if v == $value => stringify!($name), )*
                    _ => "Unrecognized status code",
                }
            }

            /// Returns a human readable description of the status, ignoring any bit flags.
            pub fn description(&self) -> &'static str {
                match self.status().bits() {
                    $( v if v == $value => $description, )*
                    _ => "Unrecognized status code",
                }
            }
        }
    };
}

status_codes! {
    Good = 0x0000_0000, "The operation succeeded.";
    UncertainLastUsableValue = 0x4090_0000, "Whatever was updating this value has stopped doing so.";
    UncertainInitialValue = 0x4092_0000, "The value is an initial value for a variable that normally receives its value from another variable.";
    BadUnexpectedError = 0x8001_0000, "An unexpected error occurred.";
    BadInternalError = 0x8002_0000, "An internal error occurred as a result of a programming or configuration error.";
    BadOutOfMemory = 0x8003_0000, "Not enough memory to complete the operation.";
    BadTimeout = 0x800A_0000, "The operation timed out.";
    BadServiceUnsupported = 0x800B_0000, "The server does not support the requested service.";
    BadShutdown = 0x800C_0000, "The operation was cancelled because the application is shutting down.";
    BadNothingToDo = 0x800F_0000, "There was nothing to do because the client passed a list of operations with no elements.";
    BadTooManyOperations = 0x8010_0000, "The request could not be processed because it specified too many operations.";
    BadUserAccessDenied = 0x801F_0000, "User does not have permission to perform the requested operation.";
    BadSessionIdInvalid = 0x8025_0000, "The session id is not valid.";
    BadSessionClosed = 0x8026_0000, "The session was closed by the client.";
    BadSubscriptionIdInvalid = 0x8028_0000, "The subscription id is not valid.";
    BadTimestampsToReturnInvalid = 0x802B_0000, "The timestamps to return parameter is invalid.";
    BadWaitingForInitialData = 0x8032_0000, "Waiting for the server to obtain values from the underlying data source.";
    BadNodeIdInvalid = 0x8033_0000, "The syntax of the node id is not valid.";
    BadNodeIdUnknown = 0x8034_0000, "The node id refers to a node that does not exist in the server address space.";
    BadAttributeIdInvalid = 0x8035_0000, "The attribute is not supported for the specified Node.";
    BadNotReadable = 0x803A_0000, "The access level does not allow reading or subscribing to the Node.";
    BadNotWritable = 0x803B_0000, "The access level does not allow writing to the Node.";
    BadOutOfRange = 0x803C_0000, "The value was out of range.";
    BadNotSupported = 0x803D_0000, "The requested operation is not supported.";
    BadNotFound = 0x803E_0000, "A requested item was not found or a search operation ended without success.";
    BadMonitoringModeInvalid = 0x8041_0000, "The monitoring mode is invalid.";
    BadMonitoredItemIdInvalid = 0x8042_0000, "The monitoring item id does not refer to a valid monitored item.";
    BadMonitoredItemFilterInvalid = 0x8043_0000, "The monitored item filter parameter is not valid.";
    BadFilterNotAllowed = 0x8045_0000, "A monitoring filter cannot be used in combination with the attribute specified.";
    BadReferenceTypeIdInvalid = 0x804C_0000, "The reference type id does not refer to a valid reference type node.";
    BadBrowseDirectionInvalid = 0x804D_0000, "The browse direction is not valid.";
    BadParentNodeIdInvalid = 0x805B_0000, "The parent node id does not to refer to a valid node.";
    BadNodeIdExists = 0x805E_0000, "The requested node id is already used by another node.";
    BadNodeClassInvalid = 0x805F_0000, "The node class is not valid.";
    BadBrowseNameInvalid = 0x8060_0000, "The browse name is invalid.";
    BadDuplicateReferenceNotAllowed = 0x8066_0000, "The reference type between the nodes is already defined.";
    BadNoMatch = 0x806F_0000, "The requested relative path cannot be resolved to a target to return.";
    BadTypeMismatch = 0x8074_0000, "The value supplied for the attribute is not of the same type as the attribute's value.";
    BadTooManySubscriptions = 0x8077_0000, "The server has reached its maximum number of subscriptions.";
    BadNoSubscription = 0x8079_0000, "There is no subscription available for this session.";
    BadSequenceNumberUnknown = 0x807A_0000, "The sequence number is unknown to the server.";
    BadMessageNotAvailable = 0x807B_0000, "The requested notification message is no longer available.";
    BadDeadbandFilterInvalid = 0x808E_0000, "The deadband filter is not valid.";
    BadInvalidArgument = 0x80AB_0000, "One or more arguments are invalid.";
    BadInvalidState = 0x80AF_0000, "The operation cannot be completed because the object is closed, uninitialized or in some other invalid state.";
    BadTooManyMonitoredItems = 0x80DB_0000, "The request could not be processed because there are too many monitored items in the subscription.";
}

// The bitflags! macro implements Debug for StatusCode but it fouls the display because status
// codes are a combination of bits and unique values.

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // Displays the StatusCode as it's name, or its name+bitflags
        let bits = self.bitflags();
        if bits.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}+{:#06x}", self.name(), bits.bits())
        }
    }
}

impl Error for StatusCode {}

impl StatusCode {
    /// Returns the bit flags of the status code, i.e. it masks out the actual status code value
    pub fn bitflags(&self) -> StatusCode {
        *self & StatusCode::BIT_MASK
    }

    /// Returns the status only, i.e. it masks out any bit flags that come with the status code
    pub fn status(&self) -> StatusCode {
        *self & StatusCode::STATUS_MASK
    }

    /// Tests if the status code is bad
    pub fn is_bad(&self) -> bool {
        self.contains(StatusCode::IS_ERROR)
    }

    /// Tests if the status code is uncertain
    pub fn is_uncertain(&self) -> bool {
        self.contains(StatusCode::IS_UNCERTAIN)
    }

    /// Tests if the status code is good (i.e. not bad or uncertain)
    pub fn is_good(&self) -> bool {
        !self.is_bad() && !self.is_uncertain()
    }

    /// Tests if the overflow bit is set, i.e. a monitored item queue discarded values before
    /// this one was delivered.
    pub fn is_overflow(&self) -> bool {
        self.contains(StatusCode::OVERFLOW)
    }

    /// Returns a copy of the status with the overflow bit (and the data value info type that
    /// must accompany it) set or cleared.
    pub fn set_overflow(self, overflow: bool) -> StatusCode {
        if overflow {
            self | StatusCode::INFO_TYPE_DATA_VALUE | StatusCode::OVERFLOW
        } else {
            self - (StatusCode::INFO_TYPE_DATA_VALUE | StatusCode::OVERFLOW)
        }
    }
}

// Serialize / Deserialize are manually implemented because bitflags! doesn't do it.

impl Serialize for StatusCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

struct StatusCodeVisitor;

impl<'de> Visitor<'de> for StatusCodeVisitor {
    type Value = u32;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an unsigned 32-bit integer")
    }

    fn visit_u32<E>(self, value: u32) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u32::try_from(value).map_err(|_| E::custom("status code out of range"))
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(StatusCode::from_bits_truncate(
            deserializer.deserialize_u32(StatusCodeVisitor)?,
        ))
    }
}

#[test]
fn status_code() {
    assert!(StatusCode::Good.is_good());
    assert!(!StatusCode::Good.is_bad());
    assert!(!StatusCode::Good.is_uncertain());

    assert!(StatusCode::UncertainLastUsableValue.is_uncertain());
    assert!(!StatusCode::UncertainLastUsableValue.is_bad());
    assert!(!StatusCode::UncertainLastUsableValue.is_good());

    assert!(StatusCode::BadNotWritable.is_bad());
    assert!(!StatusCode::BadNotWritable.is_uncertain());
    assert!(!StatusCode::BadNotWritable.is_good());

    assert_eq!(StatusCode::BadNoMatch.name(), "BadNoMatch");
    assert_eq!(format!("{}", StatusCode::BadTimeout), "BadTimeout");
}

#[test]
fn status_code_overflow() {
    let status = StatusCode::Good.set_overflow(true);
    assert!(status.is_overflow());
    assert!(status.is_good());
    assert_eq!(status.status(), StatusCode::Good);
    assert_eq!(
        status.bitflags(),
        StatusCode::OVERFLOW | StatusCode::INFO_TYPE_DATA_VALUE
    );
    assert_eq!(status.set_overflow(false), StatusCode::Good);

    let status = StatusCode::BadWaitingForInitialData.set_overflow(true);
    assert_eq!(status.status(), StatusCode::BadWaitingForInitialData);
    assert_eq!(status.name(), "BadWaitingForInitialData");
}

#[test]
fn status_code_serde() {
    let json = serde_json::to_string(&StatusCode::BadNodeIdUnknown).unwrap();
    assert_eq!(json, "2150891520");
    let status: StatusCode = serde_json::from_str(&json).unwrap();
    assert_eq!(status, StatusCode::BadNodeIdUnknown);
}
