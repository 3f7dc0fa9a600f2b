// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The OPC UA data types the engine works with. They are the decoded, in-memory forms of the
//! built-in and service types. Binary encoding is the job of the transport layer.

pub mod basic_types;
pub mod byte_string;
pub mod data_value;
pub mod date_time;
pub mod guid;
pub mod localized_text;
pub mod node_id;
pub mod node_ids;
pub mod notification_message;
pub mod qualified_name;
pub mod relative_path;
pub mod service_types;
pub mod status_code;
pub mod string;
pub mod variant;

pub use self::{
    basic_types::*, byte_string::ByteString, data_value::DataValue, date_time::*, guid::Guid,
    localized_text::LocalizedText, node_id::*, node_ids::*, notification_message::*,
    qualified_name::QualifiedName, service_types::*, status_code::StatusCode, string::UAString,
    variant::Variant,
};
