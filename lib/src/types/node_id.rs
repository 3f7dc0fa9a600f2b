// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `NodeId` and its `Identifier`.

use std::{
    self,
    convert::TryFrom,
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use regex::Regex;

use crate::types::{
    byte_string::ByteString,
    guid::Guid,
    node_ids::{ObjectId, ReferenceTypeId},
    status_code::StatusCode,
    string::UAString,
};

/// The kind of identifier, numeric, string, guid or byte
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(UAString),
    Guid(Guid),
    ByteString(ByteString),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", *v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={:?}", v),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

impl FromStr for Identifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = (s.get(..2).ok_or(())?, s.get(2..).ok_or(())?);
        match k {
            "i=" => v.parse::<u32>().map(Identifier::from).map_err(|_| ()),
            "s=" => Ok(Identifier::from(v)),
            "g=" => Guid::from_str(v).map(Identifier::from),
            "b=" => ByteString::from_base64(v).map(Identifier::from).ok_or(()),
            _ => Err(()),
        }
    }
}

impl From<i32> for Identifier {
    fn from(v: i32) -> Self {
        Identifier::Numeric(v as u32)
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl<'a> From<&'a str> for Identifier {
    fn from(v: &'a str) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<UAString> for Identifier {
    fn from(v: UAString) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<ByteString> for Identifier {
    fn from(v: ByteString) -> Self {
        Identifier::ByteString(v)
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(v: Vec<u8>) -> Self {
        Identifier::ByteString(ByteString::from(v))
    }
}

/// An identifier for a node in the address space. Two node ids are the same node when both the
/// namespace and the identifier are equal.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// The index for a namespace
    pub namespace: u16,
    /// The identifier for the node in the address space
    pub identifier: Identifier,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl FromStr for NodeId {
    type Err = StatusCode;

    /// Parses a node id from `ns=<namespaceindex>;<type>=<value>` where the type is one of
    /// `i` (numeric), `s` (string), `g` (guid) or `b` (base64 opaque). The `ns=0;` part may be
    /// omitted.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(ns=(?P<ns>[0-9]+);)?(?P<t>[isgb]=.+)$").unwrap();
        }

        let captures = RE.captures(s).ok_or(StatusCode::BadNodeIdInvalid)?;
        let namespace = match captures.name("ns") {
            Some(ns) => ns
                .as_str()
                .parse::<u16>()
                .map_err(|_| StatusCode::BadNodeIdInvalid)?,
            None => 0,
        };
        let t = captures.name("t").ok_or(StatusCode::BadNodeIdInvalid)?;
        Identifier::from_str(t.as_str())
            .map(|t| NodeId::new(namespace, t))
            .map_err(|_| StatusCode::BadNodeIdInvalid)
    }
}

impl From<&NodeId> for NodeId {
    fn from(v: &NodeId) -> Self {
        v.clone()
    }
}

impl<'a> From<(u16, &'a str)> for NodeId {
    fn from(v: (u16, &'a str)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, u32)> for NodeId {
    fn from(v: (u16, u32)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, ByteString)> for NodeId {
    fn from(v: (u16, ByteString)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, Guid)> for NodeId {
    fn from(v: (u16, Guid)) -> Self {
        Self::new(v.0, v.1)
    }
}

// Numeric ids handed out by next_numeric start high enough not to collide with hand picked ids.
static NEXT_NODE_ID_NUMERIC: AtomicU32 = AtomicU32::new(1000);

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl NodeId {
    /// Constructs a node id from anything that can be turned into an `Identifier`, i.e. a u32,
    /// Guid, ByteString or string.
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    pub fn root_folder_id() -> NodeId {
        ObjectId::RootFolder.into()
    }

    pub fn objects_folder_id() -> NodeId {
        ObjectId::ObjectsFolder.into()
    }

    pub fn types_folder_id() -> NodeId {
        ObjectId::TypesFolder.into()
    }

    pub fn views_folder_id() -> NodeId {
        ObjectId::ViewsFolder.into()
    }

    /// Test if the node id is null, i.e. 0 namespace and 0 identifier
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    /// Creates a numeric node id in the namespace, unique for the life of the process.
    pub fn next_numeric(namespace: u16) -> NodeId {
        NodeId::new(namespace, NEXT_NODE_ID_NUMERIC.fetch_add(1, Ordering::SeqCst))
    }

    /// Extracts an `ObjectId` from a node id, providing the node id holds one.
    pub fn as_object_id(&self) -> Result<ObjectId, StatusCode> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                ObjectId::try_from(id).map_err(|_| StatusCode::BadNodeIdInvalid)
            }
            _ => Err(StatusCode::BadNodeIdInvalid),
        }
    }

    /// Extracts a `ReferenceTypeId` from a node id, providing the node id holds one.
    pub fn as_reference_type_id(&self) -> Result<ReferenceTypeId, StatusCode> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                ReferenceTypeId::try_from(id).map_err(|_| StatusCode::BadReferenceTypeIdInvalid)
            }
            _ => Err(StatusCode::BadReferenceTypeIdInvalid),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.identifier, Identifier::Numeric(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.identifier, Identifier::String(_))
    }

    pub fn is_guid(&self) -> bool {
        matches!(self.identifier, Identifier::Guid(_))
    }

    pub fn is_byte_string(&self) -> bool {
        matches!(self.identifier, Identifier::ByteString(_))
    }
}
