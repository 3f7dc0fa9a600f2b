// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Well known numeric node ids of the standard (namespace 0) address space. Only the ids that
//! the engine populates or resolves against are listed.

use std::convert::TryFrom;

use crate::types::node_id::NodeId;

macro_rules! standard_ids {
    ( $( $(#[$meta:meta])* $enum_name:ident { $( $name:ident = $value:expr, )* } )* ) => {
        $(
            $(#[$meta])*
            #[allow(non_camel_case_types)]
            #[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
            pub enum $enum_name {
                $( $name = $value, )*
            }

            impl<'a> From<&'a $enum_name> for NodeId {
                fn from(r: &'a $enum_name) -> Self {
                    NodeId::new(0, *r as u32)
                }
            }

            impl From<$enum_name> for NodeId {
                fn from(r: $enum_name) -> Self {
                    NodeId::new(0, r as u32)
                }
            }

            impl TryFrom<u32> for $enum_name {
                type Error = ();

                fn try_from(value: u32) -> Result<Self, ()> {
                    match value {
                        $( $value => Ok($enum_name::$name), )*
                        _ => Err(()),
                    }
                }
            }

            impl PartialEq<$enum_name> for NodeId {
                fn eq(&self, other: &$enum_name) -> bool {
                    *self == NodeId::from(other)
                }
            }
        )*
    };
}

standard_ids! {
    ObjectId {
        RootFolder = 84,
        ObjectsFolder = 85,
        TypesFolder = 86,
        ViewsFolder = 87,
        ObjectTypesFolder = 88,
        VariableTypesFolder = 89,
        DataTypesFolder = 90,
        ReferenceTypesFolder = 91,
        ModellingRule_Mandatory = 78,
        Server = 2253,
    }

    ObjectTypeId {
        BaseObjectType = 58,
        FolderType = 61,
        ModellingRuleType = 77,
        ServerType = 2004,
    }

    VariableTypeId {
        BaseVariableType = 62,
        BaseDataVariableType = 63,
        PropertyType = 68,
        ServerStatusType = 2138,
        BuildInfoType = 3051,
    }

    DataTypeId {
        Boolean = 1,
        SByte = 2,
        Byte = 3,
        Int16 = 4,
        UInt16 = 5,
        Int32 = 6,
        UInt32 = 7,
        Int64 = 8,
        UInt64 = 9,
        Float = 10,
        Double = 11,
        String = 12,
        DateTime = 13,
        Guid = 14,
        ByteString = 15,
        NodeId = 17,
        StatusCode = 19,
        QualifiedName = 20,
        LocalizedText = 21,
        BaseDataType = 24,
        UtcTime = 294,
        BuildInfo = 338,
        ServerState = 852,
        ServerStatusDataType = 862,
    }

    ReferenceTypeId {
        References = 31,
        NonHierarchicalReferences = 32,
        HierarchicalReferences = 33,
        HasChild = 34,
        Organizes = 35,
        HasEventSource = 36,
        HasModellingRule = 37,
        HasTypeDefinition = 40,
        Aggregates = 44,
        HasSubtype = 45,
        HasProperty = 46,
        HasComponent = 47,
        HasNotifier = 48,
    }

    VariableId {
        Server_ServerArray = 2254,
        Server_NamespaceArray = 2255,
        Server_ServerStatus = 2256,
        Server_ServerStatus_StartTime = 2257,
        Server_ServerStatus_CurrentTime = 2258,
        Server_ServerStatus_State = 2259,
        Server_ServerStatus_BuildInfo = 2260,
        Server_ServerStatus_BuildInfo_ProductName = 2261,
        Server_ServerStatus_BuildInfo_ProductUri = 2262,
        Server_ServerStatus_BuildInfo_ManufacturerName = 2263,
        Server_ServerStatus_BuildInfo_SoftwareVersion = 2264,
        Server_ServerStatus_BuildInfo_BuildNumber = 2265,
        Server_ServerStatus_BuildInfo_BuildDate = 2266,
    }
}

#[test]
fn standard_id_conversions() {
    assert_eq!(NodeId::from(ObjectId::ObjectsFolder), NodeId::new(0, 85u32));
    assert_eq!(ReferenceTypeId::try_from(47u32), Ok(ReferenceTypeId::HasComponent));
    assert!(ReferenceTypeId::try_from(85u32).is_err());
    assert!(NodeId::new(0, 35u32) == ReferenceTypeId::Organizes);
}
