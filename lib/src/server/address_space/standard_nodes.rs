// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Populates an address space with the part of the standard (namespace 0) node set the engine
//! needs: the folder hierarchy, the reference type hierarchy, the base types and the `Server`
//! object with its status.

use crate::{server::config::ServerConfig, types::*};

use super::{accessor::AttrFnGetter, address_space::AddressSpace, builder::*};

pub(crate) fn populate(
    address_space: &mut AddressSpace,
    config: &ServerConfig,
) -> Result<(), StatusCode> {
    debug!("populating address space with the standard nodes");
    add_reference_types(address_space)?;
    add_folders(address_space)?;
    add_types(address_space)?;
    add_data_types(address_space)?;
    add_server(address_space, config)
}

fn add_reference_types(address_space: &mut AddressSpace) -> Result<(), StatusCode> {
    // References and HasSubtype come first since every other reference type is a subtype
    ReferenceTypeBuilder::new(&ReferenceTypeId::References.into(), "References", "References")
        .is_abstract(true)
        .symmetric(true)
        .insert(address_space)?;
    ReferenceTypeBuilder::new(&ReferenceTypeId::HasSubtype.into(), "HasSubtype", "HasSubtype")
        .inverse_name("SubtypeOf")
        .insert(address_space)?;

    let reference_types = [
        (ReferenceTypeId::HierarchicalReferences, "HierarchicalReferences", ReferenceTypeId::References, None),
        (ReferenceTypeId::NonHierarchicalReferences, "NonHierarchicalReferences", ReferenceTypeId::References, None),
        (ReferenceTypeId::HasChild, "HasChild", ReferenceTypeId::HierarchicalReferences, None),
        (ReferenceTypeId::Aggregates, "Aggregates", ReferenceTypeId::HasChild, None),
        (ReferenceTypeId::HasComponent, "HasComponent", ReferenceTypeId::Aggregates, Some("ComponentOf")),
        (ReferenceTypeId::HasProperty, "HasProperty", ReferenceTypeId::Aggregates, Some("PropertyOf")),
        (ReferenceTypeId::Organizes, "Organizes", ReferenceTypeId::HierarchicalReferences, Some("OrganizedBy")),
        (ReferenceTypeId::HasEventSource, "HasEventSource", ReferenceTypeId::HierarchicalReferences, Some("EventSourceOf")),
        (ReferenceTypeId::HasNotifier, "HasNotifier", ReferenceTypeId::HasEventSource, Some("NotifierOf")),
        (ReferenceTypeId::HasTypeDefinition, "HasTypeDefinition", ReferenceTypeId::NonHierarchicalReferences, Some("TypeDefinitionOf")),
        (ReferenceTypeId::HasModellingRule, "HasModellingRule", ReferenceTypeId::NonHierarchicalReferences, Some("ModellingRuleOf")),
    ];
    for (id, name, parent, inverse_name) in reference_types {
        let builder = ReferenceTypeBuilder::new(&id.into(), name, name)
            .subtype_of(parent)
            .is_abstract(inverse_name.is_none());
        let builder = match inverse_name {
            Some(inverse_name) => builder.inverse_name(inverse_name),
            None => builder,
        };
        builder.insert(address_space)?;
    }
    // HasSubtype could only be put in its place once HasChild existed
    address_space.insert_reference(
        &ReferenceTypeId::HasChild.into(),
        &ReferenceTypeId::HasSubtype.into(),
        ReferenceTypeId::HasSubtype,
    )
}

fn add_folders(address_space: &mut AddressSpace) -> Result<(), StatusCode> {
    // Folders need their type definition
    ObjectTypeBuilder::new(&ObjectTypeId::BaseObjectType.into(), "BaseObjectType", "BaseObjectType")
        .is_abstract(false)
        .insert(address_space)?;
    ObjectTypeBuilder::new(&ObjectTypeId::FolderType.into(), "FolderType", "FolderType")
        .subtype_of(ObjectTypeId::BaseObjectType)
        .insert(address_space)?;

    FolderBuilder::new(&ObjectId::RootFolder.into(), "Root", "Root").insert(address_space)?;
    for (id, name, parent) in [
        (ObjectId::ObjectsFolder, "Objects", ObjectId::RootFolder),
        (ObjectId::TypesFolder, "Types", ObjectId::RootFolder),
        (ObjectId::ViewsFolder, "Views", ObjectId::RootFolder),
        (ObjectId::ObjectTypesFolder, "ObjectTypes", ObjectId::TypesFolder),
        (ObjectId::VariableTypesFolder, "VariableTypes", ObjectId::TypesFolder),
        (ObjectId::DataTypesFolder, "DataTypes", ObjectId::TypesFolder),
        (ObjectId::ReferenceTypesFolder, "ReferenceTypes", ObjectId::TypesFolder),
    ] {
        FolderBuilder::new(&id.into(), name, name)
            .organized_by(parent)
            .insert(address_space)?;
    }

    address_space.insert_reference(
        &ObjectId::ReferenceTypesFolder.into(),
        &ReferenceTypeId::References.into(),
        ReferenceTypeId::Organizes,
    )?;
    address_space.insert_reference(
        &ObjectId::ObjectTypesFolder.into(),
        &ObjectTypeId::BaseObjectType.into(),
        ReferenceTypeId::Organizes,
    )
}

fn add_types(address_space: &mut AddressSpace) -> Result<(), StatusCode> {
    for (id, name) in [
        (ObjectTypeId::ModellingRuleType, "ModellingRuleType"),
        (ObjectTypeId::ServerType, "ServerType"),
    ] {
        ObjectTypeBuilder::new(&id.into(), name, name)
            .subtype_of(ObjectTypeId::BaseObjectType)
            .insert(address_space)?;
    }
    ObjectBuilder::new(&ObjectId::ModellingRule_Mandatory.into(), "Mandatory", "Mandatory")
        .has_type_definition(ObjectTypeId::ModellingRuleType)
        .insert(address_space)?;

    VariableTypeBuilder::new(&VariableTypeId::BaseVariableType.into(), "BaseVariableType", "BaseVariableType")
        .is_abstract(true)
        .organized_by(ObjectId::VariableTypesFolder)
        .insert(address_space)?;
    for (id, name, parent) in [
        (VariableTypeId::BaseDataVariableType, "BaseDataVariableType", VariableTypeId::BaseVariableType),
        (VariableTypeId::PropertyType, "PropertyType", VariableTypeId::BaseVariableType),
        (VariableTypeId::ServerStatusType, "ServerStatusType", VariableTypeId::BaseDataVariableType),
        (VariableTypeId::BuildInfoType, "BuildInfoType", VariableTypeId::BaseDataVariableType),
    ] {
        VariableTypeBuilder::new(&id.into(), name, name)
            .subtype_of(parent)
            .value_rank(-1)
            .insert(address_space)?;
    }
    Ok(())
}

fn add_data_types(address_space: &mut AddressSpace) -> Result<(), StatusCode> {
    DataTypeBuilder::new(&DataTypeId::BaseDataType.into(), "BaseDataType", "BaseDataType")
        .is_abstract(true)
        .organized_by(ObjectId::DataTypesFolder)
        .insert(address_space)?;
    for (id, name) in [
        (DataTypeId::Boolean, "Boolean"),
        (DataTypeId::SByte, "SByte"),
        (DataTypeId::Byte, "Byte"),
        (DataTypeId::Int16, "Int16"),
        (DataTypeId::UInt16, "UInt16"),
        (DataTypeId::Int32, "Int32"),
        (DataTypeId::UInt32, "UInt32"),
        (DataTypeId::Int64, "Int64"),
        (DataTypeId::UInt64, "UInt64"),
        (DataTypeId::Float, "Float"),
        (DataTypeId::Double, "Double"),
        (DataTypeId::String, "String"),
        (DataTypeId::DateTime, "DateTime"),
        (DataTypeId::Guid, "Guid"),
        (DataTypeId::ByteString, "ByteString"),
        (DataTypeId::NodeId, "NodeId"),
        (DataTypeId::StatusCode, "StatusCode"),
        (DataTypeId::QualifiedName, "QualifiedName"),
        (DataTypeId::LocalizedText, "LocalizedText"),
        (DataTypeId::BuildInfo, "BuildInfo"),
        (DataTypeId::ServerState, "ServerState"),
        (DataTypeId::ServerStatusDataType, "ServerStatusDataType"),
    ] {
        DataTypeBuilder::new(&id.into(), name, name)
            .subtype_of(DataTypeId::BaseDataType)
            .insert(address_space)?;
    }
    DataTypeBuilder::new(&DataTypeId::UtcTime.into(), "UtcTime", "UtcTime")
        .subtype_of(DataTypeId::DateTime)
        .insert(address_space)?;
    Ok(())
}

fn add_server(address_space: &mut AddressSpace, config: &ServerConfig) -> Result<(), StatusCode> {
    let start_time = address_space.start_time();

    ObjectBuilder::new(&ObjectId::Server.into(), "Server", "Server")
        .organized_by(ObjectId::ObjectsFolder)
        .has_type_definition(ObjectTypeId::ServerType)
        .insert(address_space)?;

    let namespaces = address_space
        .namespaces()
        .iter()
        .map(|ns| Variant::from(ns.as_str()))
        .collect::<Vec<_>>();
    for (id, name, value) in [
        (
            VariableId::Server_ServerArray,
            "ServerArray",
            Variant::Array(vec![Variant::from(config.application_uri.as_str())]),
        ),
        (
            VariableId::Server_NamespaceArray,
            "NamespaceArray",
            Variant::Array(namespaces),
        ),
    ] {
        VariableBuilder::new(&id.into(), name, name)
            .property_of(ObjectId::Server)
            .has_type_definition(VariableTypeId::PropertyType)
            .data_type(DataTypeId::String)
            .value_rank(1)
            .value(value)
            .insert(address_space)?;
    }

    let server_status: NodeId = VariableId::Server_ServerStatus.into();
    VariableBuilder::new(&server_status, "ServerStatus", "ServerStatus")
        .component_of(ObjectId::Server)
        .has_type_definition(VariableTypeId::ServerStatusType)
        .data_type(DataTypeId::ServerStatusDataType)
        .insert(address_space)?;

    VariableBuilder::new(&VariableId::Server_ServerStatus_StartTime.into(), "StartTime", "StartTime")
        .component_of(server_status.clone())
        .has_type_definition(VariableTypeId::BaseDataVariableType)
        .data_type(DataTypeId::UtcTime)
        .value(start_time)
        .insert(address_space)?;

    VariableBuilder::new(&VariableId::Server_ServerStatus_CurrentTime.into(), "CurrentTime", "CurrentTime")
        .component_of(server_status.clone())
        .has_type_definition(VariableTypeId::BaseDataVariableType)
        .data_type(DataTypeId::UtcTime)
        .value_getter(AttrFnGetter::new_boxed(|_, _| {
            Ok(Some(DataValue::new_now(DateTime::now())))
        }))
        .insert(address_space)?;

    VariableBuilder::new(&VariableId::Server_ServerStatus_State.into(), "State", "State")
        .component_of(server_status.clone())
        .has_type_definition(VariableTypeId::BaseDataVariableType)
        .data_type(DataTypeId::ServerState)
        .value(ServerState::Running as i32)
        .insert(address_space)?;

    let build_info: NodeId = VariableId::Server_ServerStatus_BuildInfo.into();
    VariableBuilder::new(&build_info, "BuildInfo", "BuildInfo")
        .component_of(server_status)
        .has_type_definition(VariableTypeId::BuildInfoType)
        .data_type(DataTypeId::BuildInfo)
        .insert(address_space)?;

    let info = &config.build_info;
    for (id, name, value) in [
        (VariableId::Server_ServerStatus_BuildInfo_ProductName, "ProductName", info.product_name.as_str()),
        (VariableId::Server_ServerStatus_BuildInfo_ProductUri, "ProductUri", config.product_uri.as_str()),
        (VariableId::Server_ServerStatus_BuildInfo_ManufacturerName, "ManufacturerName", info.manufacturer_name.as_str()),
        (VariableId::Server_ServerStatus_BuildInfo_SoftwareVersion, "SoftwareVersion", info.software_version.as_str()),
        (VariableId::Server_ServerStatus_BuildInfo_BuildNumber, "BuildNumber", info.build_number.as_str()),
    ] {
        VariableBuilder::new(&id.into(), name, name)
            .component_of(build_info.clone())
            .has_type_definition(VariableTypeId::BaseDataVariableType)
            .value(value)
            .insert(address_space)?;
    }
    VariableBuilder::new(&VariableId::Server_ServerStatus_BuildInfo_BuildDate.into(), "BuildDate", "BuildDate")
        .component_of(build_info)
        .has_type_definition(VariableTypeId::BaseDataVariableType)
        .data_type(DataTypeId::UtcTime)
        .value(info.build_date.unwrap_or(start_time))
        .insert(address_space)?;
    Ok(())
}
