// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use super::*;

fn browse_description(
    node_id: NodeId,
    browse_direction: BrowseDirection,
    reference_type: Option<ReferenceTypeId>,
    node_class_mask: u32,
) -> BrowseDescription {
    BrowseDescription {
        node_id,
        browse_direction,
        reference_type_id: reference_type.map(NodeId::from).unwrap_or_else(NodeId::null),
        include_subtypes: true,
        node_class_mask,
    }
}

fn browse_one(address_space: &AddressSpace, description: BrowseDescription) -> BrowseResult {
    view::browse(address_space, &small_limits(), &[description])
        .unwrap()
        .remove(0)
}

fn browse_names(result: &BrowseResult) -> Vec<String> {
    result
        .references
        .iter()
        .map(|r| r.browse_name.name.to_string())
        .collect()
}

#[test]
fn browse_folder() {
    let (address_space, _) = make_sample_address_space();
    let result = browse_one(
        &address_space,
        browse_description(
            sample_node_id("MyDevices"),
            BrowseDirection::Forward,
            Some(ReferenceTypeId::HierarchicalReferences),
            0,
        ),
    );
    assert!(result.status_code.is_good());
    assert_eq!(
        browse_names(&result),
        vec!["MyVariable1", "MyVariable2", "v1", "v2", "v3"]
    );
    let first = &result.references[0];
    assert!(first.is_forward);
    assert_eq!(first.node_id, sample_node_id("MyVariable1"));
    assert_eq!(first.node_class, NodeClass::Variable);
    assert_eq!(
        first.reference_type_id,
        NodeId::from(ReferenceTypeId::HasComponent)
    );
    // The sample variables were given no type definition
    assert!(first.type_definition.is_null());
}

#[test]
fn browse_inverse_and_both() {
    let (address_space, _) = make_sample_address_space();
    let result = browse_one(
        &address_space,
        browse_description(sample_node_id("v1"), BrowseDirection::Inverse, None, 0),
    );
    assert_eq!(browse_names(&result), vec!["MyDevices"]);
    assert!(!result.references[0].is_forward);

    let result = browse_one(
        &address_space,
        browse_description(sample_node_id("MyDevices"), BrowseDirection::Both, None, 0),
    );
    // Forward references first, then the inverse Organizes from Objects
    let last = result.references.last().unwrap();
    assert!(!last.is_forward);
    assert_eq!(last.node_id, NodeId::objects_folder_id());
    assert!(result
        .references
        .iter()
        .any(|r| r.reference_type_id == ReferenceTypeId::HasTypeDefinition));
}

#[test]
fn browse_node_class_mask() {
    let (address_space, _) = make_sample_address_space();
    let result = browse_one(
        &address_space,
        browse_description(
            NodeId::objects_folder_id(),
            BrowseDirection::Forward,
            None,
            NodeClass::Object as u32,
        ),
    );
    let names = browse_names(&result);
    assert!(names.contains(&"MyDevices".to_string()));
    assert!(names.contains(&"Server".to_string()));
    let server = result
        .references
        .iter()
        .find(|r| r.node_id == ObjectId::Server)
        .unwrap();
    assert_eq!(server.type_definition, NodeId::from(ObjectTypeId::ServerType));
    // The FolderType type definition is an ObjectType
    assert!(result
        .references
        .iter()
        .all(|r| r.node_class == NodeClass::Object));

    let result = browse_one(
        &address_space,
        browse_description(
            sample_node_id("MyDevices"),
            BrowseDirection::Forward,
            None,
            NodeClass::ObjectType as u32 | NodeClass::Method as u32,
        ),
    );
    assert_eq!(browse_names(&result), vec!["FolderType"]);
}

#[test]
fn browse_errors() {
    let (address_space, _) = make_sample_address_space();
    let results = view::browse(
        &address_space,
        &small_limits(),
        &[
            browse_description(sample_node_id("unknown"), BrowseDirection::Forward, None, 0),
            BrowseDescription {
                // A variable is not a reference type
                reference_type_id: sample_node_id("v1"),
                ..browse_description(sample_node_id("MyDevices"), BrowseDirection::Forward, None, 0)
            },
            browse_description(
                sample_node_id("v1"),
                BrowseDirection::Forward,
                Some(ReferenceTypeId::Organizes),
                0,
            ),
        ],
    )
    .unwrap();
    assert_eq!(results[0].status_code, StatusCode::BadNodeIdUnknown);
    assert!(results[0].references.is_empty());
    assert_eq!(results[1].status_code, StatusCode::BadReferenceTypeIdInvalid);
    // Nothing to find is still good
    assert_eq!(results[2].status_code, StatusCode::Good);
    assert!(results[2].references.is_empty());

    assert_eq!(
        view::browse(&address_space, &small_limits(), &[]),
        Err(StatusCode::BadNothingToDo)
    );
    let too_many = (0..4)
        .map(|_| browse_description(NodeId::root_folder_id(), BrowseDirection::Forward, None, 0))
        .collect::<Vec<_>>();
    assert_eq!(
        view::browse(&address_space, &small_limits(), &too_many),
        Err(StatusCode::BadTooManyOperations)
    );
}

fn browse_path(starting_node: NodeId, path: &str) -> BrowsePath {
    BrowsePath {
        starting_node,
        relative_path: RelativePath::from_str(path, &RelativePathElement::default_node_resolver)
            .unwrap(),
    }
}

#[test]
fn translate_browse_paths() {
    let (address_space, _) = make_sample_address_space();
    let browse_paths = vec![
        browse_path(NodeId::root_folder_id(), "/Objects/MyDevices.MyVariable1"),
        browse_path(NodeId::root_folder_id(), "/Objects/MyDevices.MyVariableX"),
    ];
    let results = view::translate_browse_paths_to_node_ids(
        &address_space,
        &small_limits(),
        &browse_paths,
    )
    .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status_code, StatusCode::Good);
    assert_eq!(
        results[0].targets,
        vec![BrowsePathTarget {
            target_id: sample_node_id("MyVariable1"),
            remaining_path_index: u32::MAX,
        }]
    );
    assert_eq!(results[1].status_code, StatusCode::BadNoMatch);
    assert!(results[1].targets.is_empty());
}

#[test]
fn translate_browse_paths_errors() {
    let (address_space, _) = make_sample_address_space();
    let browse_paths = vec![
        browse_path(sample_node_id("unknown"), "/Objects"),
        BrowsePath {
            starting_node: NodeId::root_folder_id(),
            relative_path: RelativePath { elements: vec![] },
        },
    ];
    let results = view::translate_browse_paths_to_node_ids(
        &address_space,
        &small_limits(),
        &browse_paths,
    )
    .unwrap();
    assert_eq!(results[0].status_code, StatusCode::BadNodeIdUnknown);
    assert_eq!(results[1].status_code, StatusCode::BadNothingToDo);

    assert_eq!(
        view::translate_browse_paths_to_node_ids(&address_space, &small_limits(), &[]),
        Err(StatusCode::BadNothingToDo)
    );
    let too_many = (0..3)
        .map(|_| browse_path(NodeId::root_folder_id(), "/Objects"))
        .collect::<Vec<_>>();
    assert_eq!(
        view::translate_browse_paths_to_node_ids(&address_space, &small_limits(), &too_many),
        Err(StatusCode::BadTooManyOperations)
    );
}
