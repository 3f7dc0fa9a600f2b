// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Resolution of relative paths against the address space.

use hashbrown::HashSet;

use crate::types::{
    node_id::NodeId,
    service_types::{RelativePath, RelativePathElement},
    status_code::StatusCode,
    BrowseDirection,
};

use super::address_space::AddressSpace;

/// Given a path as a string, find all the nodes that match against it. Note this function
/// uses a default path resolver based on common browse names. If you need something else use
/// `find_nodes_relative_path()` after you have created a relative path.
pub fn find_nodes_relative_path_simple(
    address_space: &AddressSpace,
    node_id: &NodeId,
    relative_path: &str,
) -> Result<Vec<NodeId>, StatusCode> {
    address_space.find_nodes_relative_path_simple(node_id, relative_path)
}

/// Given a `RelativePath`, find all the nodes that match against it. Every element replaces the
/// current set of nodes with the targets reached from any of them, so ambiguous branches are
/// all followed. Nodes are returned in the order they were discovered, without duplicates.
pub fn find_nodes_relative_path(
    address_space: &AddressSpace,
    node_id: &NodeId,
    relative_path: &RelativePath,
) -> Result<Vec<NodeId>, StatusCode> {
    if !address_space.node_exists(node_id) {
        trace!("find_nodes_relative_path cannot find node {}", node_id);
        return Err(StatusCode::BadNodeIdUnknown);
    }
    if relative_path.elements.is_empty() {
        warn!("find_nodes_relative_path elements are empty");
        return Err(StatusCode::BadNothingToDo);
    }
    if relative_path
        .elements
        .iter()
        .any(|element| element.target_name.is_null())
    {
        warn!("find_nodes_relative_path browse name is invalid (null)");
        return Err(StatusCode::BadBrowseNameInvalid);
    }

    let mut matching_nodes = vec![node_id.clone()];
    for element in &relative_path.elements {
        let mut seen = HashSet::new();
        let mut next_matching_nodes = Vec::with_capacity(matching_nodes.len());
        for node_id in &matching_nodes {
            trace!("Following relative path on node {}", node_id);
            for target in follow_relative_path(address_space, node_id, element) {
                if seen.insert(target.clone()) {
                    next_matching_nodes.push(target);
                }
            }
        }
        if next_matching_nodes.is_empty() {
            debug!(
                "find_nodes_relative_path found no match for {}",
                element.target_name
            );
            return Err(StatusCode::BadNoMatch);
        }
        matching_nodes = next_matching_nodes;
    }
    Ok(matching_nodes)
}

/// Finds the nodes one element of a path leads to from a node.
fn follow_relative_path(
    address_space: &AddressSpace,
    node_id: &NodeId,
    element: &RelativePathElement,
) -> Vec<NodeId> {
    // A null reference type follows references of any type
    let reference_filter = if element.reference_type_id.is_null() {
        None
    } else {
        Some((element.reference_type_id.clone(), element.include_subtypes))
    };
    let browse_direction = if element.is_inverse {
        BrowseDirection::Inverse
    } else {
        BrowseDirection::Forward
    };
    address_space
        .get_references(node_id, reference_filter, browse_direction)
        .into_iter()
        .filter(|reference| {
            address_space
                .find_node(&reference.target_node)
                .map_or(false, |node| *node.browse_name() == element.target_name)
        })
        .map(|reference| reference.target_node)
        .collect()
}
