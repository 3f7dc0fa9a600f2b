// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Browses the references of nodes and translates browse paths into node ids.

use crate::types::{
    basic_types::NodeClass,
    node_id::NodeId,
    service_types::{
        BrowseDescription, BrowsePath, BrowsePathResult, BrowsePathTarget, BrowseResult,
        ReferenceDescription,
    },
    status_code::StatusCode,
};

use crate::server::{
    address_space::{relative_path, AddressSpace},
    config::OperationalLimits,
};

use super::check_batch;

/// Browses the references of one or more nodes. Every node gets its own result, an unknown node
/// gives a result with `BadNodeIdUnknown` and no references.
pub fn browse(
    address_space: &AddressSpace,
    operational_limits: &OperationalLimits,
    nodes_to_browse: &[BrowseDescription],
) -> Result<Vec<BrowseResult>, StatusCode> {
    check_batch(
        "Browse",
        nodes_to_browse.len(),
        operational_limits.max_nodes_per_browse,
    )?;
    Ok(nodes_to_browse
        .iter()
        .map(
            |node_to_browse| match browse_node(address_space, node_to_browse) {
                Ok(references) => BrowseResult {
                    status_code: StatusCode::Good,
                    references,
                },
                Err(status_code) => BrowseResult {
                    status_code,
                    references: Vec::new(),
                },
            },
        )
        .collect())
}

fn browse_node(
    address_space: &AddressSpace,
    node_to_browse: &BrowseDescription,
) -> Result<Vec<ReferenceDescription>, StatusCode> {
    // Node must exist or there will be no references
    if node_to_browse.node_id.is_null() || !address_space.node_exists(&node_to_browse.node_id) {
        return Err(StatusCode::BadNodeIdUnknown);
    }

    // Request may wish to filter by a kind of reference
    let reference_filter = if node_to_browse.reference_type_id.is_null() {
        None
    } else {
        match address_space.find_node(&node_to_browse.reference_type_id) {
            Some(node) if node.node_class() == NodeClass::ReferenceType => Some((
                node_to_browse.reference_type_id.clone(),
                node_to_browse.include_subtypes,
            )),
            _ => return Err(StatusCode::BadReferenceTypeIdInvalid),
        }
    };

    let references = address_space.get_references(
        &node_to_browse.node_id,
        reference_filter,
        node_to_browse.browse_direction,
    );

    let reference_descriptions = references
        .into_iter()
        .filter_map(|reference| {
            let target_node = address_space.find_node(&reference.target_node)?;
            // Skip target nodes not required by the mask
            let node_class_mask = node_to_browse.node_class_mask;
            if node_class_mask != 0 && node_class_mask & target_node.node_class() as u32 == 0 {
                return None;
            }
            let type_definition = address_space
                .get_type_definition(target_node.node_id())
                .cloned()
                .unwrap_or_else(NodeId::null);
            Some(ReferenceDescription {
                reference_type_id: reference.reference_type,
                is_forward: reference.is_forward,
                node_id: reference.target_node,
                browse_name: target_node.browse_name().clone(),
                display_name: target_node.display_name().clone(),
                node_class: target_node.node_class(),
                type_definition,
            })
        })
        .collect();
    Ok(reference_descriptions)
}

/// Resolves one or more browse paths. Each path is resolved on its own, so one path that fails
/// does not affect the others in the batch.
pub fn translate_browse_paths_to_node_ids(
    address_space: &AddressSpace,
    operational_limits: &OperationalLimits,
    browse_paths: &[BrowsePath],
) -> Result<Vec<BrowsePathResult>, StatusCode> {
    check_batch(
        "TranslateBrowsePathsToNodeIds",
        browse_paths.len(),
        operational_limits.max_nodes_per_translate_browse_paths_to_node_ids,
    )?;
    Ok(browse_paths
        .iter()
        .enumerate()
        .map(|(i, browse_path)| {
            trace!("Processing browse path {}", i);
            translate_browse_path(address_space, browse_path)
        })
        .collect())
}

fn translate_browse_path(address_space: &AddressSpace, browse_path: &BrowsePath) -> BrowsePathResult {
    match relative_path::find_nodes_relative_path(
        address_space,
        &browse_path.starting_node,
        &browse_path.relative_path,
    ) {
        Ok(nodes) => BrowsePathResult {
            status_code: StatusCode::Good,
            targets: nodes
                .into_iter()
                .map(|target_id| BrowsePathTarget {
                    target_id,
                    remaining_path_index: u32::MAX,
                })
                .collect(),
        },
        Err(status_code) => {
            trace!(
                "Browse path result for find nodes returned in error {}",
                status_code.name()
            );
            BrowsePathResult {
                status_code,
                targets: Vec::new(),
            }
        }
    }
}
