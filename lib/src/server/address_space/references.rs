// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use hashbrown::{HashMap, HashSet};

use crate::types::*;

/// A reference seen from one of its ends. `source_node` is the node that was queried and
/// `target_node` is the node at the other end, so for an inverse reference `target_node` is
/// the node that holds the forward reference.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct Reference {
    pub source_node: NodeId,
    pub reference_type: NodeId,
    pub target_node: NodeId,
    pub is_forward: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceDirection {
    Forward,
    Inverse,
}

/// One end of a stored reference, the other end being the key it is stored under.
#[derive(Clone, Debug)]
struct Link {
    reference_type: NodeId,
    node: NodeId,
}

/// The reference graph. Every reference is stored under its source and under its target so
/// both directions can be walked. Lists keep their insertion order.
#[derive(Default)]
pub struct References {
    /// Forward references by source node id.
    by_source: HashMap<NodeId, Vec<Link>>,
    /// The same references by target node id.
    by_target: HashMap<NodeId, Vec<Link>>,
    /// Every (source, reference type, target) triple, which must be unique.
    triples: HashSet<(NodeId, NodeId, NodeId)>,
}

impl References {
    /// Inserts a forward reference. Returns false when the triple is already present.
    pub fn insert_reference(
        &mut self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: &NodeId,
    ) -> bool {
        if !self.triples.insert((
            source_node.clone(),
            reference_type.clone(),
            target_node.clone(),
        )) {
            return false;
        }
        self.by_source
            .entry(source_node.clone())
            .or_default()
            .push(Link {
                reference_type: reference_type.clone(),
                node: target_node.clone(),
            });
        self.by_target
            .entry(target_node.clone())
            .or_default()
            .push(Link {
                reference_type: reference_type.clone(),
                node: source_node.clone(),
            });
        true
    }

    pub fn has_reference(
        &self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: &NodeId,
    ) -> bool {
        // The key is cloned because the tuple holds owned ids
        self.triples.contains(&(
            source_node.clone(),
            reference_type.clone(),
            target_node.clone(),
        ))
    }

    /// Finds the references of a node in the requested direction, forward references first.
    /// The filter is applied by the caller since it needs the type hierarchy.
    pub fn find_references_by_direction<F>(
        &self,
        node: &NodeId,
        browse_direction: BrowseDirection,
        mut filter: F,
    ) -> Vec<Reference>
    where
        F: FnMut(&NodeId) -> bool,
    {
        let mut references = Vec::new();
        if matches!(
            browse_direction,
            BrowseDirection::Forward | BrowseDirection::Both
        ) {
            if let Some(links) = self.by_source.get(node) {
                references.extend(
                    links
                        .iter()
                        .filter(|l| filter(&l.reference_type))
                        .map(|l| Reference {
                            source_node: node.clone(),
                            reference_type: l.reference_type.clone(),
                            target_node: l.node.clone(),
                            is_forward: true,
                        }),
                );
            }
        }
        if matches!(
            browse_direction,
            BrowseDirection::Inverse | BrowseDirection::Both
        ) {
            if let Some(links) = self.by_target.get(node) {
                references.extend(
                    links
                        .iter()
                        .filter(|l| filter(&l.reference_type))
                        .map(|l| Reference {
                            source_node: node.clone(),
                            reference_type: l.reference_type.clone(),
                            target_node: l.node.clone(),
                            is_forward: false,
                        }),
                );
            }
        }
        references
    }

    /// Returns the targets of the forward references of one type from a node.
    pub fn forward_targets<'a>(
        &'a self,
        node: &NodeId,
        reference_type: &'a NodeId,
    ) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.by_source
            .get(node)
            .into_iter()
            .flatten()
            .filter(move |l| l.reference_type == *reference_type)
            .map(|l| &l.node)
    }

    pub fn get_type_id(&self, node: &NodeId) -> Option<&NodeId> {
        let has_type_definition: NodeId = ReferenceTypeId::HasTypeDefinition.into();
        self.by_source.get(node).and_then(|links| {
            links
                .iter()
                .find(|l| l.reference_type == has_type_definition)
                .map(|l| &l.node)
        })
    }

    /// The number of references held
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}
