// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Implementation of `AddressSpace`.

use hashbrown::{HashMap, HashSet};

use crate::{server::config::ServerConfig, types::*};

use super::{
    node::Node,
    references::{Reference, ReferenceDirection, References},
    standard_nodes,
};

/// The namespace of the standard nodes
pub const OPC_UA_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// The address space holds the nodes of the server and the references between them. It is an
/// in-memory graph that is shared behind a lock, many readers at a time.
pub struct AddressSpace {
    /// A map of all the nodes that are part of the address space
    node_map: HashMap<NodeId, Node>,
    /// The references between nodes
    references: References,
    /// The list of all registered namespaces.
    namespaces: Vec<String>,
    /// When the address space was created, the start time of the server
    start_time: DateTime,
}

impl Default for AddressSpace {
    fn default() -> Self {
        AddressSpace {
            node_map: HashMap::new(),
            references: References::default(),
            namespaces: vec![OPC_UA_NAMESPACE_URI.to_string()],
            start_time: DateTime::now(),
        }
    }
}

impl AddressSpace {
    /// Constructs an address space holding the standard nodes, using a default configuration.
    pub fn new() -> AddressSpace {
        Self::from_config(&ServerConfig::default())
    }

    /// Constructs an address space holding the standard nodes. The server's build info is
    /// taken from the configuration and its application uri becomes namespace 1.
    pub fn from_config(config: &ServerConfig) -> AddressSpace {
        let mut address_space = AddressSpace::default();
        if let Err(status_code) = standard_nodes::populate(&mut address_space, config) {
            // The standard nodes are fixed so this only happens through a coding error
            error!("Cannot populate the standard nodes, status {}", status_code);
        }
        if !config.application_uri.is_empty() {
            let _ = address_space.register_namespace(&config.application_uri);
        }
        address_space
    }

    /// The time the address space was created
    pub fn start_time(&self) -> DateTime {
        self.start_time
    }

    /// Registers a namespace described by a uri with address space. The return code is the index
    /// of the newly added namespace / index. The index is used with `NodeId`. Registering a
    /// namespace that is already registered will return the index to the previous instance.
    pub fn register_namespace(&mut self, namespace: &str) -> Result<u16, StatusCode> {
        if namespace.is_empty() || self.namespaces.len() == u16::MAX as usize {
            Err(StatusCode::BadInvalidArgument)
        } else if let Some(i) = self.namespace_index(namespace) {
            Ok(i)
        } else {
            self.namespaces.push(namespace.into());
            let namespaces = self
                .namespaces
                .iter()
                .map(|ns| Variant::from(ns.as_str()))
                .collect::<Vec<_>>();
            let _ = self.set_variable_value(VariableId::Server_NamespaceArray, Variant::Array(namespaces));
            Ok((self.namespaces.len() - 1) as u16)
        }
    }

    /// Finds the namespace index of a given namespace
    pub fn namespace_index(&self, namespace: &str) -> Option<u16> {
        self.namespaces
            .iter()
            .position(|ns| ns == namespace)
            .map(|i| i as u16)
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Adds a node beneath a parent with a reference of the given type from the parent to the
    /// node. A node without a parent is added on its own. The node and its reference are added
    /// together or not at all.
    pub fn add_node<R>(
        &mut self,
        parent: Option<&NodeId>,
        reference_type: R,
        node: Node,
    ) -> Result<NodeId, StatusCode>
    where
        R: Into<NodeId>,
    {
        match parent {
            Some(parent) => {
                if !self.node_exists(parent) {
                    error!(
                        "Cannot add node {}, parent {} does not exist",
                        node.node_id(),
                        parent
                    );
                    return Err(StatusCode::BadParentNodeIdInvalid);
                }
                let references = [(parent.clone(), reference_type.into(), ReferenceDirection::Inverse)];
                self.insert(node, &references)
            }
            None => self.insert(node, &[]),
        }
    }

    /// Inserts a node with its references to other nodes. Each reference is the other node, the
    /// reference type and whether the reference points from the new node (forward) or to it
    /// (inverse). Every reference is validated before anything changes.
    pub fn insert(
        &mut self,
        node: Node,
        references: &[(NodeId, NodeId, ReferenceDirection)],
    ) -> Result<NodeId, StatusCode> {
        let node_id = node.node_id().clone();
        if node_id.is_null() {
            return Err(StatusCode::BadNodeIdInvalid);
        }
        if self.node_exists(&node_id) {
            error!("This node {} already exists", node_id);
            return Err(StatusCode::BadNodeIdExists);
        }
        let mut seen = HashSet::with_capacity(references.len());
        for (other, reference_type, direction) in references {
            if *other == node_id || !self.node_exists(other) {
                error!(
                    "Cannot add node {}, the node {} it references does not exist",
                    node_id, other
                );
                return Err(StatusCode::BadNodeIdUnknown);
            }
            self.validate_reference_type(reference_type)?;
            if !seen.insert((other, reference_type, *direction)) {
                return Err(StatusCode::BadDuplicateReferenceNotAllowed);
            }
        }
        self.node_map.insert(node_id.clone(), node);
        for (other, reference_type, direction) in references {
            match direction {
                ReferenceDirection::Forward => {
                    self.references
                        .insert_reference(&node_id, other, reference_type)
                }
                ReferenceDirection::Inverse => {
                    self.references
                        .insert_reference(other, &node_id, reference_type)
                }
            };
        }
        Ok(node_id)
    }

    /// Inserts a single reference between two existing nodes.
    pub fn insert_reference<T>(
        &mut self,
        source_node: &NodeId,
        target_node: &NodeId,
        reference_type: T,
    ) -> Result<(), StatusCode>
    where
        T: Into<NodeId>,
    {
        let reference_type = reference_type.into();
        if !self.node_exists(source_node) || !self.node_exists(target_node) {
            return Err(StatusCode::BadNodeIdUnknown);
        }
        if source_node == target_node {
            error!("Self reference on {} is not allowed", source_node);
            return Err(StatusCode::BadInvalidArgument);
        }
        self.validate_reference_type(&reference_type)?;
        if self
            .references
            .insert_reference(source_node, target_node, &reference_type)
        {
            Ok(())
        } else {
            debug!(
                "Reference {} -> {} of type {} already exists",
                source_node, target_node, reference_type
            );
            Err(StatusCode::BadDuplicateReferenceNotAllowed)
        }
    }

    fn validate_reference_type(&self, reference_type: &NodeId) -> Result<(), StatusCode> {
        match self.node_map.get(reference_type) {
            Some(node) if node.node_class() == NodeClass::ReferenceType => Ok(()),
            _ => {
                error!("{} is not a reference type", reference_type);
                Err(StatusCode::BadReferenceTypeIdInvalid)
            }
        }
    }

    pub fn node_exists(&self, node_id: &NodeId) -> bool {
        self.node_map.contains_key(node_id)
    }

    /// The number of nodes in the address space
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    pub fn find_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.node_map.get(node_id)
    }

    pub fn find_node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.node_map.get_mut(node_id)
    }

    pub fn get_node(&self, node_id: &NodeId) -> Result<&Node, StatusCode> {
        self.find_node(node_id).ok_or(StatusCode::BadNodeIdUnknown)
    }

    /// Finds references to and from a node. With a filter, only references of that type, or of
    /// its subtypes if the flag is set, are returned. Forward references come before inverse
    /// ones and each keeps the order it was added in.
    pub fn get_references(
        &self,
        node_id: &NodeId,
        reference_filter: Option<(NodeId, bool)>,
        browse_direction: BrowseDirection,
    ) -> Vec<Reference> {
        self.references
            .find_references_by_direction(node_id, browse_direction, |reference_type| {
                match reference_filter {
                    None => true,
                    Some((ref filter_type, include_subtypes)) => {
                        self.reference_type_matches(filter_type, reference_type, include_subtypes)
                    }
                }
            })
    }

    pub fn has_reference<T>(&self, source_node: &NodeId, target_node: &NodeId, reference_type: T) -> bool
    where
        T: Into<NodeId>,
    {
        self.references
            .has_reference(source_node, target_node, &reference_type.into())
    }

    /// Test if a reference type matches another reference type which is potentially a subtype.
    /// A null filter type matches every reference type.
    pub fn reference_type_matches(
        &self,
        ref_type: &NodeId,
        ref_subtype: &NodeId,
        include_subtypes: bool,
    ) -> bool {
        ref_type.is_null()
            || ref_type == ref_subtype
            || (include_subtypes && self.is_subtype(ref_subtype, ref_type))
    }

    /// Tests if a type is a subtype of another type by following HasSubtype references down
    /// from the base type. A type matches itself.
    pub fn is_subtype(&self, subtype_id: &NodeId, base_type_id: &NodeId) -> bool {
        if subtype_id == base_type_id {
            return true;
        }
        let has_subtype: NodeId = ReferenceTypeId::HasSubtype.into();
        let mut visited = HashSet::new();
        let mut stack = vec![base_type_id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for subtype in self.references.forward_targets(current, &has_subtype) {
                if subtype == subtype_id {
                    return true;
                }
                stack.push(subtype);
            }
        }
        false
    }

    /// The type definition of a node, if it has one.
    pub fn get_type_definition(&self, node_id: &NodeId) -> Option<&NodeId> {
        self.references.get_type_id(node_id)
    }

    /// Sets the value of a variable as the server, stamping it with the current time.
    pub fn set_variable_value<N, V>(&self, node_id: N, value: V) -> Result<(), StatusCode>
    where
        N: Into<NodeId>,
        V: Into<Variant>,
    {
        self.set_variable_data_value(node_id, DataValue::new_now(value))
    }

    /// Sets the data value of a variable as the server. Samplers watching the variable are told.
    pub fn set_variable_data_value<N>(&self, node_id: N, data_value: DataValue) -> Result<(), StatusCode>
    where
        N: Into<NodeId>,
    {
        let node_id = node_id.into();
        let node = self.get_node(&node_id)?;
        let accessor = node
            .value_accessor()
            .ok_or(StatusCode::BadAttributeIdInvalid)?;
        accessor.set_value(data_value);
        Ok(())
    }

    /// Gets a variable value. The function will return an error if the node does not exist, or
    /// is not a variable.
    pub fn get_variable_value<N>(&self, node_id: N) -> Result<DataValue, StatusCode>
    where
        N: Into<NodeId>,
    {
        let node_id = node_id.into();
        let node = self.get_node(&node_id)?;
        let accessor = node
            .value_accessor()
            .ok_or(StatusCode::BadAttributeIdInvalid)?;
        Ok(accessor.read())
    }

    /// Finds the nodes at the end of a path of browse names of the form
    /// `/Objects/Server.ServerStatus`, resolving reference type names against the standard
    /// reference types.
    pub fn find_nodes_relative_path_simple(
        &self,
        start_node: &NodeId,
        path: &str,
    ) -> Result<Vec<NodeId>, StatusCode> {
        let relative_path =
            RelativePath::from_str(path, &RelativePathElement::default_node_resolver)?;
        super::relative_path::find_nodes_relative_path(self, start_node, &relative_path)
    }
}
