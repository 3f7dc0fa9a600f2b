// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Builders are used for more conveniently creating objects, variables etc. with the references
//! they have to other nodes, and inserting them into the address space in one step.

use std::sync::Arc;

use crate::sync::*;
use crate::types::*;

use super::{
    accessor::{AttributeGetter, AttributeSetter},
    address_space::AddressSpace,
    node::{AccessLevel, Node},
    references::ReferenceDirection,
};

// A macro for creating builders. A builder may be given a type definition that every node it
// builds gets.
macro_rules! node_builder_impl {
    ( $node_builder_ty:ident, $node_class:expr $(, type_definition = $type_definition:expr )? ) => {
        /// A builder for constructing a node of same name. This can be used as an easy way
        /// to create a node and the references it has to another node in a simple fashion.
        pub struct $node_builder_ty {
            node: Node,
            references: Vec<(NodeId, NodeId, ReferenceDirection)>,
        }

        impl $node_builder_ty {
            /// Creates a builder for a node. All nodes are required to supply a node id, a
            /// browse name and a display name.
            pub fn new<T, S>(node_id: &NodeId, browse_name: T, display_name: S) -> Self
            where
                T: Into<QualifiedName>,
                S: Into<LocalizedText>,
            {
                trace!("Creating a node using a builder, node id {}", node_id);
                let builder = Self {
                    node: Node::new($node_class, node_id, browse_name, display_name),
                    references: Vec::with_capacity(10),
                };
                $( let builder = builder.has_type_definition($type_definition); )?
                builder
            }

            pub fn get_node_id(&self) -> NodeId {
                self.node.node_id().clone()
            }

            /// Tests that the builder is in a valid state to build or insert the node.
            pub fn is_valid(&self) -> bool {
                self.node.is_valid()
            }

            /// Sets the description of the node
            pub fn description<V>(mut self, description: V) -> Self
            where
                V: Into<LocalizedText>,
            {
                self.node.set_description(description.into());
                self
            }

            /// Adds a reference to the node
            pub fn reference<T, R>(
                mut self,
                node_id: T,
                reference_type_id: R,
                reference_direction: ReferenceDirection,
            ) -> Self
            where
                T: Into<NodeId>,
                R: Into<NodeId>,
            {
                self.references.push((
                    node_id.into(),
                    reference_type_id.into(),
                    reference_direction,
                ));
                self
            }

            /// Indicates this node organizes another node by its id.
            pub fn organizes<T>(self, organizes_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    organizes_id,
                    ReferenceTypeId::Organizes,
                    ReferenceDirection::Forward,
                )
            }

            /// Indicates this node is organised by another node by its id
            pub fn organized_by<T>(self, organized_by_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    organized_by_id,
                    ReferenceTypeId::Organizes,
                    ReferenceDirection::Inverse,
                )
            }

            pub fn component_of<T>(self, component_of_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    component_of_id,
                    ReferenceTypeId::HasComponent,
                    ReferenceDirection::Inverse,
                )
            }

            pub fn has_component<T>(self, has_component_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    has_component_id,
                    ReferenceTypeId::HasComponent,
                    ReferenceDirection::Forward,
                )
            }

            pub fn property_of<T>(self, property_of_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    property_of_id,
                    ReferenceTypeId::HasProperty,
                    ReferenceDirection::Inverse,
                )
            }

            pub fn has_property<T>(self, has_property_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    has_property_id,
                    ReferenceTypeId::HasProperty,
                    ReferenceDirection::Forward,
                )
            }

            /// Add a reference to the node indicating it has a type of another node.
            pub fn has_type_definition<T>(self, type_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    type_id,
                    ReferenceTypeId::HasTypeDefinition,
                    ReferenceDirection::Forward,
                )
            }

            pub fn has_modelling_rule<T>(self, rule_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    rule_id,
                    ReferenceTypeId::HasModellingRule,
                    ReferenceDirection::Forward,
                )
            }

            /// Yields the built node, discarding any references given to the builder.
            pub fn build(self) -> Result<Node, StatusCode> {
                if self.is_valid() {
                    Ok(self.node)
                } else {
                    error!("The node is not valid, node id = {}", self.node.node_id());
                    Err(StatusCode::BadNodeIdInvalid)
                }
            }

            /// Inserts the node into the address space with its references. Nothing is inserted
            /// if the node or any of its references is rejected.
            pub fn insert(self, address_space: &mut AddressSpace) -> Result<NodeId, StatusCode> {
                if self.is_valid() {
                    address_space.insert(self.node, &self.references)
                } else {
                    error!("The node is not valid, node id = {}", self.node.node_id());
                    Err(StatusCode::BadNodeIdInvalid)
                }
            }
        }
    };
}

macro_rules! node_builder_impl_subtype {
    ( $node_builder_ty:ident ) => {
        impl $node_builder_ty {
            pub fn subtype_of<T>(self, type_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    type_id,
                    ReferenceTypeId::HasSubtype,
                    ReferenceDirection::Inverse,
                )
            }

            pub fn has_subtype<T>(self, subtype_id: T) -> Self
            where
                T: Into<NodeId>,
            {
                self.reference(
                    subtype_id,
                    ReferenceTypeId::HasSubtype,
                    ReferenceDirection::Forward,
                )
            }

            pub fn is_abstract(mut self, is_abstract: bool) -> Self {
                self.node
                    .set_attribute_value(AttributeId::IsAbstract, is_abstract);
                self
            }
        }
    };
}

node_builder_impl!(ObjectBuilder, NodeClass::Object);
node_builder_impl!(
    FolderBuilder,
    NodeClass::Object,
    type_definition = ObjectTypeId::FolderType
);
node_builder_impl!(VariableBuilder, NodeClass::Variable);
node_builder_impl!(MethodBuilder, NodeClass::Method);
node_builder_impl!(ObjectTypeBuilder, NodeClass::ObjectType);
node_builder_impl!(VariableTypeBuilder, NodeClass::VariableType);
node_builder_impl!(ReferenceTypeBuilder, NodeClass::ReferenceType);
node_builder_impl!(DataTypeBuilder, NodeClass::DataType);

node_builder_impl_subtype!(ObjectTypeBuilder);
node_builder_impl_subtype!(VariableTypeBuilder);
node_builder_impl_subtype!(ReferenceTypeBuilder);
node_builder_impl_subtype!(DataTypeBuilder);

impl ObjectBuilder {
    /// Makes the object a folder
    pub fn is_folder(self) -> Self {
        self.has_type_definition(ObjectTypeId::FolderType)
    }

    pub fn event_notifier(mut self, event_notifier: u8) -> Self {
        self.node
            .set_attribute_value(AttributeId::EventNotifier, event_notifier);
        self
    }
}

impl VariableBuilder {
    /// Sets the value of the variable. A variable whose data type has not been set takes on the
    /// type of the value.
    pub fn value<V>(mut self, value: V) -> Self
    where
        V: Into<Variant>,
    {
        self.node.set_static_value(value);
        self
    }

    /// Sets the data type of the variable.
    pub fn data_type<T>(mut self, data_type: T) -> Self
    where
        T: Into<NodeId>,
    {
        let data_type: NodeId = data_type.into();
        self.node.set_attribute_value(AttributeId::DataType, data_type);
        self
    }

    /// Sets the value rank of the variable.
    pub fn value_rank(mut self, value_rank: i32) -> Self {
        self.node
            .set_attribute_value(AttributeId::ValueRank, value_rank);
        self
    }

    /// Sets the access level for the variable.
    pub fn access_level(mut self, access_level: AccessLevel) -> Self {
        self.node.set_access_level(access_level);
        if let Some(accessor) = self.node.value_accessor_mut() {
            accessor.set_writable(access_level.contains(AccessLevel::CURRENT_WRITE));
        }
        self
    }

    /// Makes the variable writable (by default it isn't)
    pub fn writable(self) -> Self {
        let access_level = self.node.access_level() | AccessLevel::CURRENT_WRITE;
        self.access_level(access_level)
    }

    pub fn minimum_sampling_interval(mut self, minimum_sampling_interval: f64) -> Self {
        self.node.set_attribute_value(
            AttributeId::MinimumSamplingInterval,
            minimum_sampling_interval,
        );
        self
    }

    /// Sets a value getter function for the variable. Whenever the value of a variable
    /// needs to be fetched, that function will be called to get the value.
    pub fn value_getter(mut self, getter: Arc<Mutex<dyn AttributeGetter + Send>>) -> Self {
        if let Some(accessor) = self.node.value_accessor_mut() {
            accessor.set_getter(getter);
        }
        self
    }

    /// Sets a value setter function for the variable. Whenever the value of a variable is set via
    /// a service, this trait will be called to set the value. The variable becomes writable.
    pub fn value_setter(mut self, setter: Arc<Mutex<dyn AttributeSetter + Send>>) -> Self {
        if let Some(accessor) = self.node.value_accessor_mut() {
            accessor.set_setter(setter);
        }
        let access_level = self.node.access_level() | AccessLevel::CURRENT_WRITE;
        self.node.set_access_level(access_level);
        self
    }
}

impl MethodBuilder {
    pub fn executable(mut self, executable: bool) -> Self {
        self.node
            .set_attribute_value(AttributeId::Executable, executable);
        self.node
            .set_attribute_value(AttributeId::UserExecutable, executable);
        self
    }
}

impl VariableTypeBuilder {
    pub fn data_type<T>(mut self, data_type: T) -> Self
    where
        T: Into<NodeId>,
    {
        let data_type: NodeId = data_type.into();
        self.node.set_attribute_value(AttributeId::DataType, data_type);
        self
    }

    pub fn value_rank(mut self, value_rank: i32) -> Self {
        self.node
            .set_attribute_value(AttributeId::ValueRank, value_rank);
        self
    }
}

impl ReferenceTypeBuilder {
    pub fn symmetric(mut self, symmetric: bool) -> Self {
        self.node
            .set_attribute_value(AttributeId::Symmetric, symmetric);
        self
    }

    pub fn inverse_name<V>(mut self, inverse_name: V) -> Self
    where
        V: Into<LocalizedText>,
    {
        let inverse_name: LocalizedText = inverse_name.into();
        self.node
            .set_attribute_value(AttributeId::InverseName, inverse_name);
        self
    }
}
