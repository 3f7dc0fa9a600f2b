// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The `Node` held by the address space. Every node class shares the one struct, the class
//! specific attributes live in an attribute map.

use std::{collections::BTreeMap, sync::Arc};

use crate::types::*;

use super::accessor::ValueAccessor;

bitflags! {
    /// The AccessLevel attribute of a variable.
    pub struct AccessLevel: u8 {
        const CURRENT_READ = 1;
        const CURRENT_WRITE = 2;
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Node {
    node_id: NodeId,
    node_class: NodeClass,
    browse_name: QualifiedName,
    display_name: LocalizedText,
    description: Option<LocalizedText>,
    /// Every other attribute the node has, other than Value
    attributes: BTreeMap<AttributeId, Variant>,
    /// The Value attribute of a Variable
    #[derivative(Debug = "ignore")]
    value: Option<Arc<ValueAccessor>>,
}

impl Node {
    /// Creates a node. A variable starts out readable with an empty value of BaseDataType.
    pub fn new<R, S>(node_class: NodeClass, node_id: &NodeId, browse_name: R, display_name: S) -> Node
    where
        R: Into<QualifiedName>,
        S: Into<LocalizedText>,
    {
        let mut node = Node {
            node_id: node_id.clone(),
            node_class,
            browse_name: browse_name.into(),
            display_name: display_name.into(),
            description: None,
            attributes: BTreeMap::new(),
            value: None,
        };
        if node_class == NodeClass::Variable {
            node.set_attribute_value(AttributeId::DataType, NodeId::from(DataTypeId::BaseDataType));
            node.set_attribute_value(AttributeId::ValueRank, -1i32);
            node.set_access_level(AccessLevel::CURRENT_READ);
            node.set_value_accessor(ValueAccessor::new(node_id, DataValue::null(), false));
        }
        node
    }

    /// Creates a variable node whose value is held statically. The data type is taken from
    /// the value.
    pub fn new_variable<R, S, V>(node_id: &NodeId, browse_name: R, display_name: S, value: V) -> Node
    where
        R: Into<QualifiedName>,
        S: Into<LocalizedText>,
        V: Into<Variant>,
    {
        let mut node = Node::new(NodeClass::Variable, node_id, browse_name, display_name);
        node.set_static_value(value);
        node
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn node_class(&self) -> NodeClass {
        self.node_class
    }

    pub fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }

    pub fn display_name(&self) -> &LocalizedText {
        &self.display_name
    }

    pub fn set_display_name(&mut self, display_name: LocalizedText) {
        self.display_name = display_name;
    }

    pub fn description(&self) -> Option<&LocalizedText> {
        self.description.as_ref()
    }

    pub fn set_description(&mut self, description: LocalizedText) {
        self.description = Some(description);
    }

    /// A node is valid with a non-null id and browse name.
    pub fn is_valid(&self) -> bool {
        !self.node_id.is_null() && !self.browse_name.is_null()
    }

    /// Sets an attribute other than Value directly, without any access checks.
    pub fn set_attribute_value<V>(&mut self, attribute_id: AttributeId, value: V)
    where
        V: Into<Variant>,
    {
        self.attributes.insert(attribute_id, value.into());
    }

    pub fn attribute_value(&self, attribute_id: AttributeId) -> Option<&Variant> {
        self.attributes.get(&attribute_id)
    }

    pub fn access_level(&self) -> AccessLevel {
        match self.attributes.get(&AttributeId::AccessLevel) {
            Some(Variant::Byte(bits)) => AccessLevel::from_bits_truncate(*bits),
            _ => AccessLevel::empty(),
        }
    }

    pub fn set_access_level(&mut self, access_level: AccessLevel) {
        self.set_attribute_value(AttributeId::AccessLevel, access_level.bits());
        self.set_attribute_value(AttributeId::UserAccessLevel, access_level.bits());
    }

    pub fn data_type(&self) -> Option<&NodeId> {
        match self.attributes.get(&AttributeId::DataType) {
            Some(Variant::NodeId(data_type)) => Some(data_type),
            _ => None,
        }
    }

    pub fn value_accessor(&self) -> Option<&Arc<ValueAccessor>> {
        self.value.as_ref()
    }

    pub fn set_value_accessor(&mut self, accessor: ValueAccessor) {
        self.value = Some(Arc::new(accessor));
    }

    /// Mutable access to the accessor while the node is being built, i.e. before the address
    /// space or a sampler shares it.
    pub fn value_accessor_mut(&mut self) -> Option<&mut ValueAccessor> {
        self.value.as_mut().and_then(Arc::get_mut)
    }

    /// Sets the static value of a variable. A variable still of BaseDataType takes on the data
    /// type of the value.
    pub fn set_static_value<V>(&mut self, value: V)
    where
        V: Into<Variant>,
    {
        let value = value.into();
        let base_data_type: NodeId = DataTypeId::BaseDataType.into();
        if self.data_type().map_or(true, |t| *t == base_data_type) {
            if let Some(data_type) = value.data_type() {
                self.set_attribute_value(AttributeId::DataType, NodeId::from(data_type));
            }
        }
        if let Some(ref accessor) = self.value {
            accessor.set_value(DataValue::value_only(value));
        }
    }

    /// Reads an attribute. Attributes the node does not have give `BadAttributeIdInvalid`.
    pub fn get_attribute(&self, attribute_id: AttributeId) -> Result<DataValue, StatusCode> {
        let value: Variant = match attribute_id {
            AttributeId::NodeId => self.node_id.clone().into(),
            AttributeId::NodeClass => (self.node_class as i32).into(),
            AttributeId::BrowseName => self.browse_name.clone().into(),
            AttributeId::DisplayName => self.display_name.clone().into(),
            AttributeId::Description => self
                .description
                .clone()
                .ok_or(StatusCode::BadAttributeIdInvalid)?
                .into(),
            AttributeId::Value => {
                let accessor = self
                    .value
                    .as_ref()
                    .ok_or(StatusCode::BadAttributeIdInvalid)?;
                if !self.access_level().contains(AccessLevel::CURRENT_READ) {
                    return Err(StatusCode::BadNotReadable);
                }
                return Ok(accessor.read());
            }
            attribute_id => self
                .attributes
                .get(&attribute_id)
                .cloned()
                .ok_or(StatusCode::BadAttributeIdInvalid)?,
        };
        Ok(DataValue::value_only(value))
    }

    /// Writes an attribute on behalf of a client. Only the Value attribute of a writable
    /// variable can be written, and only with a value of the variable's data type.
    pub fn set_attribute(&self, attribute_id: AttributeId, data_value: DataValue) -> StatusCode {
        if attribute_id != AttributeId::Value {
            return if attribute_id == AttributeId::NodeId
                || attribute_id == AttributeId::NodeClass
                || attribute_id == AttributeId::BrowseName
                || attribute_id == AttributeId::DisplayName
                || self.attributes.contains_key(&attribute_id)
            {
                StatusCode::BadNotWritable
            } else {
                StatusCode::BadAttributeIdInvalid
            };
        }
        let accessor = match self.value {
            Some(ref accessor) => accessor,
            None => return StatusCode::BadAttributeIdInvalid,
        };
        if !self.access_level().contains(AccessLevel::CURRENT_WRITE) {
            return StatusCode::BadNotWritable;
        }
        if !self.is_data_type_compatible(data_value.variant()) {
            debug!(
                "Value {} written to {} does not match its data type",
                data_value.variant(),
                self.node_id
            );
            return StatusCode::BadTypeMismatch;
        }
        accessor.write(data_value)
    }

    /// Checks a scalar value against a built-in data type. Abstract and structured data types
    /// accept anything, as do empty and array values.
    fn is_data_type_compatible(&self, value: &Variant) -> bool {
        let expected = match self.data_type() {
            Some(data_type) if data_type.namespace == 0 => data_type,
            _ => return true,
        };
        let is_builtin = match expected.identifier {
            Identifier::Numeric(id) => (1..=21).contains(&id),
            _ => false,
        };
        match value.data_type() {
            Some(actual) if is_builtin => *expected == actual,
            _ => true,
        }
    }
}
