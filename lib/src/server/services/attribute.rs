// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Reads and writes attributes of nodes in the address space.

use crate::types::{
    basic_types::{AttributeId, TimestampsToReturn},
    data_value::DataValue,
    date_time::DateTime,
    service_types::{ReadValueId, WriteValue},
    status_code::StatusCode,
};

use crate::server::{address_space::AddressSpace, config::OperationalLimits};

use super::check_batch;

/// Reads attributes from one or more nodes. Each result carries its own status, a node or
/// attribute that cannot be read gives a value holding just the bad status.
pub fn read(
    address_space: &AddressSpace,
    operational_limits: &OperationalLimits,
    nodes_to_read: &[ReadValueId],
    timestamps_to_return: TimestampsToReturn,
) -> Result<Vec<DataValue>, StatusCode> {
    check_batch(
        "Read",
        nodes_to_read.len(),
        operational_limits.max_nodes_per_read,
    )?;
    Ok(nodes_to_read
        .iter()
        .map(|node_to_read| read_node_value(address_space, node_to_read, timestamps_to_return))
        .collect())
}

fn read_node_value(
    address_space: &AddressSpace,
    node_to_read: &ReadValueId,
    timestamps_to_return: TimestampsToReturn,
) -> DataValue {
    let result = AttributeId::from_u32(node_to_read.attribute_id)
        .map_err(|_| StatusCode::BadAttributeIdInvalid)
        .and_then(|attribute_id| {
            address_space
                .get_node(&node_to_read.node_id)?
                .get_attribute(attribute_id)
        });
    match result {
        Ok(mut data_value) => {
            if data_value.server_timestamp.is_none() {
                data_value.server_timestamp = Some(DateTime::now());
            }
            data_value.trim_timestamps(timestamps_to_return);
            data_value
        }
        Err(status_code) => {
            debug!(
                "read_node_value result for read node id {}, attribute {} is {}",
                node_to_read.node_id, node_to_read.attribute_id, status_code
            );
            DataValue::from_status(status_code)
        }
    }
}

/// Writes attributes of one or more nodes, returning a status for each.
pub fn write(
    address_space: &AddressSpace,
    operational_limits: &OperationalLimits,
    nodes_to_write: &[WriteValue],
) -> Result<Vec<StatusCode>, StatusCode> {
    check_batch(
        "Write",
        nodes_to_write.len(),
        operational_limits.max_nodes_per_write,
    )?;
    Ok(nodes_to_write
        .iter()
        .map(|node_to_write| write_node_value(address_space, node_to_write))
        .collect())
}

fn write_node_value(address_space: &AddressSpace, node_to_write: &WriteValue) -> StatusCode {
    let attribute_id = match AttributeId::from_u32(node_to_write.attribute_id) {
        Ok(attribute_id) => attribute_id,
        Err(_) => return StatusCode::BadAttributeIdInvalid,
    };
    let node = match address_space.get_node(&node_to_write.node_id) {
        Ok(node) => node,
        Err(status_code) => return status_code,
    };
    let status_code = node.set_attribute(attribute_id, node_to_write.value.clone());
    if status_code.is_bad() {
        debug!(
            "Value could not be set to node {} attribute {:?}, error = {}",
            node_to_write.node_id, attribute_id, status_code
        );
    }
    status_code
}
