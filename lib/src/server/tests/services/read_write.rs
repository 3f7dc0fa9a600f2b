// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use super::*;

fn read_value_id(node_id: NodeId, attribute_id: AttributeId) -> ReadValueId {
    ReadValueId {
        node_id,
        attribute_id: attribute_id as u32,
    }
}

#[test]
fn read_partial_failures() {
    let (address_space, _) = make_sample_address_space();
    let nodes_to_read = vec![
        ReadValueId::from(sample_node_id("v1")),
        ReadValueId::from(sample_node_id("unknown")),
        read_value_id(sample_node_id("MyDevices"), AttributeId::Value),
    ];
    let results = attribute::read(
        &address_space,
        &small_limits(),
        &nodes_to_read,
        TimestampsToReturn::Both,
    )
    .unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].value, Some(Variant::Int32(30)));
    assert!(results[0].status().is_good());
    assert!(results[0].server_timestamp.is_some());

    assert_eq!(results[1].status(), StatusCode::BadNodeIdUnknown);
    assert!(results[1].value.is_none());
    // An object has no value attribute
    assert_eq!(results[2].status(), StatusCode::BadAttributeIdInvalid);
}

#[test]
fn read_attributes() {
    let (address_space, counter) = make_sample_address_space();
    counter.store(42, Ordering::SeqCst);
    let nodes_to_read = vec![
        read_value_id(sample_node_id("MyVariable1"), AttributeId::Value),
        read_value_id(sample_node_id("MyVariable1"), AttributeId::BrowseName),
        read_value_id(sample_node_id("MyDevices"), AttributeId::NodeClass),
    ];
    let results = attribute::read(
        &address_space,
        &small_limits(),
        &nodes_to_read,
        TimestampsToReturn::Neither,
    )
    .unwrap();
    assert_eq!(results[0].value, Some(Variant::Double(42.0)));
    assert_eq!(
        results[1].value,
        Some(Variant::from(QualifiedName::from("MyVariable1")))
    );
    assert_eq!(
        results[2].value,
        Some(Variant::Int32(NodeClass::Object as i32))
    );
    assert!(results
        .iter()
        .all(|r| r.source_timestamp.is_none() && r.server_timestamp.is_none()));
}

#[test]
fn read_trims_timestamps() {
    let (address_space, _) = make_sample_address_space();
    address_space
        .set_variable_value(sample_node_id("v1"), 31i32)
        .unwrap();
    let nodes_to_read = vec![ReadValueId::from(sample_node_id("v1"))];

    let read = |timestamps_to_return| {
        attribute::read(
            &address_space,
            &small_limits(),
            &nodes_to_read,
            timestamps_to_return,
        )
        .unwrap()
        .remove(0)
    };
    let value = read(TimestampsToReturn::Source);
    assert!(value.source_timestamp.is_some() && value.server_timestamp.is_none());
    let value = read(TimestampsToReturn::Server);
    assert!(value.source_timestamp.is_none() && value.server_timestamp.is_some());
    let value = read(TimestampsToReturn::Both);
    assert!(value.source_timestamp.is_some() && value.server_timestamp.is_some());
}

#[test]
fn read_batch_limits() {
    let (address_space, _) = make_sample_address_space();
    assert_eq!(
        attribute::read(
            &address_space,
            &small_limits(),
            &[],
            TimestampsToReturn::Both
        ),
        Err(StatusCode::BadNothingToDo)
    );
    let nodes_to_read = (0..4)
        .map(|_| ReadValueId::from(sample_node_id("v1")))
        .collect::<Vec<_>>();
    assert_eq!(
        attribute::read(
            &address_space,
            &small_limits(),
            &nodes_to_read,
            TimestampsToReturn::Both
        ),
        Err(StatusCode::BadTooManyOperations)
    );
}

#[test]
fn write_partial_failures() {
    let (address_space, _) = make_sample_address_space();
    let nodes_to_write = vec![
        WriteValue::value_of(sample_node_id("MyVariable2"), 11.5f64),
        // Not writable
        WriteValue::value_of(sample_node_id("v1"), 1i32),
        // Wrong type
        WriteValue::value_of(sample_node_id("MyVariable2"), "eleven"),
    ];
    let results = attribute::write(&address_space, &small_limits(), &nodes_to_write).unwrap();
    assert_eq!(
        results,
        vec![
            StatusCode::Good,
            StatusCode::BadNotWritable,
            StatusCode::BadTypeMismatch
        ]
    );
    // The good write stuck and the bad ones did not touch anything
    assert_eq!(
        address_space
            .get_variable_value(sample_node_id("MyVariable2"))
            .unwrap()
            .value,
        Some(Variant::Double(11.5))
    );
    assert_eq!(
        address_space
            .get_variable_value(sample_node_id("v1"))
            .unwrap()
            .value,
        Some(Variant::Int32(30))
    );
}

#[test]
fn write_attributes_other_than_value() {
    let (address_space, _) = make_sample_address_space();
    let nodes_to_write = vec![
        WriteValue {
            node_id: sample_node_id("MyVariable2"),
            attribute_id: AttributeId::BrowseName as u32,
            value: DataValue::value_only(QualifiedName::from("Renamed")),
        },
        WriteValue {
            node_id: sample_node_id("MyVariable2"),
            attribute_id: 999,
            value: DataValue::value_only(1i32),
        },
        WriteValue::value_of(sample_node_id("unknown"), 1i32),
    ];
    let results = attribute::write(&address_space, &small_limits(), &nodes_to_write).unwrap();
    assert_eq!(
        results,
        vec![
            StatusCode::BadNotWritable,
            StatusCode::BadAttributeIdInvalid,
            StatusCode::BadNodeIdUnknown
        ]
    );
}

#[test]
fn write_batch_limits() {
    let (address_space, _) = make_sample_address_space();
    assert_eq!(
        attribute::write(&address_space, &small_limits(), &[]),
        Err(StatusCode::BadNothingToDo)
    );
    let nodes_to_write = (0..4)
        .map(|i| WriteValue::value_of(sample_node_id("MyVariable2"), i as f64))
        .collect::<Vec<_>>();
    assert_eq!(
        attribute::write(&address_space, &small_limits(), &nodes_to_write),
        Err(StatusCode::BadTooManyOperations)
    );
    // Nothing in a refused batch is written
    assert_eq!(
        address_space
            .get_variable_value(sample_node_id("MyVariable2"))
            .unwrap()
            .value,
        Some(Variant::Double(10.0))
    );
}
