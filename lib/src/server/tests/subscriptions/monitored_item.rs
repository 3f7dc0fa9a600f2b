// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use super::*;

fn queued_values(monitored_item: &mut MonitoredItem) -> Vec<Option<Variant>> {
    monitored_item
        .all_notifications()
        .into_iter()
        .map(|n| n.value.value)
        .collect()
}

#[test]
fn queue_size_is_revised() {
    for (requested, revised) in [(0, 1), (1, 1), (5, 5), (10, 10), (100, 10)] {
        let monitored_item = make_monitored_item(1, 100f64, requested, true);
        assert_eq!(monitored_item.queue_size(), revised);
    }
}

#[test]
fn sampling_interval_is_revised() {
    let monitored_item = make_monitored_item(1, -1f64, 1, true);
    assert_eq!(monitored_item.sampling_interval(), 1000f64);
    let monitored_item = make_monitored_item(1, 0f64, 1, true);
    assert_eq!(monitored_item.sampling_interval(), 0f64);
    let monitored_item = make_monitored_item(1, 50f64, 1, true);
    assert_eq!(monitored_item.sampling_interval(), 100f64);
    let monitored_item = make_monitored_item(1, 250f64, 1, true);
    assert_eq!(monitored_item.sampling_interval(), 250f64);
}

#[test]
fn sampling_interval_follows_publishing_interval() {
    let mut monitored_item = make_monitored_item(1, -1f64, 1, true);
    assert!(monitored_item.set_publishing_interval(500f64));
    assert_eq!(monitored_item.sampling_interval(), 500f64);
    assert!(!monitored_item.set_publishing_interval(500f64));

    let mut monitored_item = make_monitored_item(1, 250f64, 1, true);
    assert!(!monitored_item.set_publishing_interval(500f64));
    assert_eq!(monitored_item.sampling_interval(), 250f64);
}

#[test]
fn filters_are_validated() {
    let filter = DataChangeFilter {
        trigger: DataChangeTrigger::StatusValue,
        deadband_type: DeadbandType::Absolute,
        deadband_value: 1f64,
    };
    let mut request = create_request(
        sample_node_id("v1"),
        MonitoringParameters {
            filter: Some(filter.clone()),
            ..monitoring_parameters(1, 100f64, 1, true)
        },
    );
    assert!(MonitoredItem::new(1, TimestampsToReturn::Both, 1000f64, &test_limits(), &request).is_ok());

    request.item_to_monitor.attribute_id = AttributeId::BrowseName as u32;
    assert_eq!(
        MonitoredItem::new(1, TimestampsToReturn::Both, 1000f64, &test_limits(), &request)
            .unwrap_err(),
        StatusCode::BadFilterNotAllowed
    );

    request.item_to_monitor.attribute_id = AttributeId::Value as u32;
    request.requested_parameters.filter = Some(DataChangeFilter {
        deadband_type: DeadbandType::Percent,
        ..filter
    });
    assert_eq!(
        MonitoredItem::new(1, TimestampsToReturn::Both, 1000f64, &test_limits(), &request)
            .unwrap_err(),
        StatusCode::BadDeadbandFilterInvalid
    );
}

#[test]
fn value_and_status_changes_are_reported() {
    let mut monitored_item = make_monitored_item(1, 100f64, 10, true);
    // The first value is always a change
    assert!(monitored_item.notify_data_value(DataValue::value_only(1i32)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(1i32)));
    assert!(monitored_item.notify_data_value(DataValue::value_only(2i32)));
    let mut bad = DataValue::value_only(2i32);
    bad.status = Some(StatusCode::BadNotReadable);
    assert!(monitored_item.notify_data_value(bad));
    assert_eq!(monitored_item.queue_len(), 3);
    assert_eq!(
        monitored_item.last_data_value().unwrap().status(),
        StatusCode::BadNotReadable
    );
}

#[test]
fn nan_is_not_a_change() {
    let mut monitored_item = make_monitored_item(1, 100f64, 10, true);
    assert!(monitored_item.notify_data_value(DataValue::value_only(f64::NAN)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(f64::NAN)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(f64::NAN)));
    assert!(monitored_item.notify_data_value(DataValue::value_only(1f64)));
    assert!(monitored_item.notify_data_value(DataValue::value_only(f32::NAN)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(f32::NAN)));
    assert_eq!(monitored_item.queue_len(), 3);
}

#[test]
fn deadband_filter() {
    let request = create_request(
        sample_node_id("v1"),
        MonitoringParameters {
            filter: Some(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValue,
                deadband_type: DeadbandType::Absolute,
                deadband_value: 5f64,
            }),
            ..monitoring_parameters(1, 100f64, 10, true)
        },
    );
    let mut monitored_item =
        MonitoredItem::new(1, TimestampsToReturn::Both, 1000f64, &test_limits(), &request).unwrap();
    assert!(monitored_item.notify_data_value(DataValue::value_only(10.0f64)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(12.0f64)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(15.0f64)));
    assert!(monitored_item.notify_data_value(DataValue::value_only(16.0f64)));
    assert_eq!(
        queued_values(&mut monitored_item),
        vec![Some(Variant::Double(10.0)), Some(Variant::Double(16.0))]
    );
}

#[test]
fn status_trigger_ignores_values() {
    let request = create_request(
        sample_node_id("v1"),
        MonitoringParameters {
            filter: Some(DataChangeFilter {
                trigger: DataChangeTrigger::Status,
                deadband_type: DeadbandType::None,
                deadband_value: 0f64,
            }),
            ..monitoring_parameters(1, 100f64, 10, true)
        },
    );
    let mut monitored_item =
        MonitoredItem::new(1, TimestampsToReturn::Both, 1000f64, &test_limits(), &request).unwrap();
    assert!(monitored_item.notify_data_value(DataValue::value_only(1i32)));
    assert!(!monitored_item.notify_data_value(DataValue::value_only(2i32)));
    assert!(monitored_item.notify_data_value(DataValue::from_status(StatusCode::BadNotReadable)));
}

#[test]
fn overflow_discard_oldest() {
    let mut monitored_item = make_monitored_item(1, 100f64, 2, true);
    for i in 1..=3 {
        assert!(monitored_item.notify_data_value(data_value(i)));
    }
    assert_eq!(monitored_item.queue_len(), 2);
    assert!(monitored_item.queue_overflow());

    let first = monitored_item.take_notification().unwrap();
    assert_eq!(first.value.value, Some(Variant::Int32(2)));
    assert!(first.value.status().is_overflow());
    assert!(first.value.status().is_good());
    assert!(!monitored_item.queue_overflow());

    let second = monitored_item.take_notification().unwrap();
    assert_eq!(second.value.value, Some(Variant::Int32(3)));
    assert!(!second.value.status().is_overflow());
    assert!(monitored_item.take_notification().is_none());
}

#[test]
fn overflow_discard_newest() {
    let mut monitored_item = make_monitored_item(1, 100f64, 2, false);
    for i in 1..=3 {
        assert!(monitored_item.notify_data_value(data_value(i)));
    }
    // The newest value was dropped but is still what later samples are compared to
    assert_eq!(
        monitored_item.last_data_value().unwrap().value,
        Some(Variant::Int32(3))
    );
    assert!(!monitored_item.notify_data_value(data_value(3)));

    let notifications = monitored_item.all_notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].value.value, Some(Variant::Int32(1)));
    assert!(notifications[0].value.status().is_overflow());
    assert_eq!(notifications[1].value.value, Some(Variant::Int32(2)));
    assert!(!notifications[1].value.status().is_overflow());
}

#[test]
fn overflow_queue_of_one() {
    let mut monitored_item = make_monitored_item(1, 100f64, 1, true);
    monitored_item.notify_data_value(data_value(1));
    assert!(!monitored_item.queue_overflow());
    monitored_item.notify_data_value(data_value(2));
    assert!(monitored_item.queue_overflow());
    let notification = monitored_item.take_notification().unwrap();
    assert_eq!(notification.value.value, Some(Variant::Int32(2)));
    assert!(notification.value.status().is_overflow());
}

#[test]
fn monitoring_modes() {
    let mut monitored_item = make_monitored_item(1, 100f64, 5, true);
    assert!(monitored_item.is_reporting());
    monitored_item.notify_data_value(data_value(1));
    monitored_item.notify_data_value(data_value(2));

    monitored_item.set_monitoring_mode(MonitoringMode::Sampling);
    assert!(monitored_item.is_sampling());
    assert!(!monitored_item.is_reporting());
    monitored_item.notify_data_value(data_value(3));
    assert_eq!(monitored_item.queue_len(), 3);

    monitored_item.set_monitoring_mode(MonitoringMode::Disabled);
    assert!(!monitored_item.is_sampling());
    assert!(!monitored_item.has_notifications());
    assert!(monitored_item.last_data_value().is_none());
    assert!(!monitored_item.notify_data_value(data_value(4)));
    assert!(!monitored_item.has_notifications());

    // Enabling again reports the current value even though it was seen before
    monitored_item.set_monitoring_mode(MonitoringMode::Reporting);
    assert!(monitored_item.notify_data_value(data_value(3)));
    assert_eq!(queued_values(&mut monitored_item), vec![Some(Variant::Int32(3))]);
}

#[test]
fn deleted_item_takes_nothing() {
    let mut monitored_item = make_monitored_item(1, 100f64, 5, true);
    monitored_item.notify_data_value(data_value(1));
    monitored_item.delete();
    assert!(monitored_item.is_deleted());
    assert!(!monitored_item.has_notifications());
    assert!(!monitored_item.notify_data_value(data_value(2)));
    assert!(!monitored_item.is_reporting());
}

#[test]
fn modify_shrinks_queue() {
    let mut monitored_item = make_monitored_item(1, 100f64, 5, true);
    for i in 1..=5 {
        monitored_item.notify_data_value(data_value(i));
    }
    let request = MonitoredItemModifyRequest {
        monitored_item_id: 1,
        requested_parameters: monitoring_parameters(99, 200f64, 2, true),
    };
    monitored_item
        .modify(TimestampsToReturn::Both, 1000f64, &test_limits(), &request)
        .unwrap();
    assert_eq!(monitored_item.client_handle(), 99);
    assert_eq!(monitored_item.sampling_interval(), 200f64);
    assert_eq!(monitored_item.queue_size(), 2);
    assert!(monitored_item.queue_overflow());
    assert_eq!(
        queued_values(&mut monitored_item),
        vec![Some(Variant::Int32(4)), Some(Variant::Int32(5))]
    );

    // Discarding newest keeps the front of the queue
    let mut monitored_item = make_monitored_item(1, 100f64, 5, false);
    for i in 1..=5 {
        monitored_item.notify_data_value(data_value(i));
    }
    let request = MonitoredItemModifyRequest {
        monitored_item_id: 1,
        requested_parameters: monitoring_parameters(1, 100f64, 2, false),
    };
    monitored_item
        .modify(TimestampsToReturn::Both, 1000f64, &test_limits(), &request)
        .unwrap();
    assert_eq!(
        queued_values(&mut monitored_item),
        vec![Some(Variant::Int32(1)), Some(Variant::Int32(2))]
    );
}

#[test]
fn modify_rejects_bad_filter() {
    let mut monitored_item = make_monitored_item(1, 100f64, 5, true);
    let request = MonitoredItemModifyRequest {
        monitored_item_id: 1,
        requested_parameters: MonitoringParameters {
            filter: Some(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValue,
                deadband_type: DeadbandType::Absolute,
                deadband_value: -1f64,
            }),
            ..monitoring_parameters(1, 100f64, 5, true)
        },
    };
    assert_eq!(
        monitored_item.modify(TimestampsToReturn::Both, 1000f64, &test_limits(), &request),
        Err(StatusCode::BadDeadbandFilterInvalid)
    );
}

#[test]
fn timestamps_are_trimmed() {
    let request = create_request(sample_node_id("v1"), monitoring_parameters(1, 100f64, 5, true));
    let mut monitored_item = MonitoredItem::new(
        1,
        TimestampsToReturn::Neither,
        1000f64,
        &test_limits(),
        &request,
    )
    .unwrap();
    monitored_item.notify_data_value(data_value(1));
    let notification = monitored_item.take_notification().unwrap();
    assert!(notification.value.source_timestamp.is_none());
    assert!(notification.value.server_timestamp.is_none());
    // The value compared against keeps its timestamps
    assert!(monitored_item
        .last_data_value()
        .unwrap()
        .source_timestamp
        .is_some());
}

#[test]
fn resolve_sample_source() {
    let (address_space, counter) = make_shared_sample_address_space();
    {
        let mut address_space = trace_write_lock!(address_space);
        VariableBuilder::new(&sample_node_id("secret"), "secret", "secret")
            .component_of(sample_node_id("MyDevices"))
            .value(1i32)
            .access_level(AccessLevel::empty())
            .insert(&mut address_space)
            .unwrap();
    }

    let source =
        SampleSource::resolve(&address_space, &ReadValueId::from(sample_node_id("MyVariable1")))
            .unwrap();
    assert!(source.subscribe().is_some());
    counter.store(7, Ordering::SeqCst);
    assert_eq!(source.read().value, Some(Variant::Double(7.0)));

    let source = SampleSource::resolve(
        &address_space,
        &ReadValueId {
            node_id: sample_node_id("MyDevices"),
            attribute_id: AttributeId::DisplayName as u32,
        },
    )
    .unwrap();
    assert!(source.subscribe().is_none());
    assert_eq!(
        source.read().value,
        Some(Variant::from(LocalizedText::from("My Devices")))
    );

    let resolve = |node_id: NodeId| SampleSource::resolve(&address_space, &node_id.into()).unwrap_err();
    assert_eq!(resolve(sample_node_id("unknown")), StatusCode::BadNodeIdUnknown);
    assert_eq!(resolve(sample_node_id("MyDevices")), StatusCode::BadAttributeIdInvalid);
    assert_eq!(resolve(sample_node_id("secret")), StatusCode::BadNotReadable);
}

#[test]
fn sample_reads_source() {
    let node_id = sample_node_id("accessor");
    let accessor = Arc::new(ValueAccessor::new(&node_id, DataValue::value_only(1i32), true));
    let source = SampleSource::Value(accessor.clone());
    let mut monitored_item = make_monitored_item(1, 100f64, 5, true);
    assert!(monitored_item.sample(&source));
    assert!(!monitored_item.sample(&source));
    accessor.set_value(DataValue::new_now(2i32));
    assert!(monitored_item.sample(&source));
    assert_eq!(
        queued_values(&mut monitored_item),
        vec![Some(Variant::Int32(1)), Some(Variant::Int32(2))]
    );
}
