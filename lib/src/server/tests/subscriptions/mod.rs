// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::time::Duration;

use super::*;

mod monitored_item;
mod subscription;

fn test_limits() -> SubscriptionLimits {
    SubscriptionLimits::default()
}

fn monitoring_parameters(
    client_handle: u32,
    sampling_interval: f64,
    queue_size: u32,
    discard_oldest: bool,
) -> MonitoringParameters {
    MonitoringParameters {
        client_handle,
        sampling_interval,
        filter: None,
        queue_size,
        discard_oldest,
    }
}

fn create_request(node_id: NodeId, parameters: MonitoringParameters) -> MonitoredItemCreateRequest {
    MonitoredItemCreateRequest::new(node_id.into(), MonitoringMode::Reporting, parameters)
}

/// A reporting item on the value of a variable. The client handle is the item id.
fn make_monitored_item(
    monitored_item_id: u32,
    sampling_interval: f64,
    queue_size: u32,
    discard_oldest: bool,
) -> MonitoredItem {
    let request = create_request(
        sample_node_id("v1"),
        monitoring_parameters(monitored_item_id, sampling_interval, queue_size, discard_oldest),
    );
    MonitoredItem::new(
        monitored_item_id,
        TimestampsToReturn::Both,
        1000f64,
        &test_limits(),
        &request,
    )
    .unwrap()
}

fn data_value(value: i32) -> DataValue {
    DataValue::new_now(value)
}

fn value_source(node_id: &NodeId) -> SampleSource {
    SampleSource::Value(Arc::new(ValueAccessor::new(node_id, DataValue::null(), false)))
}

/// The values carried by the data changes of a message, paired with the client handle
fn message_values(message: &NotificationMessage) -> Vec<(u32, Option<Variant>)> {
    message
        .data_changes()
        .map(|n| (n.client_handle, n.value.value.clone()))
        .collect()
}
