// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use opcua_engine::{
    server::prelude::*,
    sync::*,
    types::{
        CreateSubscriptionRequest, DataTypeId, DataValue, MonitoredItemCreateRequest, MonitoringMode,
        MonitoringParameters, NodeId, NotificationMessage, PublishResponse, Variant,
    },
};
use tokio::{sync::mpsc, task::JoinHandle, time};

pub const COUNTER_NAMESPACE: &str = "urn:counter-test:devices";

pub fn setup() {
    opcua_engine::console_logging::init();
}

/// An address space with a `Counter` variable beneath the objects folder
pub fn make_counter_address_space() -> (Arc<RwLock<AddressSpace>>, NodeId) {
    let mut address_space = AddressSpace::from_config(&ServerConfig::new("counter-test"));
    let ns = address_space.register_namespace(COUNTER_NAMESPACE).unwrap();
    let counter_id = NodeId::new(ns, "Counter");
    VariableBuilder::new(&counter_id, "Counter", "Counter")
        .organized_by(NodeId::objects_folder_id())
        .data_type(DataTypeId::UInt32)
        .value(0u32)
        .insert(&mut address_space)
        .unwrap();
    (Arc::new(RwLock::new(address_space)), counter_id)
}

/// An address space with a `HookedCounter` variable beneath the objects folder. Its value is
/// read through a getter from the returned counter, which nothing in the engine changes.
pub fn make_hooked_counter_address_space() -> (Arc<RwLock<AddressSpace>>, NodeId, Arc<AtomicU32>) {
    let mut address_space = AddressSpace::from_config(&ServerConfig::new("counter-test"));
    let ns = address_space.register_namespace(COUNTER_NAMESPACE).unwrap();
    let counter_id = NodeId::new(ns, "HookedCounter");
    let counter = Arc::new(AtomicU32::new(0));
    let getter_counter = counter.clone();
    VariableBuilder::new(&counter_id, "HookedCounter", "HookedCounter")
        .organized_by(NodeId::objects_folder_id())
        .data_type(DataTypeId::UInt32)
        .value_getter(AttrFnGetter::new_boxed(move |_, _| {
            Ok(Some(DataValue::new_now(getter_counter.load(Ordering::SeqCst))))
        }))
        .insert(&mut address_space)
        .unwrap();
    (Arc::new(RwLock::new(address_space)), counter_id, counter)
}

/// Increments a hooked counter every interval, starting one interval from now. The engine is
/// never told, the new value is only seen when the variable is sampled.
pub fn spawn_hooked_counter(counter: Arc<AtomicU32>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = time::interval_at(time::Instant::now() + interval, interval);
        loop {
            timer.tick().await;
            counter.fetch_add(1, Ordering::SeqCst);
        }
    })
}

/// Increments the counter every interval, starting one interval from now
pub fn spawn_counter(
    address_space: Arc<RwLock<AddressSpace>>,
    counter_id: NodeId,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut count = 0u32;
        let mut timer = time::interval_at(time::Instant::now() + interval, interval);
        loop {
            timer.tick().await;
            count += 1;
            let _ = address_space
                .read()
                .set_variable_value(counter_id.clone(), count);
        }
    })
}

pub fn subscription_request(
    publishing_interval: f64,
    max_keep_alive_count: u32,
    lifetime_count: u32,
) -> CreateSubscriptionRequest {
    CreateSubscriptionRequest {
        requested_publishing_interval: publishing_interval,
        requested_lifetime_count: lifetime_count,
        requested_max_keep_alive_count: max_keep_alive_count,
        ..Default::default()
    }
}

pub fn monitor_value(
    node_id: &NodeId,
    client_handle: u32,
    sampling_interval: f64,
    queue_size: u32,
) -> MonitoredItemCreateRequest {
    MonitoredItemCreateRequest::new(
        node_id.into(),
        MonitoringMode::Reporting,
        MonitoringParameters {
            client_handle,
            sampling_interval,
            queue_size,
            ..Default::default()
        },
    )
}

/// Takes every response already on the channel
pub fn drain_responses(receiver: &mut mpsc::Receiver<PublishResponse>) -> Vec<PublishResponse> {
    let mut responses = Vec::new();
    while let Ok(response) = receiver.try_recv() {
        responses.push(response);
    }
    responses
}

/// The counter values carried by a message
pub fn counter_values(message: &NotificationMessage) -> Vec<u32> {
    message
        .data_changes()
        .map(|n| match n.value.value {
            Some(Variant::UInt32(v)) => v,
            ref value => panic!("Unexpected counter value {:?}", value),
        })
        .collect()
}
