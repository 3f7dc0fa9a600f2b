// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::watch;

use crate::sync::*;
use crate::types::{
    basic_types::{AttributeId, MonitoringMode, TimestampsToReturn},
    data_value::DataValue,
    node_id::NodeId,
    notification_message::MonitoredItemNotification,
    service_types::{
        DataChangeFilter, MonitoredItemCreateRequest, MonitoredItemModifyRequest,
        MonitoringParameters, ReadValueId,
    },
    status_code::StatusCode,
    variant::Variant,
};

use crate::server::{
    address_space::{accessor::ValueAccessor, node::AccessLevel, AddressSpace},
    config::SubscriptionLimits,
};

/// Decides whether a freshly sampled value is a change worth reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    /// A change in either the value or the status
    None,
    DataChangeFilter(DataChangeFilter),
}

impl FilterType {
    pub fn from_filter(
        filter: Option<&DataChangeFilter>,
        attribute_id: AttributeId,
    ) -> Result<FilterType, StatusCode> {
        match filter {
            None => Ok(FilterType::None),
            Some(_) if attribute_id != AttributeId::Value => {
                error!(
                    "Data change filter is not allowed on attribute {:?}",
                    attribute_id
                );
                Err(StatusCode::BadFilterNotAllowed)
            }
            Some(filter) => {
                filter.validate()?;
                Ok(FilterType::DataChangeFilter(filter.clone()))
            }
        }
    }

    /// Tests if the new value has changed from the last one
    pub fn is_changed(&self, data_value: &DataValue, last_data_value: &DataValue) -> bool {
        match self {
            FilterType::None => {
                !same_value(&data_value.value, &last_data_value.value)
                    || data_value.status() != last_data_value.status()
            }
            FilterType::DataChangeFilter(filter) => !filter.compare(data_value, last_data_value),
        }
    }
}

/// Exact equality, except that a NaN is the same as the NaN before it. Otherwise a source stuck
/// on NaN would report a change on every sample.
fn same_value(value: &Option<Variant>, last_value: &Option<Variant>) -> bool {
    match (value, last_value) {
        (Some(Variant::Double(v1)), Some(Variant::Double(v2))) if v1.is_nan() && v2.is_nan() => true,
        (Some(Variant::Float(v1)), Some(Variant::Float(v2))) if v1.is_nan() && v2.is_nan() => true,
        _ => value == last_value,
    }
}

/// Where a monitored item gets its values from. The Value attribute of a variable is sampled
/// straight from its accessor, other attributes are read through the address space.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub enum SampleSource {
    Value(Arc<ValueAccessor>),
    Attribute {
        #[derivative(Debug = "ignore")]
        address_space: Arc<RwLock<AddressSpace>>,
        node_id: NodeId,
        attribute_id: AttributeId,
    },
}

impl SampleSource {
    /// Resolves the source of an item to monitor. The node must exist, have the attribute and,
    /// for a value, be readable.
    pub fn resolve(
        address_space: &Arc<RwLock<AddressSpace>>,
        item_to_monitor: &ReadValueId,
    ) -> Result<SampleSource, StatusCode> {
        let attribute_id = AttributeId::from_u32(item_to_monitor.attribute_id)
            .map_err(|_| StatusCode::BadAttributeIdInvalid)?;
        let locked = trace_read_lock!(address_space);
        let node = locked.get_node(&item_to_monitor.node_id)?;
        if attribute_id == AttributeId::Value {
            let accessor = node
                .value_accessor()
                .ok_or(StatusCode::BadAttributeIdInvalid)?;
            if !node.access_level().contains(AccessLevel::CURRENT_READ) {
                return Err(StatusCode::BadNotReadable);
            }
            Ok(SampleSource::Value(accessor.clone()))
        } else {
            // Fails for an attribute the node does not have
            let _ = node.get_attribute(attribute_id)?;
            Ok(SampleSource::Attribute {
                address_space: address_space.clone(),
                node_id: item_to_monitor.node_id.clone(),
                attribute_id,
            })
        }
    }

    /// Reads the current value. Failures are carried in the status of the value.
    pub fn read(&self) -> DataValue {
        match self {
            SampleSource::Value(accessor) => accessor.read(),
            SampleSource::Attribute {
                address_space,
                node_id,
                attribute_id,
            } => {
                let address_space = trace_read_lock!(address_space);
                address_space
                    .get_node(node_id)
                    .and_then(|node| node.get_attribute(*attribute_id))
                    .unwrap_or_else(DataValue::from_status)
            }
        }
    }

    /// A receiver that is told when the value changes, if the source can push changes.
    pub fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        match self {
            SampleSource::Value(accessor) => Some(accessor.subscribe()),
            SampleSource::Attribute { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItem {
    monitored_item_id: u32,
    item_to_monitor: ReadValueId,
    monitoring_mode: MonitoringMode,
    client_handle: u32,
    /// The revised sampling interval in milliseconds. 0 samples on every change of the source.
    sampling_interval: f64,
    /// Whether the client asked to sample at the publishing interval of the subscription
    uses_publishing_interval: bool,
    filter: FilterType,
    discard_oldest: bool,
    queue_size: usize,
    /// The notification queue is arranged from oldest to newest, i.e. pop front gets the oldest
    /// message, pop back gets the most recent.
    notification_queue: VecDeque<MonitoredItemNotification>,
    /// Set when a value was lost to overflow and cleared once a drained notification reports it
    queue_overflow: bool,
    timestamps_to_return: TimestampsToReturn,
    last_data_value: Option<DataValue>,
    deleted: bool,
}

impl MonitoredItem {
    pub fn new(
        monitored_item_id: u32,
        timestamps_to_return: TimestampsToReturn,
        publishing_interval: f64,
        limits: &SubscriptionLimits,
        request: &MonitoredItemCreateRequest,
    ) -> Result<MonitoredItem, StatusCode> {
        let attribute_id = AttributeId::from_u32(request.item_to_monitor.attribute_id)
            .map_err(|_| StatusCode::BadAttributeIdInvalid)?;
        let parameters = &request.requested_parameters;
        let filter = FilterType::from_filter(parameters.filter.as_ref(), attribute_id)?;
        let queue_size = Self::sanitize_queue_size(limits, parameters.queue_size as usize);
        let mut monitored_item = MonitoredItem {
            monitored_item_id,
            item_to_monitor: request.item_to_monitor.clone(),
            monitoring_mode: request.monitoring_mode,
            client_handle: parameters.client_handle,
            sampling_interval: 0f64,
            uses_publishing_interval: false,
            filter,
            discard_oldest: parameters.discard_oldest,
            queue_size,
            notification_queue: VecDeque::with_capacity(queue_size),
            queue_overflow: false,
            timestamps_to_return,
            last_data_value: None,
            deleted: false,
        };
        monitored_item.set_sampling_interval(
            limits,
            parameters.sampling_interval,
            publishing_interval,
        );
        Ok(monitored_item)
    }

    /// Modifies the existing item with the values of the modify request.
    pub fn modify(
        &mut self,
        timestamps_to_return: TimestampsToReturn,
        publishing_interval: f64,
        limits: &SubscriptionLimits,
        request: &MonitoredItemModifyRequest,
    ) -> Result<(), StatusCode> {
        let parameters: &MonitoringParameters = &request.requested_parameters;
        let attribute_id = AttributeId::from_u32(self.item_to_monitor.attribute_id)
            .map_err(|_| StatusCode::BadAttributeIdInvalid)?;
        self.filter = FilterType::from_filter(parameters.filter.as_ref(), attribute_id)?;
        self.timestamps_to_return = timestamps_to_return;
        self.set_sampling_interval(limits, parameters.sampling_interval, publishing_interval);
        self.queue_size = Self::sanitize_queue_size(limits, parameters.queue_size as usize);
        self.client_handle = parameters.client_handle;
        self.discard_oldest = parameters.discard_oldest;

        // Shrink the notification queue to the new size, losing the values the policy discards
        if self.notification_queue.len() > self.queue_size {
            let excess = self.notification_queue.len() - self.queue_size;
            if self.discard_oldest {
                let _ = self.notification_queue.drain(0..excess);
            } else {
                self.notification_queue.truncate(self.queue_size);
            }
            self.queue_overflow = true;
        }
        Ok(())
    }

    /// Takes the requested sampling interval value supplied by client and ensures it is within
    /// the range supported by the server. A negative interval follows the publishing interval.
    fn set_sampling_interval(
        &mut self,
        limits: &SubscriptionLimits,
        requested_sampling_interval: f64,
        publishing_interval: f64,
    ) {
        self.uses_publishing_interval = requested_sampling_interval < 0f64;
        self.sampling_interval = if self.uses_publishing_interval {
            publishing_interval
        } else if requested_sampling_interval == 0f64 {
            0f64
        } else {
            requested_sampling_interval.max(limits.min_sampling_interval_ms)
        };
    }

    /// Follows a new publishing interval of the subscription. Returns true if the sampling
    /// interval changed as a result.
    pub fn set_publishing_interval(&mut self, publishing_interval: f64) -> bool {
        if self.uses_publishing_interval && self.sampling_interval != publishing_interval {
            self.sampling_interval = publishing_interval;
            true
        } else {
            false
        }
    }

    /// Takes the requested queue size and ensures it is within the range supported by the server
    fn sanitize_queue_size(limits: &SubscriptionLimits, requested_queue_size: usize) -> usize {
        if requested_queue_size <= 1 {
            1
        } else if requested_queue_size > limits.max_monitored_item_queue_size {
            limits.max_monitored_item_queue_size.max(1)
        } else {
            requested_queue_size
        }
    }

    /// Reads the source and processes the value. Returns true if the value was a change.
    pub fn sample(&mut self, source: &SampleSource) -> bool {
        if !self.is_sampling() {
            return false;
        }
        let data_value = source.read();
        self.notify_data_value(data_value)
    }

    /// Compares a value to the last one recorded and queues a notification if it changed.
    /// Returns true if the value was a change. Deleted and disabled items ignore values.
    pub fn notify_data_value(&mut self, mut data_value: DataValue) -> bool {
        if !self.is_sampling() {
            return false;
        }
        let data_change = match self.last_data_value {
            Some(ref last_data_value) => self.filter.is_changed(&data_value, last_data_value),
            None => {
                // There is no previous data value so yes consider it changed
                trace!(
                    "No last data value so item has changed, node {}",
                    self.item_to_monitor.node_id
                );
                true
            }
        };
        if data_change {
            trace!(
                "Data change on item {}, node {}, data_value = {:?}",
                self.monitored_item_id,
                self.item_to_monitor.node_id,
                data_value
            );
            // Store current data value to compare against on the next sample
            self.last_data_value = Some(data_value.clone());
            // Strip out timestamps that subscriber is not interested in
            data_value.trim_timestamps(self.timestamps_to_return);
            let client_handle = self.client_handle;
            self.enqueue_notification(MonitoredItemNotification {
                client_handle,
                value: data_value,
            });
        }
        data_change
    }

    /// Enqueues a notification, applying the overflow policy when the queue is full
    fn enqueue_notification(&mut self, notification: MonitoredItemNotification) {
        if self.notification_queue.len() >= self.queue_size {
            debug!(
                "Data change overflow, item {}, node {}",
                self.monitored_item_id, self.item_to_monitor.node_id
            );
            self.queue_overflow = true;
            if self.discard_oldest {
                // Throw away oldest item (the one at the start) to make space at the end
                let _ = self.notification_queue.pop_front();
            } else {
                // Keep what is queued, the new value is lost
                return;
            }
        }
        self.notification_queue.push_back(notification);
    }

    /// Takes the oldest notification from the queue. The first notification taken after values
    /// were lost carries the overflow bit in its status.
    pub fn take_notification(&mut self) -> Option<MonitoredItemNotification> {
        let mut notification = self.notification_queue.pop_front()?;
        if self.queue_overflow {
            notification.value.status = Some(notification.value.status().set_overflow(true));
            self.queue_overflow = false;
        }
        Some(notification)
    }

    /// Retrieves all the notifications from the queue, oldest to newest
    pub fn all_notifications(&mut self) -> Vec<MonitoredItemNotification> {
        let mut notifications = Vec::with_capacity(self.notification_queue.len());
        while let Some(notification) = self.take_notification() {
            notifications.push(notification);
        }
        notifications
    }

    pub fn set_monitoring_mode(&mut self, monitoring_mode: MonitoringMode) {
        if monitoring_mode == MonitoringMode::Disabled {
            // A disabled item holds nothing, re-enabling reports the current value afresh
            self.notification_queue.clear();
            self.queue_overflow = false;
            self.last_data_value = None;
        }
        self.monitoring_mode = monitoring_mode;
    }

    /// Marks the item deleted and discards its queue. Nothing is queued on it afterwards.
    pub fn delete(&mut self) {
        self.deleted = true;
        self.notification_queue.clear();
        self.queue_overflow = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Tests if the item takes samples, i.e. it is neither deleted nor disabled
    pub fn is_sampling(&self) -> bool {
        !self.deleted && self.monitoring_mode != MonitoringMode::Disabled
    }

    /// Tests if queued notifications are delivered to the client
    pub fn is_reporting(&self) -> bool {
        !self.deleted && self.monitoring_mode == MonitoringMode::Reporting
    }

    pub fn has_notifications(&self) -> bool {
        !self.notification_queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.notification_queue.len()
    }

    pub fn queue_overflow(&self) -> bool {
        self.queue_overflow
    }

    pub fn monitored_item_id(&self) -> u32 {
        self.monitored_item_id
    }

    pub fn item_to_monitor(&self) -> &ReadValueId {
        &self.item_to_monitor
    }

    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub fn discard_oldest(&self) -> bool {
        self.discard_oldest
    }

    pub fn monitoring_mode(&self) -> MonitoringMode {
        self.monitoring_mode
    }

    pub fn filter(&self) -> &FilterType {
        &self.filter
    }

    pub fn timestamps_to_return(&self) -> TimestampsToReturn {
        self.timestamps_to_return
    }

    pub fn last_data_value(&self) -> Option<&DataValue> {
        self.last_data_value.as_ref()
    }
}
