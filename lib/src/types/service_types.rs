// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Request and result structures of the attribute, view and subscription services. They are the
//! decoded form the session layer hands to the engine, there is no wire encoding here.

use crate::types::{
    basic_types::{
        AttributeId, BrowseDirection, DataChangeTrigger, DeadbandType, MonitoringMode, NodeClass,
    },
    data_value::DataValue,
    localized_text::LocalizedText,
    node_id::NodeId,
    notification_message::NotificationMessage,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    variant::Variant,
};

/// Identifies an attribute of a node to read or monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadValueId {
    pub node_id: NodeId,
    pub attribute_id: u32,
}

impl From<NodeId> for ReadValueId {
    /// Reads the Value attribute of the node
    fn from(node_id: NodeId) -> Self {
        ReadValueId {
            node_id,
            attribute_id: AttributeId::Value as u32,
        }
    }
}

impl From<&NodeId> for ReadValueId {
    fn from(node_id: &NodeId) -> Self {
        ReadValueId::from(node_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteValue {
    pub node_id: NodeId,
    pub attribute_id: u32,
    pub value: DataValue,
}

impl WriteValue {
    /// Writes the Value attribute of the node
    pub fn value_of<V>(node_id: NodeId, value: V) -> WriteValue
    where
        V: Into<Variant>,
    {
        WriteValue {
            node_id,
            attribute_id: AttributeId::Value as u32,
            value: DataValue::value_only(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseDescription {
    pub node_id: NodeId,
    pub browse_direction: BrowseDirection,
    /// Null matches every reference type
    pub reference_type_id: NodeId,
    pub include_subtypes: bool,
    /// Bitmask of `NodeClass` values, 0 matches every class
    pub node_class_mask: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDescription {
    pub reference_type_id: NodeId,
    pub is_forward: bool,
    pub node_id: NodeId,
    pub browse_name: QualifiedName,
    pub display_name: LocalizedText,
    pub node_class: NodeClass,
    pub type_definition: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResult {
    pub status_code: StatusCode,
    pub references: Vec<ReferenceDescription>,
}

/// One step of a relative path.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativePathElement {
    /// Null matches every reference type
    pub reference_type_id: NodeId,
    pub is_inverse: bool,
    pub include_subtypes: bool,
    pub target_name: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativePath {
    pub elements: Vec<RelativePathElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowsePath {
    pub starting_node: NodeId,
    pub relative_path: RelativePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowsePathTarget {
    pub target_id: NodeId,
    /// Always `u32::MAX`, every target is fully resolved in this server
    pub remaining_path_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowsePathResult {
    pub status_code: StatusCode,
    pub targets: Vec<BrowsePathTarget>,
}

/// A filter that decides when a sampled value counts as a change.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChangeFilter {
    pub trigger: DataChangeTrigger,
    pub deadband_type: DeadbandType,
    pub deadband_value: f64,
}

impl DataChangeFilter {
    /// Checks the filter can be evaluated. A percent deadband needs the engineering unit range of
    /// the variable, which is not modelled, so it is rejected.
    pub fn validate(&self) -> Result<(), StatusCode> {
        match self.deadband_type {
            DeadbandType::None => Ok(()),
            DeadbandType::Absolute if self.deadband_value >= 0f64 => Ok(()),
            DeadbandType::Absolute | DeadbandType::Percent => {
                Err(StatusCode::BadDeadbandFilterInvalid)
            }
        }
    }

    /// Compares one data value to another and returns true if they are the same according to
    /// the trigger type of status, status/value or status/value/timestamp
    pub fn compare(&self, v1: &DataValue, v2: &DataValue) -> bool {
        match self.trigger {
            DataChangeTrigger::Status => v1.status() == v2.status(),
            DataChangeTrigger::StatusValue => {
                v1.status() == v2.status() && self.compare_value_option(&v1.value, &v2.value)
            }
            DataChangeTrigger::StatusValueTimestamp => {
                v1.status() == v2.status()
                    && self.compare_value_option(&v1.value, &v2.value)
                    && v1.source_timestamp == v2.source_timestamp
            }
        }
    }

    fn compare_value_option(&self, v1: &Option<Variant>, v2: &Option<Variant>) -> bool {
        match (v1, v2) {
            (None, None) => true,
            (Some(v1), Some(v2)) => self.compare_value(v1, v2),
            _ => false,
        }
    }

    /// Compares two values, either straight or against the absolute deadband. Values that are
    /// not numeric never fall inside a deadband so any difference is a change.
    pub fn compare_value(&self, v1: &Variant, v2: &Variant) -> bool {
        match self.deadband_type {
            DeadbandType::Absolute => match (v1.as_f64(), v2.as_f64()) {
                (Some(v1), Some(v2)) => Self::abs_compare(v1, v2, self.deadband_value),
                _ => v1 == v2,
            },
            _ => v1 == v2,
        }
    }

    /// The two values are considered equal if their difference is less than or equal to the
    /// threshold.
    pub fn abs_compare(v1: f64, v2: f64, threshold_diff: f64) -> bool {
        (v1 - v2).abs() <= threshold_diff
    }
}

/// Parameters of a monitored item as requested by the client. The server revises the sampling
/// interval and queue size.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringParameters {
    pub client_handle: u32,
    /// Milliseconds. 0 samples on every source change, negative uses the publishing interval
    pub sampling_interval: f64,
    pub filter: Option<DataChangeFilter>,
    pub queue_size: u32,
    pub discard_oldest: bool,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        MonitoringParameters {
            client_handle: 0,
            sampling_interval: -1f64,
            filter: None,
            queue_size: 1,
            discard_oldest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemCreateRequest {
    pub item_to_monitor: ReadValueId,
    pub monitoring_mode: MonitoringMode,
    pub requested_parameters: MonitoringParameters,
}

impl MonitoredItemCreateRequest {
    pub fn new(
        item_to_monitor: ReadValueId,
        monitoring_mode: MonitoringMode,
        requested_parameters: MonitoringParameters,
    ) -> Self {
        Self {
            item_to_monitor,
            monitoring_mode,
            requested_parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemCreateResult {
    pub status_code: StatusCode,
    pub monitored_item_id: u32,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemModifyRequest {
    pub monitored_item_id: u32,
    pub requested_parameters: MonitoringParameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemModifyResult {
    pub status_code: StatusCode,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriptionRequest {
    /// Milliseconds
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    /// 0 means no limit
    pub max_notifications_per_publish: u32,
    pub publishing_enabled: bool,
    pub priority: u8,
}

impl Default for CreateSubscriptionRequest {
    fn default() -> Self {
        CreateSubscriptionRequest {
            requested_publishing_interval: 1000f64,
            requested_lifetime_count: 0,
            requested_max_keep_alive_count: 0,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: u32,
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifySubscriptionRequest {
    pub subscription_id: u32,
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifySubscriptionResponse {
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

/// Acknowledges receipt of one notification message, taking it out of the retransmission queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionAcknowledgement {
    pub subscription_id: u32,
    pub sequence_number: u32,
}

/// What a subscription hands the session layer on each publish. A keep-alive has a message with
/// no notification data.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResponse {
    pub subscription_id: u32,
    /// Sequence numbers still held for republish
    pub available_sequence_numbers: Vec<u32>,
    pub more_notifications: bool,
    pub notification_message: NotificationMessage,
}
