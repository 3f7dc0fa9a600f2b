// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Notification messages, the payload of every publish response.

use crate::types::{data_value::DataValue, date_time::DateTime, status_code::StatusCode};

/// A changed value of one monitored item, identified by the handle the client gave the item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredItemNotification {
    pub client_handle: u32,
    pub value: DataValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataChangeNotification {
    pub monitored_items: Vec<MonitoredItemNotification>,
}

/// Tells the client the subscription changed state, e.g. `BadTimeout` when its lifetime expired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChangeNotification {
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NotificationData {
    DataChange(DataChangeNotification),
    StatusChange(StatusChangeNotification),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMessage {
    pub sequence_number: u32,
    pub publish_time: DateTime,
    /// Empty for a keep-alive
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    /// Create a notification message which contains data changes.
    pub fn data_change(
        sequence_number: u32,
        publish_time: DateTime,
        monitored_items: Vec<MonitoredItemNotification>,
    ) -> NotificationMessage {
        let data_change_notification = DataChangeNotification { monitored_items };
        trace!("data change notification = {:?}", data_change_notification);
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: vec![NotificationData::DataChange(data_change_notification)],
        }
    }

    /// Create a status change notification message
    pub fn status_change(
        sequence_number: u32,
        publish_time: DateTime,
        status: StatusCode,
    ) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: vec![NotificationData::StatusChange(StatusChangeNotification {
                status,
            })],
        }
    }

    /// Create a keep-alive notification message. Its sequence number is the one the next data
    /// message will carry.
    pub fn keep_alive(sequence_number: u32, publish_time: DateTime) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: Vec::new(),
        }
    }

    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.is_empty()
    }

    /// Returns every data change in the message, in the order they were drained.
    pub fn data_changes(&self) -> impl Iterator<Item = &MonitoredItemNotification> {
        self.notification_data
            .iter()
            .filter_map(|n| match n {
                NotificationData::DataChange(d) => Some(d.monitored_items.iter()),
                NotificationData::StatusChange(_) => None,
            })
            .flatten()
    }

    /// Returns the status of a status change message
    pub fn status_change_status(&self) -> Option<StatusCode> {
        self.notification_data.iter().find_map(|n| match n {
            NotificationData::StatusChange(s) => Some(s.status),
            NotificationData::DataChange(_) => None,
        })
    }
}

#[test]
fn notification_message_kinds() {
    let now = DateTime::now();
    let keep_alive = NotificationMessage::keep_alive(5, now);
    assert!(keep_alive.is_keep_alive());
    assert_eq!(keep_alive.data_changes().count(), 0);

    let message = NotificationMessage::data_change(
        5,
        now,
        vec![
            MonitoredItemNotification {
                client_handle: 1,
                value: DataValue::value_only(1i32),
            },
            MonitoredItemNotification {
                client_handle: 2,
                value: DataValue::value_only(2i32),
            },
        ],
    );
    assert!(!message.is_keep_alive());
    let handles = message.data_changes().map(|n| n.client_handle).collect::<Vec<_>>();
    assert_eq!(handles, vec![1, 2]);
    assert_eq!(message.status_change_status(), None);

    let status = NotificationMessage::status_change(6, now, StatusCode::BadTimeout);
    assert_eq!(status.status_change_status(), Some(StatusCode::BadTimeout));
}
