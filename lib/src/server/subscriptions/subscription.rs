// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::core::{handle::Handle, runtime::RuntimeComponent};
use crate::sync::*;
use crate::types::{
    date_time::DateTime,
    notification_message::{MonitoredItemNotification, NotificationMessage},
    service_types::PublishResponse,
    status_code::StatusCode,
};

use super::{
    duration_from_ms,
    monitored_item::{MonitoredItem, SampleSource},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created but the publishing timer has not fired yet
    Creating,
    /// The last cycle published notifications or a keep-alive
    Normal,
    /// The last cycle passed with nothing sent and the lifetime counter is counting down
    Late,
    Closed,
}

/// The outcome of one publishing cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TickResult {
    /// Nothing to send this cycle
    None,
    /// Notifications were drained. If more are queued the caller should run another cycle
    /// straight away.
    Notifications {
        message: NotificationMessage,
        more_notifications: bool,
    },
    /// The keep-alive count was reached with nothing to send
    KeepAlive(NotificationMessage),
    /// The lifetime ran out. The message carries a `BadTimeout` status change and the
    /// subscription is now closed.
    Expired(NotificationMessage),
}

/// A monitored item of a subscription, with where it samples from and its sampling task.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct MonitoredItemEntry {
    pub(crate) monitored_item: Arc<Mutex<MonitoredItem>>,
    pub(crate) source: SampleSource,
    #[derivative(Debug = "ignore")]
    sampler: Option<JoinHandle<()>>,
}

impl MonitoredItemEntry {
    /// Deletes the item under its lock and stops its sampler. Once this returns nothing more is
    /// queued on the item.
    fn dispose(&mut self) {
        trace_lock!(self.monitored_item).delete();
        if let Some(sampler) = self.sampler.take() {
            sampler.abort();
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Subscription {
    subscription_id: u32,
    /// Publishing interval in milliseconds
    publishing_interval: f64,
    /// Number of consecutive cycles without a data publish or acknowledgement before the
    /// subscription expires
    max_lifetime_count: u32,
    /// Number of consecutive empty cycles before a keep-alive is sent
    max_keep_alive_count: u32,
    /// 0 for no limit
    max_notifications_per_publish: u32,
    /// Advisory only. Every subscription publishes on its own task so there is never a shared
    /// cycle for it to order.
    priority: u8,
    publishing_enabled: bool,
    state: SubscriptionState,
    lifetime_counter: u32,
    keep_alive_counter: u32,
    /// The next sequence number to be sent
    sequence_number: Handle,
    /// Monitored items in the order they were created
    monitored_items: BTreeMap<u32, MonitoredItemEntry>,
    /// Sent notification messages that have not been acknowledged yet, oldest first
    retransmission_queue: VecDeque<NotificationMessage>,
    max_retransmission_queue_size: usize,
    #[derivative(Debug = "ignore")]
    publisher: Option<JoinHandle<()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl Subscription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscription_id: u32,
        publishing_enabled: bool,
        publishing_interval: f64,
        max_lifetime_count: u32,
        max_keep_alive_count: u32,
        max_notifications_per_publish: u32,
        priority: u8,
        max_retransmission_queue_size: usize,
    ) -> Subscription {
        Subscription {
            subscription_id,
            publishing_interval,
            max_lifetime_count,
            max_keep_alive_count,
            max_notifications_per_publish,
            priority,
            publishing_enabled,
            state: SubscriptionState::Creating,
            lifetime_counter: 0,
            keep_alive_counter: 0,
            sequence_number: Handle::new(1),
            monitored_items: BTreeMap::new(),
            retransmission_queue: VecDeque::new(),
            max_retransmission_queue_size,
            publisher: None,
        }
    }

    pub fn subscription_id(&self) -> u32 {
        self.subscription_id
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SubscriptionState::Closed
    }

    pub fn publishing_interval(&self) -> f64 {
        self.publishing_interval
    }

    pub fn max_lifetime_count(&self) -> u32 {
        self.max_lifetime_count
    }

    pub fn max_keep_alive_count(&self) -> u32 {
        self.max_keep_alive_count
    }

    pub fn max_notifications_per_publish(&self) -> u32 {
        self.max_notifications_per_publish
    }

    /// The priority the client asked for. It is kept and reported but does not change when the
    /// subscription publishes.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn publishing_enabled(&self) -> bool {
        self.publishing_enabled
    }

    pub fn lifetime_counter(&self) -> u32 {
        self.lifetime_counter
    }

    pub fn keep_alive_counter(&self) -> u32 {
        self.keep_alive_counter
    }

    /// Changes the timing and limits of the subscription. Values must already be revised.
    pub fn modify(
        &mut self,
        publishing_interval: f64,
        max_lifetime_count: u32,
        max_keep_alive_count: u32,
        max_notifications_per_publish: u32,
        priority: u8,
    ) {
        self.publishing_interval = publishing_interval;
        self.max_lifetime_count = max_lifetime_count;
        self.max_keep_alive_count = max_keep_alive_count;
        self.max_notifications_per_publish = max_notifications_per_publish;
        self.priority = priority;
        // Counters restart against the new limits
        self.lifetime_counter = 0;
        self.keep_alive_counter = 0;
    }

    pub fn set_publishing_enabled(&mut self, publishing_enabled: bool) {
        self.publishing_enabled = publishing_enabled;
    }

    pub fn monitored_item_count(&self) -> usize {
        self.monitored_items.len()
    }

    pub fn contains_monitored_item(&self, monitored_item_id: u32) -> bool {
        self.monitored_items.contains_key(&monitored_item_id)
    }

    pub fn monitored_item_ids(&self) -> Vec<u32> {
        self.monitored_items.keys().copied().collect()
    }

    pub fn monitored_item(&self, monitored_item_id: u32) -> Option<Arc<Mutex<MonitoredItem>>> {
        self.monitored_items
            .get(&monitored_item_id)
            .map(|entry| entry.monitored_item.clone())
    }

    pub(crate) fn monitored_item_entry(&self, monitored_item_id: u32) -> Option<&MonitoredItemEntry> {
        self.monitored_items.get(&monitored_item_id)
    }

    /// Adds a monitored item and the source it samples from. Returns the shared item, or
    /// `BadSubscriptionIdInvalid` once the subscription is closed.
    pub fn insert_monitored_item(
        &mut self,
        monitored_item: MonitoredItem,
        source: SampleSource,
    ) -> Result<Arc<Mutex<MonitoredItem>>, StatusCode> {
        if self.is_closed() {
            return Err(StatusCode::BadSubscriptionIdInvalid);
        }
        let monitored_item_id = monitored_item.monitored_item_id();
        let monitored_item = Arc::new(Mutex::new(monitored_item));
        let entry = MonitoredItemEntry {
            monitored_item: monitored_item.clone(),
            source,
            sampler: None,
        };
        if let Some(mut previous) = self.monitored_items.insert(monitored_item_id, entry) {
            previous.dispose();
        }
        Ok(monitored_item)
    }

    /// Sets the sampling task of a monitored item, stopping any it replaces. The task is
    /// stopped straight away if the item is gone or the subscription is closed.
    pub(crate) fn set_sampler(&mut self, monitored_item_id: u32, sampler: JoinHandle<()>) {
        if self.is_closed() {
            sampler.abort();
            return;
        }
        match self.monitored_items.get_mut(&monitored_item_id) {
            Some(entry) => {
                if let Some(previous) = entry.sampler.replace(sampler) {
                    previous.abort();
                }
            }
            None => sampler.abort(),
        }
    }

    /// Deletes a monitored item, stopping its sampling.
    pub fn delete_monitored_item(&mut self, monitored_item_id: u32) -> StatusCode {
        match self.monitored_items.remove(&monitored_item_id) {
            Some(mut entry) => {
                entry.dispose();
                StatusCode::Good
            }
            None => StatusCode::BadMonitoredItemIdInvalid,
        }
    }

    /// Runs one publishing cycle.
    ///
    /// Notifications are drained from the reporting items, one per item per round in the order
    /// the items were created, up to the limit per publish. A cycle that drains something sends
    /// it and resets both counters. An empty cycle counts towards the keep-alive and sends one
    /// when the count is reached. Every empty cycle also counts towards the lifetime, and the
    /// subscription expires when it runs out. While publishing is disabled a cycle only counts
    /// towards the keep-alive.
    pub fn tick(&mut self, now: DateTime) -> TickResult {
        if self.is_closed() {
            return TickResult::None;
        }

        if !self.publishing_enabled {
            // Nothing is drained and the lifetime is left alone, only keep-alives go out
            return self.keep_alive_cycle(now);
        }

        let (notifications, more_notifications) = self.drain_notifications();
        if !notifications.is_empty() {
            let sequence_number = self.sequence_number.next();
            let message = NotificationMessage::data_change(sequence_number, now, notifications);
            self.retain_for_retransmission(message.clone());
            self.keep_alive_counter = 0;
            self.lifetime_counter = 0;
            self.state = SubscriptionState::Normal;
            return TickResult::Notifications {
                message,
                more_notifications,
            };
        }

        self.lifetime_counter += 1;
        if self.lifetime_counter >= self.max_lifetime_count {
            info!(
                "Subscription {} has expired after {} cycles without activity",
                self.subscription_id, self.lifetime_counter
            );
            let sequence_number = self.sequence_number.next();
            let message =
                NotificationMessage::status_change(sequence_number, now, StatusCode::BadTimeout);
            // The publishing task is left to send the status change and finish by itself
            self.close();
            return TickResult::Expired(message);
        }

        self.keep_alive_cycle(now)
    }

    /// Counts a cycle with nothing to send, sending a keep-alive when the count is reached
    fn keep_alive_cycle(&mut self, now: DateTime) -> TickResult {
        self.keep_alive_counter += 1;
        if self.keep_alive_counter >= self.max_keep_alive_count {
            trace!("Subscription {} sending keep-alive", self.subscription_id);
            self.keep_alive_counter = 0;
            self.state = SubscriptionState::Normal;
            // A keep-alive does not consume the sequence number
            TickResult::KeepAlive(NotificationMessage::keep_alive(
                self.sequence_number.peek(),
                now,
            ))
        } else {
            self.state = SubscriptionState::Late;
            TickResult::None
        }
    }

    /// Drains notifications round-robin over the reporting items. Returns the notifications and
    /// whether any were left queued.
    fn drain_notifications(&mut self) -> (Vec<MonitoredItemNotification>, bool) {
        let max_notifications = if self.max_notifications_per_publish == 0 {
            usize::MAX
        } else {
            self.max_notifications_per_publish as usize
        };
        // Items are always locked in id order
        let mut monitored_items = self
            .monitored_items
            .values()
            .map(|entry| trace_lock!(entry.monitored_item))
            .filter(|monitored_item| monitored_item.is_reporting())
            .collect::<Vec<_>>();

        let mut notifications = Vec::new();
        'rounds: loop {
            let mut drained = false;
            for monitored_item in monitored_items.iter_mut() {
                if notifications.len() >= max_notifications {
                    break 'rounds;
                }
                if let Some(notification) = monitored_item.take_notification() {
                    notifications.push(notification);
                    drained = true;
                }
            }
            if !drained {
                break;
            }
        }
        let more_notifications = monitored_items
            .iter()
            .any(|monitored_item| monitored_item.has_notifications());
        (notifications, more_notifications)
    }

    fn retain_for_retransmission(&mut self, message: NotificationMessage) {
        if self.max_retransmission_queue_size == 0 {
            return;
        }
        if self.retransmission_queue.len() >= self.max_retransmission_queue_size {
            let _ = self.retransmission_queue.pop_front();
        }
        self.retransmission_queue.push_back(message);
    }

    /// Sequence numbers of the messages held for republish
    pub fn available_sequence_numbers(&self) -> Vec<u32> {
        self.retransmission_queue
            .iter()
            .map(|message| message.sequence_number)
            .collect()
    }

    /// The client acknowledged a message. It is released from the retransmission queue and the
    /// client activity resets the lifetime.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        if self.is_closed() {
            return StatusCode::BadSubscriptionIdInvalid;
        }
        self.lifetime_counter = 0;
        if self.state == SubscriptionState::Late {
            self.state = SubscriptionState::Normal;
        }
        match self
            .retransmission_queue
            .iter()
            .position(|message| message.sequence_number == sequence_number)
        {
            Some(idx) => {
                let _ = self.retransmission_queue.remove(idx);
                StatusCode::Good
            }
            None => StatusCode::BadSequenceNumberUnknown,
        }
    }

    /// Returns a copy of a sent message that has not been acknowledged yet.
    pub fn republish(&self, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        self.retransmission_queue
            .iter()
            .find(|message| message.sequence_number == sequence_number)
            .cloned()
            .ok_or(StatusCode::BadMessageNotAvailable)
    }

    /// Wraps the message of a cycle into a response for the session layer.
    pub fn publish_response(
        &self,
        notification_message: NotificationMessage,
        more_notifications: bool,
    ) -> PublishResponse {
        PublishResponse {
            subscription_id: self.subscription_id,
            available_sequence_numbers: self.available_sequence_numbers(),
            more_notifications,
            notification_message,
        }
    }

    pub(crate) fn set_publisher(&mut self, publisher: JoinHandle<()>) {
        if self.is_closed() {
            publisher.abort();
        } else if let Some(previous) = self.publisher.replace(publisher) {
            previous.abort();
        }
    }

    /// Closes the subscription. The publishing task is stopped and every monitored item is
    /// deleted and its sampler stopped before this returns. Closing a closed subscription does
    /// nothing.
    pub fn terminate(&mut self) {
        if let Some(publisher) = self.publisher.take() {
            publisher.abort();
        }
        self.close();
    }

    /// Deletes every monitored item and moves to the closed state
    fn close(&mut self) {
        for entry in self.monitored_items.values_mut() {
            entry.dispose();
        }
        if !self.is_closed() {
            debug!("Subscription {} is closed", self.subscription_id);
            self.state = SubscriptionState::Closed;
        }
    }
}

/// Spawns the publishing task of a subscription. Each cycle waits for room on the channel,
/// then ticks the subscription and sends whatever it produced without releasing the
/// subscription lock in between. A subscription that has been terminated therefore never has
/// anything sent for it afterwards. The task ends when the subscription closes or the receiver
/// goes away.
pub(crate) fn spawn_publisher(
    subscription: Arc<Mutex<Subscription>>,
    sender: mpsc::Sender<PublishResponse>,
) -> JoinHandle<()> {
    let subscription_id = trace_lock!(subscription).subscription_id();
    tokio::spawn(async move {
        let _component = RuntimeComponent::new(format!("subscription-{}", subscription_id));
        let mut next_tick = Instant::now();
        let mut immediate = false;
        loop {
            if immediate {
                next_tick = Instant::now();
            } else {
                let publishing_interval = trace_lock!(subscription).publishing_interval();
                next_tick += duration_from_ms(publishing_interval);
                time::sleep_until(next_tick).await;
            }
            let Ok(permit) = sender.reserve().await else {
                debug!(
                    "Publish channel of subscription {} is closed",
                    subscription_id
                );
                break;
            };
            let mut subscription = trace_lock!(subscription);
            match subscription.tick(DateTime::now()) {
                TickResult::None => {
                    immediate = false;
                    if subscription.is_closed() {
                        break;
                    }
                }
                TickResult::Notifications {
                    message,
                    more_notifications,
                } => {
                    immediate = more_notifications;
                    permit.send(subscription.publish_response(message, more_notifications));
                }
                TickResult::KeepAlive(message) => {
                    immediate = false;
                    permit.send(subscription.publish_response(message, false));
                }
                TickResult::Expired(message) => {
                    permit.send(subscription.publish_response(message, false));
                    break;
                }
            }
        }
    })
}
