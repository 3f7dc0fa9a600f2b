// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::mpsc;

use crate::core::handle::Handle;
use crate::sync::*;
use crate::types::{
    basic_types::{MonitoringMode, TimestampsToReturn},
    notification_message::NotificationMessage,
    service_types::{
        CreateSubscriptionRequest, CreateSubscriptionResponse, ModifySubscriptionRequest,
        ModifySubscriptionResponse, MonitoredItemCreateRequest, MonitoredItemCreateResult,
        MonitoredItemModifyRequest, MonitoredItemModifyResult, PublishResponse,
        SubscriptionAcknowledgement,
    },
    status_code::StatusCode,
};

use crate::server::{
    address_space::AddressSpace,
    config::{Limits, SubscriptionLimits},
};

use super::{
    monitored_item::{MonitoredItem, SampleSource},
    sampler::spawn_sampler,
    subscription::{spawn_publisher, Subscription},
};

/// Subscriptions belonging to a single session. Subscription and monitored item ids are
/// allocated here and are only unique within the session.
///
/// Creating subscriptions and monitored items spawns tasks, so those calls must be made from
/// within a tokio runtime.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SessionSubscriptions {
    session_id: u32,
    #[derivative(Debug = "ignore")]
    address_space: Arc<RwLock<AddressSpace>>,
    /// Configured limits on subscriptions and service calls
    limits: Limits,
    /// Subscriptions of the session in the order they were created
    subscriptions: BTreeMap<u32, Arc<Mutex<Subscription>>>,
    next_subscription_id: Handle,
    next_monitored_item_id: Handle,
    /// Publish responses of every subscription go out on this channel
    #[derivative(Debug = "ignore")]
    publish_sender: mpsc::Sender<PublishResponse>,
    closed: bool,
}

impl Drop for SessionSubscriptions {
    fn drop(&mut self) {
        self.close();
    }
}

impl SessionSubscriptions {
    /// Creates the subscriptions of a session. The receiver gets the publish responses of every
    /// subscription in the session and is meant for the transport layer.
    pub fn new(
        session_id: u32,
        address_space: Arc<RwLock<AddressSpace>>,
        limits: Limits,
    ) -> (SessionSubscriptions, mpsc::Receiver<PublishResponse>) {
        let (publish_sender, publish_receiver) =
            mpsc::channel(limits.subscriptions.publish_channel_capacity.max(1));
        let session_subscriptions = SessionSubscriptions {
            session_id,
            address_space,
            limits,
            subscriptions: BTreeMap::new(),
            next_subscription_id: Handle::new(1),
            next_monitored_item_id: Handle::new(1),
            publish_sender,
            closed: false,
        };
        (session_subscriptions, publish_receiver)
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&mut self) -> usize {
        self.purge_closed();
        self.subscriptions.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn subscription_ids(&mut self) -> Vec<u32> {
        self.purge_closed();
        self.subscriptions.keys().copied().collect()
    }

    pub fn get(&mut self, subscription_id: u32) -> Option<Arc<Mutex<Subscription>>> {
        self.purge_closed();
        self.subscriptions.get(&subscription_id).cloned()
    }

    fn subscription_limits(&self) -> &SubscriptionLimits {
        &self.limits.subscriptions
    }

    /// Removes subscriptions that expired since the last call
    fn purge_closed(&mut self) {
        self.subscriptions.retain(|subscription_id, subscription| {
            let closed = trace_lock!(subscription).is_closed();
            if closed {
                debug!(
                    "Removing closed subscription {} from session {}",
                    subscription_id, self.session_id
                );
            }
            !closed
        });
    }

    fn find_subscription(&mut self, subscription_id: u32) -> Result<Arc<Mutex<Subscription>>, StatusCode> {
        self.purge_closed();
        self.subscriptions
            .get(&subscription_id)
            .cloned()
            .ok_or(StatusCode::BadSubscriptionIdInvalid)
    }

    /// A subscription can expire between being found and being locked, so a locked one is
    /// checked again.
    fn check_not_closed(subscription: &Subscription) -> Result<(), StatusCode> {
        if subscription.is_closed() {
            Err(StatusCode::BadSubscriptionIdInvalid)
        } else {
            Ok(())
        }
    }

    fn check_open(&self) -> Result<(), StatusCode> {
        if self.closed {
            Err(StatusCode::BadSessionClosed)
        } else {
            Ok(())
        }
    }

    /// Checks the size of a batch of operations on monitored items
    fn check_items_batch(&self, len: usize) -> Result<(), StatusCode> {
        if len == 0 {
            Err(StatusCode::BadNothingToDo)
        } else if len > self.limits.operational.max_monitored_items_per_call {
            Err(StatusCode::BadTooManyOperations)
        } else {
            Ok(())
        }
    }

    /// Revises the requested publishing interval, keep-alive count and lifetime count against
    /// the limits. The lifetime is at least three keep-alives long.
    fn revise_subscription_values(
        limits: &SubscriptionLimits,
        requested_publishing_interval: f64,
        requested_max_keep_alive_count: u32,
        requested_lifetime_count: u32,
    ) -> (f64, u32, u32) {
        let revised_publishing_interval = f64::max(
            requested_publishing_interval,
            limits.min_publishing_interval_ms,
        );
        let revised_max_keep_alive_count =
            if requested_max_keep_alive_count > limits.max_keep_alive_count {
                limits.max_keep_alive_count
            } else if requested_max_keep_alive_count == 0 {
                limits.default_keep_alive_count
            } else {
                requested_max_keep_alive_count
            };
        // Lifetime count must exceed keep alive count by at least a multiple of
        let min_lifetime_count = revised_max_keep_alive_count.saturating_mul(3);
        let revised_lifetime_count = if requested_lifetime_count < min_lifetime_count {
            min_lifetime_count
        } else if requested_lifetime_count > limits.max_lifetime_count {
            limits.max_lifetime_count
        } else {
            requested_lifetime_count
        };
        (
            revised_publishing_interval,
            revised_max_keep_alive_count,
            revised_lifetime_count,
        )
    }

    fn revise_max_notifications_per_publish(limits: &SubscriptionLimits, requested: u32) -> u32 {
        let max = limits.max_notifications_per_publish;
        if max > 0 && (requested == 0 || requested > max) {
            max
        } else {
            requested
        }
    }

    /// Creates a subscription and starts its publishing task.
    pub fn create_subscription(
        &mut self,
        request: &CreateSubscriptionRequest,
    ) -> Result<CreateSubscriptionResponse, StatusCode> {
        self.check_open()?;
        self.purge_closed();
        let limits = self.subscription_limits().clone();
        if limits.max_subscriptions_per_session > 0
            && self.subscriptions.len() >= limits.max_subscriptions_per_session
        {
            warn!(
                "Session {} cannot create a subscription, it already has {}",
                self.session_id,
                self.subscriptions.len()
            );
            return Err(StatusCode::BadTooManySubscriptions);
        }

        let (revised_publishing_interval, revised_max_keep_alive_count, revised_lifetime_count) =
            Self::revise_subscription_values(
                &limits,
                request.requested_publishing_interval,
                request.requested_max_keep_alive_count,
                request.requested_lifetime_count,
            );
        let subscription_id = self.next_subscription_id.next();
        let subscription = Subscription::new(
            subscription_id,
            request.publishing_enabled,
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            Self::revise_max_notifications_per_publish(&limits, request.max_notifications_per_publish),
            request.priority,
            limits.max_retransmission_queue_size,
        );
        let subscription = Arc::new(Mutex::new(subscription));
        let publisher = spawn_publisher(subscription.clone(), self.publish_sender.clone());
        trace_lock!(subscription).set_publisher(publisher);
        self.subscriptions.insert(subscription_id, subscription);

        info!(
            "Session {} created subscription {} with publishing interval {}ms",
            self.session_id, subscription_id, revised_publishing_interval
        );
        Ok(CreateSubscriptionResponse {
            subscription_id,
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
        })
    }

    /// Modifies the timing of a subscription. Monitored items that sample at the publishing
    /// interval follow the new interval.
    pub fn modify_subscription(
        &mut self,
        request: &ModifySubscriptionRequest,
    ) -> Result<ModifySubscriptionResponse, StatusCode> {
        let subscription = self.find_subscription(request.subscription_id)?;
        let limits = self.subscription_limits().clone();
        let (revised_publishing_interval, revised_max_keep_alive_count, revised_lifetime_count) =
            Self::revise_subscription_values(
                &limits,
                request.requested_publishing_interval,
                request.requested_max_keep_alive_count,
                request.requested_lifetime_count,
            );

        let mut subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        subscription.modify(
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            Self::revise_max_notifications_per_publish(&limits, request.max_notifications_per_publish),
            request.priority,
        );
        for monitored_item_id in subscription.monitored_item_ids() {
            let respawn = subscription
                .monitored_item(monitored_item_id)
                .map_or(false, |monitored_item| {
                    trace_lock!(monitored_item).set_publishing_interval(revised_publishing_interval)
                });
            if respawn {
                Self::restart_sampler(&mut subscription, monitored_item_id, &limits);
            }
        }

        Ok(ModifySubscriptionResponse {
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
        })
    }

    /// Enables or disables publishing on subscriptions. Each subscription gets its own status.
    pub fn set_publishing_mode(
        &mut self,
        publishing_enabled: bool,
        subscription_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if subscription_ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        self.purge_closed();
        Ok(subscription_ids
            .iter()
            .map(|subscription_id| match self.subscriptions.get(subscription_id) {
                Some(subscription) => {
                    let mut subscription = trace_lock!(subscription);
                    match Self::check_not_closed(&subscription) {
                        Ok(_) => {
                            subscription.set_publishing_enabled(publishing_enabled);
                            StatusCode::Good
                        }
                        Err(status_code) => status_code,
                    }
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect())
    }

    /// Deletes subscriptions. Each is terminated before its status is returned.
    pub fn delete_subscriptions(
        &mut self,
        subscription_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if subscription_ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        self.purge_closed();
        Ok(subscription_ids
            .iter()
            .map(|subscription_id| match self.subscriptions.remove(subscription_id) {
                Some(subscription) => {
                    trace_lock!(subscription).terminate();
                    info!(
                        "Session {} deleted subscription {}",
                        self.session_id, subscription_id
                    );
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect())
    }

    /// Creates monitored items on a subscription and starts sampling them. Each item gets its
    /// own result, an item that cannot be created never affects the others.
    pub fn create_monitored_items(
        &mut self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items_to_create: &[MonitoredItemCreateRequest],
    ) -> Result<Vec<MonitoredItemCreateResult>, StatusCode> {
        self.check_items_batch(items_to_create.len())?;
        let subscription = self.find_subscription(subscription_id)?;
        let limits = self.subscription_limits().clone();
        let mut results = Vec::with_capacity(items_to_create.len());
        for item_to_create in items_to_create {
            let result = self.create_monitored_item(
                &subscription,
                timestamps_to_return,
                &limits,
                item_to_create,
            );
            results.push(match result {
                Ok(result) => result,
                Err(status_code) => {
                    debug!(
                        "Cannot monitor node {}, status {}",
                        item_to_create.item_to_monitor.node_id, status_code
                    );
                    MonitoredItemCreateResult {
                        status_code,
                        monitored_item_id: 0,
                        revised_sampling_interval: 0f64,
                        revised_queue_size: 0,
                    }
                }
            });
        }
        Ok(results)
    }

    fn create_monitored_item(
        &mut self,
        subscription: &Arc<Mutex<Subscription>>,
        timestamps_to_return: TimestampsToReturn,
        limits: &SubscriptionLimits,
        item_to_create: &MonitoredItemCreateRequest,
    ) -> Result<MonitoredItemCreateResult, StatusCode> {
        // The source is resolved before the subscription is locked
        let source = SampleSource::resolve(&self.address_space, &item_to_create.item_to_monitor)?;
        let mut subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        if limits.max_monitored_items_per_sub > 0
            && subscription.monitored_item_count() >= limits.max_monitored_items_per_sub
        {
            return Err(StatusCode::BadTooManyMonitoredItems);
        }
        let monitored_item_id = self.next_monitored_item_id.next();
        let monitored_item = MonitoredItem::new(
            monitored_item_id,
            timestamps_to_return,
            subscription.publishing_interval(),
            limits,
            item_to_create,
        )?;
        let revised_sampling_interval = monitored_item.sampling_interval();
        let revised_queue_size = monitored_item.queue_size() as u32;
        let monitored_item = subscription.insert_monitored_item(monitored_item, source.clone())?;
        let sampler = spawn_sampler(
            subscription.subscription_id(),
            monitored_item,
            source,
            limits.min_sampling_interval_ms,
        );
        subscription.set_sampler(monitored_item_id, sampler);
        Ok(MonitoredItemCreateResult {
            status_code: StatusCode::Good,
            monitored_item_id,
            revised_sampling_interval,
            revised_queue_size,
        })
    }

    /// Starts a new sampler for an item, replacing the one it has
    fn restart_sampler(
        subscription: &mut Subscription,
        monitored_item_id: u32,
        limits: &SubscriptionLimits,
    ) {
        let entry = subscription
            .monitored_item_entry(monitored_item_id)
            .map(|entry| (entry.monitored_item.clone(), entry.source.clone()));
        if let Some((monitored_item, source)) = entry {
            let sampler = spawn_sampler(
                subscription.subscription_id(),
                monitored_item,
                source,
                limits.min_sampling_interval_ms,
            );
            subscription.set_sampler(monitored_item_id, sampler);
        }
    }

    /// Modifies monitored items of a subscription, each with its own result.
    pub fn modify_monitored_items(
        &mut self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items_to_modify: &[MonitoredItemModifyRequest],
    ) -> Result<Vec<MonitoredItemModifyResult>, StatusCode> {
        self.check_items_batch(items_to_modify.len())?;
        let subscription = self.find_subscription(subscription_id)?;
        let limits = self.subscription_limits().clone();
        let mut subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        let publishing_interval = subscription.publishing_interval();
        Ok(items_to_modify
            .iter()
            .map(|item_to_modify| {
                let monitored_item_id = item_to_modify.monitored_item_id;
                let monitored_item = match subscription.monitored_item(monitored_item_id) {
                    Some(monitored_item) => monitored_item,
                    None => {
                        return MonitoredItemModifyResult {
                            status_code: StatusCode::BadMonitoredItemIdInvalid,
                            revised_sampling_interval: 0f64,
                            revised_queue_size: 0,
                        }
                    }
                };
                let result = {
                    let mut monitored_item = trace_lock!(monitored_item);
                    let previous_sampling_interval = monitored_item.sampling_interval();
                    monitored_item
                        .modify(
                            timestamps_to_return,
                            publishing_interval,
                            &limits,
                            item_to_modify,
                        )
                        .map(|_| {
                            (
                                monitored_item.sampling_interval(),
                                monitored_item.queue_size() as u32,
                                previous_sampling_interval != monitored_item.sampling_interval(),
                            )
                        })
                };
                match result {
                    Ok((revised_sampling_interval, revised_queue_size, interval_changed)) => {
                        if interval_changed {
                            Self::restart_sampler(&mut subscription, monitored_item_id, &limits);
                        }
                        MonitoredItemModifyResult {
                            status_code: StatusCode::Good,
                            revised_sampling_interval,
                            revised_queue_size,
                        }
                    }
                    Err(status_code) => MonitoredItemModifyResult {
                        status_code,
                        revised_sampling_interval: 0f64,
                        revised_queue_size: 0,
                    },
                }
            })
            .collect())
    }

    /// Sets the monitoring mode of monitored items of a subscription.
    pub fn set_monitoring_mode(
        &mut self,
        subscription_id: u32,
        monitoring_mode: MonitoringMode,
        monitored_item_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        self.check_items_batch(monitored_item_ids.len())?;
        let subscription = self.find_subscription(subscription_id)?;
        let subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        Ok(monitored_item_ids
            .iter()
            .map(
                |monitored_item_id| match subscription.monitored_item(*monitored_item_id) {
                    Some(monitored_item) => {
                        trace_lock!(monitored_item).set_monitoring_mode(monitoring_mode);
                        StatusCode::Good
                    }
                    None => StatusCode::BadMonitoredItemIdInvalid,
                },
            )
            .collect())
    }

    /// Deletes monitored items of a subscription. Their samplers are stopped before this
    /// returns.
    pub fn delete_monitored_items(
        &mut self,
        subscription_id: u32,
        monitored_item_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        self.check_items_batch(monitored_item_ids.len())?;
        let subscription = self.find_subscription(subscription_id)?;
        let mut subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        Ok(monitored_item_ids
            .iter()
            .map(|monitored_item_id| subscription.delete_monitored_item(*monitored_item_id))
            .collect())
    }

    /// Acknowledges received notification messages, returning a status for each.
    pub fn acknowledge(
        &mut self,
        subscription_acknowledgements: &[SubscriptionAcknowledgement],
    ) -> Vec<StatusCode> {
        self.purge_closed();
        subscription_acknowledgements
            .iter()
            .map(|ack| match self.subscriptions.get(&ack.subscription_id) {
                Some(subscription) => trace_lock!(subscription).acknowledge(ack.sequence_number),
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect()
    }

    /// Returns a sent message again if it has not been acknowledged yet.
    pub fn republish(
        &mut self,
        subscription_id: u32,
        retransmit_sequence_number: u32,
    ) -> Result<NotificationMessage, StatusCode> {
        let subscription = self.find_subscription(subscription_id)?;
        let subscription = trace_lock!(subscription);
        Self::check_not_closed(&subscription)?;
        subscription.republish(retransmit_sequence_number)
    }

    /// Terminates every subscription of the session. Nothing is published afterwards.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for (_, subscription) in std::mem::take(&mut self.subscriptions) {
            trace_lock!(subscription).terminate();
        }
        self.closed = true;
        info!("Subscriptions of session {} are closed", self.session_id);
    }
}
