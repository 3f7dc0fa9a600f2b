// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use super::*;

fn make_subscription(
    max_keep_alive_count: u32,
    max_lifetime_count: u32,
    max_notifications_per_publish: u32,
) -> Subscription {
    Subscription::new(
        1,
        true,
        1000f64,
        max_lifetime_count,
        max_keep_alive_count,
        max_notifications_per_publish,
        0,
        3,
    )
}

fn add_item(subscription: &mut Subscription, monitored_item_id: u32) -> Arc<Mutex<MonitoredItem>> {
    let monitored_item = make_monitored_item(monitored_item_id, 100f64, 10, true);
    subscription
        .insert_monitored_item(monitored_item, value_source(&sample_node_id("v1")))
        .unwrap()
}

fn notify(monitored_item: &Arc<Mutex<MonitoredItem>>, values: &[i32]) {
    let mut monitored_item = trace_lock!(monitored_item);
    for value in values {
        monitored_item.notify_data_value(data_value(*value));
    }
}

fn expect_notifications(result: TickResult) -> (NotificationMessage, bool) {
    match result {
        TickResult::Notifications {
            message,
            more_notifications,
        } => (message, more_notifications),
        result => panic!("Expected notifications, got {:?}", result),
    }
}

#[test]
fn keep_alive_every_max_keep_alive_count() {
    let mut subscription = make_subscription(3, 100, 0);
    assert_eq!(subscription.state(), SubscriptionState::Creating);
    let now = DateTime::now();

    for _ in 0..2 {
        // Nothing is sent until the count is reached
        for _ in 0..2 {
            assert_eq!(subscription.tick(now), TickResult::None);
            assert_eq!(subscription.state(), SubscriptionState::Late);
        }
        match subscription.tick(now) {
            TickResult::KeepAlive(message) => {
                assert!(message.is_keep_alive());
                // The number is the one the next data message will have
                assert_eq!(message.sequence_number, 1);
            }
            result => panic!("Expected keep-alive, got {:?}", result),
        }
        assert_eq!(subscription.state(), SubscriptionState::Normal);
        assert_eq!(subscription.keep_alive_counter(), 0);
    }
    assert_eq!(subscription.lifetime_counter(), 6);
    // Keep-alives are not retained for republish
    assert!(subscription.available_sequence_numbers().is_empty());
}

#[test]
fn data_publish_resets_counters() {
    let mut subscription = make_subscription(3, 100, 0);
    let monitored_item = add_item(&mut subscription, 1);
    let now = DateTime::now();

    assert_eq!(subscription.tick(now), TickResult::None);
    assert_eq!(subscription.tick(now), TickResult::None);
    notify(&monitored_item, &[1]);
    let (message, more) = expect_notifications(subscription.tick(now));
    assert!(!more);
    assert_eq!(message.sequence_number, 1);
    assert_eq!(message_values(&message), vec![(1, Some(Variant::Int32(1)))]);
    assert_eq!(subscription.state(), SubscriptionState::Normal);
    assert_eq!(subscription.keep_alive_counter(), 0);
    assert_eq!(subscription.lifetime_counter(), 0);

    // The keep-alive count starts again
    assert_eq!(subscription.tick(now), TickResult::None);
    notify(&monitored_item, &[2]);
    let (message, _) = expect_notifications(subscription.tick(now));
    assert_eq!(message.sequence_number, 2);
    assert_eq!(subscription.available_sequence_numbers(), vec![1, 2]);
}

#[test]
fn lifetime_expires() {
    let mut subscription = make_subscription(2, 6, 0);
    let monitored_item = add_item(&mut subscription, 1);
    let now = DateTime::now();

    let mut keep_alives = 0;
    for _ in 0..5 {
        match subscription.tick(now) {
            TickResult::None => {}
            TickResult::KeepAlive(_) => keep_alives += 1,
            result => panic!("Unexpected result {:?}", result),
        }
    }
    assert_eq!(keep_alives, 2);

    match subscription.tick(now) {
        TickResult::Expired(message) => {
            assert_eq!(message.status_change_status(), Some(StatusCode::BadTimeout));
            assert_eq!(message.sequence_number, 1);
        }
        result => panic!("Expected expiry, got {:?}", result),
    }
    assert!(subscription.is_closed());
    assert!(trace_lock!(monitored_item).is_deleted());

    // A closed subscription does nothing
    notify(&monitored_item, &[1]);
    assert_eq!(subscription.tick(now), TickResult::None);
    assert_eq!(subscription.acknowledge(1), StatusCode::BadSubscriptionIdInvalid);
}

#[test]
fn acknowledge_resets_lifetime() {
    let mut subscription = make_subscription(2, 6, 0);
    let now = DateTime::now();
    for _ in 0..5 {
        let _ = subscription.tick(now);
    }
    assert_eq!(subscription.lifetime_counter(), 5);
    assert_eq!(subscription.state(), SubscriptionState::Late);
    // Even an acknowledgement of an unknown message shows the client is alive
    assert_eq!(subscription.acknowledge(99), StatusCode::BadSequenceNumberUnknown);
    assert_eq!(subscription.lifetime_counter(), 0);
    assert_eq!(subscription.state(), SubscriptionState::Normal);
    for _ in 0..5 {
        assert!(!matches!(subscription.tick(now), TickResult::Expired(_)));
    }
}

#[test]
fn drain_round_robin() {
    let mut subscription = make_subscription(3, 100, 0);
    let item1 = add_item(&mut subscription, 1);
    let item2 = add_item(&mut subscription, 2);
    let item3 = add_item(&mut subscription, 3);
    notify(&item1, &[10, 11, 12]);
    notify(&item2, &[20]);
    notify(&item3, &[30, 31]);

    let (message, more) = expect_notifications(subscription.tick(DateTime::now()));
    assert!(!more);
    let handles_and_values = message_values(&message)
        .into_iter()
        .map(|(handle, value)| match value {
            Some(Variant::Int32(v)) => (handle, v),
            value => panic!("Unexpected value {:?}", value),
        })
        .collect::<Vec<_>>();
    assert_eq!(
        handles_and_values,
        vec![(1, 10), (2, 20), (3, 30), (1, 11), (3, 31), (1, 12)]
    );
}

#[test]
fn drain_max_notifications_per_publish() {
    let mut subscription = make_subscription(3, 100, 4);
    let item1 = add_item(&mut subscription, 1);
    let item2 = add_item(&mut subscription, 2);
    notify(&item1, &[10, 11, 12]);
    notify(&item2, &[20, 21, 22]);
    let now = DateTime::now();

    let (message, more) = expect_notifications(subscription.tick(now));
    assert!(more);
    assert_eq!(message.data_changes().count(), 4);
    assert_eq!(message.sequence_number, 1);

    let (message, more) = expect_notifications(subscription.tick(now));
    assert!(!more);
    assert_eq!(
        message_values(&message),
        vec![(1, Some(Variant::Int32(12))), (2, Some(Variant::Int32(22)))]
    );
    assert_eq!(message.sequence_number, 2);
}

#[test]
fn sampling_items_are_not_drained() {
    let mut subscription = make_subscription(3, 100, 0);
    let item1 = add_item(&mut subscription, 1);
    let item2 = add_item(&mut subscription, 2);
    trace_lock!(item2).set_monitoring_mode(MonitoringMode::Sampling);
    notify(&item1, &[10]);
    notify(&item2, &[20]);

    let (message, more) = expect_notifications(subscription.tick(DateTime::now()));
    assert!(!more);
    assert_eq!(message_values(&message), vec![(1, Some(Variant::Int32(10)))]);
    assert_eq!(trace_lock!(item2).queue_len(), 1);

    trace_lock!(item2).set_monitoring_mode(MonitoringMode::Reporting);
    let (message, _) = expect_notifications(subscription.tick(DateTime::now()));
    assert_eq!(message_values(&message), vec![(2, Some(Variant::Int32(20)))]);
}

#[test]
fn publishing_disabled() {
    let mut subscription = make_subscription(3, 9, 0);
    let monitored_item = add_item(&mut subscription, 1);
    subscription.set_publishing_enabled(false);
    notify(&monitored_item, &[1]);
    let now = DateTime::now();

    // Well past the lifetime, only keep-alives are sent and nothing is drained
    let mut keep_alives = 0;
    for _ in 0..12 {
        match subscription.tick(now) {
            TickResult::None => {}
            TickResult::KeepAlive(message) => {
                assert_eq!(message.sequence_number, 1);
                keep_alives += 1;
            }
            result => panic!("Unexpected result {:?}", result),
        }
    }
    assert_eq!(keep_alives, 4);
    assert!(!subscription.is_closed());
    assert_eq!(subscription.lifetime_counter(), 0);
    assert_eq!(trace_lock!(monitored_item).queue_len(), 1);

    subscription.set_publishing_enabled(true);
    let (message, _) = expect_notifications(subscription.tick(now));
    assert_eq!(message_values(&message), vec![(1, Some(Variant::Int32(1)))]);
}

#[test]
fn publishing_disabled_keeps_lifetime() {
    let mut subscription = make_subscription(3, 9, 0);
    let now = DateTime::now();
    for _ in 0..4 {
        let _ = subscription.tick(now);
    }
    assert_eq!(subscription.lifetime_counter(), 4);
    // Disabled cycles neither add to nor reset the lifetime
    subscription.set_publishing_enabled(false);
    for _ in 0..20 {
        let _ = subscription.tick(now);
    }
    assert_eq!(subscription.lifetime_counter(), 4);
    subscription.set_publishing_enabled(true);
    for _ in 0..4 {
        assert!(!matches!(subscription.tick(now), TickResult::Expired(_)));
    }
    assert!(matches!(subscription.tick(now), TickResult::Expired(_)));
}

#[test]
fn acknowledge_and_republish() {
    let mut subscription = make_subscription(3, 100, 0);
    let monitored_item = add_item(&mut subscription, 1);
    let now = DateTime::now();
    for i in 1..=4 {
        notify(&monitored_item, &[i]);
        let (message, _) = expect_notifications(subscription.tick(now));
        assert_eq!(message.sequence_number, i as u32);
    }
    // Only the last three are held
    assert_eq!(subscription.available_sequence_numbers(), vec![2, 3, 4]);
    assert_eq!(subscription.republish(1), Err(StatusCode::BadMessageNotAvailable));

    let message = subscription.republish(3).unwrap();
    assert_eq!(message_values(&message), vec![(1, Some(Variant::Int32(3)))]);

    assert_eq!(subscription.acknowledge(3), StatusCode::Good);
    assert_eq!(subscription.acknowledge(3), StatusCode::BadSequenceNumberUnknown);
    assert_eq!(subscription.republish(3), Err(StatusCode::BadMessageNotAvailable));
    assert_eq!(subscription.available_sequence_numbers(), vec![2, 4]);

    let response = subscription.publish_response(message, true);
    assert_eq!(response.subscription_id, 1);
    assert_eq!(response.available_sequence_numbers, vec![2, 4]);
    assert!(response.more_notifications);
}

#[test]
fn modify_restarts_counters() {
    let mut subscription = make_subscription(3, 100, 0);
    let now = DateTime::now();
    let _ = subscription.tick(now);
    let _ = subscription.tick(now);
    subscription.modify(500f64, 30, 10, 5, 2);
    assert_eq!(subscription.publishing_interval(), 500f64);
    assert_eq!(subscription.max_lifetime_count(), 30);
    assert_eq!(subscription.max_keep_alive_count(), 10);
    assert_eq!(subscription.max_notifications_per_publish(), 5);
    assert_eq!(subscription.priority(), 2);
    assert_eq!(subscription.lifetime_counter(), 0);
    assert_eq!(subscription.keep_alive_counter(), 0);
    for _ in 0..9 {
        assert_eq!(subscription.tick(now), TickResult::None);
    }
    assert!(matches!(subscription.tick(now), TickResult::KeepAlive(_)));
}

#[test]
fn delete_monitored_item() {
    let mut subscription = make_subscription(3, 100, 0);
    let monitored_item = add_item(&mut subscription, 1);
    notify(&monitored_item, &[1]);
    assert_eq!(subscription.delete_monitored_item(1), StatusCode::Good);
    assert_eq!(
        subscription.delete_monitored_item(1),
        StatusCode::BadMonitoredItemIdInvalid
    );
    assert!(trace_lock!(monitored_item).is_deleted());
    assert_eq!(subscription.monitored_item_count(), 0);
    // Nothing queued on the item is published
    assert_eq!(subscription.tick(DateTime::now()), TickResult::None);
}

#[test]
fn terminate_is_idempotent() {
    let mut subscription = make_subscription(3, 100, 0);
    let item1 = add_item(&mut subscription, 1);
    let item2 = add_item(&mut subscription, 2);
    subscription.terminate();
    assert!(subscription.is_closed());
    assert!(trace_lock!(item1).is_deleted());
    assert!(trace_lock!(item2).is_deleted());
    subscription.terminate();
    assert_eq!(subscription.state(), SubscriptionState::Closed);
    assert_eq!(subscription.tick(DateTime::now()), TickResult::None);
}

#[test]
fn closed_subscription_takes_no_items() {
    let mut subscription = make_subscription(3, 100, 0);
    subscription.terminate();
    let monitored_item = make_monitored_item(1, 100f64, 10, true);
    assert_eq!(
        subscription
            .insert_monitored_item(monitored_item, value_source(&sample_node_id("v1")))
            .unwrap_err(),
        StatusCode::BadSubscriptionIdInvalid
    );
    assert_eq!(subscription.monitored_item_count(), 0);
    assert_eq!(subscription.tick(DateTime::now()), TickResult::None);
}
