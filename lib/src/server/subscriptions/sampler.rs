// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The task that samples a monitored item.

use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::core::runtime::RuntimeComponent;
use crate::sync::*;

use super::{
    duration_from_ms,
    monitored_item::{MonitoredItem, SampleSource},
};

/// Spawns a task that samples the item until it is deleted or the task is aborted.
///
/// An item with a positive sampling interval is sampled on a timer at that interval. An item
/// with a zero interval is sampled whenever its source reports a change, and also on a timer at
/// the minimum sampling interval for sources that never report changes.
pub(crate) fn spawn_sampler(
    subscription_id: u32,
    monitored_item: Arc<Mutex<MonitoredItem>>,
    source: SampleSource,
    min_sampling_interval_ms: f64,
) -> JoinHandle<()> {
    let (monitored_item_id, sampling_interval) = {
        let monitored_item = trace_lock!(monitored_item);
        (
            monitored_item.monitored_item_id(),
            monitored_item.sampling_interval(),
        )
    };
    let period = if sampling_interval > 0f64 {
        sampling_interval
    } else {
        min_sampling_interval_ms.max(1f64)
    };
    let mut changes = if sampling_interval == 0f64 {
        source.subscribe()
    } else {
        None
    };
    let key = format!("sampler-{}-{}", subscription_id, monitored_item_id);
    tokio::spawn(async move {
        let _component = RuntimeComponent::new(key);
        let mut timer = time::interval(duration_from_ms(period));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            let source_alive = match changes {
                Some(ref mut changes) => {
                    tokio::select! {
                        _ = timer.tick() => true,
                        changed = changes.changed() => changed.is_ok(),
                    }
                }
                None => {
                    timer.tick().await;
                    true
                }
            };
            if !source_alive {
                // The value source has gone, only the timer remains
                changes = None;
                continue;
            }
            {
                let monitored_item = trace_lock!(monitored_item);
                if monitored_item.is_deleted() {
                    break;
                }
                if !monitored_item.is_sampling() {
                    continue;
                }
            }
            // The source is read without holding the item so hooks never run under its lock
            let data_value = source.read();
            let mut monitored_item = trace_lock!(monitored_item);
            if monitored_item.is_deleted() {
                break;
            }
            monitored_item.notify_data_value(data_value);
        }
        debug!(
            "Sampler for monitored item {} on subscription {} has finished",
            monitored_item_id, subscription_id
        );
    })
}
