// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The server side of the engine: the address space, the subscriptions that monitor it and
//! batch helpers for the attribute and view services.

pub mod address_space;
pub mod config;
pub mod services;
pub mod subscriptions;

#[cfg(test)]
mod tests;

/// Contains constants for default configuration values.
/// These are for the most part possible to override through server configuration.
pub mod constants {
    /// Default maximum number of subscriptions in a session
    pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 100;
    /// Default maximum number of monitored items per subscription
    pub const DEFAULT_MAX_MONITORED_ITEMS_PER_SUB: usize = 1000;
    /// Minimum publishing interval for subscriptions
    pub const MIN_PUBLISHING_INTERVAL_MS: f64 = 100f64;
    /// Minimum sampling interval on monitored items
    pub const MIN_SAMPLING_INTERVAL_MS: f64 = 100f64;
    /// Maximum data change queue allowed by clients on monitored items
    pub const MAX_DATA_CHANGE_QUEUE_SIZE: usize = 10;
    /// Default keep alive count
    pub const DEFAULT_KEEP_ALIVE_COUNT: u32 = 10;
    /// Maximum keep alive count
    pub const MAX_KEEP_ALIVE_COUNT: u32 = 30000;
    /// Maximum notifications in one publish, 0 for no limit
    pub const MAX_NOTIFICATIONS_PER_PUBLISH: u32 = 0;
    /// Number of sent notification messages a subscription keeps for republish
    pub const MAX_RETRANSMISSION_QUEUE_SIZE: usize = 10;
    /// Publish responses buffered for the transport before a subscription waits
    pub const PUBLISH_CHANNEL_CAPACITY: usize = 20;

    /// Maximum number of nodes in a TranslateBrowsePathsToNodeIdsRequest
    pub const MAX_NODES_PER_TRANSLATE_BROWSE_PATHS_TO_NODE_IDS: usize = 10;
    /// Maximum number of ReadValueIds in a Read request.
    pub const MAX_NODES_PER_READ: usize = 50;
    /// Maximum number of WriteValues in a Write request.
    pub const MAX_NODES_PER_WRITE: usize = 10;
    /// Maximum number of nodes in a Browse request.
    pub const MAX_NODES_PER_BROWSE: usize = 50;
    /// Maximum number of monitored items per operation.
    pub const MAX_MONITORED_ITEMS_PER_CALL: usize = 10;
}

pub mod prelude {
    pub use super::{
        address_space::{
            accessor::*, address_space::AddressSpace, builder::*, node::*,
            references::Reference, relative_path::*,
        },
        config::*,
        services::{attribute, view},
        subscriptions::{
            monitored_item::{FilterType, MonitoredItem, SampleSource},
            session_subscriptions::SessionSubscriptions,
            subscription::{Subscription, SubscriptionState, TickResult},
            SubscriptionCache,
        },
    };
}
