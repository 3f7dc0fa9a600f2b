// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Provides configuration settings for the engine including serialization and deserialization
//! from file.

use crate::{
    core::config::Config,
    types::{DateTime, UAString},
};

/// Build information the server publishes under `Server.ServerStatus.BuildInfo`.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct BuildInfoConfig {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub manufacturer_name: String,
    #[serde(default = "defaults::software_version")]
    pub software_version: String,
    #[serde(default)]
    pub build_number: String,
    /// The time the server starts when absent
    #[serde(default)]
    pub build_date: Option<DateTime>,
}

impl Default for BuildInfoConfig {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            manufacturer_name: String::new(),
            software_version: defaults::software_version(),
            build_number: String::new(),
            build_date: None,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SubscriptionLimits {
    /// Maximum number of subscriptions in a session, 0 for no limit
    #[serde(default = "defaults::max_subscriptions_per_session")]
    pub max_subscriptions_per_session: usize,
    /// Specifies the minimum sampling interval for this server in milliseconds.
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// Specifies the minimum publishing interval for this server in milliseconds.
    #[serde(default = "defaults::min_publishing_interval_ms")]
    pub min_publishing_interval_ms: f64,
    #[serde(default = "defaults::max_keep_alive_count")]
    pub max_keep_alive_count: u32,
    #[serde(default = "defaults::default_keep_alive_count")]
    pub default_keep_alive_count: u32,
    /// Maximum number of monitored items per subscription, 0 for no limit
    #[serde(default = "defaults::max_monitored_items_per_sub")]
    pub max_monitored_items_per_sub: usize,
    /// Maximum number of values in a monitored item queue
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: usize,
    /// Maximum lifetime count (3 times as large as max keep alive)
    #[serde(default = "defaults::max_lifetime_count")]
    pub max_lifetime_count: u32,
    /// Maximum number of notifications per publish message, 0 for no limit
    #[serde(default = "defaults::max_notifications_per_publish")]
    pub max_notifications_per_publish: u32,
    /// Maximum number of sent messages held per subscription until they are acknowledged
    #[serde(default = "defaults::max_retransmission_queue_size")]
    pub max_retransmission_queue_size: usize,
    /// Capacity of the channel publish responses are sent on
    #[serde(default = "defaults::publish_channel_capacity")]
    pub publish_channel_capacity: usize,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_subscriptions_per_session: defaults::max_subscriptions_per_session(),
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            min_publishing_interval_ms: defaults::min_publishing_interval_ms(),
            max_keep_alive_count: defaults::max_keep_alive_count(),
            default_keep_alive_count: defaults::default_keep_alive_count(),
            max_monitored_items_per_sub: defaults::max_monitored_items_per_sub(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
            max_lifetime_count: defaults::max_lifetime_count(),
            max_notifications_per_publish: defaults::max_notifications_per_publish(),
            max_retransmission_queue_size: defaults::max_retransmission_queue_size(),
            publish_channel_capacity: defaults::publish_channel_capacity(),
        }
    }
}

/// Limits on the number of operations in one service call.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OperationalLimits {
    #[serde(default = "defaults::max_nodes_per_translate_browse_paths_to_node_ids")]
    pub max_nodes_per_translate_browse_paths_to_node_ids: usize,
    #[serde(default = "defaults::max_nodes_per_read")]
    pub max_nodes_per_read: usize,
    #[serde(default = "defaults::max_nodes_per_write")]
    pub max_nodes_per_write: usize,
    #[serde(default = "defaults::max_nodes_per_browse")]
    pub max_nodes_per_browse: usize,
    #[serde(default = "defaults::max_monitored_items_per_call")]
    pub max_monitored_items_per_call: usize,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_nodes_per_translate_browse_paths_to_node_ids:
                defaults::max_nodes_per_translate_browse_paths_to_node_ids(),
            max_nodes_per_read: defaults::max_nodes_per_read(),
            max_nodes_per_write: defaults::max_nodes_per_write(),
            max_nodes_per_browse: defaults::max_nodes_per_browse(),
            max_monitored_items_per_call: defaults::max_monitored_items_per_call(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct Limits {
    /// Limits specific to subscriptions.
    #[serde(default)]
    pub subscriptions: SubscriptionLimits,
    /// Limits on service calls.
    #[serde(default)]
    pub operational: OperationalLimits,
}

mod defaults {
    use crate::server::constants;

    pub fn software_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    pub fn max_subscriptions_per_session() -> usize {
        constants::DEFAULT_MAX_SUBSCRIPTIONS
    }
    pub fn min_sampling_interval_ms() -> f64 {
        constants::MIN_SAMPLING_INTERVAL_MS
    }
    pub fn min_publishing_interval_ms() -> f64 {
        constants::MIN_PUBLISHING_INTERVAL_MS
    }
    pub fn max_keep_alive_count() -> u32 {
        constants::MAX_KEEP_ALIVE_COUNT
    }
    pub fn default_keep_alive_count() -> u32 {
        constants::DEFAULT_KEEP_ALIVE_COUNT
    }
    pub fn max_monitored_items_per_sub() -> usize {
        constants::DEFAULT_MAX_MONITORED_ITEMS_PER_SUB
    }
    pub fn max_monitored_item_queue_size() -> usize {
        constants::MAX_DATA_CHANGE_QUEUE_SIZE
    }
    pub fn max_lifetime_count() -> u32 {
        constants::MAX_KEEP_ALIVE_COUNT * 3
    }
    pub fn max_notifications_per_publish() -> u32 {
        constants::MAX_NOTIFICATIONS_PER_PUBLISH
    }
    pub fn max_retransmission_queue_size() -> usize {
        constants::MAX_RETRANSMISSION_QUEUE_SIZE
    }
    pub fn publish_channel_capacity() -> usize {
        constants::PUBLISH_CHANNEL_CAPACITY
    }

    pub fn max_nodes_per_translate_browse_paths_to_node_ids() -> usize {
        constants::MAX_NODES_PER_TRANSLATE_BROWSE_PATHS_TO_NODE_IDS
    }
    pub fn max_nodes_per_read() -> usize {
        constants::MAX_NODES_PER_READ
    }
    pub fn max_nodes_per_write() -> usize {
        constants::MAX_NODES_PER_WRITE
    }
    pub fn max_nodes_per_browse() -> usize {
        constants::MAX_NODES_PER_BROWSE
    }
    pub fn max_monitored_items_per_call() -> usize {
        constants::MAX_MONITORED_ITEMS_PER_CALL
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// An id for this server
    pub application_name: String,
    /// The application uri, also registered as namespace 1 of the address space
    pub application_uri: String,
    /// Product url
    pub product_uri: String,
    #[serde(default)]
    pub build_info: BuildInfoConfig,
    /// Server OPC UA limits
    #[serde(default)]
    pub limits: Limits,
}

impl Config for ServerConfig {
    fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.application_name.is_empty() {
            warn!("No application was set");
        }
        if self.application_uri.is_empty() {
            warn!("No application uri was set");
        }
        if self.product_uri.is_empty() {
            warn!("No product uri was set");
        }
        let subscriptions = &self.limits.subscriptions;
        if subscriptions.min_publishing_interval_ms <= 0f64 {
            error!("Server configuration is invalid. Min publishing interval must be positive");
            valid = false;
        }
        if subscriptions.min_sampling_interval_ms <= 0f64 {
            error!("Server configuration is invalid. Min sampling interval must be positive");
            valid = false;
        }
        if subscriptions.max_keep_alive_count == 0
            || subscriptions.default_keep_alive_count == 0
            || subscriptions.default_keep_alive_count > subscriptions.max_keep_alive_count
        {
            error!("Server configuration is invalid. Keep alive counts are inconsistent");
            valid = false;
        }
        if subscriptions.max_lifetime_count < subscriptions.max_keep_alive_count.saturating_mul(3) {
            error!("Server configuration is invalid. Max lifetime count must be at least 3 times the max keep alive count");
            valid = false;
        }
        if subscriptions.max_monitored_item_queue_size == 0 {
            error!("Server configuration is invalid. Max monitored item queue size is invalid");
            valid = false;
        }
        if subscriptions.publish_channel_capacity == 0 {
            error!("Server configuration is invalid. Publish channel capacity is invalid");
            valid = false;
        }
        valid
    }

    fn application_name(&self) -> UAString {
        UAString::from(&self.application_name)
    }

    fn application_uri(&self) -> UAString {
        UAString::from(&self.application_uri)
    }

    fn product_uri(&self) -> UAString {
        UAString::from(&self.product_uri)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            application_name: String::new(),
            application_uri: String::new(),
            product_uri: String::new(),
            build_info: BuildInfoConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl ServerConfig {
    pub fn new<T>(application_name: T) -> Self
    where
        T: Into<String>,
    {
        let application_name = application_name.into();
        let application_uri = format!("urn:{}", application_name);
        let product_uri = format!("urn:{}", application_name);
        ServerConfig {
            build_info: BuildInfoConfig {
                product_name: application_name.clone(),
                ..Default::default()
            },
            application_name,
            application_uri,
            product_uri,
            limits: Limits::default(),
        }
    }
}
