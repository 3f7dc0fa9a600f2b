// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use tempdir::TempDir;

use crate::core::config::Config;
use crate::server::prelude::*;
use crate::sync::*;
use crate::types::*;

mod services;
mod subscriptions;

/// The namespace of the sample nodes
const SAMPLE_NAMESPACE: &str = "urn:sample:devices";

fn sample_node_id(name: &str) -> NodeId {
    NodeId::new(2, name)
}

/// Builds an address space with a `MyDevices` folder holding a counter variable, a writable
/// variable and a few static variables of different types.
fn make_sample_address_space() -> (AddressSpace, Arc<AtomicU32>) {
    let mut address_space = AddressSpace::from_config(&ServerConfig::new("sample"));
    let ns = address_space.register_namespace(SAMPLE_NAMESPACE).unwrap();
    assert_eq!(ns, 2);

    let devices_id = sample_node_id("MyDevices");
    FolderBuilder::new(&devices_id, "MyDevices", "My Devices")
        .organized_by(NodeId::objects_folder_id())
        .insert(&mut address_space)
        .unwrap();

    let counter = Arc::new(AtomicU32::new(1));
    let counter_getter = counter.clone();
    VariableBuilder::new(&sample_node_id("MyVariable1"), "MyVariable1", "MyVariable1")
        .component_of(devices_id.clone())
        .data_type(DataTypeId::Double)
        .value_getter(AttrFnGetter::new_boxed(move |_, _| {
            let value = counter_getter.load(Ordering::SeqCst) as f64;
            Ok(Some(DataValue::new_now(value)))
        }))
        .insert(&mut address_space)
        .unwrap();

    VariableBuilder::new(&sample_node_id("MyVariable2"), "MyVariable2", "MyVariable2")
        .component_of(devices_id.clone())
        .value(10.0f64)
        .writable()
        .insert(&mut address_space)
        .unwrap();

    for (name, value) in [
        ("v1", Variant::from(30i32)),
        ("v2", Variant::from(true)),
        ("v3", Variant::from("Hello world")),
    ] {
        VariableBuilder::new(&sample_node_id(name), name, name)
            .component_of(devices_id.clone())
            .value(value)
            .insert(&mut address_space)
            .unwrap();
    }
    (address_space, counter)
}

fn make_shared_sample_address_space() -> (Arc<RwLock<AddressSpace>>, Arc<AtomicU32>) {
    let (address_space, counter) = make_sample_address_space();
    (Arc::new(RwLock::new(address_space)), counter)
}

#[test]
fn server_config_save() {
    let tmp_dir = TempDir::new("server_config").unwrap();
    let path = tmp_dir.path().join("server_config.yaml");
    let mut config = ServerConfig::new("foo");
    config.build_info.manufacturer_name = "Manufacturer".into();
    config.limits.subscriptions.max_subscriptions_per_session = 5;
    assert!(config.save(&path).is_ok());
    let config2: ServerConfig = ServerConfig::load(&path).unwrap();
    assert_eq!(config, config2);
}

#[test]
fn server_config_defaults_fill_missing_fields() {
    let yaml = r#"
application_name: foo
application_uri: "urn:foo"
product_uri: "urn:foo"
limits:
  subscriptions:
    max_keep_alive_count: 100
"#;
    let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.limits.subscriptions.max_keep_alive_count, 100);
    assert_eq!(
        config.limits.subscriptions.min_publishing_interval_ms,
        crate::server::constants::MIN_PUBLISHING_INTERVAL_MS
    );
    assert_eq!(
        config.limits.operational,
        OperationalLimits::default()
    );
    assert!(config.is_valid());
}

#[test]
fn server_config_invalid() {
    let mut config = ServerConfig::new("foo");
    assert!(config.is_valid());
    config.limits.subscriptions.max_lifetime_count = config.limits.subscriptions.max_keep_alive_count;
    assert!(!config.is_valid());

    // An invalid config is not saved
    let tmp_dir = TempDir::new("server_config").unwrap();
    let path = tmp_dir.path().join("invalid.yaml");
    assert!(config.save(&path).is_err());
    assert!(!path.exists());
}
