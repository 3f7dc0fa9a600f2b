// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::{collections::BTreeSet, sync::Arc};

use crate::sync::*;
use crate::trace_lock;

/// The `Runtime` is for debugging / diagnostics purposes and tracks which substantial system objects
/// components are in existence. It can be used to detect if something has shutdown or not.
pub struct Runtime {
    /// This is a list of the currently running components / tasks in the engine, such as
    /// monitored item samplers and subscription publishers.
    running_components: Arc<Mutex<BTreeSet<String>>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            running_components: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }
}

impl Runtime {
    pub fn components(&self) -> Vec<String> {
        let running_components = trace_lock!(self.running_components);
        running_components.iter().cloned().collect()
    }

    pub fn register_component(&self, key: &str) {
        debug!("registering component {}", key);
        let mut running_components = trace_lock!(self.running_components);
        if running_components.contains(key) {
            trace!("Shouldn't be registering component {} more than once", key);
        } else {
            running_components.insert(key.to_string());
        }
    }

    pub fn deregister_component(&self, key: &str) {
        debug!("deregistering component {}", key);
        let mut running_components = trace_lock!(self.running_components);
        if !running_components.contains(key) {
            trace!(
                "Shouldn't be deregistering component {} which doesn't exist",
                key
            );
        } else {
            running_components.remove(key);
        }
    }
}

/// Registers a component for as long as the value lives. A task that is aborted drops its
/// future, so holding one of these inside the task deregisters it however the task ends.
pub struct RuntimeComponent {
    key: String,
}

impl RuntimeComponent {
    pub fn new(key: String) -> Self {
        register_runtime_component!(&key);
        Self { key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for RuntimeComponent {
    fn drop(&mut self) {
        deregister_runtime_component!(&self.key);
    }
}

#[test]
fn runtime_component_deregisters_on_drop() {
    let key = "runtime-component-test".to_string();
    {
        let component = RuntimeComponent::new(key.clone());
        assert_eq!(component.key(), key);
        assert!(runtime_components!().contains(&key));
    }
    assert!(!runtime_components!().contains(&key));
}
