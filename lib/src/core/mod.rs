// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Functionality shared by every part of the engine. It holds configuration persistence,
//! handle factories and the runtime component registry used to track spawned tasks.

lazy_static! {
    pub static ref RUNTIME: crate::core::runtime::Runtime =
        crate::core::runtime::Runtime::default();
}

/// Returns a vector of all currently existing runtime components as a vector of strings.
#[macro_export]
macro_rules! runtime_components {
    () => {{
        use $crate::core::RUNTIME;
        RUNTIME.components()
    }};
}

/// This macro is for debugging purposes - code register a running component (e.g. tokio task) when it starts
/// and calls the corresponding deregister macro when it finishes. This enables the code to print
/// out a list of components in existence at any time to ensure they were properly cleaned up.
#[macro_export]
macro_rules! register_runtime_component {
    ( $component_name:expr ) => {
        $crate::core::RUNTIME.register_component($component_name);
    };
}

/// See `register_runtime_component`
#[macro_export]
macro_rules! deregister_runtime_component {
    ( $component_name:expr ) => {
        $crate::core::RUNTIME.deregister_component($component_name);
    };
}

pub mod config;
pub mod handle;
pub mod runtime;

/// Contains most of the things that are typically required from a server.
pub mod prelude {
    pub use super::{config::Config, handle::Handle, runtime::RuntimeComponent};
    pub use crate::types::{status_code::StatusCode, *};
}
