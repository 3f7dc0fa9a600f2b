// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Provides functionality to create an address space, find nodes, add nodes, change attributes
//! and values on nodes.

pub mod accessor;
pub mod address_space;
pub mod builder;
pub mod node;
pub mod references;
pub mod relative_path;
mod standard_nodes;

pub use self::address_space::AddressSpace;
