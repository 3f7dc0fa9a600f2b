// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use super::*;

mod browse;
mod read_write;

/// Limits small enough for tests to go over them
fn small_limits() -> OperationalLimits {
    OperationalLimits {
        max_nodes_per_translate_browse_paths_to_node_ids: 2,
        max_nodes_per_read: 3,
        max_nodes_per_write: 3,
        max_nodes_per_browse: 3,
        max_monitored_items_per_call: 3,
    }
}
