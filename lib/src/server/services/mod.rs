// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Batch helpers over the address space that mirror the attribute and view services. Each
//! takes the whole batch, checks it against the operational limits and then returns one result
//! per target, so a bad target never fails its neighbours.

use crate::types::status_code::StatusCode;

pub mod attribute;
pub mod view;

/// Checks the size of a batch of operations. An empty batch has nothing to do and a batch over
/// the limit is refused as a whole.
fn check_batch(service: &str, len: usize, max: usize) -> Result<(), StatusCode> {
    if len == 0 {
        debug!("{} was passed an empty list", service);
        Err(StatusCode::BadNothingToDo)
    } else if len > max {
        warn!("{} has too many operations {}, limit is {}", service, len, max);
        Err(StatusCode::BadTooManyOperations)
    } else {
        Ok(())
    }
}
