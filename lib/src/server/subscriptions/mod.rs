// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Subscriptions and the monitored items they own. Every monitored item is sampled by its own
//! task and every subscription publishes on its own task. Publish responses of a session are
//! delivered on a bounded channel.

use std::{sync::Arc, time::Duration};

use hashbrown::HashMap;
use tokio::sync::mpsc;

use crate::sync::*;
use crate::types::{service_types::PublishResponse, status_code::StatusCode};

use super::{address_space::AddressSpace, config::Limits};

pub mod monitored_item;
pub mod session_subscriptions;
pub mod subscription;

mod sampler;

use self::session_subscriptions::SessionSubscriptions;

/// This converts an OPC UA Duration in milliseconds into a time duration used by the timers
pub(crate) fn duration_from_ms(d: f64) -> Duration {
    // Duration is a floating point number in millis so turn to microseconds for greater accuracy
    // 1 millisecond = 1000 microsecond
    if d.is_finite() && d > 0f64 {
        Duration::from_micros((d * 1000f64) as u64)
    } else {
        Duration::from_millis(1)
    }
}

/// The subscriptions of every session, by session id.
pub struct SubscriptionCache {
    address_space: Arc<RwLock<AddressSpace>>,
    /// Map from session ID to subscription cache
    session_subscriptions: RwLock<HashMap<u32, Arc<Mutex<SessionSubscriptions>>>>,
    /// Configured limits on subscriptions.
    limits: Limits,
}

impl SubscriptionCache {
    pub fn new(address_space: Arc<RwLock<AddressSpace>>, limits: Limits) -> Self {
        Self {
            address_space,
            session_subscriptions: RwLock::new(HashMap::new()),
            limits,
        }
    }

    /// Starts tracking the subscriptions of a new session. The receiver gets every publish
    /// response of the session.
    pub fn create_session(
        &self,
        session_id: u32,
    ) -> Result<
        (
            Arc<Mutex<SessionSubscriptions>>,
            mpsc::Receiver<PublishResponse>,
        ),
        StatusCode,
    > {
        let mut lck = trace_write_lock!(self.session_subscriptions);
        if lck.contains_key(&session_id) {
            error!("Session {} already has subscriptions", session_id);
            return Err(StatusCode::BadSessionIdInvalid);
        }
        let (session_subscriptions, publish_receiver) = SessionSubscriptions::new(
            session_id,
            self.address_space.clone(),
            self.limits.clone(),
        );
        let session_subscriptions = Arc::new(Mutex::new(session_subscriptions));
        lck.insert(session_id, session_subscriptions.clone());
        Ok((session_subscriptions, publish_receiver))
    }

    /// Gets the subscriptions of a session
    pub fn get(&self, session_id: u32) -> Option<Arc<Mutex<SessionSubscriptions>>> {
        trace_read_lock!(self.session_subscriptions)
            .get(&session_id)
            .cloned()
    }

    /// Ends a session, terminating all of its subscriptions before returning.
    pub fn close_session(&self, session_id: u32) -> Result<(), StatusCode> {
        let Some(session_subscriptions) =
            trace_write_lock!(self.session_subscriptions).remove(&session_id)
        else {
            return Err(StatusCode::BadSessionIdInvalid);
        };
        trace_lock!(session_subscriptions).close();
        Ok(())
    }

    pub fn session_ids(&self) -> Vec<u32> {
        trace_read_lock!(self.session_subscriptions)
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        trace_read_lock!(self.session_subscriptions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
