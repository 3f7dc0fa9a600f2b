// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The value accessor of a variable. A value is either held statically by the accessor or
//! supplied on demand by getter / setter hooks that the server implementation registers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::sync::*;
use crate::types::*;

/// An attribute getter trait is used to obtain the data value associated with the particular
/// attribute id. This allows server implementations to supply a value on demand, usually in
/// response to a polling action such as a monitored item in a subscription.
pub trait AttributeGetter {
    /// Returns a data value of the specified attribute or none.
    fn get(
        &mut self,
        node_id: &NodeId,
        attribute_id: AttributeId,
    ) -> Result<Option<DataValue>, StatusCode>;
}

/// An attribute setter. Sets the value on the specified attribute
pub trait AttributeSetter {
    /// Sets the attribute on the specified node
    fn set(
        &mut self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        data_value: DataValue,
    ) -> Result<(), StatusCode>;
}

/// An implementation of attribute getter that can be easily constructed from a mutable function
pub struct AttrFnGetter<F>
where
    F: FnMut(&NodeId, AttributeId) -> Result<Option<DataValue>, StatusCode> + Send,
{
    getter: F,
}

impl<F> AttributeGetter for AttrFnGetter<F>
where
    F: FnMut(&NodeId, AttributeId) -> Result<Option<DataValue>, StatusCode> + Send,
{
    fn get(
        &mut self,
        node_id: &NodeId,
        attribute_id: AttributeId,
    ) -> Result<Option<DataValue>, StatusCode> {
        (self.getter)(node_id, attribute_id)
    }
}

impl<F> AttrFnGetter<F>
where
    F: FnMut(&NodeId, AttributeId) -> Result<Option<DataValue>, StatusCode> + Send,
{
    pub fn new(getter: F) -> AttrFnGetter<F> {
        AttrFnGetter { getter }
    }

    pub fn new_boxed(getter: F) -> Arc<Mutex<AttrFnGetter<F>>> {
        Arc::new(Mutex::new(Self::new(getter)))
    }
}

/// An implementation of attribute setter that can be easily constructed using a mutable function
pub struct AttrFnSetter<F>
where
    F: FnMut(&NodeId, AttributeId, DataValue) -> Result<(), StatusCode> + Send,
{
    setter: F,
}

impl<F> AttributeSetter for AttrFnSetter<F>
where
    F: FnMut(&NodeId, AttributeId, DataValue) -> Result<(), StatusCode> + Send,
{
    fn set(
        &mut self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        data_value: DataValue,
    ) -> Result<(), StatusCode> {
        (self.setter)(node_id, attribute_id, data_value)
    }
}

impl<F> AttrFnSetter<F>
where
    F: FnMut(&NodeId, AttributeId, DataValue) -> Result<(), StatusCode> + Send,
{
    pub fn new(setter: F) -> AttrFnSetter<F> {
        AttrFnSetter { setter }
    }

    pub fn new_boxed(setter: F) -> Arc<Mutex<AttrFnSetter<F>>> {
        Arc::new(Mutex::new(Self::new(setter)))
    }
}

/// Reads and writes the Value attribute of one variable. Reads and writes may come from any
/// number of sampling tasks and service calls at once. Each hook is behind its own lock so the
/// state a hook captures is only ever touched by one caller at a time.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ValueAccessor {
    node_id: NodeId,
    /// The static value, also used when there is no getter
    value: RwLock<DataValue>,
    /// True if a client may overwrite the static value
    writable: bool,
    #[derivative(Debug = "ignore")]
    getter: Option<Arc<Mutex<dyn AttributeGetter + Send>>>,
    #[derivative(Debug = "ignore")]
    setter: Option<Arc<Mutex<dyn AttributeSetter + Send>>>,
    /// Bumped on every change so push-driven samplers wake up
    #[derivative(Debug = "ignore")]
    changed: watch::Sender<u64>,
}

impl ValueAccessor {
    pub fn new(node_id: &NodeId, value: DataValue, writable: bool) -> ValueAccessor {
        let (changed, _) = watch::channel(0);
        ValueAccessor {
            node_id: node_id.clone(),
            value: RwLock::new(value),
            writable,
            getter: None,
            setter: None,
            changed,
        }
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    pub fn set_getter(&mut self, getter: Arc<Mutex<dyn AttributeGetter + Send>>) {
        self.getter = Some(getter);
    }

    pub fn set_setter(&mut self, setter: Arc<Mutex<dyn AttributeSetter + Send>>) {
        self.setter = Some(setter);
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// True if `write` can succeed, i.e. there is a setter or the static value is writable.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some() || (self.writable && self.getter.is_none())
    }

    /// Reads the current value. A failing getter yields a value carrying the failure as its
    /// status. The server timestamp is set if the source left it out.
    pub fn read(&self) -> DataValue {
        let mut data_value = if let Some(ref getter) = self.getter {
            let mut getter = trace_lock!(getter);
            match getter.get(&self.node_id, AttributeId::Value) {
                Ok(Some(data_value)) => data_value,
                Ok(None) => DataValue::null(),
                Err(status_code) => {
                    debug!(
                        "Getter for {} failed with status {}",
                        self.node_id, status_code
                    );
                    DataValue::from_status(status_code)
                }
            }
        } else {
            trace_read_lock!(self.value).clone()
        };
        if data_value.server_timestamp.is_none() {
            data_value.server_timestamp = Some(DateTime::now());
        }
        data_value
    }

    /// Writes a value on behalf of a client and returns the outcome. Values without a source
    /// timestamp are stamped with the time of the write.
    pub fn write(&self, mut data_value: DataValue) -> StatusCode {
        if let Some(ref setter) = self.setter {
            let result = {
                let mut setter = trace_lock!(setter);
                setter.set(&self.node_id, AttributeId::Value, data_value)
            };
            match result {
                Ok(()) => {
                    self.notify_changed();
                    StatusCode::Good
                }
                Err(status_code) => status_code,
            }
        } else if self.writable && self.getter.is_none() {
            let now = DateTime::now();
            if data_value.source_timestamp.is_none() {
                data_value.source_timestamp = Some(now);
            }
            data_value.server_timestamp = Some(now);
            *trace_write_lock!(self.value) = data_value;
            self.notify_changed();
            StatusCode::Good
        } else {
            StatusCode::BadNotWritable
        }
    }

    /// Replaces the static value directly. This is the server updating its own data so the
    /// writable flag does not apply.
    pub fn set_value(&self, data_value: DataValue) {
        *trace_write_lock!(self.value) = data_value;
        self.notify_changed();
    }

    /// Tells push-driven samplers that the value source changed. Sources behind a getter call
    /// this when their data moves.
    pub fn notify_changed(&self) {
        self.changed.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Returns a receiver that sees every change notification made after this call.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }
}
