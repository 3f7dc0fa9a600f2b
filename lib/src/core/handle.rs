// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

/// A handle factory for wrapping sequences of numbers. Subscriptions use one for their
/// notification sequence numbers and sessions use them for subscription and monitored item ids.
#[derive(Debug, Clone, Serialize)]
pub struct Handle {
    next: u32,
    first: u32,
}

impl Handle {
    /// Creates a new handle factory, that starts with the supplied number
    pub fn new(first: u32) -> Handle {
        Handle { next: first, first }
    }

    /// Returns the next handle to be issued, internally incrementing each time so the handle
    /// is always different until it wraps back to the start.
    pub fn next(&mut self) -> u32 {
        let next = self.next;
        if self.next == u32::MAX {
            self.next = self.first;
        } else {
            self.next += 1;
        }
        next
    }

    /// Returns the handle that the next call to `next()` will issue without consuming it.
    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn set_next(&mut self, next: u32) {
        self.next = next;
    }

    /// Resets the handle to its initial state
    pub fn reset(&mut self) {
        self.set_next(self.first);
    }
}

#[test]
fn handle_increment() {
    let mut h = Handle::new(1);
    assert_eq!(h.peek(), 1);
    assert_eq!(h.next(), 1);
    assert_eq!(h.next(), 2);
    assert_eq!(h.peek(), 3);
    assert_eq!(h.next(), 3);
    h.reset();
    assert_eq!(h.next(), 1);
}

#[test]
fn handle_wrap() {
    let mut h = Handle::new(u32::MAX - 1);
    assert_eq!(h.next(), u32::MAX - 1);
    assert_eq!(h.next(), u32::MAX);
    // Wraps to the first value, never to zero
    assert_eq!(h.peek(), u32::MAX - 1);
    assert_eq!(h.next(), u32::MAX - 1);
}
