// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;

/// Unbounded FIFO of wire messages between the protocol thread and the
/// foreground thread.
///
/// The lock is held only inside `push`/`pop`; a waiting
/// [`pop_timeout`](Self::pop_timeout) releases it while parked.
#[derive(Default)]
pub struct MessageQueue {
    items: Mutex<VecDeque<String>>,
    ready: Condvar,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` and wake one waiting consumer. Returns the new depth.
    pub fn push(&self, message: String) -> usize {
        let depth = {
            let mut items = self.items.lock();
            items.push_back(message);
            items.len()
        };
        self.ready.notify_one();
        depth
    }

    /// Oldest message, or `None` right away when empty.
    pub fn pop(&self) -> Option<String> {
        self.items.lock().pop_front()
    }

    /// Oldest message, waiting at most `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<String> {
        let mut items = self.items.lock();
        self.ready
            .wait_while_for(&mut items, |items| items.is_empty(), timeout);
        items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
