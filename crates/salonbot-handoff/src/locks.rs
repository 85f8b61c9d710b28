// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender session locks.
//!
//! Every read-modify-write of a stored session happens under its sender's
//! lock: the message pipeline, scheduler follow-ups, and the handoff
//! worker's take-over and release writes. Waiters are served in arrival
//! order.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SenderLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for `sender`'s lock. Held until the guard is dropped.
    pub async fn lock(&self, sender: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(sender.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops locks no task is holding or waiting on.
    pub fn purge_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - self.locks.len()
    }
}
