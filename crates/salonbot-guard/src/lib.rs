// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window anti-flood guard.
//!
//! Each sender gets a message counter over a fixed window. Going past the
//! limit blocks the sender for a cool-down period during which every
//! message is dropped. State is process-local and never persisted.

use std::time::Duration;

use dashmap::DashMap;
use salonbot_config::model::FloodConfig;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Limits applied by [`AntiFloodGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodLimits {
    pub window: Duration,
    pub max_messages: u32,
    pub block: Duration,
}

impl Default for FloodLimits {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_messages: 50,
            block: Duration::from_secs(600),
        }
    }
}

impl From<&FloodConfig> for FloodLimits {
    fn from(config: &FloodConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_messages: config.max_messages,
            block: Duration::from_secs(config.block_secs),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SenderState {
    Counting { count: u32, window_start: Instant },
    Blocked { until: Instant },
}

/// Per-sender rate window plus temporary block list.
///
/// Check-then-act runs under the map's per-key entry lock, so concurrent
/// calls for the same sender never lose an increment.
#[derive(Debug, Default)]
pub struct AntiFloodGuard {
    limits: FloodLimits,
    senders: DashMap<String, SenderState>,
}

impl AntiFloodGuard {
    pub fn new(limits: FloodLimits) -> Self {
        Self {
            limits,
            senders: DashMap::new(),
        }
    }

    pub fn limits(&self) -> FloodLimits {
        self.limits
    }

    /// Records one message from `sender` and reports whether it may be processed.
    pub fn allow(&self, sender: &str) -> bool {
        self.check_at(sender, Instant::now())
    }

    /// [`allow`](Self::allow) evaluated at an explicit instant.
    pub fn check_at(&self, sender: &str, now: Instant) -> bool {
        let mut entry = self
            .senders
            .entry(sender.to_string())
            .or_insert(SenderState::Counting {
                count: 0,
                window_start: now,
            });

        let (count, window_start) = match *entry {
            SenderState::Blocked { until } if now < until => return false,
            SenderState::Blocked { .. } => {
                debug!(sender, "flood block expired");
                (1, now)
            }
            SenderState::Counting {
                count,
                window_start,
            } if count > 0
                && now.saturating_duration_since(window_start) <= self.limits.window =>
            {
                (count + 1, window_start)
            }
            SenderState::Counting { .. } => (1, now),
        };

        if count > self.limits.max_messages {
            *entry = SenderState::Blocked {
                until: now + self.limits.block,
            };
            warn!(
                sender,
                block_secs = self.limits.block.as_secs(),
                "sender exceeded flood limit, blocking"
            );
            return false;
        }

        *entry = SenderState::Counting {
            count,
            window_start,
        };
        true
    }

    /// True while `sender` sits on the block list.
    pub fn is_blocked(&self, sender: &str) -> bool {
        let now = Instant::now();
        self.senders
            .get(sender)
            .is_some_and(|s| matches!(*s, SenderState::Blocked { until } if now < until))
    }

    /// Drops expired windows and blocks. Returns how many senders were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.senders.len();
        self.senders.retain(|_, state| match *state {
            SenderState::Blocked { until } => now < until,
            SenderState::Counting { window_start, .. } => {
                now.saturating_duration_since(window_start) <= self.limits.window
            }
        });
        before.saturating_sub(self.senders.len())
    }

    /// Number of senders currently tracked.
    pub fn tracked(&self) -> usize {
        self.senders.len()
    }
}
