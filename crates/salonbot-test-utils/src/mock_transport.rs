// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! Inbound messages injected with [`MockTransport::inject`] come out of
//! `receive()`; every `send_message()` is captured with the (Tokio) instant
//! it happened so pacing can be asserted under a paused clock.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use salonbot_core::{
    AdapterType, HealthStatus, InboundMessage, MessageId, MessageTransport, OutboundContent,
    PluginAdapter, SalonError,
};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub content: OutboundContent,
    pub at: Instant,
}

pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    notify: Arc<Notify>,
    next_id: AtomicU64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queues a message for the next `receive()`.
    pub async fn inject(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Makes every send to `recipient` fail with a transport error.
    pub async fn fail_for(&self, recipient: &str) {
        self.failing.lock().await.insert(recipient.to_string());
    }

    /// Successfully delivered messages, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Text of every delivered message to `recipient`.
    pub async fn texts_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient == recipient)
            .filter_map(|m| m.content.as_text().map(str::to_string))
            .collect()
    }

    /// Every recipient a send was attempted for, failures included.
    pub async fn attempts(&self) -> Vec<String> {
        self.attempts.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SalonError> {
        Ok(())
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send_message(
        &self,
        recipient: &str,
        content: OutboundContent,
    ) -> Result<MessageId, SalonError> {
        self.attempts.lock().await.push(recipient.to_string());
        if self.failing.lock().await.contains(recipient) {
            return Err(SalonError::transport(format!("recipient {recipient} rejected")));
        }
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            content,
            at: Instant::now(),
        });
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn receive(&self) -> Result<InboundMessage, SalonError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            self.notify.notified().await;
        }
    }
}
