// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport that prints outbound messages to the terminal.
//!
//! Stands in for a chat provider in the shell and for campaign previews.
//! It has no inbound side.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use colored::Colorize;
use salonbot_core::{
    AdapterType, HealthStatus, InboundMessage, MessageId, MessageTransport, OutboundContent,
    PluginAdapter, SalonError,
};

#[derive(Debug, Default)]
pub struct ConsoleTransport {
    next_id: AtomicU64,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
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
impl MessageTransport for ConsoleTransport {
    async fn send_message(
        &self,
        recipient: &str,
        content: OutboundContent,
    ) -> Result<MessageId, SalonError> {
        let text = match &content {
            OutboundContent::Text(text) => text.clone(),
            OutboundContent::Media { url, caption, .. } => match caption {
                Some(caption) => format!("[{url}] {caption}"),
                None => format!("[{url}]"),
            },
        };
        println!("{} {}", format!("-> {recipient}:").dimmed(), text);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(MessageId(format!("console-{id}")))
    }

    async fn receive(&self) -> Result<InboundMessage, SalonError> {
        Err(SalonError::transport("console transport has no inbound channel"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sends_get_sequential_ids() {
        let transport = ConsoleTransport::new();
        let first = transport.send_message("5511", "oi".into()).await.unwrap();
        let second = transport.send_message("5511", "tchau".into()).await.unwrap();
        assert_eq!(first.0, "console-1");
        assert_eq!(second.0, "console-2");
    }

    #[tokio::test]
    async fn receive_is_unsupported() {
        assert!(ConsoleTransport::new().receive().await.is_err());
    }
}
