// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait (the WhatsApp client sits behind this).

use async_trait::async_trait;

use crate::error::SalonError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundContent};

/// Adapter for the chat transport carrying customer conversations.
///
/// The dispatch engine never talks to the messaging provider directly; it
/// only sends through and receives from this trait.
#[async_trait]
pub trait MessageTransport: PluginAdapter {
    /// Delivers `content` to `recipient` and returns the provider's handle.
    async fn send_message(
        &self,
        recipient: &str,
        content: OutboundContent,
    ) -> Result<MessageId, SalonError>;

    /// Receives the next inbound message.
    async fn receive(&self) -> Result<InboundMessage, SalonError>;
}
