// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notifiers.

use std::sync::Arc;

use async_trait::async_trait;
use salonbot_core::{MessageTransport, OperatorAlert, OperatorNotifier, SalonError};
use tracing::{info, warn};

/// Writes alerts to the log. Used when no operator phone is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl OperatorNotifier for LogNotifier {
    async fn notify(&self, alert: &OperatorAlert) -> Result<(), SalonError> {
        warn!(sender = %alert.sender, kind = %alert.kind, detail = %alert.detail, "operator attention needed");
        Ok(())
    }
}

/// Forwards alerts as chat messages to the operator's phone.
pub struct TransportNotifier {
    transport: Arc<dyn MessageTransport>,
    operator_phone: String,
}

impl TransportNotifier {
    pub fn new(transport: Arc<dyn MessageTransport>, operator_phone: impl Into<String>) -> Self {
        Self {
            transport,
            operator_phone: operator_phone.into(),
        }
    }
}

#[async_trait]
impl OperatorNotifier for TransportNotifier {
    async fn notify(&self, alert: &OperatorAlert) -> Result<(), SalonError> {
        let id = self
            .transport
            .send_message(&self.operator_phone, alert.detail.clone().into())
            .await?;
        info!(sender = %alert.sender, kind = %alert.kind, message_id = %id.0, "operator alerted");
        Ok(())
    }
}

/// Picks the notifier for the configured operator phone.
pub fn from_config(
    operator_phone: Option<&str>,
    transport: Arc<dyn MessageTransport>,
) -> Arc<dyn OperatorNotifier> {
    match operator_phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(phone) => Arc::new(TransportNotifier::new(transport, phone)),
        None => Arc::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbot_core::AlertKind;
    use salonbot_test_utils::MockTransport;
    use tracing_test::traced_test;

    fn alert() -> OperatorAlert {
        OperatorAlert {
            sender: "5511988887777".into(),
            kind: AlertKind::MinorBooking,
            detail: "Cliente 5511988887777 (16 anos) tentou agendar Corte.".into(),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn log_notifier_writes_a_warning() {
        LogNotifier.notify(&alert()).await.unwrap();
        assert!(logs_contain("operator attention needed"));
        assert!(logs_contain("minor_booking"));
    }

    #[tokio::test]
    async fn transport_notifier_messages_the_operator() {
        let transport = Arc::new(MockTransport::new());
        let notifier = TransportNotifier::new(transport.clone(), "5511900000000");
        notifier.notify(&alert()).await.unwrap();
        let texts = transport.texts_to("5511900000000").await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("16 anos"));
    }

    #[tokio::test]
    async fn transport_failure_is_returned() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_for("5511900000000").await;
        let notifier = TransportNotifier::new(transport, "5511900000000");
        assert!(notifier.notify(&alert()).await.is_err());
    }

    #[tokio::test]
    async fn blank_operator_phone_logs_only() {
        let transport = Arc::new(MockTransport::new());
        let notifier = from_config(Some("  "), transport.clone());
        notifier.notify(&alert()).await.unwrap();
        assert_eq!(transport.sent_count().await, 0);
    }
}
