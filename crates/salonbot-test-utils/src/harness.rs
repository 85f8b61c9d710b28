// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles a complete [`MessageDispatcher`] over in-memory
//! stores, a scriptable booking backend, and a capturing transport.
//! `send()` drives one inbound message through the whole pipeline.

use std::sync::Arc;

use chrono::NaiveDate;
use salonbot_broadcast::{BroadcastDispatcher, Pacing};
use salonbot_config::SalonConfig;
use salonbot_config::model::{LocationConfig, ServiceConfig};
use salonbot_core::{InboundMessage, MessageTransport, SalonError};
use salonbot_dispatch::MessageDispatcher;
use salonbot_engine::{Collaborators, ConversationEngine, TemplateCatalog};
use salonbot_guard::{AntiFloodGuard, FloodLimits};
use salonbot_handoff::HandoffCoordinator;

use crate::memory_store::MemoryStore;
use crate::mock_booking::MockBooking;
use crate::mock_transport::MockTransport;
use crate::notifier::{FixedClock, RecordingNotifier};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: SalonConfig,
    today: NaiveDate,
    pacing: Option<Pacing>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = SalonConfig::default();
        config.salon.name = "Studio Bela".into();
        config.services = vec![ServiceConfig {
            id: "corte".into(),
            name: "Corte Feminino".into(),
            description: "Lavagem, corte e finalização.".into(),
            price_cents: 8000,
            deposit_cents: 0,
            duration_minutes: 60,
            age_exempt: false,
            keywords: Vec::new(),
        }];
        config.locations = vec![LocationConfig {
            id: "centro".into(),
            name: "Centro".into(),
            address: "Rua Augusta, 100".into(),
            keywords: Vec::new(),
        }];
        Self {
            config,
            // A Sunday.
            today: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap_or_default(),
            pacing: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: SalonConfig) -> Self {
        self.config = config;
        self
    }

    /// Pins the engine's notion of today.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Overrides the broadcast pacing taken from the configuration.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// Build the test harness. Must be called inside a Tokio runtime.
    pub fn build(self) -> Result<TestHarness, SalonError> {
        let store = Arc::new(MemoryStore::new());
        let booking = Arc::new(MockBooking::new());
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let templates = TemplateCatalog::with_overrides(&self.config.templates)?;
        let engine = ConversationEngine::from_config(
            &self.config,
            Collaborators {
                booking: booking.clone(),
                contacts: store.clone(),
                events: store.clone(),
                templates: Arc::new(templates),
                clock: Arc::new(FixedClock(self.today)),
            },
        );

        let guard = Arc::new(AntiFloodGuard::new(FloodLimits::from(&self.config.flood)));
        let handoff = Arc::new(HandoffCoordinator::new(store.clone(), store.clone()));
        let pacing = self
            .pacing
            .unwrap_or_else(|| Pacing::from(&self.config.broadcast));
        let broadcast = BroadcastDispatcher::new(store.clone(), pacing);

        let dispatcher = Arc::new(MessageDispatcher::new(
            Arc::new(engine),
            store.clone(),
            guard,
            handoff,
            broadcast,
            transport.clone(),
            notifier.clone(),
        ));

        Ok(TestHarness {
            dispatcher,
            store,
            booking,
            transport,
            notifier,
            config: self.config,
        })
    }
}

/// A complete pipeline with mock collaborators.
pub struct TestHarness {
    pub dispatcher: Arc<MessageDispatcher>,
    /// Sessions, contacts, handoffs, and the event log.
    pub store: Arc<MemoryStore>,
    pub booking: Arc<MockBooking>,
    /// Captures every reply, broadcast, and operator message.
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: SalonConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends `text` from `sender` through the pipeline and returns the replies.
    ///
    /// Replies are also delivered to the mock transport.
    pub async fn send(&self, sender: &str, text: &str) -> Result<Vec<String>, SalonError> {
        let msg = InboundMessage::text(sender, text);
        let replies = self.dispatcher.process_message(&msg).await?;
        for reply in &replies {
            self.transport
                .send_message(sender, reply.as_str().into())
                .await?;
        }
        Ok(replies)
    }
}
