// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires storage, the conversation engine, and the dispatcher from config.

use std::sync::Arc;

use salonbot_broadcast::{BroadcastDispatcher, Pacing};
use salonbot_config::SalonConfig;
use salonbot_core::{MessageTransport, PluginAdapter, SalonError, SystemClock};
use salonbot_dispatch::{MessageDispatcher, notifier};
use salonbot_engine::{Collaborators, ConversationEngine, TemplateCatalog};
use salonbot_guard::{AntiFloodGuard, FloodLimits};
use salonbot_handoff::HandoffCoordinator;
use salonbot_storage::{Database, SlotRules, SqliteBooking, SqliteStore};
use tracing::info;

/// A fully wired dispatcher over the configured SQLite database.
pub struct App {
    pub store: Arc<SqliteStore>,
    pub dispatcher: Arc<MessageDispatcher>,
}

impl App {
    /// Opens the database and assembles the pipeline around `transport`.
    ///
    /// Open handoffs are restored before this returns.
    pub async fn build(
        config: &SalonConfig,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, SalonError> {
        let db = Database::open(&config.storage, &config.salon.tenant_id).await?;
        let store = Arc::new(SqliteStore::new(db.clone()));
        let booking = Arc::new(SqliteBooking::new(
            db,
            SlotRules::from_config(&config.booking, &config.locations),
            Arc::new(SystemClock),
        ));

        let templates = TemplateCatalog::with_overrides(&config.templates)?;
        let engine = ConversationEngine::from_config(
            config,
            Collaborators {
                booking,
                contacts: store.clone(),
                events: store.clone(),
                templates: Arc::new(templates),
                clock: Arc::new(SystemClock),
            },
        );

        let handoff = Arc::new(HandoffCoordinator::new(store.clone(), store.clone()));
        handoff.reload_from_store().await?;

        let dispatcher = MessageDispatcher::new(
            Arc::new(engine),
            store.clone(),
            Arc::new(AntiFloodGuard::new(FloodLimits::from(&config.flood))),
            handoff,
            BroadcastDispatcher::new(store.clone(), Pacing::from(&config.broadcast)),
            transport.clone(),
            notifier::from_config(config.salon.operator_phone.as_deref(), transport),
        );

        info!(
            salon = config.salon.name.as_str(),
            tenant = config.salon.tenant_id.as_str(),
            services = config.services.len(),
            locations = config.locations.len(),
            "salonbot initialized"
        );

        Ok(Self {
            store,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Drains queued handoff writes and checkpoints the database.
    pub async fn close(&self) -> Result<(), SalonError> {
        self.dispatcher.handoff().shutdown().await;
        PluginAdapter::shutdown(self.store.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbot_core::{ConversationState, InboundMessage, SessionStore};
    use salonbot_test_utils::MockTransport;

    fn config(dir: &tempfile::TempDir) -> SalonConfig {
        let mut config = SalonConfig::default();
        config.storage.database_path = dir.path().join("salon.db").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn greeting_is_persisted_to_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::build(&config(&dir), Arc::new(MockTransport::new()))
            .await
            .unwrap();

        let replies = app
            .dispatcher
            .process_message(&InboundMessage::text("5511988887777", "oi"))
            .await
            .unwrap();
        assert_eq!(replies.len(), 2);

        let session = app.store.get_session("5511988887777").await.unwrap().unwrap();
        assert_eq!(session.state, ConversationState::Menu);
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn handover_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        {
            let app = App::build(&config, Arc::new(MockTransport::new())).await.unwrap();
            app.dispatcher.start_handover("5511988887777", "ana");
            app.close().await.unwrap();
        }

        let app = App::build(&config, Arc::new(MockTransport::new())).await.unwrap();
        assert!(app.dispatcher.handoff().is_active("5511988887777"));
        let replies = app
            .dispatcher
            .process_message(&InboundMessage::text("5511988887777", "oi"))
            .await
            .unwrap();
        assert!(replies.is_empty());
        app.close().await.unwrap();
    }
}
