// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message pipeline and the transport run loop.

use std::sync::Arc;
use std::time::Duration;

use salonbot_broadcast::{BroadcastDispatcher, BroadcastReport};
use salonbot_core::{
    Appointment, ConversationState, InboundMessage, MessageTransport, OperatorNotifier,
    SalonError, Session, SessionStore,
};
use salonbot_engine::ConversationEngine;
use salonbot_guard::AntiFloodGuard;
use salonbot_handoff::HandoffCoordinator;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// How often the run loop purges expired flood entries and idle sender locks.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Pause after a failed `receive()` before asking the transport again.
const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

pub struct MessageDispatcher {
    engine: Arc<ConversationEngine>,
    sessions: Arc<dyn SessionStore>,
    guard: Arc<AntiFloodGuard>,
    handoff: Arc<HandoffCoordinator>,
    broadcast: BroadcastDispatcher,
    transport: Arc<dyn MessageTransport>,
    notifier: Arc<dyn OperatorNotifier>,
}

impl MessageDispatcher {
    pub fn new(
        engine: Arc<ConversationEngine>,
        sessions: Arc<dyn SessionStore>,
        guard: Arc<AntiFloodGuard>,
        handoff: Arc<HandoffCoordinator>,
        broadcast: BroadcastDispatcher,
        transport: Arc<dyn MessageTransport>,
        notifier: Arc<dyn OperatorNotifier>,
    ) -> Self {
        Self {
            engine,
            sessions,
            guard,
            handoff,
            broadcast,
            transport,
            notifier,
        }
    }

    pub fn handoff(&self) -> &HandoffCoordinator {
        &self.handoff
    }

    pub fn guard(&self) -> &AntiFloodGuard {
        &self.guard
    }

    pub fn broadcaster(&self) -> &BroadcastDispatcher {
        &self.broadcast
    }

    /// Runs one inbound message through the pipeline and returns the replies.
    ///
    /// Nothing is sent here; see [`MessageDispatcher::deliver`]. An empty
    /// result means the message was dropped (flood) or a human owns the
    /// conversation.
    pub async fn process_message(&self, msg: &InboundMessage) -> Result<Vec<String>, SalonError> {
        let sender = msg.sender.as_str();

        if !self.guard.allow(sender) {
            debug!(sender, "message dropped by flood guard");
            return Ok(Vec::new());
        }
        if self.handoff.is_active(sender) {
            debug!(sender, "human is handling this conversation");
            return Ok(Vec::new());
        }

        let _held = self.handoff.sender_locks().lock(sender).await;
        if self.handoff.is_active(sender) {
            debug!(sender, "handoff started while waiting, staying silent");
            return Ok(Vec::new());
        }

        let mut session = self.load_session(sender).await?;
        let outcome = self.engine.process(&mut session, &msg.text).await;

        if let Err(e) = self.sessions.save_session(&session).await {
            warn!(sender, error = %e, "failed to save session");
        }
        if let Some(kind) = outcome.escalation {
            self.handoff.request(sender, &kind.to_string());
        }
        for alert in &outcome.alerts {
            if let Err(e) = self.notifier.notify(alert).await {
                warn!(sender, kind = %alert.kind, error = %e, "operator alert not delivered");
            }
        }
        Ok(outcome.replies)
    }

    /// Processes `msg` and sends the replies back through the transport.
    ///
    /// Returns the number of replies delivered.
    pub async fn deliver(&self, msg: &InboundMessage) -> Result<usize, SalonError> {
        let replies = self.process_message(msg).await?;
        Ok(self.send_all(&msg.sender, replies).await)
    }

    /// Sends `message` to every contact tagged `tag` that has not opted out.
    pub async fn dispatch_broadcast(
        &self,
        tag: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<BroadcastReport, SalonError> {
        self.broadcast
            .send(self.transport.as_ref(), tag, message, cancel)
            .await
    }

    /// An operator takes over `sender`. Effective immediately.
    pub fn start_handover(&self, sender: &str, agent: &str) {
        self.handoff.start(sender, agent);
    }

    /// Hands `sender` back to automation and waits for the session reset.
    pub async fn resolve_handover(&self, sender: &str, agent: &str) {
        self.handoff.resolve(sender, agent);
        self.handoff.flush().await;
    }

    /// Asks the customer of `appointment` to confirm attendance.
    ///
    /// Returns the number of messages sent; zero when a human owns the
    /// conversation.
    pub async fn request_confirmation(&self, appointment: &Appointment) -> Result<usize, SalonError> {
        self.follow_up(appointment, ConversationState::ConfirmationPending)
            .await
    }

    /// Asks the customer of `appointment` to rate the service.
    pub async fn request_feedback(&self, appointment: &Appointment) -> Result<usize, SalonError> {
        self.follow_up(appointment, ConversationState::FeedbackPending)
            .await
    }

    /// Receives and handles messages until `cancel` fires.
    ///
    /// Each message is handled on its own task, so different senders are
    /// processed concurrently; the per-sender lock keeps one sender's
    /// messages in order. In-flight tasks and queued handoff writes are
    /// drained before this returns.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), SalonError> {
        match self.handoff.reload_from_store().await {
            Ok(count) => debug!(count, "open handoffs restored"),
            Err(e) => warn!(error = %e, "could not reload open handoffs"),
        }

        let tracker = TaskTracker::new();
        let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        info!(transport = self.transport.name(), "dispatcher running");

        loop {
            tokio::select! {
                msg = self.transport.receive() => match msg {
                    Ok(inbound) => {
                        let this = Arc::clone(&self);
                        tracker.spawn(async move {
                            if let Err(e) = this.deliver(&inbound).await {
                                error!(sender = %inbound.sender, error = %e, "failed to handle inbound message");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "transport receive error");
                        tokio::select! {
                            _ = tokio::time::sleep(RECEIVE_BACKOFF) => {}
                            _ = cancel.cancelled() => {}
                        }
                    }
                },
                _ = housekeeping.tick() => {
                    let purged = self.guard.purge_expired();
                    let idle = self.purge_idle_locks();
                    debug!(purged, idle, "housekeeping");
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        self.handoff.shutdown().await;
        if let Err(e) = self.transport.shutdown().await {
            warn!(error = %e, "transport shutdown failed");
        }
        info!("dispatcher stopped");
        Ok(())
    }

    /// Drops sender locks no task is holding or waiting on.
    pub fn purge_idle_locks(&self) -> usize {
        self.handoff.sender_locks().purge_idle()
    }

    /// Loads the stored session, starting over when its data no longer
    /// fits its state.
    async fn load_session(&self, sender: &str) -> Result<Session, SalonError> {
        let Some(mut session) = self.sessions.get_session(sender).await? else {
            debug!(sender, "new session");
            return Ok(Session::new(sender));
        };
        if !session.data.is_consistent_with(session.state) {
            warn!(sender, state = %session.state, "session data does not match its state, restarting");
            session.reset(ConversationState::Greeting);
        }
        Ok(session)
    }

    async fn follow_up(
        &self,
        appointment: &Appointment,
        target: ConversationState,
    ) -> Result<usize, SalonError> {
        let sender = appointment.phone.as_str();
        if self.handoff.is_active(sender) {
            debug!(sender, state = %target, "human is handling this conversation, skipping");
            return Ok(0);
        }

        let _held = self.handoff.sender_locks().lock(sender).await;
        if self.handoff.is_active(sender) {
            debug!(sender, state = %target, "handoff started while waiting, skipping");
            return Ok(0);
        }

        let mut session = self.load_session(sender).await?;
        let replies = match target {
            ConversationState::FeedbackPending => {
                self.engine.enter_feedback_pending(&mut session, appointment)
            }
            _ => self
                .engine
                .enter_confirmation_pending(&mut session, appointment),
        };
        if replies.is_empty() {
            return Ok(0);
        }
        self.sessions.save_session(&session).await?;
        info!(sender, appointment = %appointment.id, state = %target, "follow-up requested");
        Ok(self.send_all(sender, replies).await)
    }

    /// Sends each reply in order; failures are logged and skipped.
    async fn send_all(&self, recipient: &str, replies: Vec<String>) -> usize {
        let mut sent = 0;
        for reply in replies {
            match self.transport.send_message(recipient, reply.into()).await {
                Ok(id) => {
                    debug!(recipient, message_id = %id.0, "reply sent");
                    sent += 1;
                }
                Err(e) => warn!(recipient, error = %e, "reply not delivered"),
            }
        }
        sent
    }
}
