// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human handoff coordination.
//!
//! [`HandoffCoordinator::is_active`] answers "is a human running this
//! conversation?" from an in-memory set without touching storage. Start and
//! resolve update that set synchronously, then hand persistence to a single
//! background worker that applies writes in call order. Persistence
//! failures are logged and never reach the message path.
//!
//! The worker's session writes take the same [`SenderLocks`] the message
//! pipeline holds, so a message handled while a handoff starts or resolves
//! can never overwrite the handoff's session state.

mod locks;

pub use locks::SenderLocks;

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashSet;
use salonbot_core::{
    ConversationState, HandoffRecord, HandoffStatus, HandoffStore, SalonError, Session,
    SessionStore,
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// What the worker does to the stored session after persisting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEffect {
    /// Force the session into `HUMAN`.
    TakeOver,
    /// Clear collected data and go back to `MENU`.
    Release,
    /// Leave the session alone; the engine already moved it.
    Keep,
}

enum Job {
    Persist {
        record: HandoffRecord,
        effect: SessionEffect,
    },
    Flush(oneshot::Sender<()>),
}

/// Write-through cache of senders currently handled by a human.
pub struct HandoffCoordinator {
    active: Arc<DashSet<String>>,
    handoffs: Arc<dyn HandoffStore>,
    locks: Arc<SenderLocks>,
    jobs: mpsc::UnboundedSender<Job>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl HandoffCoordinator {
    /// Creates the coordinator and spawns its persistence worker.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(handoffs: Arc<dyn HandoffStore>, sessions: Arc<dyn SessionStore>) -> Self {
        let (jobs, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let locks = Arc::new(SenderLocks::new());

        tracker.spawn(persistence_worker(
            rx,
            Stores {
                handoffs: handoffs.clone(),
                sessions,
                locks: locks.clone(),
            },
            cancel.clone(),
        ));

        Self {
            active: Arc::new(DashSet::new()),
            handoffs,
            locks,
            jobs,
            cancel,
            tracker,
        }
    }

    /// Seeds the cache from every persisted `open` record.
    ///
    /// Run once at startup so a restart never makes the bot speak inside a
    /// conversation an agent is running.
    pub async fn reload_from_store(&self) -> Result<usize, SalonError> {
        let records = self.handoffs.load_open_handoffs().await?;
        let count = records.len();
        for record in records {
            self.active.insert(record.sender);
        }
        info!(count, "handoff cache reloaded");
        Ok(count)
    }

    /// The per-sender locks guarding stored sessions.
    pub fn sender_locks(&self) -> &SenderLocks {
        &self.locks
    }

    /// O(1) membership check, no I/O.
    pub fn is_active(&self, sender: &str) -> bool {
        self.active.contains(sender)
    }

    /// An operator takes over `sender`.
    ///
    /// The cache is updated before this returns; the `open` record and the
    /// forced `HUMAN` session are written in the background.
    pub fn start(&self, sender: &str, agent: &str) {
        self.active.insert(sender.to_string());
        info!(sender, agent, "handoff started");
        self.enqueue(
            record(sender, HandoffStatus::Open, Some(agent)),
            SessionEffect::TakeOver,
        );
    }

    /// The engine escalated `sender` (user asked for a human, minor booking).
    ///
    /// Recorded as `pending` until an agent picks it up.
    pub fn request(&self, sender: &str, reason: &str) {
        self.active.insert(sender.to_string());
        info!(sender, reason, "handoff requested");
        self.enqueue(
            record(sender, HandoffStatus::Pending, None),
            SessionEffect::Keep,
        );
    }

    /// Hands `sender` back to automation.
    ///
    /// The cache entry is gone before this returns; the `resolved` record
    /// and the reset to `MENU` follow in the background.
    pub fn resolve(&self, sender: &str, agent: &str) {
        let was_active = self.active.remove(sender).is_some();
        info!(sender, agent, was_active, "handoff resolved");
        self.enqueue(
            record(sender, HandoffStatus::Resolved, Some(agent)),
            SessionEffect::Release,
        );
    }

    /// Senders currently in the cache, sorted.
    pub fn active_senders(&self) -> Vec<String> {
        let mut senders: Vec<String> = self.active.iter().map(|s| s.key().clone()).collect();
        senders.sort();
        senders
    }

    /// Waits until every write queued so far has been applied.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.jobs.send(Job::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Drains queued writes and stops the worker.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("handoff worker stopped");
    }

    fn enqueue(&self, record: HandoffRecord, effect: SessionEffect) {
        if self.jobs.send(Job::Persist { record, effect }).is_err() {
            warn!("handoff worker is stopped; persistence skipped");
        }
    }
}

fn record(sender: &str, status: HandoffStatus, agent: Option<&str>) -> HandoffRecord {
    HandoffRecord {
        sender: sender.to_string(),
        status,
        agent: agent.map(str::to_string),
        started_at: Utc::now(),
    }
}

struct Stores {
    handoffs: Arc<dyn HandoffStore>,
    sessions: Arc<dyn SessionStore>,
    locks: Arc<SenderLocks>,
}

async fn persistence_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    stores: Stores,
    cancel: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            job = rx.recv() => job,
            _ = cancel.cancelled() => break,
        };
        match job {
            Some(job) => apply(job, &stores).await,
            None => return,
        }
    }

    // Cancelled: apply what is already queued, then stop.
    rx.close();
    while let Ok(job) = rx.try_recv() {
        apply(job, &stores).await;
    }
}

async fn apply(job: Job, stores: &Stores) {
    let (record, effect) = match job {
        Job::Persist { record, effect } => (record, effect),
        Job::Flush(done) => {
            let _ = done.send(());
            return;
        }
    };

    if let Err(e) = stores.handoffs.persist_handoff(&record).await {
        warn!(sender = %record.sender, status = %record.status, error = %e, "failed to persist handoff");
    }

    if effect == SessionEffect::Keep {
        return;
    }

    let _held = stores.locks.lock(&record.sender).await;
    let mut session = match stores.sessions.get_session(&record.sender).await {
        Ok(Some(session)) => session,
        Ok(None) => Session::new(record.sender.clone()),
        Err(e) => {
            warn!(sender = %record.sender, error = %e, "failed to load session for handoff");
            return;
        }
    };

    match effect {
        SessionEffect::TakeOver => {
            session.data.human_takeover = true;
            session.transition(ConversationState::Human);
        }
        SessionEffect::Release => session.reset(ConversationState::Menu),
        SessionEffect::Keep => {}
    }

    if let Err(e) = stores.sessions.save_session(&session).await {
        warn!(sender = %record.sender, error = %e, "failed to save session for handoff");
    }
}
