// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for sessions, contacts, and human handoffs.

use async_trait::async_trait;

use crate::error::SalonError;
use crate::types::{Contact, HandoffRecord, Session};

/// Conversation session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for `sender`, if one was ever saved.
    async fn get_session(&self, sender: &str) -> Result<Option<Session>, SalonError>;

    /// Inserts or replaces the session (state and data) for `session.sender`.
    async fn save_session(&self, session: &Session) -> Result<(), SalonError>;

    /// Appends a conversation event to the audit log.
    ///
    /// Callers treat this as a non-critical write and swallow failures.
    async fn log_event(&self, sender: &str, kind: &str, detail: &str) -> Result<(), SalonError>;
}

/// CRM contact lookups used by the engine and the broadcast dispatcher.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Returns the normalized tags of `sender` (empty for unknown contacts).
    async fn get_contact_tags(&self, sender: &str) -> Result<Vec<String>, SalonError>;

    /// Returns `true` if `sender` opted out of automated messaging.
    async fn is_opted_out(&self, sender: &str) -> Result<bool, SalonError>;

    /// Sets or clears the opt-out flag, creating the contact if needed.
    async fn set_opted_out(&self, sender: &str, opted_out: bool) -> Result<(), SalonError>;

    /// Adds `tag` to `sender`, creating the contact if needed.
    async fn add_contact_tag(&self, sender: &str, tag: &str) -> Result<(), SalonError>;

    /// Returns every contact carrying `tag`, opted-out contacts included.
    async fn contacts_with_tag(&self, tag: &str) -> Result<Vec<Contact>, SalonError>;
}

/// Persistence for human takeover records.
#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// Inserts or replaces the handoff record for `record.sender`.
    async fn persist_handoff(&self, record: &HandoffRecord) -> Result<(), SalonError>;

    /// Returns all records whose status is `open`.
    async fn load_open_handoffs(&self) -> Result<Vec<HandoffRecord>, SalonError>;
}
