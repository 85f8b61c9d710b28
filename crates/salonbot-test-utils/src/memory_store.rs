// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session, contact, and handoff store with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use salonbot_core::{
    Contact, ContactStore, HandoffRecord, HandoffStatus, HandoffStore, SalonError, Session,
    SessionStore, normalize_tag,
};

/// One row of the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub sender: String,
    pub kind: String,
    pub detail: String,
}

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    contacts: Mutex<HashMap<String, Contact>>,
    handoffs: Mutex<HashMap<String, HandoffRecord>>,
    events: Mutex<Vec<LoggedEvent>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write (sessions, events, tags, handoffs) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every session save wait `delay` before it is stored.
    pub fn set_save_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.save_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub async fn add_contact(&self, phone: &str, tags: &[&str], opted_out: bool) {
        self.contacts.lock().await.insert(
            phone.to_string(),
            Contact {
                phone: phone.to_string(),
                name: None,
                tags: tags.iter().map(|t| normalize_tag(t)).collect(),
                opted_out,
            },
        );
    }

    pub async fn insert_session(&self, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(session.sender.clone(), session);
    }

    pub async fn insert_handoff(&self, record: HandoffRecord) {
        self.handoffs
            .lock()
            .await
            .insert(record.sender.clone(), record);
    }

    pub async fn session(&self, sender: &str) -> Option<Session> {
        self.sessions.lock().await.get(sender).cloned()
    }

    pub async fn contact(&self, phone: &str) -> Option<Contact> {
        self.contacts.lock().await.get(phone).cloned()
    }

    pub async fn handoff(&self, sender: &str) -> Option<HandoffRecord> {
        self.handoffs.lock().await.get(sender).cloned()
    }

    pub async fn events(&self) -> Vec<LoggedEvent> {
        self.events.lock().await.clone()
    }

    fn check_write(&self) -> Result<(), SalonError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(SalonError::storage(std::io::Error::other("write rejected")))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> Result<(), SalonError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(SalonError::storage(std::io::Error::other("read rejected")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get_session(&self, sender: &str) -> Result<Option<Session>, SalonError> {
        self.check_read()?;
        Ok(self.sessions.lock().await.get(sender).cloned())
    }

    async fn save_session(&self, session: &Session) -> Result<(), SalonError> {
        self.check_write()?;
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.insert_session(session.clone()).await;
        Ok(())
    }

    async fn log_event(&self, sender: &str, kind: &str, detail: &str) -> Result<(), SalonError> {
        self.check_write()?;
        self.events.lock().await.push(LoggedEvent {
            sender: sender.to_string(),
            kind: kind.to_string(),
            detail: detail.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn get_contact_tags(&self, sender: &str) -> Result<Vec<String>, SalonError> {
        self.check_read()?;
        Ok(self
            .contacts
            .lock()
            .await
            .get(sender)
            .map(|c| c.tags.clone())
            .unwrap_or_default())
    }

    async fn is_opted_out(&self, sender: &str) -> Result<bool, SalonError> {
        self.check_read()?;
        Ok(self
            .contacts
            .lock()
            .await
            .get(sender)
            .is_some_and(|c| c.opted_out))
    }

    async fn set_opted_out(&self, sender: &str, opted_out: bool) -> Result<(), SalonError> {
        self.check_write()?;
        let mut contacts = self.contacts.lock().await;
        let contact = contacts.entry(sender.to_string()).or_insert_with(|| Contact {
            phone: sender.to_string(),
            name: None,
            tags: Vec::new(),
            opted_out: false,
        });
        contact.opted_out = opted_out;
        Ok(())
    }

    async fn add_contact_tag(&self, sender: &str, tag: &str) -> Result<(), SalonError> {
        self.check_write()?;
        let tag = normalize_tag(tag);
        let mut contacts = self.contacts.lock().await;
        let contact = contacts.entry(sender.to_string()).or_insert_with(|| Contact {
            phone: sender.to_string(),
            name: None,
            tags: Vec::new(),
            opted_out: false,
        });
        if !contact.tags.contains(&tag) {
            contact.tags.push(tag);
        }
        Ok(())
    }

    async fn contacts_with_tag(&self, tag: &str) -> Result<Vec<Contact>, SalonError> {
        self.check_read()?;
        let mut matches: Vec<Contact> = self
            .contacts
            .lock()
            .await
            .values()
            .filter(|c| c.has_tag(tag))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.phone.cmp(&b.phone));
        Ok(matches)
    }
}

#[async_trait]
impl HandoffStore for MemoryStore {
    async fn persist_handoff(&self, record: &HandoffRecord) -> Result<(), SalonError> {
        self.check_write()?;
        self.insert_handoff(record.clone()).await;
        Ok(())
    }

    async fn load_open_handoffs(&self) -> Result<Vec<HandoffRecord>, SalonError> {
        self.check_read()?;
        Ok(self
            .handoffs
            .lock()
            .await
            .values()
            .filter(|r| r.status == HandoffStatus::Open)
            .cloned()
            .collect())
    }
}
