// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the session, contact, and handoff stores.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use salonbot_core::{
    AdapterType, Contact, ContactStore, ConversationState, HandoffRecord, HandoffStatus,
    HandoffStore, HealthStatus, PluginAdapter, SalonError, Session, SessionData, SessionStore,
    normalize_tag,
};

use crate::database::{Database, TIMESTAMP_FORMAT, map_tr_err, now_timestamp};

/// Row-level decoding failure, surfaced as a storage error.
fn decode_err(e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(decode_err)
}

/// Sessions, contacts, handoffs, and the event log for one tenant.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates the contact if needed and sets its display name.
    pub async fn upsert_contact(&self, phone: &str, name: Option<&str>) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let phone = phone.to_string();
        let name = name.map(str::to_string);
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO contacts (tenant_id, phone, name, opted_out, created_at)
                     VALUES (?1, ?2, ?3, 0, ?4)
                     ON CONFLICT (tenant_id, phone) DO UPDATE SET name = excluded.name",
                    params![tenant, phone, name, now_timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of events logged for `sender`.
    pub async fn event_count(&self, sender: &str) -> Result<i64, SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM events WHERE tenant_id = ?1 AND sender = ?2",
                    params![tenant, sender],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SalonError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_session(&self, sender: &str) -> Result<Option<Session>, SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT sender, state, data, updated_at FROM sessions
                     WHERE tenant_id = ?1 AND sender = ?2",
                    params![tenant, sender],
                    |row| {
                        let state: String = row.get(1)?;
                        let data: String = row.get(2)?;
                        let updated_at: String = row.get(3)?;
                        Ok(Session {
                            sender: row.get(0)?,
                            state: ConversationState::from_str(&state).map_err(decode_err)?,
                            data: serde_json::from_str::<SessionData>(&data)
                                .map_err(decode_err)?,
                            updated_at: parse_timestamp(&updated_at)?,
                        })
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn save_session(&self, session: &Session) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = session.sender.clone();
        let state = session.state.to_string();
        let data = serde_json::to_string(&session.data).map_err(SalonError::storage)?;
        let updated_at = session.updated_at.format(TIMESTAMP_FORMAT).to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (tenant_id, sender, state, data, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (tenant_id, sender) DO UPDATE SET
                         state = excluded.state,
                         data = excluded.data,
                         updated_at = excluded.updated_at",
                    params![tenant, sender, state, data, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn log_event(&self, sender: &str, kind: &str, detail: &str) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let (sender, kind, detail) = (sender.to_string(), kind.to_string(), detail.to_string());
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO events (tenant_id, sender, kind, detail, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![tenant, sender, kind, detail, now_timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn get_contact_tags(&self, sender: &str) -> Result<Vec<String>, SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT tag FROM contact_tags WHERE tenant_id = ?1 AND phone = ?2 ORDER BY tag",
                )?;
                let tags = stmt
                    .query_map(params![tenant, sender], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(tags)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn is_opted_out(&self, sender: &str) -> Result<bool, SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let opted_out: Option<bool> = conn
                    .query_row(
                        "SELECT opted_out FROM contacts WHERE tenant_id = ?1 AND phone = ?2",
                        params![tenant, sender],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(opted_out.unwrap_or(false))
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set_opted_out(&self, sender: &str, opted_out: bool) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO contacts (tenant_id, phone, opted_out, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (tenant_id, phone) DO UPDATE SET opted_out = excluded.opted_out",
                    params![tenant, sender, opted_out, now_timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn add_contact_tag(&self, sender: &str, tag: &str) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = sender.to_string();
        let tag = normalize_tag(tag);
        self.db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO contacts (tenant_id, phone, opted_out, created_at)
                     VALUES (?1, ?2, 0, ?3)",
                    params![tenant, sender, now_timestamp()],
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO contact_tags (tenant_id, phone, tag) VALUES (?1, ?2, ?3)",
                    params![tenant, sender, tag],
                )?;
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn contacts_with_tag(&self, tag: &str) -> Result<Vec<Contact>, SalonError> {
        let tenant = self.db.tenant_owned();
        let tag = normalize_tag(tag);
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.phone, c.name, c.opted_out FROM contacts c
                     JOIN contact_tags t ON t.tenant_id = c.tenant_id AND t.phone = c.phone
                     WHERE c.tenant_id = ?1 AND t.tag = ?2
                     ORDER BY c.phone",
                )?;
                let mut contacts = stmt
                    .query_map(params![tenant, tag], |row| {
                        Ok(Contact {
                            phone: row.get(0)?,
                            name: row.get(1)?,
                            tags: Vec::new(),
                            opted_out: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut tags_stmt = conn.prepare(
                    "SELECT tag FROM contact_tags WHERE tenant_id = ?1 AND phone = ?2 ORDER BY tag",
                )?;
                for contact in &mut contacts {
                    contact.tags = tags_stmt
                        .query_map(params![tenant, contact.phone], |row| row.get(0))?
                        .collect::<Result<Vec<String>, _>>()?;
                }
                Ok(contacts)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl HandoffStore for SqliteStore {
    async fn persist_handoff(&self, record: &HandoffRecord) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let sender = record.sender.clone();
        let status = record.status.to_string();
        let agent = record.agent.clone();
        let started_at = record.started_at.format(TIMESTAMP_FORMAT).to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO handoffs (tenant_id, sender, status, agent, started_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (tenant_id, sender) DO UPDATE SET
                         status = excluded.status,
                         agent = excluded.agent,
                         started_at = excluded.started_at,
                         updated_at = excluded.updated_at",
                    params![tenant, sender, status, agent, started_at, now_timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn load_open_handoffs(&self) -> Result<Vec<HandoffRecord>, SalonError> {
        let tenant = self.db.tenant_owned();
        let open = HandoffStatus::Open.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT sender, status, agent, started_at FROM handoffs
                     WHERE tenant_id = ?1 AND status = ?2
                     ORDER BY started_at",
                )?;
                let records = stmt
                    .query_map(params![tenant, open], |row| {
                        let status: String = row.get(1)?;
                        let started_at: String = row.get(3)?;
                        Ok(HandoffRecord {
                            sender: row.get(0)?,
                            status: HandoffStatus::from_str(&status).map_err(decode_err)?,
                            agent: row.get(2)?,
                            started_at: parse_timestamp(&started_at)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(map_tr_err)
    }
}
