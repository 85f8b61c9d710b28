// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread. Every
//! handle is scoped to one tenant and each query filters on it once.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use salonbot_config::model::StorageConfig;
use salonbot_core::SalonError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Timestamp format for `*_at` columns.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Convert a tokio-rusqlite error into `SalonError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SalonError {
    SalonError::Storage {
        source: Box::new(e),
    }
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A migrated SQLite database scoped to one tenant.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    tenant: Arc<str>,
}

impl Database {
    /// Opens (creating if needed) the database at `config.database_path`
    /// and applies pending migrations.
    pub async fn open(config: &StorageConfig, tenant_id: &str) -> Result<Self, SalonError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(SalonError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| SalonError::Storage {
                source: Box::new(e),
            })?;

        let wal_mode = config.wal_mode;
        conn.call(move |conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| run_migrations(conn))
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| {
                SalonError::storage(std::io::Error::other(format!("migration failed: {e}")))
            })?;

        debug!(path = %config.database_path, tenant = tenant_id, "database opened");
        Ok(Self {
            conn,
            tenant: Arc::from(tenant_id),
        })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub(crate) fn tenant_owned(&self) -> String {
        self.tenant.to_string()
    }

    /// Flushes the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), SalonError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
