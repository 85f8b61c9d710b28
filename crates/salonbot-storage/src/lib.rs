// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Salonbot dispatch engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. [`SqliteStore`]
//! backs sessions, contacts, handoffs, and the event log;
//! [`SqliteBooking`] is a slot-based booking backend.

pub mod booking;
pub mod database;
pub mod migrations;
pub mod store;

pub use booking::{SlotRules, SqliteBooking};
pub use database::Database;
pub use store::SqliteStore;
