// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender conversation state machine for the Salonbot dispatch engine.
//!
//! The engine turns one inbound text plus the sender's [`Session`] into
//! replies and operator alerts. It owns no I/O of its own: booking, contact
//! storage, the event log, message copy, and the clock are injected through
//! [`Collaborators`].
//!
//! [`Session`]: salonbot_core::Session

mod booking_flow;
pub mod catalog;
mod engine;
mod followup;
mod info;
pub mod parse;
pub mod templates;

pub use catalog::{Catalog, MenuOption};
pub use engine::{
    Collaborators, ConversationEngine, EngineSettings, Outcome, PixSettings, WAITING_LIST_TAG,
};
pub use templates::{TemplateCatalog, format_brl};
