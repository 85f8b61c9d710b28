// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbound message pipeline for the Salonbot dispatch engine.
//!
//! [`MessageDispatcher`] is the single entry point a transport drives:
//! - Drops messages from flooding senders
//! - Stays silent while a human handles the conversation
//! - Serializes messages per sender and runs the conversation engine
//! - Persists the session, escalates to a human, and alerts operators
//!
//! It also exposes the operator-facing controls (handover, broadcasts) and
//! the scheduler entry points for confirmation and feedback requests.

pub mod dispatcher;
pub mod notifier;
pub mod shutdown;

pub use dispatcher::MessageDispatcher;
pub use notifier::{LogNotifier, TransportNotifier};
