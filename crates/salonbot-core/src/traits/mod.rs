// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions consumed by the dispatch engine.
//!
//! Every collaborator is passed in explicitly (constructor injection) and
//! uses `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod booking;
pub mod clock;
pub mod notifier;
pub mod store;
pub mod templates;
pub mod transport;

pub use adapter::PluginAdapter;
pub use booking::BookingBackend;
pub use clock::{Clock, SystemClock};
pub use notifier::OperatorNotifier;
pub use store::{ContactStore, HandoffStore, SessionStore};
pub use templates::{MessageKey, MessageTemplates};
pub use transport::MessageTransport;
