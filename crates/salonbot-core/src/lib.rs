// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Salonbot dispatch engine.
//!
//! This crate provides the error type, the domain types (sessions, contacts,
//! slots, handoff records), and the narrow collaborator traits that the
//! engine consumes. Storage, booking, and transport implementations live in
//! their own crates and implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SalonError;
pub use types::{
    AdapterType, AlertKind, Appointment, AppointmentStatus, BatchBooking, Contact,
    ConversationState, HandoffRecord, HandoffStatus, HealthStatus, InboundMessage, MessageId,
    OperatorAlert, OutboundContent, Session, SessionData, Slot, normalize_tag,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    BookingBackend, Clock, ContactStore, HandoffStore, MessageKey, MessageTemplates,
    MessageTransport, OperatorNotifier, PluginAdapter, SessionStore, SystemClock,
};
