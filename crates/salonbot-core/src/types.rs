// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the dispatch engine and its collaborators.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Delivery handle returned by a transport after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
    Booking,
    Notifier,
}

// --- Conversation ---

/// States of the per-sender booking conversation.
///
/// `Greeting` is the initial state. `Booked` is transient: a successful
/// booking resets to `Menu` unless a recurrence offer is pending.
/// `ConfirmationPending` and `FeedbackPending` are entered by the scheduler,
/// never by user input. `Human` is absorbing and only left through an
/// operator resolve.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    Greeting,
    Menu,
    Services,
    ServiceDetail,
    PickService,
    PickLocation,
    PickSlot,
    CollectName,
    CollectBirthdate,
    Confirm,
    WaitingList,
    Faq,
    FaqDetail,
    Locations,
    Packages,
    Booked,
    RecurrenceOffer,
    ConfirmationPending,
    FeedbackPending,
    Human,
}

impl ConversationState {
    /// States entered asynchronously by the scheduler rather than by user input.
    pub fn is_scheduler_owned(self) -> bool {
        matches!(
            self,
            ConversationState::ConfirmationPending | ConversationState::FeedbackPending
        )
    }
}

/// Slots collected while a conversation moves through the booking flow.
///
/// Every field is optional; [`SessionData::is_consistent_with`] checks that
/// the fields a state relies on are actually present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offered_slots: Vec<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_slot: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    /// Future weekly slots offered after a successful booking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence_offer: Vec<Slot>,
    /// Set once the retry prompt for an unrecognized offer answer was sent.
    #[serde(default)]
    pub recurrence_prompted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq_index: Option<usize>,
    #[serde(default)]
    pub human_takeover: bool,
}

impl SessionData {
    /// Returns `true` if the data carries everything `state` needs.
    pub fn is_consistent_with(&self, state: ConversationState) -> bool {
        use ConversationState::*;
        match state {
            ServiceDetail | PickLocation => self.service_id.is_some(),
            PickSlot => {
                self.service_id.is_some()
                    && self.location_id.is_some()
                    && !self.offered_slots.is_empty()
            }
            CollectName => self.service_id.is_some() && self.selected_slot.is_some(),
            CollectBirthdate => {
                self.service_id.is_some()
                    && self.selected_slot.is_some()
                    && self.customer_name.is_some()
            }
            Confirm => {
                self.service_id.is_some()
                    && self.selected_slot.is_some()
                    && self.customer_name.is_some()
                    && self.birthdate.is_some()
            }
            RecurrenceOffer => {
                self.service_id.is_some()
                    && self.customer_name.is_some()
                    && !self.recurrence_offer.is_empty()
            }
            FaqDetail => self.faq_index.is_some(),
            ConfirmationPending | FeedbackPending => self.appointment_id.is_some(),
            Human => self.human_takeover,
            _ => true,
        }
    }
}

/// Conversation state for one sender, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub sender: String,
    pub state: ConversationState,
    #[serde(default)]
    pub data: SessionData,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session in the initial `Greeting` state.
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            state: ConversationState::Greeting,
            data: SessionData::default(),
            updated_at: Utc::now(),
        }
    }

    /// Moves to `state`, keeping collected data.
    pub fn transition(&mut self, state: ConversationState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Moves to `state` and clears all collected data.
    pub fn reset(&mut self, state: ConversationState) {
        self.data = SessionData::default();
        self.transition(state);
    }
}

// --- Contacts ---

/// Normalizes a contact tag for comparison (trimmed, upper-case).
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_uppercase()
}

/// A CRM contact as seen by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub opted_out: bool,
}

impl Contact {
    /// Returns `true` if the contact carries `tag`, compared case-insensitively.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = normalize_tag(tag);
        self.tags.iter().any(|t| normalize_tag(t) == wanted)
    }
}

// --- Booking ---

/// A bookable appointment slot at one location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub location_id: String,
    pub starts_at: NaiveDateTime,
}

/// Lifecycle of a booked appointment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
}

/// A booked appointment returned by the booking backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub slot: Slot,
    pub customer_name: String,
    pub phone: String,
    pub service_id: String,
    pub status: AppointmentStatus,
}

/// Result of booking several slots where each attempt is independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchBooking {
    pub booked: Vec<Appointment>,
    pub failed: Vec<Slot>,
}

// --- Handoff ---

/// Lifecycle of a human takeover.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HandoffStatus {
    /// Escalated by the engine, waiting for an agent to pick it up.
    Pending,
    /// An agent is actively handling the conversation.
    Open,
    /// Control was handed back to automation.
    Resolved,
}

/// Persisted record of a human takeover for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub sender: String,
    pub status: HandoffStatus,
    pub agent: Option<String>,
    pub started_at: DateTime<Utc>,
}

// --- Messages ---

/// An inbound chat message handed to the dispatcher by a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// The transport's raw event, kept for logging.
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

impl InboundMessage {
    /// Builds a text message stamped with the current time.
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("in-{}", now.timestamp_nanos_opt().unwrap_or_default()),
            sender: sender.into(),
            text: text.into(),
            timestamp: now,
            raw: None,
        }
    }
}

/// Content handed to a transport for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundContent {
    Text(String),
    Media {
        url: String,
        mime_type: String,
        caption: Option<String>,
    },
}

impl OutboundContent {
    /// Returns the textual part of the content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundContent::Text(t) => Some(t),
            OutboundContent::Media { caption, .. } => caption.as_deref(),
        }
    }
}

impl From<String> for OutboundContent {
    fn from(text: String) -> Self {
        OutboundContent::Text(text)
    }
}

impl From<&str> for OutboundContent {
    fn from(text: &str) -> Self {
        OutboundContent::Text(text.to_string())
    }
}

// --- Operator alerts ---

/// Why an operator is being pulled into a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The customer asked for a human.
    HumanRequested,
    /// A minor tried to book a service that requires an adult.
    MinorBooking,
    /// A reply to a confirmation request matched neither yes nor no.
    UnmatchedConfirmation,
    /// A reply to a feedback request was not a rating.
    UnmatchedFeedback,
}

/// A notification for the human operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAlert {
    pub sender: String,
    pub kind: AlertKind,
    pub detail: String,
}

impl fmt::Display for OperatorAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.sender, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn state_display_and_parse_roundtrip() {
        assert_eq!(
            ConversationState::ConfirmationPending.to_string(),
            "CONFIRMATION_PENDING"
        );
        assert_eq!(
            ConversationState::from_str("RECURRENCE_OFFER").unwrap(),
            ConversationState::RecurrenceOffer
        );
        assert_eq!(ConversationState::default(), ConversationState::Greeting);
    }

    #[test]
    fn state_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ConversationState::PickSlot).unwrap();
        assert_eq!(json, "\"PICK_SLOT\"");
    }

    #[test]
    fn reset_clears_data() {
        let mut session = Session::new("5511999999999");
        session.data.customer_name = Some("Ana".into());
        session.data.service_id = Some("corte".into());
        session.transition(ConversationState::CollectBirthdate);
        assert_eq!(session.data.customer_name.as_deref(), Some("Ana"));

        session.reset(ConversationState::Menu);
        assert_eq!(session.state, ConversationState::Menu);
        assert_eq!(session.data, SessionData::default());
    }

    #[test]
    fn consistency_requires_state_specific_fields() {
        let mut data = SessionData::default();
        assert!(data.is_consistent_with(ConversationState::Menu));
        assert!(!data.is_consistent_with(ConversationState::Confirm));
        assert!(!data.is_consistent_with(ConversationState::ConfirmationPending));

        data.appointment_id = Some("apt-1".into());
        assert!(data.is_consistent_with(ConversationState::ConfirmationPending));
    }

    #[test]
    fn session_data_skips_empty_fields() {
        let json = serde_json::to_string(&SessionData::default()).unwrap();
        assert_eq!(
            json,
            r#"{"recurrence_prompted":false,"human_takeover":false}"#
        );
        let back: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(back, SessionData::default());
    }

    #[test]
    fn contact_tags_compare_case_insensitively() {
        let contact = Contact {
            phone: "5511".into(),
            name: None,
            tags: vec!["vip".into(), " Noivas ".into()],
            opted_out: false,
        };
        assert!(contact.has_tag("VIP"));
        assert!(contact.has_tag("noivas"));
        assert!(!contact.has_tag("inativos"));
        assert_eq!(normalize_tag("  vip "), "VIP");
    }

    #[test]
    fn handoff_status_strings() {
        assert_eq!(HandoffStatus::Open.to_string(), "open");
        assert_eq!(HandoffStatus::from_str("pending").unwrap(), HandoffStatus::Pending);
    }

    #[test]
    fn alert_display_includes_kind_and_sender() {
        let alert = OperatorAlert {
            sender: "5511".into(),
            kind: AlertKind::MinorBooking,
            detail: "idade 16".into(),
        };
        assert_eq!(alert.to_string(), "[minor_booking] 5511: idade 16");
    }
}
