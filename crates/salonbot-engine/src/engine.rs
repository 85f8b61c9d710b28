// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! [`ConversationEngine::process`] takes one inbound text and the sender's
//! session, mutates the session in place, and returns the replies plus any
//! operator alerts. Persisting the session is the caller's job.

use std::sync::Arc;

use salonbot_config::SalonConfig;
use salonbot_core::{
    AlertKind, BookingBackend, Clock, ContactStore, ConversationState, MessageKey,
    MessageTemplates, OperatorAlert, Session, SessionStore,
};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, MenuOption};
use crate::parse;

/// Contact tag recorded when a customer joins the waiting list.
pub const WAITING_LIST_TAG: &str = "WAITING_LIST";

/// Pix merchant data used for the deposit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixSettings {
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub salon_name: String,
    pub days_ahead: u32,
    pub max_offered_slots: usize,
    pub recurrence_weeks: u32,
    pub adult_age: u32,
    /// `None` skips the payment step entirely.
    pub pix: Option<PixSettings>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&SalonConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &SalonConfig) -> Self {
        let pix = config
            .pix
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|key| PixSettings {
                key: key.to_string(),
                merchant_name: config.pix.merchant_name.clone(),
                merchant_city: config.pix.merchant_city.clone(),
            });
        Self {
            salon_name: config.salon.name.clone(),
            days_ahead: config.booking.days_ahead,
            max_offered_slots: config.booking.max_offered_slots,
            recurrence_weeks: config.booking.recurrence_weeks,
            adult_age: config.booking.adult_age,
            pix,
        }
    }
}

/// Everything the engine calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub booking: Arc<dyn BookingBackend>,
    pub contacts: Arc<dyn ContactStore>,
    /// Used for the non-critical event log only.
    pub events: Arc<dyn SessionStore>,
    pub templates: Arc<dyn MessageTemplates>,
    pub clock: Arc<dyn Clock>,
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Replies to send back to the sender, in order.
    pub replies: Vec<String>,
    /// Alerts for the human operators.
    pub alerts: Vec<OperatorAlert>,
    /// Set when the conversation was handed to a human.
    pub escalation: Option<AlertKind>,
}

impl Outcome {
    pub(crate) fn reply(&mut self, text: String) {
        self.replies.push(text);
    }
}

pub struct ConversationEngine {
    pub(crate) settings: EngineSettings,
    pub(crate) catalog: Catalog,
    pub(crate) collab: Collaborators,
}

impl ConversationEngine {
    pub fn new(settings: EngineSettings, catalog: Catalog, collaborators: Collaborators) -> Self {
        Self {
            settings,
            catalog,
            collab: collaborators,
        }
    }

    pub fn from_config(config: &SalonConfig, collaborators: Collaborators) -> Self {
        Self::new(
            EngineSettings::from_config(config),
            Catalog::from_config(config),
            collaborators,
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handles one inbound text for `session`.
    ///
    /// Opt-out and requests for a human are honored in every state before
    /// normal dispatch. A session in `HUMAN` gets no reply at all.
    pub async fn process(&self, session: &mut Session, text: &str) -> Outcome {
        let mut out = Outcome::default();
        let before = session.state;
        debug!(sender = %session.sender, state = %before, "processing message");

        if before == ConversationState::Human {
            debug!(sender = %session.sender, "human takeover, staying silent");
            return out;
        }

        if parse::is_opt_out(text) {
            self.opt_out(session, &mut out).await;
        } else if parse::is_human_request(text) {
            self.request_human(session, text, &mut out).await;
        } else {
            self.dispatch(session, text, &mut out).await;
        }

        if session.state != before {
            info!(sender = %session.sender, from = %before, to = %session.state, "state transition");
        }
        out
    }

    async fn dispatch(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        use ConversationState::*;

        if is_navigable(session.state) && parse::is_back(text) {
            out.reply(self.msg(MessageKey::BackToMenu, &[]));
            out.reply(self.msg(MessageKey::MainMenu, &[]));
            session.reset(Menu);
            return;
        }

        match session.state {
            Greeting => self.greet(session, out).await,
            Menu | Booked => self.on_menu(session, text, out).await,
            Services => self.on_services(session, text, out),
            ServiceDetail => self.on_service_detail(session, text, out).await,
            PickService => self.on_pick_service(session, text, out).await,
            PickLocation => self.on_pick_location(session, text, out).await,
            PickSlot => self.on_pick_slot(session, text, out),
            CollectName => self.on_collect_name(session, text, out),
            CollectBirthdate => self.on_collect_birthdate(session, text, out).await,
            Confirm => self.on_confirm(session, text, out).await,
            WaitingList => self.on_waiting_list(session, text, out).await,
            Faq | FaqDetail => self.on_faq(session, text, out),
            Locations => self.on_locations(session, text, out),
            Packages => self.on_packages(session, text, out),
            RecurrenceOffer => self.on_recurrence_offer(session, text, out).await,
            ConfirmationPending => self.on_confirmation_pending(session, text, out).await,
            FeedbackPending => self.on_feedback_pending(session, text, out).await,
            Human => {}
        }
    }

    /// Greets the sender and opens the menu. A greeting from an opted-out
    /// contact opts them back in.
    async fn greet(&self, session: &mut Session, out: &mut Outcome) {
        match self.collab.contacts.is_opted_out(&session.sender).await {
            Ok(true) => {
                if let Err(e) = self.collab.contacts.set_opted_out(&session.sender, false).await {
                    warn!(sender = %session.sender, error = %e, "failed to clear opt-out");
                }
                self.log_event(&session.sender, "opt_in", "").await;
            }
            Ok(false) => {}
            Err(e) => warn!(sender = %session.sender, error = %e, "opt-out lookup failed"),
        }
        out.reply(self.msg(
            MessageKey::Welcome,
            &[("salon", self.settings.salon_name.clone())],
        ));
        out.reply(self.msg(MessageKey::MainMenu, &[]));
        session.transition(ConversationState::Menu);
    }

    async fn on_menu(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        if session.state == ConversationState::Booked {
            session.reset(ConversationState::Menu);
        }
        let Some(idx) = parse::parse_choice(text, &MenuOption::keyword_table()) else {
            out.reply(self.msg(MessageKey::Clarify, &[]));
            out.reply(self.msg(MessageKey::MainMenu, &[]));
            return;
        };
        match MenuOption::ALL[idx] {
            MenuOption::Book => self.start_booking(session, out),
            MenuOption::Services => self.show_services(session, out),
            MenuOption::Locations => self.show_locations(session, out),
            MenuOption::Packages => self.show_packages(session, out),
            MenuOption::Faq => self.show_faq(session, out),
            MenuOption::Human => self.request_human(session, text, out).await,
        }
    }

    async fn opt_out(&self, session: &mut Session, out: &mut Outcome) {
        if let Err(e) = self.collab.contacts.set_opted_out(&session.sender, true).await {
            warn!(sender = %session.sender, error = %e, "failed to record opt-out");
        }
        self.log_event(&session.sender, "opt_out", "").await;
        out.reply(self.msg(MessageKey::OptOutConfirmed, &[]));
        session.reset(ConversationState::Greeting);
    }

    async fn request_human(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        let detail = self.msg(
            MessageKey::OperatorHumanRequested,
            &[("sender", session.sender.clone()), ("text", text.to_string())],
        );
        self.escalate(session, AlertKind::HumanRequested, MessageKey::HumanHandoff, detail, out);
        self.log_event(&session.sender, "human_requested", text).await;
    }

    /// Moves the session to `HUMAN`, tells the customer, and raises an alert.
    pub(crate) fn escalate(
        &self,
        session: &mut Session,
        kind: AlertKind,
        reply: MessageKey,
        detail: String,
        out: &mut Outcome,
    ) {
        out.reply(self.msg(reply, &[]));
        out.alerts.push(OperatorAlert {
            sender: session.sender.clone(),
            kind,
            detail,
        });
        out.escalation = Some(kind);
        session.data.human_takeover = true;
        session.transition(ConversationState::Human);
    }

    pub(crate) fn clarify(&self, out: &mut Outcome) {
        out.reply(self.msg(MessageKey::Clarify, &[]));
    }

    pub(crate) fn msg(&self, key: MessageKey, replacements: &[(&str, String)]) -> String {
        self.collab.templates.get_message(key, replacements)
    }

    /// Header followed by one rendered line per row, as a single message.
    pub(crate) fn listing(
        &self,
        header: MessageKey,
        line: MessageKey,
        rows: Vec<Vec<(&str, String)>>,
    ) -> String {
        let mut text = self.msg(header, &[]);
        text.push('\n');
        text.push_str(&self.numbered_lines(line, rows));
        text
    }

    /// Renders `line` once per row with a 1-based `{index}`.
    pub(crate) fn numbered_lines(&self, line: MessageKey, rows: Vec<Vec<(&str, String)>>) -> String {
        rows.into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.push(("index", (i + 1).to_string()));
                self.msg(line, &row)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends to the event log; failures are logged and swallowed.
    pub(crate) async fn log_event(&self, sender: &str, kind: &str, detail: &str) {
        if let Err(e) = self.collab.events.log_event(sender, kind, detail).await {
            warn!(sender, kind, error = %e, "failed to log conversation event");
        }
    }
}

/// States where `0`/`menu`/`voltar` leaves the current sub-flow.
fn is_navigable(state: ConversationState) -> bool {
    use ConversationState::*;
    matches!(
        state,
        Services
            | ServiceDetail
            | PickService
            | PickLocation
            | PickSlot
            | CollectName
            | CollectBirthdate
            | Confirm
            | WaitingList
            | Faq
            | FaqDetail
            | Locations
            | Packages
    )
}
