// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking path: service, unit, slot, name, birthdate, confirmation,
//! deposit, and the weekly recurrence upsell.

use salonbot_config::model::ServiceConfig;
use salonbot_core::{AlertKind, Appointment, ConversationState, MessageKey, Session, Slot};
use salonbot_pix::PixPayload;
use tracing::warn;

use crate::engine::{ConversationEngine, Outcome, WAITING_LIST_TAG};
use crate::parse;
use crate::templates::format_brl;

/// Oldest plausible customer; anything above is a typo.
const MAX_AGE: u32 = 120;

pub(crate) fn slot_date(slot: &Slot) -> String {
    slot.starts_at.format("%d/%m/%Y").to_string()
}

pub(crate) fn slot_time(slot: &Slot) -> String {
    slot.starts_at.format("%H:%M").to_string()
}

impl ConversationEngine {
    pub(crate) fn start_booking(&self, session: &mut Session, out: &mut Outcome) {
        let rows = self
            .catalog
            .services
            .iter()
            .map(|s| vec![("name", s.name.clone()), ("price", format_brl(s.price_cents))])
            .collect();
        out.reply(self.listing(MessageKey::PickServicePrompt, MessageKey::ServiceLine, rows));
        session.reset(ConversationState::PickService);
    }

    pub(crate) async fn on_pick_service(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_choice(text, &self.catalog.service_keywords()) {
            Some(idx) => self.choose_service(session, idx, out).await,
            None => self.clarify(out),
        }
    }

    /// Continues with service `idx`, skipping the unit question when the
    /// salon has a single unit.
    pub(crate) async fn choose_service(&self, session: &mut Session, idx: usize, out: &mut Outcome) {
        let Some(service) = self.catalog.services.get(idx) else {
            self.clarify(out);
            return;
        };

        if let [only] = self.catalog.locations.as_slice() {
            let (service_id, location_id) = (service.id.clone(), only.id.clone());
            self.offer_slots(session, service_id, location_id, out).await;
            return;
        }

        let rows = self
            .catalog
            .locations
            .iter()
            .map(|l| vec![("name", l.name.clone()), ("address", l.address.clone())])
            .collect();
        out.reply(self.listing(MessageKey::PickLocationPrompt, MessageKey::LocationLine, rows));
        session.data.service_id = Some(service.id.clone());
        session.transition(ConversationState::PickLocation);
    }

    pub(crate) async fn on_pick_location(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        let Some(idx) = parse::parse_choice(text, &self.catalog.location_keywords()) else {
            self.clarify(out);
            return;
        };
        let Some(service_id) = session.data.service_id.clone() else {
            self.restart(session, out);
            return;
        };
        let location_id = self.catalog.locations[idx].id.clone();
        self.offer_slots(session, service_id, location_id, out).await;
    }

    /// Looks up free slots. A backend failure leaves the session untouched.
    async fn offer_slots(
        &self,
        session: &mut Session,
        service_id: String,
        location_id: String,
        out: &mut Outcome,
    ) {
        let slots = match self
            .collab
            .booking
            .find_available_slots(&location_id, self.settings.days_ahead)
            .await
        {
            Ok(slots) => slots,
            Err(e) => {
                warn!(sender = %session.sender, location = %location_id, error = %e, "slot lookup failed");
                out.reply(self.msg(MessageKey::BookingFailed, &[]));
                return;
            }
        };

        let location_name = self
            .catalog
            .location(&location_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| location_id.clone());
        session.data.service_id = Some(service_id);
        session.data.location_id = Some(location_id);

        if slots.is_empty() {
            out.reply(self.msg(MessageKey::NoSlots, &[("location", location_name)]));
            session.transition(ConversationState::WaitingList);
            return;
        }

        let offered: Vec<Slot> = slots
            .into_iter()
            .take(self.settings.max_offered_slots)
            .collect();
        let rows = offered
            .iter()
            .map(|s| vec![("date", slot_date(s)), ("time", slot_time(s))])
            .collect();
        let mut text = self.msg(MessageKey::SlotsHeader, &[("location", location_name)]);
        text.push('\n');
        text.push_str(&self.numbered_lines(MessageKey::SlotLine, rows));
        out.reply(text);
        session.data.offered_slots = offered;
        session.transition(ConversationState::PickSlot);
    }

    pub(crate) fn on_pick_slot(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        let offered = session.data.offered_slots.len();
        match parse::leading_number(text).filter(|n| (1..=offered).contains(n)) {
            Some(n) => {
                let slot = session.data.offered_slots.swap_remove(n - 1);
                session.data.offered_slots.clear();
                session.data.selected_slot = Some(slot);
                out.reply(self.msg(MessageKey::AskName, &[]));
                session.transition(ConversationState::CollectName);
            }
            None => self.clarify(out),
        }
    }

    pub(crate) async fn on_waiting_list(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_confirmation(text) {
            Some(true) => {
                if let Err(e) = self
                    .collab
                    .contacts
                    .add_contact_tag(&session.sender, WAITING_LIST_TAG)
                    .await
                {
                    warn!(sender = %session.sender, error = %e, "failed to tag waiting list");
                }
                let detail = session.data.location_id.clone().unwrap_or_default();
                self.log_event(&session.sender, "waiting_list", &detail).await;
                out.reply(self.msg(MessageKey::WaitingListJoined, &[]));
                session.reset(ConversationState::Menu);
            }
            Some(false) => {
                out.reply(self.msg(MessageKey::WaitingListDeclined, &[]));
                session.reset(ConversationState::Menu);
            }
            None => self.clarify(out),
        }
    }

    pub(crate) fn on_collect_name(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_name(text) {
            Some(name) => {
                out.reply(self.msg(MessageKey::AskBirthdate, &[("name", name.clone())]));
                session.data.customer_name = Some(name);
                session.transition(ConversationState::CollectBirthdate);
            }
            None => out.reply(self.msg(MessageKey::InvalidName, &[])),
        }
    }

    /// Collects the birthdate and applies the age gate.
    ///
    /// Minors booking a service that is not age-exempt go to a human; the
    /// automation never completes their booking.
    pub(crate) async fn on_collect_birthdate(
        &self,
        session: &mut Session,
        text: &str,
        out: &mut Outcome,
    ) {
        let today = self.collab.clock.today();
        let Some(birthdate) = parse::parse_birthdate(text)
            .filter(|b| *b <= today && parse::age_on(*b, today) <= MAX_AGE)
        else {
            out.reply(self.msg(MessageKey::InvalidBirthdate, &[]));
            return;
        };
        session.data.birthdate = Some(birthdate);

        let age = parse::age_on(birthdate, today);
        let service = self.selected_service(session);
        let exempt = service.is_some_and(|s| s.age_exempt);
        if age < self.settings.adult_age && !exempt {
            let service_name = service.map(|s| s.name.clone()).unwrap_or_default();
            let detail = self.msg(
                MessageKey::OperatorMinorBooking,
                &[
                    ("sender", session.sender.clone()),
                    ("age", age.to_string()),
                    ("service", service_name.clone()),
                ],
            );
            self.escalate(session, AlertKind::MinorBooking, MessageKey::MinorHandoff, detail, out);
            self.log_event(&session.sender, "minor_booking", &service_name).await;
            return;
        }

        let Some(slot) = session.data.selected_slot.as_ref() else {
            self.restart(session, out);
            return;
        };
        let summary = self.msg(
            MessageKey::ConfirmSummary,
            &[
                ("service", service.map(|s| s.name.clone()).unwrap_or_default()),
                ("location", self.location_name(&slot.location_id)),
                ("date", slot_date(slot)),
                ("time", slot_time(slot)),
                ("name", session.data.customer_name.clone().unwrap_or_default()),
            ],
        );
        out.reply(summary);
        session.transition(ConversationState::Confirm);
    }

    pub(crate) async fn on_confirm(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_confirmation(text) {
            Some(true) => self.book(session, out).await,
            Some(false) => {
                out.reply(self.msg(MessageKey::BookingAborted, &[]));
                session.reset(ConversationState::Menu);
            }
            None => self.clarify(out),
        }
    }

    async fn book(&self, session: &mut Session, out: &mut Outcome) {
        let (Some(slot), Some(name), Some(service_id)) = (
            session.data.selected_slot.clone(),
            session.data.customer_name.clone(),
            session.data.service_id.clone(),
        ) else {
            self.restart(session, out);
            return;
        };

        let appointment = match self
            .collab
            .booking
            .book_appointment(&slot, &name, &session.sender, &service_id)
            .await
        {
            Ok(appointment) => appointment,
            Err(e) => {
                warn!(sender = %session.sender, slot = %slot.id, error = %e, "booking failed");
                out.reply(self.msg(MessageKey::BookingFailed, &[]));
                return;
            }
        };

        let service = self.catalog.service(&service_id);
        let service_name = service.map(|s| s.name.clone()).unwrap_or_else(|| service_id.clone());
        self.log_event(&session.sender, "booked", &appointment.id).await;
        out.reply(self.msg(
            MessageKey::Booked,
            &[
                ("service", service_name),
                ("date", slot_date(&slot)),
                ("time", slot_time(&slot)),
                ("location", self.location_name(&slot.location_id)),
            ],
        ));
        if let Some(payment) = service.and_then(|s| self.payment_message(s, &appointment)) {
            out.reply(payment);
        }
        session.transition(ConversationState::Booked);

        self.offer_recurrence(session, &appointment, service, out).await;
    }

    /// Deposit request with a Pix code, when a key is configured and the
    /// service asks for a deposit.
    fn payment_message(&self, service: &ServiceConfig, appointment: &Appointment) -> Option<String> {
        let pix = self.settings.pix.as_ref()?;
        if service.deposit_cents == 0 {
            return None;
        }
        let code = PixPayload::new(&pix.key, &pix.merchant_name, &pix.merchant_city)
            .amount_cents(service.deposit_cents)
            .txid(&appointment.id)
            .encode();
        match code {
            Ok(code) => Some(self.msg(
                MessageKey::PixPayment,
                &[("amount", format_brl(service.deposit_cents)), ("code", code)],
            )),
            Err(e) => {
                warn!(appointment = %appointment.id, error = %e, "skipping payment step");
                None
            }
        }
    }

    async fn offer_recurrence(
        &self,
        session: &mut Session,
        appointment: &Appointment,
        service: Option<&ServiceConfig>,
        out: &mut Outcome,
    ) {
        let weeks = self.settings.recurrence_weeks;
        let slots = if weeks == 0 {
            Vec::new()
        } else {
            match self
                .collab
                .booking
                .find_consecutive_slots(&appointment.slot, weeks)
                .await
            {
                Ok(slots) => slots,
                Err(e) => {
                    warn!(sender = %session.sender, error = %e, "recurrence lookup failed");
                    Vec::new()
                }
            }
        };

        if slots.is_empty() {
            session.reset(ConversationState::Menu);
            return;
        }

        let price = service.map_or(0, |s| s.price_cents);
        let dates = slots.iter().map(slot_date).collect::<Vec<_>>().join(", ");
        out.reply(self.msg(
            MessageKey::RecurrenceOffer,
            &[
                ("count", slots.len().to_string()),
                ("dates", dates),
                ("total", format_brl(price * slots.len() as u64)),
            ],
        ));
        session.data.appointment_id = Some(appointment.id.clone());
        session.data.selected_slot = Some(appointment.slot.clone());
        session.data.recurrence_offer = slots;
        session.data.recurrence_prompted = false;
        session.transition(ConversationState::RecurrenceOffer);
    }

    /// Accepting books every offered week independently; the number that
    /// succeeded drives the price quote.
    pub(crate) async fn on_recurrence_offer(
        &self,
        session: &mut Session,
        text: &str,
        out: &mut Outcome,
    ) {
        match parse::parse_confirmation(text) {
            Some(true) => {
                let name = session.data.customer_name.clone().unwrap_or_default();
                let service_id = session.data.service_id.clone().unwrap_or_default();
                let batch = match self
                    .collab
                    .booking
                    .book_batch(&session.data.recurrence_offer, &name, &session.sender, &service_id)
                    .await
                {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!(sender = %session.sender, error = %e, "recurrence booking failed");
                        out.reply(self.msg(MessageKey::BookingFailed, &[]));
                        return;
                    }
                };

                let booked = batch.booked.len();
                if !batch.failed.is_empty() {
                    warn!(sender = %session.sender, booked, failed = batch.failed.len(), "recurrence partially booked");
                }
                self.log_event(&session.sender, "recurrence_booked", &booked.to_string())
                    .await;
                if booked > 0 {
                    let price = self.catalog.service(&service_id).map_or(0, |s| s.price_cents);
                    out.reply(self.msg(
                        MessageKey::RecurrenceBooked,
                        &[
                            ("count", booked.to_string()),
                            ("total", format_brl(price * booked as u64)),
                        ],
                    ));
                } else {
                    out.reply(self.msg(MessageKey::RecurrenceNoneBooked, &[]));
                }
                session.reset(ConversationState::Menu);
            }
            Some(false) => {
                out.reply(self.msg(MessageKey::RecurrenceDeclined, &[]));
                session.reset(ConversationState::Menu);
            }
            None if !session.data.recurrence_prompted => {
                session.data.recurrence_prompted = true;
                out.reply(self.msg(MessageKey::RecurrenceRetry, &[]));
            }
            None => {
                out.reply(self.msg(MessageKey::RecurrenceDeclined, &[]));
                session.reset(ConversationState::Menu);
            }
        }
    }

    fn selected_service(&self, session: &Session) -> Option<&ServiceConfig> {
        session
            .data
            .service_id
            .as_deref()
            .and_then(|id| self.catalog.service(id))
    }

    pub(crate) fn location_name(&self, location_id: &str) -> String {
        self.catalog
            .location(location_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| location_id.to_string())
    }

    /// Recovery for a session missing data its state needs.
    pub(crate) fn restart(&self, session: &mut Session, out: &mut Outcome) {
        warn!(sender = %session.sender, state = %session.state, "session data inconsistent, restarting");
        out.reply(self.msg(MessageKey::MainMenu, &[]));
        session.reset(ConversationState::Menu);
    }
}
