// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler-driven states: appointment confirmation and feedback.
//!
//! Both states are entered from outside the conversation and persist across
//! replies the engine cannot interpret. Such replies never fall back to the
//! menu; they are forwarded to an operator instead.

use salonbot_core::{AlertKind, Appointment, ConversationState, MessageKey, OperatorAlert, Session};
use tracing::{info, warn};

use crate::booking_flow::{slot_date, slot_time};
use crate::engine::{ConversationEngine, Outcome};
use crate::parse;

impl ConversationEngine {
    /// Moves the session into `CONFIRMATION_PENDING` for `appointment` and
    /// returns the reminder to send.
    ///
    /// A session under human takeover is left alone and nothing is sent.
    pub fn enter_confirmation_pending(
        &self,
        session: &mut Session,
        appointment: &Appointment,
    ) -> Vec<String> {
        if session.state == ConversationState::Human {
            return Vec::new();
        }
        self.note_superseded(session, appointment);
        let service = self.service_name(&appointment.service_id);
        session.reset(ConversationState::ConfirmationPending);
        session.data.appointment_id = Some(appointment.id.clone());
        session.data.service_id = Some(appointment.service_id.clone());
        vec![self.msg(
            MessageKey::ConfirmationRequest,
            &[
                ("name", appointment.customer_name.clone()),
                ("service", service),
                ("date", slot_date(&appointment.slot)),
                ("time", slot_time(&appointment.slot)),
            ],
        )]
    }

    /// Moves the session into `FEEDBACK_PENDING` after `appointment` and
    /// returns the rating request.
    pub fn enter_feedback_pending(
        &self,
        session: &mut Session,
        appointment: &Appointment,
    ) -> Vec<String> {
        if session.state == ConversationState::Human {
            return Vec::new();
        }
        self.note_superseded(session, appointment);
        let service = self.service_name(&appointment.service_id);
        session.reset(ConversationState::FeedbackPending);
        session.data.appointment_id = Some(appointment.id.clone());
        session.data.service_id = Some(appointment.service_id.clone());
        vec![self.msg(MessageKey::FeedbackRequest, &[("service", service)])]
    }

    fn note_superseded(&self, session: &Session, appointment: &Appointment) {
        if session.state.is_scheduler_owned() {
            info!(
                sender = %session.sender,
                state = %session.state,
                previous = session.data.appointment_id.as_deref().unwrap_or_default(),
                appointment = %appointment.id,
                "pending follow-up replaced"
            );
        }
    }

    pub(crate) async fn on_confirmation_pending(
        &self,
        session: &mut Session,
        text: &str,
        out: &mut Outcome,
    ) {
        let appointment_id = session.data.appointment_id.clone().unwrap_or_default();
        match parse::parse_confirmation(text) {
            Some(true) => {
                if let Err(e) = self.collab.booking.confirm_appointment(&appointment_id).await {
                    warn!(sender = %session.sender, appointment = %appointment_id, error = %e, "confirmation failed");
                    out.reply(self.msg(MessageKey::BookingFailed, &[]));
                    return;
                }
                self.log_event(&session.sender, "appointment_confirmed", &appointment_id)
                    .await;
                out.reply(self.msg(MessageKey::AppointmentConfirmed, &[]));
                session.reset(ConversationState::Menu);
            }
            Some(false) => {
                if let Err(e) = self.collab.booking.cancel_appointment(&appointment_id).await {
                    warn!(sender = %session.sender, appointment = %appointment_id, error = %e, "cancellation failed");
                    out.reply(self.msg(MessageKey::BookingFailed, &[]));
                    return;
                }
                self.log_event(&session.sender, "appointment_cancelled", &appointment_id)
                    .await;
                out.reply(self.msg(MessageKey::AppointmentCancelled, &[]));
                session.reset(ConversationState::Menu);
            }
            None => {
                info!(sender = %session.sender, "unmatched reply to confirmation request");
                self.forward_unmatched(
                    session,
                    text,
                    AlertKind::UnmatchedConfirmation,
                    MessageKey::OperatorUnmatchedConfirmation,
                    out,
                )
                .await;
            }
        }
    }

    pub(crate) async fn on_feedback_pending(
        &self,
        session: &mut Session,
        text: &str,
        out: &mut Outcome,
    ) {
        match parse::parse_rating(text) {
            Some(rating) => {
                self.log_event(&session.sender, "feedback", &rating.to_string())
                    .await;
                out.reply(self.msg(MessageKey::FeedbackThanks, &[("rating", rating.to_string())]));
                session.reset(ConversationState::Menu);
            }
            None => {
                self.forward_unmatched(
                    session,
                    text,
                    AlertKind::UnmatchedFeedback,
                    MessageKey::OperatorUnmatchedFeedback,
                    out,
                )
                .await;
            }
        }
    }

    /// Alerts an operator about a reply the engine could not interpret.
    /// The customer gets no reply and the state does not change.
    async fn forward_unmatched(
        &self,
        session: &Session,
        text: &str,
        kind: AlertKind,
        template: MessageKey,
        out: &mut Outcome,
    ) {
        out.alerts.push(OperatorAlert {
            sender: session.sender.clone(),
            kind,
            detail: self.msg(
                template,
                &[("sender", session.sender.clone()), ("text", text.to_string())],
            ),
        });
        self.log_event(&session.sender, "unmatched_reply", text).await;
    }

    fn service_name(&self, service_id: &str) -> String {
        self.catalog
            .service(service_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| service_id.to_string())
    }
}
