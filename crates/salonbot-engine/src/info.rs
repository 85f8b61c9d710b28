// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Informational menus: services, units, packages, and FAQ.

use salonbot_core::{ConversationState, MessageKey, Session};

use crate::engine::{ConversationEngine, Outcome};
use crate::parse;
use crate::templates::format_brl;

/// Free-text replies on a service detail that mean "book this one".
const BOOK_WORDS: &[&str] = &["agendar", "marcar", "reservar", "quero"];

impl ConversationEngine {
    pub(crate) fn show_services(&self, session: &mut Session, out: &mut Outcome) {
        let rows = self
            .catalog
            .services
            .iter()
            .map(|s| vec![("name", s.name.clone()), ("price", format_brl(s.price_cents))])
            .collect();
        out.reply(self.listing(MessageKey::ServicesHeader, MessageKey::ServiceLine, rows));
        session.reset(ConversationState::Services);
    }

    pub(crate) fn on_services(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        let Some(idx) = parse::parse_choice(text, &self.catalog.service_keywords()) else {
            self.clarify(out);
            return;
        };
        let service = &self.catalog.services[idx];
        out.reply(self.msg(
            MessageKey::ServiceDetail,
            &[
                ("name", service.name.clone()),
                ("price", format_brl(service.price_cents)),
                ("duration", service.duration_minutes.to_string()),
                ("description", service.description.clone()),
            ],
        ));
        session.data.service_id = Some(service.id.clone());
        session.transition(ConversationState::ServiceDetail);
    }

    pub(crate) async fn on_service_detail(
        &self,
        session: &mut Session,
        text: &str,
        out: &mut Outcome,
    ) {
        let wants_booking = parse::parse_confirmation(text) == Some(true)
            || BOOK_WORDS.iter().any(|w| parse::mentions(text, w));
        if !wants_booking {
            self.clarify(out);
            return;
        }

        let idx = session
            .data
            .service_id
            .as_deref()
            .and_then(|id| self.catalog.services.iter().position(|s| s.id == id));
        match idx {
            Some(idx) => self.choose_service(session, idx, out).await,
            None => self.restart(session, out),
        }
    }

    pub(crate) fn show_locations(&self, session: &mut Session, out: &mut Outcome) {
        let rows = self
            .catalog
            .locations
            .iter()
            .map(|l| vec![("name", l.name.clone()), ("address", l.address.clone())])
            .collect();
        out.reply(self.listing(MessageKey::LocationsHeader, MessageKey::LocationLine, rows));
        session.reset(ConversationState::Locations);
    }

    pub(crate) fn on_locations(&self, _session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_choice(text, &self.catalog.location_keywords()) {
            Some(idx) => {
                let location = &self.catalog.locations[idx];
                out.reply(self.msg(
                    MessageKey::LocationDetail,
                    &[
                        ("name", location.name.clone()),
                        ("address", location.address.clone()),
                    ],
                ));
            }
            None => self.clarify(out),
        }
    }

    pub(crate) fn show_packages(&self, session: &mut Session, out: &mut Outcome) {
        let rows = self
            .catalog
            .packages
            .iter()
            .map(|p| vec![("name", p.name.clone()), ("price", format_brl(p.price_cents))])
            .collect();
        out.reply(self.listing(MessageKey::PackagesHeader, MessageKey::PackageLine, rows));
        session.reset(ConversationState::Packages);
    }

    pub(crate) fn on_packages(&self, _session: &mut Session, text: &str, out: &mut Outcome) {
        match parse::parse_choice(text, &self.catalog.package_keywords()) {
            Some(idx) => {
                let package = &self.catalog.packages[idx];
                out.reply(self.msg(
                    MessageKey::PackageDetail,
                    &[
                        ("name", package.name.clone()),
                        ("price", format_brl(package.price_cents)),
                        ("description", package.description.clone()),
                    ],
                ));
            }
            None => self.clarify(out),
        }
    }

    pub(crate) fn show_faq(&self, session: &mut Session, out: &mut Outcome) {
        let rows = self
            .catalog
            .faq
            .iter()
            .map(|f| vec![("question", f.question.clone())])
            .collect();
        out.reply(self.listing(MessageKey::FaqHeader, MessageKey::FaqLine, rows));
        session.reset(ConversationState::Faq);
    }

    /// Answers a question; from an answer the customer may pick another.
    pub(crate) fn on_faq(&self, session: &mut Session, text: &str, out: &mut Outcome) {
        let Some(idx) = parse::parse_choice(text, &self.catalog.faq_keywords()) else {
            self.clarify(out);
            return;
        };
        let entry = &self.catalog.faq[idx];
        out.reply(self.msg(
            MessageKey::FaqAnswer,
            &[
                ("question", entry.question.clone()),
                ("answer", entry.answer.clone()),
            ],
        ));
        session.data.faq_index = Some(idx);
        session.transition(ConversationState::FaqDetail);
    }
}
