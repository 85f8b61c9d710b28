// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation flows driven end to end against the mock collaborators.

use std::sync::Arc;

use chrono::NaiveDate;
use salonbot_config::SalonConfig;
use salonbot_config::model::{FaqConfig, LocationConfig, ServiceConfig};
use salonbot_core::{
    AlertKind, Appointment, AppointmentStatus, ConversationState, Session, Slot,
};
use salonbot_engine::{Collaborators, ConversationEngine, TemplateCatalog, WAITING_LIST_TAG};
use salonbot_test_utils::{FixedClock, MemoryStore, MockBooking, slot};

const SENDER: &str = "5511988887777";

struct Fixture {
    engine: ConversationEngine,
    booking: Arc<MockBooking>,
    store: Arc<MemoryStore>,
}

fn service(id: &str, name: &str, price: u64, deposit: u64, age_exempt: bool) -> ServiceConfig {
    ServiceConfig {
        id: id.into(),
        name: name.into(),
        description: format!("Descricao de {name}"),
        price_cents: price,
        deposit_cents: deposit,
        duration_minutes: 60,
        age_exempt,
        keywords: Vec::new(),
    }
}

fn location(id: &str, name: &str) -> LocationConfig {
    LocationConfig {
        id: id.into(),
        name: name.into(),
        address: format!("Rua {name}, 100"),
        keywords: Vec::new(),
    }
}

fn config() -> SalonConfig {
    let mut config = SalonConfig::default();
    config.salon.name = "Studio Bela".into();
    config.services = vec![
        service("corte", "Corte Feminino", 8000, 2000, false),
        service("infantil", "Corte Infantil", 5000, 0, true),
        service("coloracao", "Coloracao", 15000, 0, false),
    ];
    config.locations = vec![location("centro", "Centro")];
    config.faq = vec![FaqConfig {
        question: "Aceitam cartao?".into(),
        answer: "Sim, debito e credito.".into(),
        keywords: vec!["cartao".into()],
    }];
    config
}

fn fixture(config: &SalonConfig) -> Fixture {
    let booking = Arc::new(MockBooking::new());
    let store = Arc::new(MemoryStore::new());
    let templates = TemplateCatalog::with_overrides(&config.templates).unwrap();
    let collaborators = Collaborators {
        booking: booking.clone(),
        contacts: store.clone(),
        events: store.clone(),
        templates: Arc::new(templates),
        clock: Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())),
    };
    Fixture {
        engine: ConversationEngine::from_config(config, collaborators),
        booking,
        store,
    }
}

fn centro_slots() -> Vec<Slot> {
    vec![
        slot("s1", "centro", "2026-10-20 09:00"),
        slot("s2", "centro", "2026-10-20 10:00"),
        slot("s3", "centro", "2026-10-21 14:00"),
    ]
}

fn appointment(id: &str) -> Appointment {
    Appointment {
        id: id.into(),
        slot: slot("s1", "centro", "2026-10-20 09:00"),
        customer_name: "Maria Silva".into(),
        phone: SENDER.into(),
        service_id: "corte".into(),
        status: AppointmentStatus::Scheduled,
    }
}

/// Drives a fresh session up to the confirmation question.
async fn reach_confirm(f: &Fixture, service_choice: &str, birthdate: &str) -> Session {
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", service_choice, "2", "Maria Silva", birthdate] {
        f.engine.process(&mut session, text).await;
    }
    session
}

#[tokio::test]
async fn greeting_then_menu() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);

    let out = f.engine.process(&mut session, "Oi, boa tarde").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(out.replies.len(), 2);
    assert!(out.replies[0].contains("Studio Bela"));
}

#[tokio::test]
async fn full_booking_with_pix_deposit() {
    let mut cfg = config();
    cfg.pix.key = Some("5511999999999".into());
    cfg.pix.merchant_name = "Studio Bela".into();
    let f = fixture(&cfg);

    let mut session = reach_confirm(&f, "1", "15/03/1990").await;
    assert_eq!(session.state, ConversationState::Confirm);
    assert_eq!(session.data.selected_slot.as_ref().unwrap().id, "s2");
    assert_eq!(session.data.customer_name.as_deref(), Some("Maria Silva"));

    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(out.replies.len(), 2);
    assert!(out.replies[0].contains("Corte Feminino"));
    assert!(out.replies[0].contains("20/10/2026 às 10:00"));
    assert!(out.replies[1].contains("R$ 20,00"));

    let code = out.replies[1].lines().last().unwrap();
    assert!(code.starts_with("000201"));
    assert!(code.contains("5511999999999"));
    assert!(code.contains("20.00"));
    assert!(salonbot_pix::verify(code));

    let appointments = f.booking.appointments().await;
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].customer_name, "Maria Silva");
    assert_eq!(appointments[0].service_id, "corte");
    assert!(f.store.events().await.iter().any(|e| e.kind == "booked"));
}

#[tokio::test]
async fn payment_step_skipped_without_key() {
    let f = fixture(&config());
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;

    let out = f.engine.process(&mut session, "1").await;
    assert_eq!(out.replies.len(), 1);
    assert!(!out.replies[0].contains("000201"));
    assert_eq!(f.booking.appointments().await.len(), 1);
}

#[tokio::test]
async fn service_chosen_by_name() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    f.engine.process(&mut session, "oi").await;
    f.engine.process(&mut session, "quero agendar").await;
    assert_eq!(session.state, ConversationState::PickService);

    f.engine.process(&mut session, "coloração").await;
    assert_eq!(session.state, ConversationState::PickSlot);
    assert_eq!(session.data.service_id.as_deref(), Some("coloracao"));
    assert_eq!(session.data.offered_slots.len(), 3);
}

#[tokio::test]
async fn several_locations_ask_for_a_unit() {
    let mut cfg = config();
    cfg.locations.push(location("moema", "Moema"));
    let f = fixture(&cfg);
    f.booking
        .set_available(vec![slot("m1", "moema", "2026-10-22 11:00")])
        .await;

    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }
    assert_eq!(session.state, ConversationState::PickLocation);

    let out = f.engine.process(&mut session, "moema").await;
    assert_eq!(session.state, ConversationState::PickSlot);
    assert_eq!(session.data.location_id.as_deref(), Some("moema"));
    assert!(out.replies[0].contains("22/10/2026 às 11:00"));
}

#[tokio::test]
async fn offered_slots_are_capped() {
    let mut cfg = config();
    cfg.booking.max_offered_slots = 2;
    let f = fixture(&cfg);
    f.booking.set_available(centro_slots()).await;

    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }
    assert_eq!(session.data.offered_slots.len(), 2);

    let out = f.engine.process(&mut session, "3").await;
    assert_eq!(session.state, ConversationState::PickSlot);
    assert_eq!(out.replies.len(), 1);
}

#[tokio::test]
async fn minor_goes_to_human_without_booking() {
    let f = fixture(&config());
    let session = reach_confirm(&f, "1", "01/01/2012").await;

    assert_eq!(session.state, ConversationState::Human);
    assert!(session.data.human_takeover);
    assert!(f.booking.appointments().await.is_empty());
    assert!(f.store.events().await.iter().any(|e| e.kind == "minor_booking"));
}

#[tokio::test]
async fn minor_escalation_outcome() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1", "1", "Joana Lima"] {
        f.engine.process(&mut session, text).await;
    }

    let out = f.engine.process(&mut session, "10/05/2010").await;
    assert_eq!(out.escalation, Some(AlertKind::MinorBooking));
    assert_eq!(out.alerts.len(), 1);
    assert!(out.alerts[0].detail.contains("16 anos"));
    assert!(out.replies.iter().all(|r| !r.contains("Confira os dados")));

    let out = f.engine.process(&mut session, "sim").await;
    assert!(out.replies.is_empty());
    assert_eq!(session.state, ConversationState::Human);
    assert!(f.booking.appointments().await.is_empty());
}

#[tokio::test]
async fn minor_may_book_exempt_service() {
    let f = fixture(&config());
    let session = reach_confirm(&f, "2", "01/01/2016").await;
    assert_eq!(session.state, ConversationState::Confirm);
}

#[tokio::test]
async fn invalid_birthdate_keeps_state() {
    let f = fixture(&config());
    let mut session = reach_confirm(&f, "1", "ontem").await;
    assert_eq!(session.state, ConversationState::CollectBirthdate);

    f.engine.process(&mut session, "01/01/2030").await;
    assert_eq!(session.state, ConversationState::CollectBirthdate);
}

#[tokio::test]
async fn booking_failure_keeps_confirm_state() {
    let f = fixture(&config());
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;
    f.booking.mark_taken("s2").await;

    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Confirm);
    assert!(out.replies[0].contains("problema"));
    assert!(session.data.selected_slot.is_some());
}

#[tokio::test]
async fn unreachable_calendar_during_slot_lookup() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    f.engine.process(&mut session, "oi").await;
    f.engine.process(&mut session, "1").await;
    f.booking.set_unreachable(true);

    let out = f.engine.process(&mut session, "1").await;
    assert_eq!(session.state, ConversationState::PickService);
    assert!(out.replies[0].contains("problema"));
    assert!(session.data.service_id.is_none());
}

#[tokio::test]
async fn declining_confirmation_returns_to_menu() {
    let f = fixture(&config());
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;
    f.engine.process(&mut session, "não").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert!(f.booking.appointments().await.is_empty());
}

#[tokio::test]
async fn recurrence_partial_failure_quotes_booked_weeks() {
    let f = fixture(&config());
    f.booking
        .set_consecutive(vec![
            slot("w1", "centro", "2026-10-27 10:00"),
            slot("w2", "centro", "2026-11-03 10:00"),
            slot("w3", "centro", "2026-11-10 10:00"),
        ])
        .await;
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;

    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::RecurrenceOffer);
    assert!(out.replies.last().unwrap().contains("3 semanas"));
    assert!(out.replies.last().unwrap().contains("R$ 240,00"));

    f.booking.mark_taken("w2").await;
    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert!(out.replies[0].contains("mais 2"));
    assert!(out.replies[0].contains("R$ 160,00"));
    assert_eq!(f.booking.appointments().await.len(), 3);
}

#[tokio::test]
async fn recurrence_all_taken() {
    let f = fixture(&config());
    f.booking
        .set_consecutive(vec![slot("w1", "centro", "2026-10-27 10:00")])
        .await;
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;
    f.engine.process(&mut session, "sim").await;

    f.booking.mark_taken("w1").await;
    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert!(out.replies[0].contains("primeiro agendamento continua garantido"));
}

#[tokio::test]
async fn recurrence_retries_once_then_declines() {
    let f = fixture(&config());
    f.booking
        .set_consecutive(vec![slot("w1", "centro", "2026-10-27 10:00")])
        .await;
    let mut session = reach_confirm(&f, "1", "15/03/1990").await;
    f.engine.process(&mut session, "sim").await;

    f.engine.process(&mut session, "talvez").await;
    assert_eq!(session.state, ConversationState::RecurrenceOffer);

    f.engine.process(&mut session, "hmm").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(f.booking.appointments().await.len(), 1);
}

#[tokio::test]
async fn no_slots_offers_waiting_list() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }
    assert_eq!(session.state, ConversationState::WaitingList);

    f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Menu);
    let contact = f.store.contact(SENDER).await.unwrap();
    assert!(contact.has_tag(WAITING_LIST_TAG));
}

#[tokio::test]
async fn unmatched_confirmation_reply_keeps_pending_state() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    let prompt = f
        .engine
        .enter_confirmation_pending(&mut session, &appointment("apt-9"));
    assert_eq!(prompt.len(), 1);
    assert_eq!(session.state, ConversationState::ConfirmationPending);

    let out = f.engine.process(&mut session, "Vou atrasar 10 minutos").await;
    assert_eq!(session.state, ConversationState::ConfirmationPending);
    assert!(out.replies.is_empty());
    assert_eq!(out.alerts.len(), 1);
    assert_eq!(out.alerts[0].kind, AlertKind::UnmatchedConfirmation);
    assert!(out.alerts[0].detail.contains("Vou atrasar 10 minutos"));

    // Still pending: a later "sim" is applied to the same appointment.
    f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(f.booking.confirmed().await, vec!["apt-9".to_string()]);
}

#[tokio::test]
async fn confirmation_keywords() {
    for (reply, confirmed) in [("1", true), ("sim", true), ("2", false), ("cancelar", false)] {
        let f = fixture(&config());
        let mut session = Session::new(SENDER);
        f.engine
            .enter_confirmation_pending(&mut session, &appointment("apt-1"));

        f.engine.process(&mut session, reply).await;
        assert_eq!(session.state, ConversationState::Menu, "reply {reply}");
        if confirmed {
            assert_eq!(f.booking.confirmed().await, vec!["apt-1".to_string()]);
            assert!(f.booking.cancelled().await.is_empty());
        } else {
            assert_eq!(f.booking.cancelled().await, vec!["apt-1".to_string()]);
            assert!(f.booking.confirmed().await.is_empty());
        }
    }
}

#[tokio::test]
async fn late_arrival_sentences_do_not_touch_the_appointment() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    f.engine
        .enter_confirmation_pending(&mut session, &appointment("apt-1"));

    for text in [
        "No caminho, chego em 10 minutos",
        "Pode ser que eu atrase um pouco",
        "Não sei se chego no horário, vou atrasar",
    ] {
        let out = f.engine.process(&mut session, text).await;
        assert_eq!(session.state, ConversationState::ConfirmationPending, "{text}");
        assert!(out.replies.is_empty(), "{text}");
        assert_eq!(out.alerts.len(), 1, "{text}");
    }
    assert!(f.booking.confirmed().await.is_empty());
    assert!(f.booking.cancelled().await.is_empty());
    assert_eq!(session.data.appointment_id.as_deref(), Some("apt-1"));
}

#[tokio::test]
async fn new_reminder_replaces_a_pending_one() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    f.engine
        .enter_confirmation_pending(&mut session, &appointment("apt-1"));
    f.engine
        .enter_confirmation_pending(&mut session, &appointment("apt-2"));
    assert_eq!(session.data.appointment_id.as_deref(), Some("apt-2"));

    f.engine.process(&mut session, "sim").await;
    assert_eq!(f.booking.confirmed().await, vec!["apt-2".to_string()]);
}

#[tokio::test]
async fn confirmation_failure_keeps_pending_state() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    f.engine
        .enter_confirmation_pending(&mut session, &appointment("apt-1"));
    f.booking.set_unreachable(true);

    let out = f.engine.process(&mut session, "sim").await;
    assert_eq!(session.state, ConversationState::ConfirmationPending);
    assert_eq!(out.replies.len(), 1);
}

#[tokio::test]
async fn human_session_is_not_pulled_into_followups() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    session.transition(ConversationState::Human);

    let prompt = f
        .engine
        .enter_confirmation_pending(&mut session, &appointment("apt-1"));
    assert!(prompt.is_empty());
    assert_eq!(session.state, ConversationState::Human);
}

#[tokio::test]
async fn feedback_rating_recorded() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    let prompt = f
        .engine
        .enter_feedback_pending(&mut session, &appointment("apt-1"));
    assert!(prompt[0].contains("Corte Feminino"));

    let out = f.engine.process(&mut session, "adorei!").await;
    assert_eq!(session.state, ConversationState::FeedbackPending);
    assert_eq!(out.alerts[0].kind, AlertKind::UnmatchedFeedback);

    f.engine.process(&mut session, "5").await;
    assert_eq!(session.state, ConversationState::Menu);
    let events = f.store.events().await;
    assert!(events.iter().any(|e| e.kind == "feedback" && e.detail == "5"));
}

#[tokio::test]
async fn opt_out_from_any_state() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }

    let out = f.engine.process(&mut session, "SAIR").await;
    assert_eq!(session.state, ConversationState::Greeting);
    assert_eq!(out.replies.len(), 1);
    assert!(f.store.contact(SENDER).await.unwrap().opted_out);
}

#[tokio::test]
async fn greeting_after_opt_out_opts_back_in() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    session.transition(ConversationState::Menu);
    f.engine.process(&mut session, "sair").await;
    assert!(f.store.contact(SENDER).await.unwrap().opted_out);

    let out = f.engine.process(&mut session, "oi").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(out.replies.len(), 2);
    assert!(!f.store.contact(SENDER).await.unwrap().opted_out);
    assert!(f.store.events().await.iter().any(|e| e.kind == "opt_in"));
}

#[tokio::test]
async fn opt_out_survives_store_failure() {
    let f = fixture(&config());
    f.store.set_fail_writes(true);
    let mut session = Session::new(SENDER);
    session.transition(ConversationState::Menu);

    let out = f.engine.process(&mut session, "parar").await;
    assert_eq!(session.state, ConversationState::Greeting);
    assert_eq!(out.replies.len(), 1);
}

#[tokio::test]
async fn human_state_is_silent() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    session.transition(ConversationState::Human);

    for text in ["oi", "1", "sair", "quero falar com uma atendente"] {
        let out = f.engine.process(&mut session, text).await;
        assert!(out.replies.is_empty(), "reply to {text}");
        assert!(out.alerts.is_empty());
        assert_eq!(session.state, ConversationState::Human);
    }
}

#[tokio::test]
async fn human_request_escalates_mid_flow() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }

    let out = f
        .engine
        .process(&mut session, "prefiro falar com alguém")
        .await;
    assert_eq!(session.state, ConversationState::Human);
    assert_eq!(out.escalation, Some(AlertKind::HumanRequested));
    assert_eq!(out.replies.len(), 1);
}

#[tokio::test]
async fn unrecognized_input_clarifies_without_state_change() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    f.engine.process(&mut session, "oi").await;

    let out = f.engine.process(&mut session, "xyz qwerty").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert_eq!(out.replies.len(), 2);

    f.engine.process(&mut session, "1").await;
    f.engine.process(&mut session, "1").await;
    let out = f.engine.process(&mut session, "9").await;
    assert_eq!(session.state, ConversationState::PickSlot);
    assert_eq!(out.replies.len(), 1);
    assert_eq!(session.data.offered_slots.len(), 3);
}

#[tokio::test]
async fn back_returns_to_menu_and_clears_data() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    for text in ["oi", "1", "1"] {
        f.engine.process(&mut session, text).await;
    }

    f.engine.process(&mut session, "voltar").await;
    assert_eq!(session.state, ConversationState::Menu);
    assert!(session.data.offered_slots.is_empty());
    assert!(session.data.service_id.is_none());
}

#[tokio::test]
async fn services_menu_leads_into_booking() {
    let f = fixture(&config());
    f.booking.set_available(centro_slots()).await;
    let mut session = Session::new(SENDER);
    f.engine.process(&mut session, "oi").await;

    let out = f.engine.process(&mut session, "2").await;
    assert_eq!(session.state, ConversationState::Services);
    assert!(out.replies[0].contains("Coloracao (R$ 150,00)"));

    f.engine.process(&mut session, "infantil").await;
    assert_eq!(session.state, ConversationState::ServiceDetail);

    f.engine.process(&mut session, "quero agendar").await;
    assert_eq!(session.state, ConversationState::PickSlot);
    assert_eq!(session.data.service_id.as_deref(), Some("infantil"));
}

#[tokio::test]
async fn faq_answers_and_stays_browsable() {
    let f = fixture(&config());
    let mut session = Session::new(SENDER);
    f.engine.process(&mut session, "oi").await;
    f.engine.process(&mut session, "5").await;
    assert_eq!(session.state, ConversationState::Faq);

    let out = f.engine.process(&mut session, "vocês aceitam cartão?").await;
    assert_eq!(session.state, ConversationState::FaqDetail);
    assert!(out.replies[0].contains("debito e credito"));
    assert_eq!(session.data.faq_index, Some(0));
}

#[tokio::test]
async fn template_override_changes_copy() {
    let mut cfg = config();
    cfg.templates
        .insert("welcome".into(), "Bem-vindo ao {salon}!".into());
    let f = fixture(&cfg);
    let mut session = Session::new(SENDER);

    let out = f.engine.process(&mut session, "oi").await;
    assert_eq!(out.replies[0], "Bem-vindo ao Studio Bela!");
}
