// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline tests: flood guard, handoff, per-sender ordering,
//! scheduler follow-ups, broadcasts, and the run loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use salonbot_broadcast::Pacing;
use salonbot_core::{
    AlertKind, Appointment, AppointmentStatus, ConversationState, HandoffRecord, HandoffStatus,
    InboundMessage, Session,
};
use salonbot_test_utils::{TestHarness, slot};
use tokio_util::sync::CancellationToken;

const SENDER: &str = "5511988887777";

fn harness() -> TestHarness {
    TestHarness::builder().build().unwrap()
}

fn appointment() -> Appointment {
    Appointment {
        id: "apt-1".into(),
        slot: slot("s1", "centro", "2026-10-20 09:00"),
        customer_name: "Maria Silva".into(),
        phone: SENDER.into(),
        service_id: "corte".into(),
        status: AppointmentStatus::Scheduled,
    }
}

#[tokio::test]
async fn first_message_greets_and_persists_session() {
    let h = harness();
    let replies = h.send(SENDER, "Oi").await.unwrap();

    assert_eq!(replies.len(), 2);
    assert!(replies[0].contains("Studio Bela"));
    assert_eq!(h.transport.texts_to(SENDER).await, replies);
    let session = h.store.session(SENDER).await.unwrap();
    assert_eq!(session.state, ConversationState::Menu);
}

#[tokio::test(start_paused = true)]
async fn flood_guard_drops_the_51st_message_until_unblocked() {
    let h = harness();
    for i in 0..50 {
        let replies = h.send(SENDER, "oi").await.unwrap();
        assert!(!replies.is_empty(), "message {i} was dropped");
    }

    assert!(h.send(SENDER, "oi").await.unwrap().is_empty());
    assert!(h.dispatcher.guard().is_blocked(SENDER));

    tokio::time::advance(Duration::from_secs(9 * 60)).await;
    assert!(h.send(SENDER, "oi").await.unwrap().is_empty());

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(!h.send(SENDER, "oi").await.unwrap().is_empty());
    assert!(!h.dispatcher.guard().is_blocked(SENDER));
}

#[tokio::test]
async fn flooding_one_sender_does_not_block_another() {
    let h = harness();
    for _ in 0..51 {
        h.send(SENDER, "oi").await.unwrap();
    }
    assert!(h.send(SENDER, "oi").await.unwrap().is_empty());
    assert!(!h.send("5511911112222", "oi").await.unwrap().is_empty());
}

#[tokio::test]
async fn operator_handover_silences_the_bot_until_resolved() {
    let h = harness();
    h.send(SENDER, "oi").await.unwrap();

    h.dispatcher.start_handover(SENDER, "ana");
    assert!(h.dispatcher.handoff().is_active(SENDER));
    assert!(h.send(SENDER, "1").await.unwrap().is_empty());

    h.dispatcher.handoff().flush().await;
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Human
    );
    assert_eq!(
        h.store.handoff(SENDER).await.unwrap().status,
        HandoffStatus::Open
    );

    h.dispatcher.resolve_handover(SENDER, "ana").await;
    assert!(!h.dispatcher.handoff().is_active(SENDER));
    let session = h.store.session(SENDER).await.unwrap();
    assert_eq!(session.state, ConversationState::Menu);
    assert!(!session.data.human_takeover);
    assert_eq!(
        h.store.handoff(SENDER).await.unwrap().status,
        HandoffStatus::Resolved
    );

    assert!(!h.send(SENDER, "oi").await.unwrap().is_empty());
}

#[tokio::test]
async fn message_during_resolve_cannot_pin_the_session_in_human() {
    let h = harness();
    h.send(SENDER, "oi").await.unwrap();
    h.dispatcher.start_handover(SENDER, "ana");
    h.dispatcher.handoff().flush().await;

    h.store.set_save_delay(Duration::from_millis(50));
    h.dispatcher.handoff().resolve(SENDER, "ana");
    h.dispatcher
        .process_message(&InboundMessage::text(SENDER, "obrigada"))
        .await
        .unwrap();
    h.dispatcher.handoff().flush().await;

    assert!(!h.dispatcher.handoff().is_active(SENDER));
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Menu
    );
    h.store.set_save_delay(Duration::ZERO);
    assert!(!h.send(SENDER, "oi").await.unwrap().is_empty());
}

#[tokio::test]
async fn message_queued_behind_the_lock_respects_a_new_handover() {
    let h = harness();
    h.send(SENDER, "oi").await.unwrap();
    h.store.set_save_delay(Duration::from_millis(50));

    let first = {
        let dispatcher = Arc::clone(&h.dispatcher);
        tokio::spawn(async move {
            dispatcher
                .process_message(&InboundMessage::text(SENDER, "2"))
                .await
        })
    };
    tokio::task::yield_now().await;
    let queued = {
        let dispatcher = Arc::clone(&h.dispatcher);
        tokio::spawn(async move {
            dispatcher
                .process_message(&InboundMessage::text(SENDER, "1"))
                .await
        })
    };
    tokio::task::yield_now().await;

    h.dispatcher.start_handover(SENDER, "ana");
    assert!(!first.await.unwrap().unwrap().is_empty());
    assert!(queued.await.unwrap().unwrap().is_empty());

    h.dispatcher.handoff().flush().await;
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Human
    );
}

#[tokio::test]
async fn asking_for_a_human_escalates_and_alerts() {
    let h = harness();
    h.send(SENDER, "oi").await.unwrap();

    let replies = h.send(SENDER, "6").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(h.notifier.kinds().await, vec![AlertKind::HumanRequested]);
    assert!(h.dispatcher.handoff().is_active(SENDER));

    h.dispatcher.handoff().flush().await;
    assert_eq!(
        h.store.handoff(SENDER).await.unwrap().status,
        HandoffStatus::Pending
    );
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Human
    );
    assert!(h.send(SENDER, "alo?").await.unwrap().is_empty());
}

#[tokio::test]
async fn open_handoffs_survive_a_restart() {
    let h = harness();
    h.store
        .insert_handoff(HandoffRecord {
            sender: SENDER.into(),
            status: HandoffStatus::Open,
            agent: Some("ana".into()),
            started_at: Utc::now(),
        })
        .await;

    assert_eq!(h.dispatcher.handoff().reload_from_store().await.unwrap(), 1);
    assert!(h.send(SENDER, "oi").await.unwrap().is_empty());
    assert!(h.store.session(SENDER).await.is_none());
}

#[tokio::test]
async fn concurrent_messages_from_one_sender_are_serialized() {
    let h = harness();
    let mut tasks = Vec::new();
    for _ in 0..10 {
        let dispatcher = Arc::clone(&h.dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher
                .process_message(&InboundMessage::text(SENDER, "oi"))
                .await
        }));
    }

    let mut greetings = 0;
    for task in tasks {
        let replies = task.await.unwrap().unwrap();
        if replies.iter().any(|r| r.contains("Studio Bela")) {
            greetings += 1;
        }
    }
    assert_eq!(greetings, 1);
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Menu
    );
}

#[tokio::test]
async fn idle_sender_locks_are_purged() {
    let h = harness();
    h.send(SENDER, "oi").await.unwrap();
    h.send("5511911112222", "oi").await.unwrap();
    assert_eq!(h.dispatcher.purge_idle_locks(), 2);
    assert_eq!(h.dispatcher.purge_idle_locks(), 0);
}

#[tokio::test]
async fn inconsistent_session_restarts_at_greeting() {
    let h = harness();
    let mut broken = Session::new(SENDER);
    broken.transition(ConversationState::PickSlot);
    h.store.insert_session(broken).await;

    let replies = h.send(SENDER, "1").await.unwrap();
    assert!(replies[0].contains("Studio Bela"));
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Menu
    );
}

#[tokio::test]
async fn confirmation_request_holds_through_unrelated_replies() {
    let h = harness();
    assert_eq!(h.dispatcher.request_confirmation(&appointment()).await.unwrap(), 1);
    let reminder = h.transport.texts_to(SENDER).await;
    assert!(reminder[0].contains("Maria Silva"));
    assert!(reminder[0].contains("20/10/2026"));

    let replies = h.send(SENDER, "Vou atrasar 10 minutos").await.unwrap();
    assert!(replies.is_empty());
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::ConfirmationPending
    );
    assert_eq!(
        h.notifier.kinds().await,
        vec![AlertKind::UnmatchedConfirmation]
    );

    h.send(SENDER, "sim").await.unwrap();
    assert_eq!(h.booking.confirmed().await, vec!["apt-1".to_string()]);
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::Menu
    );
}

#[tokio::test]
async fn feedback_request_records_the_rating() {
    let h = harness();
    assert_eq!(h.dispatcher.request_feedback(&appointment()).await.unwrap(), 1);
    assert_eq!(
        h.store.session(SENDER).await.unwrap().state,
        ConversationState::FeedbackPending
    );

    h.send(SENDER, "4").await.unwrap();
    let events = h.store.events().await;
    assert!(events.iter().any(|e| e.kind == "feedback" && e.detail == "4"));
}

#[tokio::test]
async fn follow_ups_are_skipped_during_handover() {
    let h = harness();
    h.dispatcher.start_handover(SENDER, "ana");
    assert_eq!(h.dispatcher.request_confirmation(&appointment()).await.unwrap(), 0);
    assert_eq!(h.transport.sent_count().await, 0);
}

#[tokio::test]
async fn session_write_failure_does_not_block_replies() {
    let h = harness();
    h.store.set_fail_writes(true);
    let replies = h.send(SENDER, "oi").await.unwrap();
    assert_eq!(replies.len(), 2);
}

#[tokio::test]
async fn session_read_failure_is_an_error() {
    let h = harness();
    h.store.set_fail_reads(true);
    assert!(h.send(SENDER, "oi").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn broadcast_goes_through_the_dispatcher() {
    let h = TestHarness::builder()
        .with_pacing(Pacing {
            base: Duration::from_millis(2000),
            jitter: Duration::ZERO,
        })
        .build()
        .unwrap();
    h.store.add_contact("5511900000001", &["vip"], false).await;
    h.store.add_contact("5511900000002", &["VIP"], true).await;
    h.store.add_contact("5511900000003", &["Vip"], false).await;

    let report = h
        .dispatcher
        .dispatch_broadcast("vip", "Promoção de outubro!", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped_opted_out, 1);
    let sent = h.transport.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].at - sent[0].at >= Duration::from_millis(2000));
}

#[tokio::test]
async fn run_loop_answers_injected_messages_and_stops_on_cancel() {
    let h = harness();
    let cancel = CancellationToken::new();
    let run = tokio::spawn(Arc::clone(&h.dispatcher).run(cancel.clone()));

    h.transport.inject(InboundMessage::text(SENDER, "oi")).await;
    h.transport
        .inject(InboundMessage::text("5511911112222", "oi"))
        .await;

    for _ in 0..200 {
        if h.transport.sent_count().await >= 4 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.transport.texts_to(SENDER).await.len(), 2);
    assert_eq!(h.transport.texts_to("5511911112222").await.len(), 2);

    cancel.cancel();
    run.await.unwrap().unwrap();
}
