// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete dealflow pipeline.
//!
//! Each test opens an isolated temp SQLite database and drives the real
//! storage adapter through the state machine, dispatcher, and scheduler,
//! with mock channel senders standing in for the provider HTTP calls.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dealflow_core::traits::NotificationLogStore;
use dealflow_core::types::{Channel, CustomerRef, InquiryId, InquiryKind, LogStatus, Payload};
use dealflow_lifecycle::{AssignmentEngine, StateMachine, TransitionContext};
use dealflow_notify::{Dispatcher, Scheduler};
use dealflow_storage::queries;
use dealflow_storage::{Database, SqliteStorage};
use dealflow_test_utils::MockSender;

struct TestStack {
    storage: Arc<SqliteStorage>,
    machine: StateMachine,
    dispatcher: Arc<Dispatcher>,
    scheduler: Scheduler,
    sms: Arc<MockSender>,
    _dir: tempfile::TempDir,
}

async fn stack() -> TestStack {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("dealflow.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    let storage = Arc::new(SqliteStorage::new(db));

    let sms = Arc::new(MockSender::new(Channel::Sms));
    let mut dispatcher = Dispatcher::new(storage.clone());
    dispatcher.register(sms.clone());
    let dispatcher = Arc::new(dispatcher);

    let machine = StateMachine::new(
        storage.clone(),
        AssignmentEngine::new(storage.clone(), storage.clone()),
    );
    let scheduler = Scheduler::new(dispatcher.clone(), storage.clone(), 100);

    TestStack {
        storage,
        machine,
        dispatcher,
        scheduler,
        sms,
        _dir: dir,
    }
}

fn customer() -> CustomerRef {
    CustomerRef {
        user_id: 42,
        name: "Sara Ahmadi".into(),
        phone: "09121234567".into(),
    }
}

#[tokio::test]
async fn approval_flows_from_transition_to_delivered_sms() {
    let stack = stack().await;
    let db = stack.storage.database();

    queries::experts::create(db, "Amir", "0935000001", true)
        .await
        .unwrap();
    queries::experts::create(db, "Maryam", "0935000002", true)
        .await
        .unwrap();
    let id = queries::inquiries::create(db, InquiryKind::Installment, customer(), "Atlas GX")
        .await
        .unwrap();

    let result = stack
        .machine
        .apply_transition(id, "approved", &TransitionContext::default())
        .await
        .unwrap();
    assert_eq!(result.status.label(), "user_confirmed");
    assert_eq!(result.notifications.len(), 2);

    for request in &result.notifications {
        let outcomes = stack.dispatcher.send(request).await.unwrap();
        assert!(outcomes[&Channel::Sms].success);
    }

    // Customer notification plus expert referral, both delivered.
    let sent = stack.sms.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "09121234567");
    assert_eq!(sent[1].0, "0935000001");

    let stored = queries::inquiries::get(db, id).await.unwrap();
    assert_eq!(stored.assigned_expert.as_ref().unwrap().name, "Amir");
}

#[tokio::test]
async fn rotation_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("dealflow.db");

    {
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        queries::experts::create(&db, "Amir", "0935000001", true)
            .await
            .unwrap();
        queries::experts::create(&db, "Maryam", "0935000002", true)
            .await
            .unwrap();
        assert_eq!(queries::rotation::advance(&db, 2).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    // Reopen: the index picked up where the last process left off.
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    assert_eq!(queries::rotation::advance(&db, 2).await.unwrap(), 1);
    db.close().await.unwrap();
}

#[tokio::test]
async fn scheduled_notification_round_trips_through_sqlite() {
    let stack = stack().await;
    let request = dealflow_core::types::NotificationRequest::single(
        Channel::Sms,
        "09121234567",
        Payload::pattern("inquiry_approved", vec!["Sara".into(), "Atlas GX".into()]),
    )
    .with_related_id(1);

    let at = Utc::now() - Duration::seconds(1);
    let ids = stack.scheduler.schedule(&request, at).await.unwrap();
    assert_eq!(ids.len(), 1);

    let pending = stack.storage.get(ids[0]).await.unwrap();
    assert_eq!(pending.status, LogStatus::Pending);
    assert!(pending.sent_at.is_none());

    assert_eq!(stack.scheduler.process_due(Utc::now()).await.unwrap(), 1);
    // A second tick finds nothing: the entry was claimed and finalized.
    assert_eq!(stack.scheduler.process_due(Utc::now()).await.unwrap(), 0);

    let done = stack.storage.get(ids[0]).await.unwrap();
    assert_eq!(done.status, LogStatus::Sent);
    assert!(done.sent_at.is_some());
    assert_eq!(stack.sms.sent_count().await, 1);
}

#[tokio::test]
async fn rejection_without_reason_leaves_no_trace() {
    let stack = stack().await;
    let db = stack.storage.database();
    let id = queries::inquiries::create(db, InquiryKind::Installment, customer(), "Atlas GX")
        .await
        .unwrap();

    let result = stack
        .machine
        .apply_transition(id, "rejected", &TransitionContext::default())
        .await;
    assert!(result.is_err());

    let stored = queries::inquiries::get(db, id).await.unwrap();
    assert_eq!(stored.status.label(), "pending");
    assert!(stored.meta.is_empty());
}

#[tokio::test]
async fn unknown_inquiry_id_is_a_store_failure() {
    let stack = stack().await;
    let result = stack
        .machine
        .apply_transition(InquiryId(9999), "approved", &TransitionContext::default())
        .await;
    assert!(result.is_err());
}
