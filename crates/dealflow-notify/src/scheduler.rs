// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deferred notification delivery.
//!
//! Future-dated requests are persisted as pending log rows. On each tick
//! the scheduler claims due rows (the claim marks them `processing`
//! atomically) and hands them to the dispatcher, which finalizes each row
//! in place. A failure on one entry never blocks the rest of the batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dealflow_core::DealflowError;
use dealflow_core::traits::NotificationLogStore;
use dealflow_core::types::{
    BulkOutcome, Channel, LogStatus, NewLogEntry, NotificationRequest,
};
use tracing::{debug, info, warn};

/// How a submitted request was handled.
#[derive(Debug)]
pub enum SubmitResult {
    /// Delivered immediately; per-channel outcomes.
    Sent(BTreeMap<Channel, BulkOutcome>),
    /// Persisted for later delivery; pending log row ids, one per channel.
    Scheduled(Vec<i64>),
}

pub struct Scheduler {
    dispatcher: Arc<crate::Dispatcher>,
    log: Arc<dyn NotificationLogStore>,
    batch_size: usize,
}

impl Scheduler {
    pub fn new(
        dispatcher: Arc<crate::Dispatcher>,
        log: Arc<dyn NotificationLogStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            dispatcher,
            log,
            batch_size,
        }
    }

    /// Route a request: future `scheduled_at` goes to [`Scheduler::schedule`],
    /// anything else is sent immediately.
    pub async fn submit(
        &self,
        request: &NotificationRequest,
    ) -> Result<SubmitResult, DealflowError> {
        match request.scheduled_at {
            Some(at) if at > Utc::now() => {
                Ok(SubmitResult::Scheduled(self.schedule(request, at).await?))
            }
            _ => Ok(SubmitResult::Sent(self.dispatcher.send(request).await?)),
        }
    }

    /// Persist one pending log row per channel, to be delivered once
    /// `at` arrives.
    pub async fn schedule(
        &self,
        request: &NotificationRequest,
        at: DateTime<Utc>,
    ) -> Result<Vec<i64>, DealflowError> {
        let mut ids = Vec::with_capacity(request.channels.len());
        for &channel in &request.channels {
            let recipients = request
                .recipients
                .get(&channel)
                .cloned()
                .unwrap_or_default();
            let id = self
                .log
                .append(NewLogEntry {
                    channel,
                    recipient: recipients.join(","),
                    payload: request.payload.clone(),
                    status: LogStatus::Pending,
                    error_message: None,
                    scheduled_at: Some(at),
                    sent_at: None,
                    related_id: request.related_id,
                    user_id: request.user_id,
                })
                .await?;
            ids.push(id);
        }
        debug!(count = ids.len(), scheduled_at = %at, "notification scheduled");
        Ok(ids)
    }

    /// Claim and deliver every entry due at `now`, up to the configured
    /// batch size. Returns the number of entries processed.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<usize, DealflowError> {
        let due = self.log.claim_due(now, self.batch_size).await?;
        if due.is_empty() {
            return Ok(0);
        }
        info!(count = due.len(), "processing due notifications");

        let mut processed = 0;
        for entry in &due {
            match self.dispatcher.deliver_claimed(entry).await {
                Ok(_) => processed += 1,
                Err(e) => {
                    // Leave the entry finalizable by a later tick only if the
                    // finalize itself failed; the claim already moved it out
                    // of `pending`, so log loudly.
                    warn!(entry_id = entry.id, error = %e, "scheduled delivery failed");
                }
            }
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use chrono::Duration;
    use dealflow_core::types::Payload;
    use dealflow_test_utils::{MemoryStores, MockSender};

    fn build(stores: &MemoryStores) -> (Scheduler, Arc<MockSender>) {
        let sms = Arc::new(MockSender::new(Channel::Sms));
        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(sms.clone());
        let scheduler = Scheduler::new(Arc::new(dispatcher), Arc::new(stores.clone()), 100);
        (scheduler, sms)
    }

    fn request() -> NotificationRequest {
        NotificationRequest::single(Channel::Sms, "09121234567", Payload::text("reminder"))
            .with_related_id(7)
    }

    #[tokio::test]
    async fn scheduled_request_round_trips_through_a_tick() {
        let stores = MemoryStores::new();
        let (scheduler, sms) = build(&stores);
        let at = Utc::now() - Duration::minutes(1);

        let ids = scheduler.schedule(&request(), at).await.unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(sms.sent_count().await, 0);

        let processed = scheduler.process_due(Utc::now()).await.unwrap();
        assert_eq!(processed, 1);
        assert_eq!(sms.sent_count().await, 1);

        let entry = stores.log_entries().await.remove(0);
        assert_eq!(entry.status, LogStatus::Sent);
        assert!(entry.sent_at.is_some());
    }

    #[tokio::test]
    async fn process_due_is_idempotent_across_ticks() {
        let stores = MemoryStores::new();
        let (scheduler, sms) = build(&stores);

        scheduler
            .schedule(&request(), Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(scheduler.process_due(Utc::now()).await.unwrap(), 1);
        assert_eq!(scheduler.process_due(Utc::now()).await.unwrap(), 0);
        assert_eq!(sms.sent_count().await, 1);
    }

    #[tokio::test]
    async fn future_entries_are_not_touched() {
        let stores = MemoryStores::new();
        let (scheduler, sms) = build(&stores);

        scheduler
            .schedule(&request(), Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(scheduler.process_due(Utc::now()).await.unwrap(), 0);
        assert_eq!(sms.sent_count().await, 0);
        assert_eq!(stores.log_entries().await[0].status, LogStatus::Pending);
    }

    #[tokio::test]
    async fn submit_routes_on_scheduled_at() {
        let stores = MemoryStores::new();
        let (scheduler, sms) = build(&stores);

        let immediate = scheduler.submit(&request()).await.unwrap();
        assert!(matches!(immediate, SubmitResult::Sent(_)));
        assert_eq!(sms.sent_count().await, 1);

        let deferred = scheduler
            .submit(&request().with_scheduled_at(Utc::now() + Duration::hours(1)))
            .await
            .unwrap();
        assert!(matches!(deferred, SubmitResult::Scheduled(ids) if ids.len() == 1));
        assert_eq!(sms.sent_count().await, 1);
    }

    #[tokio::test]
    async fn failed_delivery_finalizes_as_failed() {
        let stores = MemoryStores::new();
        let (scheduler, sms) = build(&stores);
        sms.push_outcome(dealflow_core::types::SendOutcome::failed("rate limited"))
            .await;

        scheduler
            .schedule(&request(), Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        scheduler.process_due(Utc::now()).await.unwrap();

        let entry = stores.log_entries().await.remove(0);
        assert_eq!(entry.status, LogStatus::Failed);
        assert_eq!(entry.error_message.as_deref(), Some("rate limited"));
    }

    #[tokio::test]
    async fn batch_size_caps_one_tick() {
        let stores = MemoryStores::new();
        let sms = Arc::new(MockSender::new(Channel::Sms));
        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(sms.clone());
        let scheduler = Scheduler::new(Arc::new(dispatcher), Arc::new(stores.clone()), 2);

        for _ in 0..3 {
            scheduler
                .schedule(&request(), Utc::now() - Duration::minutes(1))
                .await
                .unwrap();
        }

        assert_eq!(scheduler.process_due(Utc::now()).await.unwrap(), 2);
        assert_eq!(scheduler.process_due(Utc::now()).await.unwrap(), 1);
    }
}
