// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-channel notification dispatcher.
//!
//! One request fans out to every channel it names. Each channel attempt
//! produces exactly one notification log row, including attempts on
//! channels with no registered sender, so the audit trail never has gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use dealflow_core::DealflowError;
use dealflow_core::traits::{ChannelSender, NotificationLogStore};
use dealflow_core::types::{
    BulkOutcome, Channel, LogStatus, NewLogEntry, NotificationLogEntry, NotificationRequest,
    SendOutcome,
};
use tracing::{debug, warn};

/// Routes notification requests to channel senders and records every
/// attempt in the notification log.
pub struct Dispatcher {
    senders: BTreeMap<Channel, Arc<dyn ChannelSender>>,
    log: Arc<dyn NotificationLogStore>,
}

impl Dispatcher {
    pub fn new(log: Arc<dyn NotificationLogStore>) -> Self {
        Self {
            senders: BTreeMap::new(),
            log,
        }
    }

    /// Register a sender under its own channel. Replaces any previous
    /// sender for that channel.
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.channel(), sender);
    }

    pub fn has_sender(&self, channel: Channel) -> bool {
        self.senders.contains_key(&channel)
    }

    /// Send a request immediately, fanning out to every named channel.
    ///
    /// A channel failure never aborts the fan-out: each channel gets its
    /// own attempt and its own log row, and the caller receives the
    /// per-channel outcomes. `Err` is reserved for log-store failures.
    pub async fn send(
        &self,
        request: &NotificationRequest,
    ) -> Result<BTreeMap<Channel, BulkOutcome>, DealflowError> {
        let mut results = BTreeMap::new();
        for &channel in &request.channels {
            let recipients = request
                .recipients
                .get(&channel)
                .cloned()
                .unwrap_or_default();
            let outcome = self.attempt(channel, &recipients, request).await;
            let error_message = if recipients.is_empty() {
                Some(format!("no recipients for channel `{channel}`"))
            } else {
                outcome.first_error().map(str::to_string)
            };

            let now = Utc::now();
            self.log
                .append(NewLogEntry {
                    channel,
                    recipient: recipients.join(","),
                    payload: request.payload.clone(),
                    status: if outcome.success {
                        LogStatus::Sent
                    } else {
                        LogStatus::Failed
                    },
                    error_message,
                    scheduled_at: request.scheduled_at,
                    sent_at: outcome.success.then_some(now),
                    related_id: request.related_id,
                    user_id: request.user_id,
                })
                .await?;

            results.insert(channel, outcome);
        }
        Ok(results)
    }

    /// Deliver a previously claimed log entry and finalize its row in
    /// place, instead of appending new rows.
    pub async fn deliver_claimed(
        &self,
        entry: &NotificationLogEntry,
    ) -> Result<BulkOutcome, DealflowError> {
        let recipients: Vec<String> = entry
            .recipient
            .split(',')
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        let outcome = match self.senders.get(&entry.channel) {
            Some(sender) => sender.send_to_all(&recipients, &entry.payload).await,
            None => unregistered(entry.channel, &recipients),
        };

        let now = Utc::now();
        self.log
            .finalize(
                entry.id,
                if outcome.success {
                    LogStatus::Sent
                } else {
                    LogStatus::Failed
                },
                outcome.first_error(),
                outcome.success.then_some(now),
            )
            .await?;

        debug!(
            entry_id = entry.id,
            channel = %entry.channel,
            success = outcome.success,
            "claimed entry delivered"
        );
        Ok(outcome)
    }

    async fn attempt(
        &self,
        channel: Channel,
        recipients: &[String],
        request: &NotificationRequest,
    ) -> BulkOutcome {
        if recipients.is_empty() {
            warn!(channel = %channel, "notification request names channel with no recipients");
            return BulkOutcome {
                success: false,
                per_recipient: BTreeMap::new(),
            };
        }
        match self.senders.get(&channel) {
            Some(sender) => sender.send_to_all(recipients, &request.payload).await,
            None => {
                warn!(channel = %channel, "no sender registered for channel");
                unregistered(channel, recipients)
            }
        }
    }
}

fn unregistered(channel: Channel, recipients: &[String]) -> BulkOutcome {
    let per_recipient = recipients
        .iter()
        .map(|r| {
            (
                r.clone(),
                SendOutcome::failed(format!("no sender registered for channel `{channel}`")),
            )
        })
        .collect();
    BulkOutcome::from_outcomes(per_recipient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealflow_core::types::Payload;
    use dealflow_test_utils::{MemoryStores, MockSender};

    fn request() -> NotificationRequest {
        NotificationRequest::single(Channel::Sms, "09121234567", Payload::text("hello"))
            .with_related_id(7)
            .with_user_id(42)
    }

    #[tokio::test]
    async fn send_writes_one_log_row_per_channel() {
        let stores = MemoryStores::new();
        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(Arc::new(MockSender::new(Channel::Sms)));
        dispatcher.register(Arc::new(MockSender::new(Channel::Telegram)));

        let request = request().with_channel(Channel::Telegram, vec!["987".into()]);
        let results = dispatcher.send(&request).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[&Channel::Sms].success);
        assert!(results[&Channel::Telegram].success);

        let log = stores.log_entries().await;
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.status == LogStatus::Sent));
        assert!(log.iter().all(|e| e.related_id == Some(7)));
        assert!(log.iter().all(|e| e.sent_at.is_some()));
    }

    #[tokio::test]
    async fn one_channel_failing_does_not_abort_the_rest() {
        let stores = MemoryStores::new();
        let sms = Arc::new(MockSender::new(Channel::Sms));
        sms.push_outcome(SendOutcome::failed("rate limited")).await;

        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(sms);
        dispatcher.register(Arc::new(MockSender::new(Channel::Telegram)));

        let request = request().with_channel(Channel::Telegram, vec!["987".into()]);
        let results = dispatcher.send(&request).await.unwrap();

        assert!(!results[&Channel::Sms].success);
        assert!(results[&Channel::Telegram].success);

        let log = stores.log_entries().await;
        assert_eq!(log.len(), 2);
        let failed = log.iter().find(|e| e.channel == Channel::Sms).unwrap();
        assert_eq!(failed.status, LogStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("rate limited"));
        let sent = log.iter().find(|e| e.channel == Channel::Telegram).unwrap();
        assert_eq!(sent.status, LogStatus::Sent);
    }

    #[tokio::test]
    async fn unregistered_channel_is_logged_as_failed() {
        let stores = MemoryStores::new();
        let dispatcher = Dispatcher::new(Arc::new(stores.clone()));

        let results = dispatcher.send(&request()).await.unwrap();

        assert!(!results[&Channel::Sms].success);
        let log = stores.log_entries().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, LogStatus::Failed);
        assert!(
            log[0]
                .error_message
                .as_deref()
                .unwrap()
                .contains("no sender registered")
        );
    }

    #[tokio::test]
    async fn channel_without_recipients_is_logged_with_a_reason() {
        let stores = MemoryStores::new();
        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(Arc::new(MockSender::new(Channel::Telegram)));

        let request = request().with_channel(Channel::Telegram, vec![]);
        let results = dispatcher.send(&request).await.unwrap();
        assert!(!results[&Channel::Telegram].success);

        let log = stores.log_entries().await;
        let row = log.iter().find(|e| e.channel == Channel::Telegram).unwrap();
        assert_eq!(row.status, LogStatus::Failed);
        assert_eq!(
            row.error_message.as_deref(),
            Some("no recipients for channel `telegram`")
        );
    }

    #[tokio::test]
    async fn bulk_send_succeeds_when_any_recipient_succeeds() {
        let stores = MemoryStores::new();
        let telegram = Arc::new(MockSender::new(Channel::Telegram));
        telegram
            .push_outcome(SendOutcome::failed("chat not found"))
            .await;

        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(telegram.clone());

        let request = NotificationRequest {
            channels: vec![Channel::Telegram],
            recipients: [(Channel::Telegram, vec!["111".into(), "222".into()])]
                .into_iter()
                .collect(),
            payload: Payload::text("hello"),
            related_id: None,
            user_id: None,
            scheduled_at: None,
        };
        let results = dispatcher.send(&request).await.unwrap();

        let bulk = &results[&Channel::Telegram];
        assert!(bulk.success);
        assert!(!bulk.per_recipient["111"].success);
        assert!(bulk.per_recipient["222"].success);
        assert_eq!(telegram.sent_count().await, 2);

        let log = stores.log_entries().await;
        assert_eq!(log[0].status, LogStatus::Sent);
        assert_eq!(log[0].recipient, "111,222");
    }

    #[tokio::test]
    async fn deliver_claimed_finalizes_in_place() {
        use chrono::Utc;

        let stores = MemoryStores::new();
        let id = stores
            .append(NewLogEntry {
                channel: Channel::Sms,
                recipient: "09121234567".into(),
                payload: Payload::text("hello"),
                status: LogStatus::Pending,
                error_message: None,
                scheduled_at: Some(Utc::now()),
                sent_at: None,
                related_id: None,
                user_id: None,
            })
            .await
            .unwrap();
        let claimed = stores.claim_due(Utc::now(), 10).await.unwrap();
        assert_eq!(claimed.len(), 1);

        let mut dispatcher = Dispatcher::new(Arc::new(stores.clone()));
        dispatcher.register(Arc::new(MockSender::new(Channel::Sms)));

        let outcome = dispatcher.deliver_claimed(&claimed[0]).await.unwrap();
        assert!(outcome.success);

        let log = stores.log_entries().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, id);
        assert_eq!(log[0].status, LogStatus::Sent);
    }
}
