// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel sender trait for notification transports (SMS, Telegram, email, in-app).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::{BulkOutcome, Channel, Payload, SendOutcome};

/// A one-way notification transport.
///
/// Implementations report provider-level failure through [`SendOutcome`],
/// never by returning early: one failed recipient or one misconfigured
/// credential must not panic or abort sibling sends. Retry policy does not
/// live here; deferred re-sends go through the scheduler.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Which channel this sender serves.
    fn channel(&self) -> Channel;

    /// Send one payload to one recipient.
    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome;

    /// Send one payload to a recipient list.
    ///
    /// Default implementation sends sequentially and aggregates under the
    /// at-least-one-success rule. Channels with a native bulk API may override.
    async fn send_to_all(&self, recipients: &[String], payload: &Payload) -> BulkOutcome {
        let mut per_recipient = BTreeMap::new();
        for recipient in recipients {
            let outcome = self.send(recipient, payload).await;
            per_recipient.insert(recipient.clone(), outcome);
        }
        BulkOutcome::from_outcomes(per_recipient)
    }
}
