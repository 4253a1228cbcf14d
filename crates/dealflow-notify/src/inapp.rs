// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-app channel sender backed by the in-app notification store.
//!
//! Delivery is a database insert; the recipient is the numeric id of the
//! target user.

use std::sync::Arc;

use async_trait::async_trait;
use dealflow_core::traits::{ChannelSender, InAppStore};
use dealflow_core::types::{Channel, Payload, SendOutcome};
use tracing::warn;

pub struct InAppSender {
    store: Arc<dyn InAppStore>,
}

impl InAppSender {
    pub fn new(store: Arc<dyn InAppStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome {
        let user_id = match recipient.trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                return SendOutcome::failed(format!(
                    "in-app recipient must be a numeric user id, got `{recipient}`"
                ));
            }
        };

        let (title, message, link, related_id) = match payload {
            Payload::InApp {
                title,
                message,
                link,
                related_id,
            } => (title.as_str(), message.as_str(), link.as_deref(), *related_id),
            Payload::Text { body } => ("Notification", body.as_str(), None, None),
            other => {
                return SendOutcome::failed(format!(
                    "unsupported payload type for in_app channel: {other:?}"
                ));
            }
        };

        match self
            .store
            .create(user_id, title, message, link, related_id)
            .await
        {
            Ok(row_id) => SendOutcome::sent(row_id.to_string()),
            Err(e) => {
                warn!(user_id, error = %e, "in-app notification insert failed");
                SendOutcome::failed(format!("in-app store error: {e}"))
            }
        }
    }
}
