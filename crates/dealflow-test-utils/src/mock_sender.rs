// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel sender for deterministic testing.
//!
//! `MockSender` implements `ChannelSender` with scripted outcomes and
//! captured sends for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use dealflow_core::traits::ChannelSender;
use dealflow_core::types::{Channel, Payload, SendOutcome};
use tokio::sync::Mutex;

/// A mock channel sender for testing.
///
/// Outcomes queued via [`MockSender::push_outcome`] are popped one per
/// send; once the queue is empty every send succeeds. Every call to
/// `send` is captured and retrievable via [`MockSender::sent`].
pub struct MockSender {
    channel: Channel,
    scripted: Arc<Mutex<VecDeque<SendOutcome>>>,
    captured: Arc<Mutex<Vec<(String, Payload)>>>,
}

impl MockSender {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue an outcome to return from the next send.
    pub async fn push_outcome(&self, outcome: SendOutcome) {
        self.scripted.lock().await.push_back(outcome);
    }

    /// All sends seen so far, in order, as (recipient, payload) pairs.
    pub async fn sent(&self) -> Vec<(String, Payload)> {
        self.captured.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.captured.lock().await.len()
    }
}

#[async_trait]
impl ChannelSender for MockSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome {
        self.captured
            .lock()
            .await
            .push((recipient.to_string(), payload.clone()));
        self.scripted
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| SendOutcome::sent(format!("mock-{}", recipient)))
    }
}
