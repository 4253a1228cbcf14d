// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store implementations for testing.
//!
//! `MemoryStores` implements every store trait from `dealflow-core` with
//! the same observable semantics as the SQLite adapter: rotation seeded at
//! -1, claim marks entries `processing`, finalize accepts only terminal
//! statuses.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealflow_core::DealflowError;
use dealflow_core::traits::{
    ExpertsProvider, InAppStore, InquiryStore, NotificationLogStore, RotationStore,
};
use dealflow_core::types::{
    Expert, ExpertRef, Inquiry, InquiryId, InquiryStatus, LogStatus, NewLogEntry,
    NotificationLogEntry,
};
use tokio::sync::Mutex;

/// A captured in-app notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InAppRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub related_id: Option<i64>,
}

#[derive(Default)]
struct State {
    inquiries: BTreeMap<i64, Inquiry>,
    experts: Vec<Expert>,
    rotation_idx: i64,
    log: Vec<NotificationLogEntry>,
    next_log_id: i64,
    inapp: Vec<InAppRow>,
}

/// In-memory backing for all five store traits. Cheap to clone; clones
/// share state.
#[derive(Clone)]
pub struct MemoryStores {
    inner: Arc<Mutex<State>>,
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStores {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                rotation_idx: -1,
                next_log_id: 1,
                ..State::default()
            })),
        }
    }

    /// Seed an inquiry record.
    pub async fn insert_inquiry(&self, inquiry: Inquiry) {
        self.inner
            .lock()
            .await
            .inquiries
            .insert(inquiry.id.0, inquiry);
    }

    /// Replace the expert roster. Only eligible experts are returned by
    /// `list_eligible`.
    pub async fn set_experts(&self, experts: Vec<Expert>) {
        self.inner.lock().await.experts = experts;
    }

    /// Snapshot of all notification log entries.
    pub async fn log_entries(&self) -> Vec<NotificationLogEntry> {
        self.inner.lock().await.log.clone()
    }

    /// Snapshot of all in-app rows.
    pub async fn inapp_rows(&self) -> Vec<InAppRow> {
        self.inner.lock().await.inapp.clone()
    }

    /// The raw rotation index, -1 before the first assignment.
    pub async fn rotation_index(&self) -> i64 {
        self.inner.lock().await.rotation_idx
    }
}

#[async_trait]
impl InquiryStore for MemoryStores {
    async fn get(&self, id: InquiryId) -> Result<Inquiry, DealflowError> {
        self.inner
            .lock()
            .await
            .inquiries
            .get(&id.0)
            .cloned()
            .ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))
    }

    async fn set_status(&self, id: InquiryId, status: InquiryStatus) -> Result<(), DealflowError> {
        let mut state = self.inner.lock().await;
        let inquiry = state
            .inquiries
            .get_mut(&id.0)
            .ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))?;
        inquiry.status = status;
        Ok(())
    }

    async fn set_meta(&self, id: InquiryId, key: &str, value: &str) -> Result<(), DealflowError> {
        let mut state = self.inner.lock().await;
        let inquiry = state
            .inquiries
            .get_mut(&id.0)
            .ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))?;
        inquiry.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_meta(&self, id: InquiryId, key: &str) -> Result<Option<String>, DealflowError> {
        let state = self.inner.lock().await;
        let inquiry = state
            .inquiries
            .get(&id.0)
            .ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))?;
        Ok(inquiry.meta.get(key).cloned())
    }

    async fn set_assigned_expert(
        &self,
        id: InquiryId,
        expert: &ExpertRef,
    ) -> Result<(), DealflowError> {
        let mut state = self.inner.lock().await;
        let inquiry = state
            .inquiries
            .get_mut(&id.0)
            .ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))?;
        inquiry.assigned_expert = Some(expert.clone());
        Ok(())
    }
}

#[async_trait]
impl ExpertsProvider for MemoryStores {
    async fn list_eligible(&self) -> Result<Vec<Expert>, DealflowError> {
        let mut eligible: Vec<Expert> = self
            .inner
            .lock()
            .await
            .experts
            .iter()
            .filter(|e| e.eligible)
            .cloned()
            .collect();
        eligible.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.0.cmp(&b.id.0)));
        Ok(eligible)
    }
}

#[async_trait]
impl RotationStore for MemoryStores {
    async fn advance(&self, eligible_count: usize) -> Result<usize, DealflowError> {
        if eligible_count == 0 {
            return Err(DealflowError::NoEligibleExperts);
        }
        let mut state = self.inner.lock().await;
        state.rotation_idx = (state.rotation_idx + 1) % eligible_count as i64;
        Ok(state.rotation_idx as usize)
    }

    async fn current(&self) -> Result<i64, DealflowError> {
        Ok(self.inner.lock().await.rotation_idx)
    }
}

#[async_trait]
impl NotificationLogStore for MemoryStores {
    async fn append(&self, entry: NewLogEntry) -> Result<i64, DealflowError> {
        let mut state = self.inner.lock().await;
        let id = state.next_log_id;
        state.next_log_id += 1;
        state.log.push(NotificationLogEntry {
            id,
            channel: entry.channel,
            recipient: entry.recipient,
            payload: entry.payload,
            status: entry.status,
            error_message: entry.error_message,
            scheduled_at: entry.scheduled_at,
            sent_at: entry.sent_at,
            related_id: entry.related_id,
            user_id: entry.user_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationLogEntry>, DealflowError> {
        let mut state = self.inner.lock().await;
        let mut due: Vec<usize> = state
            .log
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.status == LogStatus::Pending
                    && e.scheduled_at.is_some_and(|at| at <= now)
            })
            .map(|(i, _)| i)
            .collect();
        due.sort_by_key(|&i| (state.log[i].scheduled_at, state.log[i].id));
        due.truncate(limit);

        let mut claimed = Vec::with_capacity(due.len());
        for i in due {
            state.log[i].status = LogStatus::Processing;
            claimed.push(state.log[i].clone());
        }
        Ok(claimed)
    }

    async fn finalize(
        &self,
        id: i64,
        status: LogStatus,
        error_message: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), DealflowError> {
        if !matches!(status, LogStatus::Sent | LogStatus::Failed) {
            return Err(DealflowError::Internal(format!(
                "cannot finalize log entry {id} with non-terminal status `{status}`"
            )));
        }
        let mut state = self.inner.lock().await;
        let entry = state
            .log
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| {
                DealflowError::Internal(format!("notification log entry {id} not found"))
            })?;
        entry.status = status;
        entry.error_message = error_message.map(str::to_string);
        entry.sent_at = sent_at;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<NotificationLogEntry, DealflowError> {
        self.inner
            .lock()
            .await
            .log
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| {
                DealflowError::Internal(format!("notification log entry {id} not found"))
            })
    }
}

#[async_trait]
impl InAppStore for MemoryStores {
    async fn create(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
        link: Option<&str>,
        related_id: Option<i64>,
    ) -> Result<i64, DealflowError> {
        let mut state = self.inner.lock().await;
        let id = state.inapp.len() as i64 + 1;
        state.inapp.push(InAppRow {
            id,
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            link: link.map(str::to_string),
            related_id,
        });
        Ok(id)
    }
}
