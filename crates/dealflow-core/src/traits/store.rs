// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store traits: the persistence boundary injected into the workflow core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DealflowError;
use crate::types::{
    Expert, ExpertRef, Inquiry, InquiryId, InquiryStatus, LogStatus, NewLogEntry,
    NotificationLogEntry,
};

/// Record store for inquiries: status plus an open key-value meta bag.
#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn get(&self, id: InquiryId) -> Result<Inquiry, DealflowError>;

    async fn set_status(&self, id: InquiryId, status: InquiryStatus) -> Result<(), DealflowError>;

    async fn set_meta(&self, id: InquiryId, key: &str, value: &str) -> Result<(), DealflowError>;

    async fn get_meta(&self, id: InquiryId, key: &str) -> Result<Option<String>, DealflowError>;

    /// Store the assigned expert snapshot (name/phone at assignment time).
    async fn set_assigned_expert(
        &self,
        id: InquiryId,
        expert: &ExpertRef,
    ) -> Result<(), DealflowError>;
}

/// Supplies the current eligible-expert set.
///
/// The returned order must be stable across calls within the same rotation
/// epoch; the rotation index is meaningless without it.
#[async_trait]
pub trait ExpertsProvider: Send + Sync {
    async fn list_eligible(&self) -> Result<Vec<Expert>, DealflowError>;
}

/// Durable rotation state for round-robin assignment: a single integer index.
#[async_trait]
pub trait RotationStore: Send + Sync {
    /// Atomically advance the index by one modulo `eligible_count` and return
    /// the new index. Must be a single read-modify-write so concurrent
    /// assignments cannot lose updates.
    async fn advance(&self, eligible_count: usize) -> Result<usize, DealflowError>;

    /// The last-assigned index, or -1 if no assignment has happened yet.
    async fn current(&self) -> Result<i64, DealflowError>;
}

/// Append/claim/finalize store for notification log entries.
#[async_trait]
pub trait NotificationLogStore: Send + Sync {
    /// Append one entry, returning its id.
    async fn append(&self, entry: NewLogEntry) -> Result<i64, DealflowError>;

    /// Atomically select up to `limit` pending entries with
    /// `scheduled_at <= now`, oldest first, and mark them `processing` so a
    /// concurrent tick cannot claim them again.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationLogEntry>, DealflowError>;

    /// Record the terminal outcome of a claimed entry.
    ///
    /// `status` must be `Sent` or `Failed`; `sent_at` is set only on success.
    async fn finalize(
        &self,
        id: i64,
        status: LogStatus,
        error_message: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), DealflowError>;

    async fn get(&self, id: i64) -> Result<NotificationLogEntry, DealflowError>;
}

/// Durable in-app notification rows, one per recipient user.
#[async_trait]
pub trait InAppStore: Send + Sync {
    /// Create one row; returns its id.
    async fn create(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
        link: Option<&str>,
        related_id: Option<i64>,
    ) -> Result<i64, DealflowError>;
}
