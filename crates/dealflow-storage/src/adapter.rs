// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait adapter connecting the SQLite database to the workflow core.
//!
//! `SqliteStorage` implements every store trait the core defines, so the
//! lifecycle engine and notification scheduler depend only on trait objects
//! and never on SQL.

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

use crate::database::Database;
use crate::queries;

/// SQLite-backed implementation of the core store traits.
///
/// Cheap to clone; all clones share one serialized connection.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Arc<Database>,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl InquiryStore for SqliteStorage {
    async fn get(&self, id: InquiryId) -> Result<Inquiry, DealflowError> {
        queries::inquiries::get(&self.db, id).await
    }

    async fn set_status(&self, id: InquiryId, status: InquiryStatus) -> Result<(), DealflowError> {
        queries::inquiries::set_status(&self.db, id, status).await
    }

    async fn set_meta(&self, id: InquiryId, key: &str, value: &str) -> Result<(), DealflowError> {
        queries::inquiries::set_meta(&self.db, id, key, value).await
    }

    async fn get_meta(&self, id: InquiryId, key: &str) -> Result<Option<String>, DealflowError> {
        queries::inquiries::get_meta(&self.db, id, key).await
    }

    async fn set_assigned_expert(
        &self,
        id: InquiryId,
        expert: &ExpertRef,
    ) -> Result<(), DealflowError> {
        queries::inquiries::set_assigned_expert(&self.db, id, expert).await
    }
}

#[async_trait]
impl ExpertsProvider for SqliteStorage {
    async fn list_eligible(&self) -> Result<Vec<Expert>, DealflowError> {
        queries::experts::list_eligible(&self.db).await
    }
}

#[async_trait]
impl RotationStore for SqliteStorage {
    async fn advance(&self, eligible_count: usize) -> Result<usize, DealflowError> {
        queries::rotation::advance(&self.db, eligible_count).await
    }

    async fn current(&self) -> Result<i64, DealflowError> {
        queries::rotation::current(&self.db).await
    }
}

#[async_trait]
impl NotificationLogStore for SqliteStorage {
    async fn append(&self, entry: NewLogEntry) -> Result<i64, DealflowError> {
        queries::notification_log::append(&self.db, entry).await
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationLogEntry>, DealflowError> {
        queries::notification_log::claim_due(&self.db, now, limit).await
    }

    async fn finalize(
        &self,
        id: i64,
        status: LogStatus,
        error_message: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), DealflowError> {
        queries::notification_log::finalize(
            &self.db,
            id,
            status,
            error_message.map(str::to_string),
            sent_at,
        )
        .await
    }

    async fn get(&self, id: i64) -> Result<NotificationLogEntry, DealflowError> {
        queries::notification_log::get(&self.db, id).await
    }
}

#[async_trait]
impl InAppStore for SqliteStorage {
    async fn create(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
        link: Option<&str>,
        related_id: Option<i64>,
    ) -> Result<i64, DealflowError> {
        queries::inapp::create(&self.db, user_id, title, message, link, related_id).await
    }
}
