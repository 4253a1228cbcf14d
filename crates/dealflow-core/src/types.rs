// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Dealflow workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a credit inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InquiryId(pub i64);

/// Unique identifier for an expert (staff member eligible for rotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpertId(pub i64);

/// A notification transport.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Telegram,
    Email,
    InApp,
}

/// The two inquiry kinds, each with its own status vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    Cash,
    Installment,
}

/// Lifecycle states for an installment inquiry.
///
/// `pending -> {user_confirmed | rejected | more_docs}`; `more_docs` may
/// return to `pending` once the customer resubmits documents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    UserConfirmed,
    Rejected,
    MoreDocs,
}

/// Lifecycle states for a cash (tracking-oriented) inquiry.
///
/// `new -> referred -> in_progress -> {completed | rejected}`, with
/// `follow_up_scheduled` reachable from `referred`/`in_progress` and
/// returning to `in_progress`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashStatus {
    New,
    Referred,
    InProgress,
    FollowUpScheduled,
    Completed,
    Rejected,
}

/// The current lifecycle state of an inquiry, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InquiryStatus {
    Cash(CashStatus),
    Installment(InstallmentStatus),
}

impl InquiryStatus {
    /// The kind this status belongs to.
    pub fn kind(&self) -> InquiryKind {
        match self {
            InquiryStatus::Cash(_) => InquiryKind::Cash,
            InquiryStatus::Installment(_) => InquiryKind::Installment,
        }
    }

    /// The snake_case label used in stores and logs.
    pub fn label(&self) -> String {
        match self {
            InquiryStatus::Cash(s) => s.to_string(),
            InquiryStatus::Installment(s) => s.to_string(),
        }
    }
}

/// The customer who submitted an inquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub user_id: i64,
    pub name: String,
    pub phone: String,
}

/// Snapshot of the expert assigned to an inquiry, captured at assignment
/// time. Not a live join: later edits to the expert record do not flow back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertRef {
    pub id: ExpertId,
    pub name: String,
    pub phone: String,
}

/// A staff member in the assignment roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expert {
    pub id: ExpertId,
    pub name: String,
    pub phone: String,
    /// Whether this expert participates in rotation. Providers only return
    /// eligible experts; the flag travels with the record for bookkeeping.
    pub eligible: bool,
}

impl Expert {
    /// Snapshot this expert's contact data onto an inquiry.
    pub fn to_ref(&self) -> ExpertRef {
        ExpertRef {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// A credit request record.
///
/// The `meta` bag is opaque pass-through: the core reads individual keys only
/// when building notification parameters, and writes keys such as
/// `rejection_reason` as transition side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub kind: InquiryKind,
    pub status: InquiryStatus,
    pub customer: CustomerRef,
    /// Display name of the car the inquiry is about.
    pub car_name: String,
    pub assigned_expert: Option<ExpertRef>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

/// The message body of a notification, in the shape the target channel expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Free text (Telegram, or SMS lines that allow raw text).
    Text { body: String },
    /// A pre-approved template id with ordered parameters (SMS patterns).
    Pattern { pattern: String, params: Vec<String> },
    /// Subject plus HTML body (email).
    Email { subject: String, html_body: String },
    /// Title/message/link for a durable in-app notification row.
    InApp {
        title: String,
        message: String,
        link: Option<String>,
        /// Id of the related entity, stored on the created row.
        related_id: Option<i64>,
    },
}

impl Payload {
    pub fn text(body: impl Into<String>) -> Self {
        Payload::Text { body: body.into() }
    }

    pub fn pattern(pattern: impl Into<String>, params: Vec<String>) -> Self {
        Payload::Pattern {
            pattern: pattern.into(),
            params,
        }
    }
}

/// One logical notification to send, across one or more channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Channels to fan out to. Each produces exactly one log entry.
    pub channels: Vec<Channel>,
    /// Per-channel recipient identifiers (phone / chat id / address / user id).
    /// Telegram, email, and in-app accept multiple recipients per channel.
    pub recipients: BTreeMap<Channel, Vec<String>>,
    pub payload: Payload,
    /// Id of the related entity (typically the inquiry), for bookkeeping.
    pub related_id: Option<i64>,
    /// Id of the user on whose behalf the notification is sent.
    pub user_id: Option<i64>,
    /// When set and in the future, the request is persisted as pending log
    /// entries and resumed by the scheduler instead of being sent immediately.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NotificationRequest {
    /// A single-channel request with one recipient.
    pub fn single(channel: Channel, recipient: impl Into<String>, payload: Payload) -> Self {
        let mut recipients = BTreeMap::new();
        recipients.insert(channel, vec![recipient.into()]);
        Self {
            channels: vec![channel],
            recipients,
            payload,
            related_id: None,
            user_id: None,
            scheduled_at: None,
        }
    }

    /// Add another channel with its recipients.
    pub fn with_channel(mut self, channel: Channel, recipients: Vec<String>) -> Self {
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        self.recipients.insert(channel, recipients);
        self
    }

    pub fn with_related_id(mut self, id: i64) -> Self {
        self.related_id = Some(id);
        self
    }

    pub fn with_user_id(mut self, id: i64) -> Self {
        self.user_id = Some(id);
        self
    }

    pub fn with_scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }
}

/// The result of one channel send attempt.
///
/// Channel senders signal provider-level failure through this value and never
/// through `Err`: misconfiguration, provider rejection, and transport failure
/// all land here so the caller can surface partial failure per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }

    /// A failure caused by missing or invalid local configuration, kept
    /// distinct from provider rejection so operators can tell the two apart.
    pub fn misconfigured(detail: impl std::fmt::Display) -> Self {
        Self::failed(format!("configuration error: {detail}"))
    }
}

/// Aggregate outcome of sending one payload to a recipient list.
///
/// `success` is true when at least one recipient succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub success: bool,
    pub per_recipient: BTreeMap<String, SendOutcome>,
}

impl BulkOutcome {
    /// Aggregate per-recipient outcomes under the at-least-one-success rule.
    pub fn from_outcomes(per_recipient: BTreeMap<String, SendOutcome>) -> Self {
        let success = per_recipient.values().any(|o| o.success);
        Self {
            success,
            per_recipient,
        }
    }

    /// The first recorded error, for log bookkeeping on overall failure.
    pub fn first_error(&self) -> Option<&str> {
        self.per_recipient
            .values()
            .find_map(|o| o.error.as_deref())
    }

    /// The first message id, for log bookkeeping on success.
    pub fn first_message_id(&self) -> Option<&str> {
        self.per_recipient
            .values()
            .find_map(|o| o.message_id.as_deref())
    }
}

/// Status of a persisted notification log entry.
///
/// `Processing` is a transient claim marker used by the scheduler so that
/// overlapping ticks never send the same entry twice; externally every entry
/// still ends in `Sent` or `Failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

/// Persisted record of one channel-send attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub id: i64,
    pub channel: Channel,
    /// One recipient per attempt; multi-recipient sends store a
    /// comma-joined list.
    pub recipient: String,
    pub payload: Payload,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub related_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields for appending a new notification log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub channel: Channel,
    pub recipient: String,
    pub payload: Payload,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub related_id: Option<i64>,
    pub user_id: Option<i64>,
}
