// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod experts;
pub mod inapp;
pub mod inquiries;
pub mod notification_log;
pub mod rotation;

use chrono::{DateTime, SecondsFormat, Utc};
use dealflow_core::DealflowError;

/// Timestamp format used in every table: RFC 3339 with millisecond precision,
/// UTC, matching SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` defaults.
pub(crate) fn fmt_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DealflowError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DealflowError::Internal(format!("malformed stored timestamp `{s}`: {e}")))
}
