// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification log: the audit trail for every dispatch attempt, and the
//! work queue for scheduled sends.
//!
//! `claim_due` selects and marks rows in one serialized call, so two ticks
//! racing over the same backlog never claim the same entry.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use dealflow_core::DealflowError;
use dealflow_core::types::{Channel, LogStatus, NewLogEntry, NotificationLogEntry, Payload};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::{fmt_ts, parse_ts};

/// Append an attempt row. Returns the new log id.
pub async fn append(db: &Database, entry: NewLogEntry) -> Result<i64, DealflowError> {
    let payload_json = serde_json::to_string(&entry.payload)
        .map_err(|e| DealflowError::Internal(format!("payload serialization failed: {e}")))?;
    let channel = entry.channel.to_string();
    let status = entry.status.to_string();
    let scheduled_at = entry.scheduled_at.map(fmt_ts);
    let sent_at = entry.sent_at.map(fmt_ts);
    let recipient = entry.recipient;
    let error_message = entry.error_message;
    let related_id = entry.related_id;
    let user_id = entry.user_id;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notification_log
                 (channel, recipient, payload, status, error_message,
                  scheduled_at, sent_at, related_id, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    channel,
                    recipient,
                    payload_json,
                    status,
                    error_message,
                    scheduled_at,
                    sent_at,
                    related_id,
                    user_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim pending entries whose `scheduled_at` has arrived, oldest first.
///
/// Claimed rows move to `processing` inside the same transaction that
/// selected them. The caller must `finalize` each one.
pub async fn claim_due(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<NotificationLogEntry>, DealflowError> {
    let now_ts = fmt_ts(now);
    let limit = limit as i64;
    let raw_rows = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut rows = Vec::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT id, channel, recipient, payload, status, error_message,
                            scheduled_at, sent_at, related_id, user_id, created_at
                     FROM notification_log
                     WHERE status = 'pending'
                       AND scheduled_at IS NOT NULL
                       AND scheduled_at <= ?1
                     ORDER BY scheduled_at ASC, id ASC
                     LIMIT ?2",
                )?;
                let mapped = stmt.query_map(params![now_ts, limit], |row| {
                    Ok(RawLogRow {
                        id: row.get(0)?,
                        channel: row.get(1)?,
                        recipient: row.get(2)?,
                        payload: row.get(3)?,
                        status: row.get(4)?,
                        error_message: row.get(5)?,
                        scheduled_at: row.get(6)?,
                        sent_at: row.get(7)?,
                        related_id: row.get(8)?,
                        user_id: row.get(9)?,
                        created_at: row.get(10)?,
                    })
                })?;
                for row in mapped {
                    rows.push(row?);
                }
            }
            for row in &mut rows {
                tx.execute(
                    "UPDATE notification_log SET status = 'processing'
                     WHERE id = ?1 AND status = 'pending'",
                    params![row.id],
                )?;
                row.status = "processing".to_string();
            }
            tx.commit()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    raw_rows.into_iter().map(RawLogRow::into_entry).collect()
}

/// Record the terminal outcome of an attempt. Only `sent` and `failed`
/// are accepted here.
pub async fn finalize(
    db: &Database,
    id: i64,
    status: LogStatus,
    error_message: Option<String>,
    sent_at: Option<DateTime<Utc>>,
) -> Result<(), DealflowError> {
    if !matches!(status, LogStatus::Sent | LogStatus::Failed) {
        return Err(DealflowError::Internal(format!(
            "cannot finalize log entry {id} with non-terminal status `{status}`"
        )));
    }
    let status = status.to_string();
    let sent_at = sent_at.map(fmt_ts);
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notification_log
                 SET status = ?1, error_message = ?2, sent_at = ?3
                 WHERE id = ?4",
                params![status, error_message, sent_at, id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealflowError::Internal(format!(
            "notification log entry {id} not found"
        )));
    }
    Ok(())
}

/// Fetch one log entry by id.
pub async fn get(db: &Database, id: i64) -> Result<NotificationLogEntry, DealflowError> {
    let raw = db
        .connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, channel, recipient, payload, status, error_message,
                            scheduled_at, sent_at, related_id, user_id, created_at
                     FROM notification_log WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(RawLogRow {
                            id: row.get(0)?,
                            channel: row.get(1)?,
                            recipient: row.get(2)?,
                            payload: row.get(3)?,
                            status: row.get(4)?,
                            error_message: row.get(5)?,
                            scheduled_at: row.get(6)?,
                            sent_at: row.get(7)?,
                            related_id: row.get(8)?,
                            user_id: row.get(9)?,
                            created_at: row.get(10)?,
                        })
                    },
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(row)
        })
        .await
        .map_err(map_tr_err)?;

    let raw = raw.ok_or_else(|| {
        DealflowError::Internal(format!("notification log entry {id} not found"))
    })?;
    raw.into_entry()
}

/// Row shape fetched inside the connection closure. Parsing into domain
/// types happens outside so errors map cleanly.
struct RawLogRow {
    id: i64,
    channel: String,
    recipient: String,
    payload: String,
    status: String,
    error_message: Option<String>,
    scheduled_at: Option<String>,
    sent_at: Option<String>,
    related_id: Option<i64>,
    user_id: Option<i64>,
    created_at: String,
}

impl RawLogRow {
    fn into_entry(self) -> Result<NotificationLogEntry, DealflowError> {
        let channel = Channel::from_str(&self.channel).map_err(|_| {
            DealflowError::Internal(format!("unrecognized stored channel `{}`", self.channel))
        })?;
        let status = LogStatus::from_str(&self.status).map_err(|_| {
            DealflowError::Internal(format!("unrecognized stored log status `{}`", self.status))
        })?;
        let payload: Payload = serde_json::from_str(&self.payload).map_err(|e| {
            DealflowError::Internal(format!("malformed stored payload for entry {}: {e}", self.id))
        })?;
        Ok(NotificationLogEntry {
            id: self.id,
            channel,
            recipient: self.recipient,
            payload,
            status,
            error_message: self.error_message,
            scheduled_at: self.scheduled_at.as_deref().map(parse_ts).transpose()?,
            sent_at: self.sent_at.as_deref().map(parse_ts).transpose()?,
            related_id: self.related_id,
            user_id: self.user_id,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn entry(scheduled_at: Option<DateTime<Utc>>) -> NewLogEntry {
        NewLogEntry {
            channel: Channel::Sms,
            recipient: "09121234567".into(),
            payload: Payload::pattern("inquiry-approved", vec!["Sara".into(), "Atlas GX".into()]),
            status: LogStatus::Pending,
            error_message: None,
            scheduled_at,
            sent_at: None,
            related_id: Some(1),
            user_id: Some(42),
        }
    }

    #[tokio::test]
    async fn append_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();

        let id = append(&db, entry(Some(now))).await.unwrap();
        let fetched = get(&db, id).await.unwrap();

        assert_eq!(fetched.id, id);
        assert_eq!(fetched.channel, Channel::Sms);
        assert_eq!(fetched.status, LogStatus::Pending);
        assert_eq!(fetched.recipient, "09121234567");
        assert_eq!(fetched.related_id, Some(1));
        assert!(fetched.sent_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_due_returns_only_ripe_entries() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();

        let ripe = append(&db, entry(Some(now - Duration::minutes(5)))).await.unwrap();
        let future = append(&db, entry(Some(now + Duration::minutes(5)))).await.unwrap();
        let unscheduled = append(&db, entry(None)).await.unwrap();

        let claimed = claim_due(&db, now, 10).await.unwrap();
        let ids: Vec<i64> = claimed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ripe]);
        assert_eq!(claimed[0].status, LogStatus::Processing);

        assert_eq!(get(&db, future).await.unwrap().status, LogStatus::Pending);
        assert_eq!(get(&db, unscheduled).await.unwrap().status, LogStatus::Pending);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_due_is_not_reentrant() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();

        append(&db, entry(Some(now - Duration::minutes(1)))).await.unwrap();

        let first = claim_due(&db, now, 10).await.unwrap();
        assert_eq!(first.len(), 1);

        // Second pass sees the row in `processing` and skips it.
        let second = claim_due(&db, now, 10).await.unwrap();
        assert!(second.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_due_respects_limit_and_order() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();

        let oldest = append(&db, entry(Some(now - Duration::minutes(30)))).await.unwrap();
        let middle = append(&db, entry(Some(now - Duration::minutes(20)))).await.unwrap();
        let newest = append(&db, entry(Some(now - Duration::minutes(10)))).await.unwrap();

        let claimed = claim_due(&db, now, 2).await.unwrap();
        let ids: Vec<i64> = claimed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![oldest, middle]);
        assert_eq!(get(&db, newest).await.unwrap().status, LogStatus::Pending);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn finalize_records_terminal_outcome() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();

        let id = append(&db, entry(Some(now))).await.unwrap();
        claim_due(&db, now, 10).await.unwrap();

        finalize(&db, id, LogStatus::Sent, None, Some(now)).await.unwrap();

        let fetched = get(&db, id).await.unwrap();
        assert_eq!(fetched.status, LogStatus::Sent);
        assert!(fetched.sent_at.is_some());
        assert!(fetched.error_message.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn finalize_rejects_non_terminal_status() {
        let (db, _dir) = setup_db().await;
        let id = append(&db, entry(None)).await.unwrap();

        let result = finalize(&db, id, LogStatus::Pending, None, None).await;
        assert!(result.is_err());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn finalize_failed_keeps_error_message() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();
        let id = append(&db, entry(Some(now))).await.unwrap();
        claim_due(&db, now, 10).await.unwrap();

        finalize(&db, id, LogStatus::Failed, Some("rate limited".into()), None)
            .await
            .unwrap();

        let fetched = get(&db, id).await.unwrap();
        assert_eq!(fetched.status, LogStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("rate limited"));
        assert!(fetched.sent_at.is_none());

        db.close().await.unwrap();
    }
}
