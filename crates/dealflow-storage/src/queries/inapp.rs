// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-app notification rows, read by the user-facing surface.

use dealflow_core::DealflowError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Insert an unread in-app notification for a user. Returns the row id.
pub async fn create(
    db: &Database,
    user_id: i64,
    title: &str,
    message: &str,
    link: Option<&str>,
    related_id: Option<i64>,
) -> Result<i64, DealflowError> {
    let title = title.to_string();
    let message = message.to_string();
    let link = link.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO inapp_notifications (user_id, title, message, link, related_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, title, message, link, related_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Count unread notifications for a user.
pub async fn unread_count(db: &Database, user_id: i64) -> Result<u64, DealflowError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM inapp_notifications WHERE user_id = ?1 AND read = 0",
                params![user_id],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(count)
        })
        .await
        .map(|c| c as u64)
        .map_err(map_tr_err)
}

/// Mark every notification for a user as read.
pub async fn mark_all_read(db: &Database, user_id: i64) -> Result<(), DealflowError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE inapp_notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
                params![user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
