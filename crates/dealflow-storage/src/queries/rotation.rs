// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin rotation cursor.
//!
//! A single row (`id = 1`) holds the index of the most recently assigned
//! expert within the ordered eligible list. The seed value is -1 so the
//! first advance lands on index 0.

use dealflow_core::DealflowError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Advance the cursor by one position modulo `eligible_count` and return the
/// new index. Runs as a single serialized call, so concurrent advances never
/// observe the same index.
pub async fn advance(db: &Database, eligible_count: usize) -> Result<usize, DealflowError> {
    if eligible_count == 0 {
        return Err(DealflowError::NoEligibleExperts);
    }
    let n = eligible_count as i64;
    let idx = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE rotation_state SET idx = (idx + 1) % ?1 WHERE id = 1",
                params![n],
            )?;
            let idx =
                conn.query_row("SELECT idx FROM rotation_state WHERE id = 1", [], |row| {
                    row.get::<_, i64>(0)
                })?;
            Ok(idx)
        })
        .await
        .map_err(map_tr_err)?;
    Ok(idx as usize)
}

/// Read the current cursor without advancing. Returns -1 before any
/// assignment has been made.
pub async fn current(db: &Database) -> Result<i64, DealflowError> {
    db.connection()
        .call(|conn| {
            let idx =
                conn.query_row("SELECT idx FROM rotation_state WHERE id = 1", [], |row| {
                    row.get::<_, i64>(0)
                })?;
            Ok(idx)
        })
        .await
        .map_err(map_tr_err)
}
