// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expert roster queries.
//!
//! The eligible list is returned in a stable order (name, then id) so the
//! rotation index always resolves to the same expert between advances.

use dealflow_core::DealflowError;
use dealflow_core::types::{Expert, ExpertId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// List experts currently eligible for assignment, in rotation order.
pub async fn list_eligible(db: &Database) -> Result<Vec<Expert>, DealflowError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, eligible FROM experts
                 WHERE eligible = 1 ORDER BY name, id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Expert {
                    id: ExpertId(row.get(0)?),
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    eligible: row.get(3)?,
                })
            })?;
            let mut experts = Vec::new();
            for expert in rows {
                experts.push(expert?);
            }
            Ok(experts)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert an expert into the roster. Returns the new id.
pub async fn create(
    db: &Database,
    name: &str,
    phone: &str,
    eligible: bool,
) -> Result<ExpertId, DealflowError> {
    let name = name.to_string();
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO experts (name, phone, eligible) VALUES (?1, ?2, ?3)",
                params![name, phone, eligible],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map(ExpertId)
        .map_err(map_tr_err)
}

/// Flip an expert's eligibility flag.
pub async fn set_eligible(
    db: &Database,
    id: ExpertId,
    eligible: bool,
) -> Result<(), DealflowError> {
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE experts SET eligible = ?1 WHERE id = ?2",
                params![eligible, id.0],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealflowError::Internal(format!("expert {} not found", id.0)));
    }
    Ok(())
}
