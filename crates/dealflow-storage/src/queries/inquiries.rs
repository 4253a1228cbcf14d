// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inquiry record operations: status, meta bag, and the expert snapshot.

use std::collections::BTreeMap;
use std::str::FromStr;

use dealflow_core::DealflowError;
use dealflow_core::types::{
    CashStatus, CustomerRef, ExpertRef, InquiryKind, InquiryStatus, InstallmentStatus,
};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{ExpertId, Inquiry, InquiryId};

/// Create a new inquiry in its kind's initial state
/// (`new` for cash, `pending` for installment). Returns the new id.
pub async fn create(
    db: &Database,
    kind: InquiryKind,
    customer: CustomerRef,
    car_name: &str,
) -> Result<InquiryId, DealflowError> {
    let status = initial_status(kind);
    let kind_label = kind.to_string();
    let status_label = status.label();
    let car_name = car_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO inquiries
                 (kind, status, customer_user_id, customer_name, customer_phone, car_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    kind_label,
                    status_label,
                    customer.user_id,
                    customer.name,
                    customer.phone,
                    car_name,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map(InquiryId)
        .map_err(map_tr_err)
}

/// Fetch an inquiry with its full meta bag.
pub async fn get(db: &Database, id: InquiryId) -> Result<Inquiry, DealflowError> {
    let raw = db
        .connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    "SELECT kind, status, customer_user_id, customer_name, customer_phone,
                            car_name, expert_id, expert_name, expert_phone
                     FROM inquiries WHERE id = ?1",
                    params![id.0],
                    |row| {
                        Ok(RawInquiry {
                            kind: row.get(0)?,
                            status: row.get(1)?,
                            customer_user_id: row.get(2)?,
                            customer_name: row.get(3)?,
                            customer_phone: row.get(4)?,
                            car_name: row.get(5)?,
                            expert_id: row.get(6)?,
                            expert_name: row.get(7)?,
                            expert_phone: row.get(8)?,
                            meta: BTreeMap::new(),
                        })
                    },
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;

            let Some(mut raw) = row else {
                return Ok(None);
            };

            let mut stmt =
                conn.prepare("SELECT key, value FROM inquiry_meta WHERE inquiry_id = ?1")?;
            let rows = stmt.query_map(params![id.0], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for entry in rows {
                let (key, value) = entry?;
                raw.meta.insert(key, value);
            }
            Ok(Some(raw))
        })
        .await
        .map_err(map_tr_err)?;

    let raw = raw.ok_or_else(|| DealflowError::Internal(format!("inquiry {} not found", id.0)))?;
    raw.into_inquiry(id)
}

/// Overwrite the inquiry's status label.
pub async fn set_status(
    db: &Database,
    id: InquiryId,
    status: InquiryStatus,
) -> Result<(), DealflowError> {
    let label = status.label();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE inquiries
                 SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![label, id.0],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealflowError::Internal(format!(
            "inquiry {} not found",
            id.0
        )));
    }
    Ok(())
}

/// Upsert one key in the inquiry's meta bag.
pub async fn set_meta(
    db: &Database,
    id: InquiryId,
    key: &str,
    value: &str,
) -> Result<(), DealflowError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO inquiry_meta (inquiry_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (inquiry_id, key) DO UPDATE SET value = excluded.value",
                params![id.0, key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read one key from the meta bag.
pub async fn get_meta(
    db: &Database,
    id: InquiryId,
    key: &str,
) -> Result<Option<String>, DealflowError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM inquiry_meta WHERE inquiry_id = ?1 AND key = ?2",
                    params![id.0, key],
                    |row| row.get::<_, String>(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(value)
        })
        .await
        .map_err(map_tr_err)
}

/// Store the assigned-expert snapshot (id, display name, phone).
pub async fn set_assigned_expert(
    db: &Database,
    id: InquiryId,
    expert: &ExpertRef,
) -> Result<(), DealflowError> {
    let expert = expert.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE inquiries
                 SET expert_id = ?1, expert_name = ?2, expert_phone = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?4",
                params![expert.id.0, expert.name, expert.phone, id.0],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealflowError::Internal(format!(
            "inquiry {} not found",
            id.0
        )));
    }
    Ok(())
}

fn initial_status(kind: InquiryKind) -> InquiryStatus {
    match kind {
        InquiryKind::Cash => InquiryStatus::Cash(CashStatus::New),
        InquiryKind::Installment => InquiryStatus::Installment(InstallmentStatus::Pending),
    }
}

/// Row shape fetched inside the connection closure; converted to the domain
/// type outside so parse failures map to proper errors.
struct RawInquiry {
    kind: String,
    status: String,
    customer_user_id: i64,
    customer_name: String,
    customer_phone: String,
    car_name: String,
    expert_id: Option<i64>,
    expert_name: Option<String>,
    expert_phone: Option<String>,
    meta: BTreeMap<String, String>,
}

impl RawInquiry {
    fn into_inquiry(self, id: InquiryId) -> Result<Inquiry, DealflowError> {
        let kind = InquiryKind::from_str(&self.kind).map_err(|_| {
            DealflowError::Internal(format!("unrecognized stored kind `{}`", self.kind))
        })?;
        let status = parse_status(kind, &self.status)?;
        let assigned_expert = match (self.expert_id, self.expert_name, self.expert_phone) {
            (Some(eid), Some(name), Some(phone)) => Some(ExpertRef {
                id: ExpertId(eid),
                name,
                phone,
            }),
            _ => None,
        };
        Ok(Inquiry {
            id,
            kind,
            status,
            customer: CustomerRef {
                user_id: self.customer_user_id,
                name: self.customer_name,
                phone: self.customer_phone,
            },
            car_name: self.car_name,
            assigned_expert,
            meta: self.meta,
        })
    }
}

/// Parse a stored status label in the context of the inquiry's kind.
///
/// `rejected` exists in both vocabularies, so the kind decides which enum
/// the label belongs to.
pub(crate) fn parse_status(
    kind: InquiryKind,
    label: &str,
) -> Result<InquiryStatus, DealflowError> {
    match kind {
        InquiryKind::Cash => CashStatus::from_str(label)
            .map(InquiryStatus::Cash)
            .map_err(|_| DealflowError::Internal(format!("unrecognized cash status `{label}`"))),
        InquiryKind::Installment => InstallmentStatus::from_str(label)
            .map(InquiryStatus::Installment)
            .map_err(|_| {
                DealflowError::Internal(format!("unrecognized installment status `{label}`"))
            }),
    }
}
