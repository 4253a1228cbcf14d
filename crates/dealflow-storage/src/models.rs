// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `dealflow-core::types` for use across
//! trait boundaries. This module re-exports them for convenience within the
//! storage crate.

pub use dealflow_core::types::{
    CustomerRef, Expert, ExpertId, ExpertRef, Inquiry, InquiryId, InquiryKind, InquiryStatus,
    LogStatus, NewLogEntry, NotificationLogEntry,
};
