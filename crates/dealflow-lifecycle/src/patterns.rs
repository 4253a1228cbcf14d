// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS pattern ids used by transition notifications.
//!
//! Parameter order is part of the provider-side template contract and must
//! not change without re-registering the pattern.

/// Params: [expert name, customer name, customer phone, car name].
pub const EXPERT_REFERRAL: &str = "expert_referral";

/// Params: [customer name, car name].
pub const INQUIRY_APPROVED: &str = "inquiry_approved";

/// Params: [customer name, car name, rejection reason].
pub const INQUIRY_REJECTED: &str = "inquiry_rejected";

/// Params: [customer name, car name].
pub const MORE_DOCUMENTS: &str = "more_documents";

/// Params: [customer name, car name].
pub const INQUIRY_REFERRED: &str = "inquiry_referred";

/// Params: [customer name, car name].
pub const INQUIRY_COMPLETED: &str = "inquiry_completed";
