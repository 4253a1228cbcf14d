// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dealflow workflow engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Dealflow workspace: inquiry lifecycle
//! states, notification requests and outcomes, and the store/sender
//! boundary traits the surrounding application implements.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DealflowError;
pub use types::{
    BulkOutcome, Channel, Expert, ExpertId, Inquiry, InquiryId, InquiryKind, InquiryStatus,
    LogStatus, NotificationLogEntry, NotificationRequest, Payload, SendOutcome,
};

pub use traits::{
    ChannelSender, ExpertsProvider, InAppStore, InquiryStore, NotificationLogStore, RotationStore,
};
