// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary traits consumed by the workflow core.
//!
//! The surrounding application (admin screens, webhook handlers, whatever CMS
//! hosts the inquiries) supplies implementations of these; the core never
//! assumes a concrete store or transport.

pub mod channel;
pub mod store;

pub use channel::ChannelSender;
pub use store::{ExpertsProvider, InAppStore, InquiryStore, NotificationLogStore, RotationStore};
