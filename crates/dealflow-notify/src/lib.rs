// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch for dealflow.
//!
//! The [`Dispatcher`] fans a [`NotificationRequest`] out to registered
//! channel senders and writes one log entry per channel. The [`Scheduler`]
//! persists future-dated requests and resumes them on a tick, claiming
//! entries atomically so overlapping ticks never double-send.
//!
//! [`NotificationRequest`]: dealflow_core::types::NotificationRequest

pub mod dispatcher;
pub mod inapp;
pub mod scheduler;

pub use dispatcher::Dispatcher;
pub use inapp::InAppSender;
pub use scheduler::{Scheduler, SubmitResult};
