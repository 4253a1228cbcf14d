// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inquiry lifecycle engine for dealflow.
//!
//! [`AssignmentEngine`] rotates assignments over the eligible expert
//! roster; [`StateMachine`] validates and applies status transitions and
//! derives the notifications each transition implies.

pub mod assignment;
pub mod patterns;
pub mod state_machine;

pub use assignment::AssignmentEngine;
pub use state_machine::{StateMachine, TransitionContext, TransitionResult};
