// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for dealflow integration tests.
//!
//! Provides mock channel senders and in-memory store implementations for
//! fast, deterministic, CI-runnable tests without SQLite or external
//! services.
//!
//! # Components
//!
//! - [`MockSender`] - Mock channel sender with scripted outcomes and captured sends
//! - [`MemoryStores`] - In-memory implementations of every store trait

pub mod memory_store;
pub mod mock_sender;

pub use memory_store::MemoryStores;
pub use mock_sender::MockSender;
