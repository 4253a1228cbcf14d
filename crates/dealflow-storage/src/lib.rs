// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for dealflow.
//!
//! Single serialized connection (tokio-rusqlite), embedded refinery
//! migrations, and an adapter implementing the store traits from
//! `dealflow-core`.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod writer;

pub use adapter::SqliteStorage;
pub use database::Database;
