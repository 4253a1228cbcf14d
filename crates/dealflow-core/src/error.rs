// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dealflow workflow engine.

use thiserror::Error;

/// The primary error type used across all Dealflow traits and core operations.
///
/// Per-channel send failures are deliberately NOT represented here: a channel
/// sender reports provider-level failure as a [`crate::types::SendOutcome`]
/// value so that one channel failing never aborts its siblings. This enum
/// covers the fatal cases only.
#[derive(Debug, Error)]
pub enum DealflowError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Store backend errors (database connection, query failure, serialization).
    /// Fatal for the enclosing operation: a transition whose status write
    /// fails must not report success.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel plumbing errors that are not per-send outcomes
    /// (e.g., a caller-supplied recipient that violates the channel contract).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Requested transition target is not recognized for the inquiry's kind.
    /// Raised before any side effect occurs.
    #[error("invalid status `{requested}` for {kind} inquiry")]
    InvalidStatus { requested: String, kind: String },

    /// A transition context field required by the requested action is missing
    /// (e.g., a rejection without a rejection reason).
    #[error("missing required context field `{field}`")]
    MissingContext { field: String },

    /// The eligible expert set is empty in a context where assignment is
    /// strictly required. The `approved`/`referred` transitions degrade
    /// instead of raising this.
    #[error("no eligible experts available for assignment")]
    NoEligibleExperts,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_status_formats_requested_and_kind() {
        let err = DealflowError::InvalidStatus {
            requested: "bogus".into(),
            kind: "installment".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("bogus"));
        assert!(rendered.contains("installment"));
    }

    #[test]
    fn missing_context_names_the_field() {
        let err = DealflowError::MissingContext {
            field: "rejection_reason".into(),
        };
        assert!(err.to_string().contains("rejection_reason"));
    }
}
