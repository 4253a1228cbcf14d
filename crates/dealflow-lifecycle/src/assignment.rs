// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin expert assignment.
//!
//! The rotation index lives in the store and advances by exactly one per
//! successful assignment. The eligible roster is re-read on every call;
//! when the roster shrinks past the stored index the modulo arithmetic
//! wraps, which is accepted rotation behavior rather than an error.

use std::sync::Arc;

use dealflow_core::DealflowError;
use dealflow_core::traits::{ExpertsProvider, RotationStore};
use dealflow_core::types::Expert;
use tracing::debug;

pub struct AssignmentEngine {
    experts: Arc<dyn ExpertsProvider>,
    rotation: Arc<dyn RotationStore>,
}

impl AssignmentEngine {
    pub fn new(experts: Arc<dyn ExpertsProvider>, rotation: Arc<dyn RotationStore>) -> Self {
        Self { experts, rotation }
    }

    /// Return the next expert in rotation order, advancing the durable
    /// index by one.
    ///
    /// Fails with [`DealflowError::NoEligibleExperts`] when the roster is
    /// empty; the rotation index is not touched in that case.
    pub async fn assign_next(&self) -> Result<Expert, DealflowError> {
        let eligible = self.experts.list_eligible().await?;
        if eligible.is_empty() {
            return Err(DealflowError::NoEligibleExperts);
        }
        let index = self.rotation.advance(eligible.len()).await?;
        let expert = eligible[index].clone();
        debug!(index, expert_id = expert.id.0, "expert assigned in rotation");
        Ok(expert)
    }
}
