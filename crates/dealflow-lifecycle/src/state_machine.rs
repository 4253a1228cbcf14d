// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inquiry status state machine.
//!
//! Validates a requested transition against the inquiry's kind, applies
//! it, and derives the notifications the transition implies. Validation
//! failures abort before any mutation; notification delivery is the
//! caller's concern and never gates the status change.
//!
//! Side effects tied to the requested action (expert assignment on
//! approval, reason storage on rejection) run on every call, even when
//! the status is already the target. The no-op guard only skips the
//! status write and the customer-facing notification.

use std::sync::Arc;

use dealflow_core::DealflowError;
use dealflow_core::traits::InquiryStore;
use dealflow_core::types::{
    CashStatus, Channel, Inquiry, InquiryId, InquiryKind, InquiryStatus, InstallmentStatus,
    NotificationRequest, Payload,
};
use tracing::{debug, warn};

use crate::assignment::AssignmentEngine;
use crate::patterns;

/// Caller-supplied context for a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    /// Required when the requested action is `rejected`.
    pub rejection_reason: Option<String>,
}

impl TransitionContext {
    pub fn with_rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }
}

/// Outcome of a transition: the resulting status plus the notifications
/// it implies. The customer-facing notification, when present, comes
/// first; an expert referral is appended as an independent request.
#[derive(Debug)]
pub struct TransitionResult {
    pub status: InquiryStatus,
    pub notifications: Vec<NotificationRequest>,
}

pub struct StateMachine {
    inquiries: Arc<dyn InquiryStore>,
    assignment: AssignmentEngine,
}

impl StateMachine {
    pub fn new(inquiries: Arc<dyn InquiryStore>, assignment: AssignmentEngine) -> Self {
        Self {
            inquiries,
            assignment,
        }
    }

    /// Apply `requested` (an action label such as `approved` or
    /// `referred`) to the inquiry.
    ///
    /// Returns [`DealflowError::InvalidStatus`] for labels outside the
    /// kind's vocabulary or edges the lifecycle does not allow, and
    /// [`DealflowError::MissingContext`] when `rejected` lacks a reason.
    /// Both abort before any mutation.
    pub async fn apply_transition(
        &self,
        id: InquiryId,
        requested: &str,
        context: &TransitionContext,
    ) -> Result<TransitionResult, DealflowError> {
        let inquiry = self.inquiries.get(id).await?;
        let target = resolve_target(&inquiry, requested)?;

        let reason = if requested == "rejected" {
            match context.rejection_reason.as_deref() {
                Some(reason) if !reason.trim().is_empty() => Some(reason.to_string()),
                _ => {
                    return Err(DealflowError::MissingContext {
                        field: "rejection_reason".into(),
                    });
                }
            }
        } else {
            None
        };

        let changed = target != inquiry.status;
        let mut notifications = Vec::new();

        // Requested-action side effects, independent of the no-op guard.
        let referral = if needs_assignment(&inquiry, requested) {
            self.assign_expert(&inquiry).await?
        } else {
            None
        };
        if let Some(reason) = &reason {
            self.inquiries
                .set_meta(id, "rejection_reason", reason)
                .await?;
        }

        if changed {
            self.inquiries.set_status(id, target).await?;
            if let Some(primary) = customer_notification(&inquiry, target, reason.as_deref()) {
                notifications.push(primary);
            }
        } else {
            debug!(
                inquiry_id = id.0,
                status = target.label(),
                "status unchanged, skipping write and customer notification"
            );
        }
        if let Some(referral) = referral {
            notifications.push(referral);
        }

        Ok(TransitionResult {
            status: target,
            notifications,
        })
    }

    /// Degraded assignment path: an empty roster skips the handoff but
    /// never fails the transition.
    async fn assign_expert(
        &self,
        inquiry: &Inquiry,
    ) -> Result<Option<NotificationRequest>, DealflowError> {
        let expert = match self.assignment.assign_next().await {
            Ok(expert) => expert,
            Err(DealflowError::NoEligibleExperts) => {
                warn!(
                    inquiry_id = inquiry.id.0,
                    "no eligible experts, proceeding without handoff"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        self.inquiries
            .set_assigned_expert(inquiry.id, &expert.to_ref())
            .await?;

        let referral = NotificationRequest::single(
            Channel::Sms,
            expert.phone.clone(),
            Payload::pattern(
                patterns::EXPERT_REFERRAL,
                vec![
                    expert.name.clone(),
                    inquiry.customer.name.clone(),
                    inquiry.customer.phone.clone(),
                    inquiry.car_name.clone(),
                ],
            ),
        )
        .with_related_id(inquiry.id.0)
        .with_user_id(inquiry.customer.user_id);
        Ok(Some(referral))
    }
}

/// Map an action label to the target status, enforcing the kind's edges.
fn resolve_target(inquiry: &Inquiry, requested: &str) -> Result<InquiryStatus, DealflowError> {
    let invalid = || DealflowError::InvalidStatus {
        requested: requested.to_string(),
        kind: inquiry.kind.to_string(),
    };

    match inquiry.kind {
        InquiryKind::Installment => {
            let target = match requested {
                "approved" => InstallmentStatus::UserConfirmed,
                "rejected" => InstallmentStatus::Rejected,
                "more_docs" => InstallmentStatus::MoreDocs,
                // Resubmission after a documents request.
                "pending" if inquiry.status == InquiryStatus::Installment(InstallmentStatus::MoreDocs) => {
                    InstallmentStatus::Pending
                }
                _ => return Err(invalid()),
            };
            Ok(InquiryStatus::Installment(target))
        }
        InquiryKind::Cash => {
            let target = match requested {
                "referred" => CashStatus::Referred,
                "in_progress" => CashStatus::InProgress,
                "follow_up_scheduled" => CashStatus::FollowUpScheduled,
                "completed" => CashStatus::Completed,
                "rejected" => CashStatus::Rejected,
                _ => return Err(invalid()),
            };
            let current = match inquiry.status {
                InquiryStatus::Cash(current) => current,
                InquiryStatus::Installment(_) => return Err(invalid()),
            };
            if target == current || cash_edge_allowed(current, target) {
                Ok(InquiryStatus::Cash(target))
            } else {
                Err(invalid())
            }
        }
    }
}

fn cash_edge_allowed(from: CashStatus, to: CashStatus) -> bool {
    matches!(
        (from, to),
        (CashStatus::New, CashStatus::Referred)
            | (CashStatus::Referred, CashStatus::InProgress)
            | (CashStatus::Referred, CashStatus::FollowUpScheduled)
            | (CashStatus::InProgress, CashStatus::FollowUpScheduled)
            | (CashStatus::InProgress, CashStatus::Completed)
            | (CashStatus::InProgress, CashStatus::Rejected)
            | (CashStatus::FollowUpScheduled, CashStatus::InProgress)
    )
}

/// Approval hands an installment inquiry to an expert; a cash inquiry is
/// handed off when it is referred.
fn needs_assignment(inquiry: &Inquiry, requested: &str) -> bool {
    match inquiry.kind {
        InquiryKind::Installment => requested == "approved",
        InquiryKind::Cash => requested == "referred",
    }
}

/// The customer-facing notification a status change implies, if any.
fn customer_notification(
    inquiry: &Inquiry,
    target: InquiryStatus,
    reason: Option<&str>,
) -> Option<NotificationRequest> {
    let customer = &inquiry.customer;
    let payload = match target {
        InquiryStatus::Installment(InstallmentStatus::UserConfirmed) => Payload::pattern(
            patterns::INQUIRY_APPROVED,
            vec![customer.name.clone(), inquiry.car_name.clone()],
        ),
        InquiryStatus::Installment(InstallmentStatus::Rejected)
        | InquiryStatus::Cash(CashStatus::Rejected) => Payload::pattern(
            patterns::INQUIRY_REJECTED,
            vec![
                customer.name.clone(),
                inquiry.car_name.clone(),
                reason.unwrap_or_default().to_string(),
            ],
        ),
        InquiryStatus::Installment(InstallmentStatus::MoreDocs) => Payload::pattern(
            patterns::MORE_DOCUMENTS,
            vec![customer.name.clone(), inquiry.car_name.clone()],
        ),
        InquiryStatus::Cash(CashStatus::Referred) => Payload::pattern(
            patterns::INQUIRY_REFERRED,
            vec![customer.name.clone(), inquiry.car_name.clone()],
        ),
        InquiryStatus::Cash(CashStatus::Completed) => Payload::pattern(
            patterns::INQUIRY_COMPLETED,
            vec![customer.name.clone(), inquiry.car_name.clone()],
        ),
        _ => return None,
    };
    Some(
        NotificationRequest::single(Channel::Sms, customer.phone.clone(), payload)
            .with_related_id(inquiry.id.0)
            .with_user_id(customer.user_id),
    )
}
