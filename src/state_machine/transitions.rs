//! # Transition Table
//!
//! The status graph as pure data. Record-level and screen-level workflows
//! both plan through [`plan_transition`]; they differ only in the store that
//! persists the outcome.
//!
//! | Action          | From | To | Remarks  |
//! |-----------------|------|----|----------|
//! | SubmitToChecker | 1    | 2  |          |
//! | CheckerApprove  | 2    | 4  |          |
//! | CheckerReject   | 2    | 1  | required |
//! | HeadApprove     | 4    | 6  |          |
//! | HeadReject      | 4    | 2  | required |
//!
//! Statuses 3 and 5 are never a transition result.

use super::actions::WorkflowAction;
use super::states::WorkflowState;
use crate::error::{WorkflowError, WorkflowResult};

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: WorkflowAction,
    pub from: &'static [WorkflowState],
    pub to: WorkflowState,
    pub remarks_required: bool,
}

pub const TRANSITION_TABLE: [TransitionRule; 5] = [
    TransitionRule {
        action: WorkflowAction::SubmitToChecker,
        from: &[WorkflowState::MakerEntry],
        to: WorkflowState::PendingChecker,
        remarks_required: false,
    },
    TransitionRule {
        action: WorkflowAction::CheckerApprove,
        from: &[WorkflowState::PendingChecker],
        to: WorkflowState::PendingHead,
        remarks_required: false,
    },
    TransitionRule {
        action: WorkflowAction::CheckerReject,
        from: &[WorkflowState::PendingChecker],
        to: WorkflowState::MakerEntry,
        remarks_required: true,
    },
    TransitionRule {
        action: WorkflowAction::HeadApprove,
        from: &[WorkflowState::PendingHead],
        to: WorkflowState::Approved,
        remarks_required: false,
    },
    TransitionRule {
        action: WorkflowAction::HeadReject,
        from: &[WorkflowState::PendingHead],
        to: WorkflowState::PendingChecker,
        remarks_required: true,
    },
];

/// Validated outcome of applying an action to a current status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransition {
    pub action: WorkflowAction,
    pub from: WorkflowState,
    pub to: WorkflowState,
    /// Trimmed remarks; `None` when blank
    pub remarks: Option<String>,
}

pub fn rule_for(action: WorkflowAction) -> &'static TransitionRule {
    TRANSITION_TABLE
        .iter()
        .find(|rule| rule.action == action)
        .unwrap_or_else(|| unreachable!("every WorkflowAction has a transition rule"))
}

/// Validate `action` against `current_status` and compute the next status.
///
/// Checks run in a fixed order: source status first, then remarks. A status
/// id outside the catalog can never be a valid source and reports
/// `InvalidTransition` like any other mismatch.
pub fn plan_transition(
    current_status: i32,
    action: WorkflowAction,
    remarks: Option<&str>,
) -> WorkflowResult<PlannedTransition> {
    let rule = rule_for(action);

    let from = WorkflowState::try_from(current_status)
        .ok()
        .filter(|state| rule.from.contains(state))
        .ok_or_else(|| WorkflowError::InvalidTransition {
            action: action.name().to_string(),
            current_status,
        })?;

    let remarks = remarks
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    if rule.remarks_required && remarks.is_none() {
        return Err(WorkflowError::RemarksRequired {
            action: action.name().to_string(),
        });
    }

    Ok(PlannedTransition {
        action,
        from,
        to: rule.to,
        remarks,
    })
}

/// Actions a caller may take from `current_status`, in table order
pub fn available_actions(current_status: i32) -> Vec<WorkflowAction> {
    let Ok(state) = WorkflowState::try_from(current_status) else {
        return Vec::new();
    };

    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.from.contains(&state))
        .map(|rule| rule.action)
        .collect()
}
