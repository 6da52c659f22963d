use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkflowError;

/// Caller-requested actions that drive status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowAction {
    /// Maker hands the draft to the checker
    SubmitToChecker,
    /// Checker forwards to the head
    CheckerApprove,
    /// Checker bounces back to the maker
    CheckerReject,
    /// Head gives final approval
    HeadApprove,
    /// Head bounces back to the checker
    HeadReject,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 5] = [
        Self::SubmitToChecker,
        Self::CheckerApprove,
        Self::CheckerReject,
        Self::HeadApprove,
        Self::HeadReject,
    ];

    /// Action name as stored in `workflow_audit_entries.action_name`
    pub fn name(self) -> &'static str {
        match self {
            Self::SubmitToChecker => "SubmitToChecker",
            Self::CheckerApprove => "CheckerApprove",
            Self::CheckerReject => "CheckerReject",
            Self::HeadApprove => "HeadApprove",
            Self::HeadReject => "HeadReject",
        }
    }

    pub fn is_rejection(self) -> bool {
        matches!(self, Self::CheckerReject | Self::HeadReject)
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = WorkflowError;

    /// Accepts the canonical names case-insensitively, ignoring surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| WorkflowError::UnknownAction(s.to_string()))
    }
}
