use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkflowError;

/// Workflow status definitions, mirroring the seeded `workflow_statuses` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum WorkflowState {
    /// Maker is entering or editing data (draft)
    MakerEntry = 1,
    /// Submitted, waiting in the checker's queue
    PendingChecker = 2,
    /// Historical vocabulary only; checker rejections bounce to `MakerEntry`
    RejectedByChecker = 3,
    /// Checker approved, waiting in the head's queue
    PendingHead = 4,
    /// Historical vocabulary only; head rejections bounce to `PendingChecker`
    RejectedByHead = 5,
    /// Head approved; terminal
    Approved = 6,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 6] = [
        Self::MakerEntry,
        Self::PendingChecker,
        Self::RejectedByChecker,
        Self::PendingHead,
        Self::RejectedByHead,
        Self::Approved,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    /// Stable code stored in `workflow_statuses.status_code`
    pub fn code(self) -> &'static str {
        match self {
            Self::MakerEntry => "MAKER_ENTRY",
            Self::PendingChecker => "PENDING_CHECKER",
            Self::RejectedByChecker => "REJECTED_BY_CHECKER",
            Self::PendingHead => "PENDING_HEAD",
            Self::RejectedByHead => "REJECTED_BY_HEAD",
            Self::Approved => "APPROVED",
        }
    }

    /// Human-readable name used when no catalog row is available
    pub fn label(self) -> &'static str {
        match self {
            Self::MakerEntry => "Maker Entry (Draft)",
            Self::PendingChecker => "Pending Checker",
            Self::RejectedByChecker => "Rejected by Checker",
            Self::PendingHead => "Pending Head",
            Self::RejectedByHead => "Rejected by Head",
            Self::Approved => "Approved",
        }
    }

    /// Display grouping; rejected statuses fold into the queue they bounce back to
    pub fn visual_stage(self) -> VisualStage {
        match self {
            Self::MakerEntry | Self::RejectedByChecker => VisualStage::Draft,
            Self::PendingChecker | Self::RejectedByHead => VisualStage::CheckerReview,
            Self::PendingHead => VisualStage::HeadReview,
            Self::Approved => VisualStage::Approved,
        }
    }

    /// Approval locks the entity against further actions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Only the maker's draft may be edited
    pub fn is_editable(self) -> bool {
        matches!(self, Self::MakerEntry)
    }

    /// Statuses the transition graph can leave an entity resting in
    pub fn is_resting_state(self) -> bool {
        !matches!(self, Self::RejectedByChecker | Self::RejectedByHead)
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::MakerEntry
    }
}

impl TryFrom<i32> for WorkflowState {
    type Error = WorkflowError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|state| state.id() == value)
            .ok_or(WorkflowError::StatusNotFound(value))
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.id())
    }
}

/// The four user-facing phases the six statuses collapse into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualStage {
    Draft,
    CheckerReview,
    HeadReview,
    Approved,
}

impl VisualStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::CheckerReview => "CheckerReview",
            Self::HeadReview => "HeadReview",
            Self::Approved => "Approved",
        }
    }
}

impl fmt::Display for VisualStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VisualStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "CheckerReview" => Ok(Self::CheckerReview),
            "HeadReview" => Ok(Self::HeadReview),
            "Approved" => Ok(Self::Approved),
            _ => Err(format!("Invalid visual stage: {s}")),
        }
    }
}
