//! # Workflow Persistence
//!
//! The engine plans transitions as pure data and hands the outcome to a
//! [`WorkflowStore`]. A store owns the two invariants the engine cannot
//! enforce on its own:
//!
//! - **Atomicity**: the status write and the audit append of one transition
//!   commit together or not at all.
//! - **Conditional update**: the status write only applies while the entity
//!   still holds the status the transition was validated against; otherwise
//!   the commit fails with `ConcurrentModification` (or `RecordNotFound` /
//!   `ScreenNotFound` if the entity disappeared).
//!
//! Implementations:
//! - [`PgWorkflowStore`] - PostgreSQL via sqlx transactions
//! - [`InMemoryWorkflowStore`] - process-local, single mutex

pub mod memory;
pub mod postgres;

pub use memory::InMemoryWorkflowStore;
pub use postgres::PgWorkflowStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::access::AdminGrant;
use crate::error::WorkflowResult;
use crate::locator::TableBinding;
use crate::models::{AuditEntry, NewAuditEntry, NewScreenWorkflow, ScreenWorkflow, WorkflowStatus, SCREEN_RECORD_ID};
use crate::state_machine::WorkflowAction;

/// A business record located through its table binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordTarget {
    pub binding: TableBinding,
    pub record_id: i64,
    pub current_status_id: i32,
}

/// Where a workflow's current status lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WorkflowTarget {
    Record(RecordTarget),
    Screen(ScreenWorkflow),
}

impl WorkflowTarget {
    pub fn current_status_id(&self) -> i32 {
        match self {
            Self::Record(record) => record.current_status_id,
            Self::Screen(screen) => screen.current_status_id,
        }
    }

    pub fn table_name(&self) -> &str {
        match self {
            Self::Record(record) => &record.binding.table,
            Self::Screen(screen) => &screen.table_name,
        }
    }

    pub fn record_id(&self) -> i64 {
        match self {
            Self::Record(record) => record.record_id,
            Self::Screen(_) => SCREEN_RECORD_ID,
        }
    }

    pub fn screen_workflow_id(&self) -> Option<i64> {
        match self {
            Self::Record(_) => None,
            Self::Screen(screen) => Some(screen.screen_workflow_id),
        }
    }

    /// Short label for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Record(record) => format!("record {}#{}", record.binding.table, record.record_id),
            Self::Screen(screen) => format!("screen {}", screen.screen_code),
        }
    }
}

/// A validated transition ready to be persisted
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub target: WorkflowTarget,
    pub action: WorkflowAction,
    /// Status the transition was validated against; the write is conditional on it
    pub from_status_id: i32,
    pub to_status: WorkflowStatus,
    pub remarks: Option<String>,
    pub actor_id: i64,
}

impl TransitionCommit {
    pub fn audit_entry(&self) -> NewAuditEntry {
        NewAuditEntry {
            table_name: self.target.table_name().to_string(),
            record_id: self.target.record_id(),
            action_name: self.action.name().to_string(),
            from_status_id: Some(self.from_status_id),
            to_status_id: self.to_status.workflow_status_id,
            remarks: self.remarks.clone(),
            acted_by: self.actor_id,
            screen_workflow_id: self.target.screen_workflow_id(),
        }
    }
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Locate a record and read its current status
    async fn resolve_record(&self, table: &str, record_id: i64) -> WorkflowResult<RecordTarget>;

    /// Active screen by code, or `ScreenNotFound`
    async fn find_screen(&self, screen_code: &str) -> WorkflowResult<ScreenWorkflow>;

    async fn register_screen(
        &self,
        new_screen: &NewScreenWorkflow,
        initial: &WorkflowStatus,
    ) -> WorkflowResult<ScreenWorkflow>;

    async fn deactivate_screen(&self, screen_code: &str) -> WorkflowResult<()>;

    /// Conditional status write plus audit append, atomically
    async fn commit_transition(&self, commit: &TransitionCommit) -> WorkflowResult<AuditEntry>;

    /// Record-level history, newest first
    async fn record_history(
        &self,
        binding: &TableBinding,
        record_id: i64,
    ) -> WorkflowResult<Vec<AuditEntry>>;

    /// Screen-level history, newest first
    async fn screen_history(&self, screen_workflow_id: i64) -> WorkflowResult<Vec<AuditEntry>>;

    /// Purge the screen's audit trail and force its status, atomically.
    /// Returns the number of purged entries.
    async fn reset_screen(
        &self,
        screen: &ScreenWorkflow,
        status: &WorkflowStatus,
        grant: &AdminGrant,
    ) -> WorkflowResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn screen() -> ScreenWorkflow {
        let now = Utc::now().naive_utc();
        ScreenWorkflow {
            screen_workflow_id: 11,
            screen_code: "CPI_MONTHLY".to_string(),
            current_status_id: 2,
            current_status_name: "Pending Checker".to_string(),
            table_name: "cpi_monthly".to_string(),
            created_by: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_screen_commit_audit_entry() {
        let commit = TransitionCommit {
            target: WorkflowTarget::Screen(screen()),
            action: WorkflowAction::CheckerReject,
            from_status_id: 2,
            to_status: WorkflowStatus::canonical(crate::state_machine::WorkflowState::MakerEntry),
            remarks: Some("wrong base year".to_string()),
            actor_id: 9,
        };

        let entry = commit.audit_entry();
        assert_eq!(entry.table_name, "cpi_monthly");
        assert_eq!(entry.record_id, SCREEN_RECORD_ID);
        assert_eq!(entry.screen_workflow_id, Some(11));
        assert_eq!(entry.from_status_id, Some(2));
        assert_eq!(entry.to_status_id, 1);
        assert_eq!(entry.action_name, "CheckerReject");
    }

    #[test]
    fn test_record_target_description() {
        let target = WorkflowTarget::Record(RecordTarget {
            binding: TableBinding::new("gdp_quarterly", "gdp_quarterly_id", "workflow_status_id")
                .unwrap(),
            record_id: 12,
            current_status_id: 1,
        });
        assert_eq!(target.describe(), "record gdp_quarterly#12");
        assert_eq!(target.screen_workflow_id(), None);
        assert_eq!(target.record_id(), 12);
    }
}
