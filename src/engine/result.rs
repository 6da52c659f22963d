use serde::{Deserialize, Serialize};

use crate::locator::StatusField;
use crate::models::{AuditEntry, WorkflowStatus};
use crate::state_machine::WorkflowAction;

/// Outcome of a successful workflow operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub success: bool,
    pub message: String,
    pub new_status_id: i32,
    pub new_status_name: String,
    /// Absent for the administrative reset, which writes no audit entry
    pub audit_id: Option<i64>,
}

impl TransitionResult {
    pub(crate) fn applied(action: WorkflowAction, status: &WorkflowStatus, entry: &AuditEntry) -> Self {
        Self {
            success: true,
            message: format!("{action} completed; status is now {}", status.status_name),
            new_status_id: status.workflow_status_id,
            new_status_name: status.status_name.clone(),
            audit_id: Some(entry.audit_id),
        }
    }

    pub(crate) fn reset(status: &WorkflowStatus, purged: u64) -> Self {
        Self {
            success: true,
            message: format!(
                "Workflow reset to {}; {purged} audit entries removed",
                status.status_name
            ),
            new_status_id: status.workflow_status_id,
            new_status_name: status.status_name.clone(),
            audit_id: None,
        }
    }

    /// Mirror the new status onto an in-memory copy of the record
    pub fn apply_to<T: StatusField>(&self, record: &mut T) {
        record.set_status_id(self.new_status_id);
    }
}
