//! # Workflow Status Model
//!
//! Read-only reference rows for the six workflow statuses.
//!
//! Maps to `workflow_statuses`:
//! ```sql
//! CREATE TABLE workflow_statuses (
//!   workflow_status_id INTEGER PRIMARY KEY,
//!   status_name VARCHAR(100) NOT NULL,
//!   status_code VARCHAR(50) NOT NULL UNIQUE,
//!   display_order INTEGER NOT NULL,
//!   visual_stage VARCHAR(32) NOT NULL,
//!   is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!   -- ... timestamps
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::state_machine::{VisualStage, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WorkflowStatus {
    pub workflow_status_id: i32,
    pub status_name: String,
    pub status_code: String,
    pub display_order: i32,
    pub visual_stage: String,
    pub is_active: bool,
}

impl WorkflowStatus {
    /// The seeded row for `state`, as written by the initial migration
    pub fn canonical(state: WorkflowState) -> Self {
        Self {
            workflow_status_id: state.id(),
            status_name: state.label().to_string(),
            status_code: state.code().to_string(),
            display_order: state.id(),
            visual_stage: state.visual_stage().as_str().to_string(),
            is_active: true,
        }
    }

    pub fn state(&self) -> Option<WorkflowState> {
        WorkflowState::try_from(self.workflow_status_id).ok()
    }

    /// Parsed stage group; falls back to the built-in grouping for unknown keys
    pub fn stage(&self) -> Option<VisualStage> {
        self.visual_stage
            .parse()
            .ok()
            .or_else(|| self.state().map(WorkflowState::visual_stage))
    }

    /// Every status row, active or not, in display order
    pub async fn list_all(pool: &PgPool) -> Result<Vec<WorkflowStatus>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowStatus>(
            r#"
            SELECT workflow_status_id, status_name, status_code, display_order,
                   visual_stage, is_active
            FROM workflow_statuses
            ORDER BY display_order, workflow_status_id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
