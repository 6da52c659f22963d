//! # Status Catalog
//!
//! In-memory view of `workflow_statuses`, loaded once at startup. The engine
//! resolves display names through it and never writes to it.

use sqlx::PgPool;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::WorkflowStatus;
use crate::state_machine::{VisualStage, WorkflowState};

#[derive(Debug, Clone)]
pub struct StatusCatalog {
    statuses: Vec<WorkflowStatus>,
}

impl StatusCatalog {
    /// The six built-in statuses, identical to the seeded rows
    pub fn canonical() -> Self {
        Self::from_statuses(
            WorkflowState::ALL
                .into_iter()
                .map(WorkflowStatus::canonical)
                .collect(),
        )
    }

    pub fn from_statuses(mut statuses: Vec<WorkflowStatus>) -> Self {
        statuses.sort_by_key(|s| (s.display_order, s.workflow_status_id));
        Self { statuses }
    }

    /// Load every status row. Inactive rows stay resolvable so records
    /// parked on a retired status can still be read.
    pub async fn load(pool: &PgPool) -> WorkflowResult<Self> {
        let statuses = WorkflowStatus::list_all(pool).await?;
        let catalog = Self::from_statuses(statuses);
        catalog.verify()?;

        tracing::debug!(statuses = catalog.statuses.len(), "Status catalog loaded");
        Ok(catalog)
    }

    /// Every status the transition table can produce must be present
    fn verify(&self) -> WorkflowResult<()> {
        for state in WorkflowState::ALL.into_iter().filter(|s| s.is_resting_state()) {
            if self.resolve(state.id()).is_err() {
                return Err(WorkflowError::Configuration(format!(
                    "workflow_statuses is missing status {} ({}); run migrations",
                    state.id(),
                    state.code()
                )));
            }
        }
        Ok(())
    }

    /// Active statuses in display order
    pub fn list_active(&self) -> Vec<WorkflowStatus> {
        self.statuses.iter().filter(|s| s.is_active).cloned().collect()
    }

    pub fn resolve(&self, workflow_status_id: i32) -> WorkflowResult<&WorkflowStatus> {
        self.statuses
            .iter()
            .find(|s| s.workflow_status_id == workflow_status_id)
            .ok_or(WorkflowError::StatusNotFound(workflow_status_id))
    }

    pub fn resolve_state(&self, state: WorkflowState) -> WorkflowResult<&WorkflowStatus> {
        self.resolve(state.id())
    }

    /// Display stage for a status id, or `None` for ids outside the catalog
    pub fn visual_stage(&self, workflow_status_id: i32) -> Option<VisualStage> {
        match self.resolve(workflow_status_id) {
            Ok(status) => status.stage(),
            Err(_) => WorkflowState::try_from(workflow_status_id)
                .ok()
                .map(WorkflowState::visual_stage),
        }
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}
