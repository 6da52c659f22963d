//! # Workflow Engine
//!
//! Stateless request handler for the maker-checker-approver status graph.
//!
//! ## Transition Algorithm
//!
//! For both record-level and screen-level targets:
//!
//! 1. Validate the table name (record-level) and parse the action
//!    (`InvalidTableName`, `UnknownAction`)
//! 2. Locate the target and read its current status
//! 3. Plan the transition against the fixed table (`InvalidTransition`,
//!    `RemarksRequired`)
//! 4. Resolve the new status through the catalog
//! 5. Commit: conditional status write plus audit append in one atomic unit
//!    (`ConcurrentModification` when the status moved since step 2)
//!
//! Nothing is written unless every step succeeds. The engine never retries;
//! callers decide how to handle each error.

mod result;

pub use result::TransitionResult;

use std::time::Instant;

use crate::access::Actor;
use crate::catalog::StatusCatalog;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::validate_table_name;
use crate::logging::{log_screen_reset, log_transition};
use crate::models::{AuditEntry, NewScreenWorkflow, ScreenWorkflow, WorkflowStatus};
use crate::persistence::{TransitionCommit, WorkflowStore, WorkflowTarget};
use crate::state_machine::{available_actions, plan_transition, WorkflowAction, WorkflowState};

pub struct WorkflowEngine<S> {
    store: S,
    catalog: StatusCatalog,
}

impl<S: WorkflowStore> WorkflowEngine<S> {
    pub fn new(store: S, catalog: StatusCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    /// Active statuses in display order
    pub fn list_statuses(&self) -> Vec<WorkflowStatus> {
        self.catalog.list_active()
    }

    /// Actions valid from `status_id`, for deciding what a caller may offer
    pub fn available_actions(&self, status_id: i32) -> Vec<WorkflowAction> {
        available_actions(status_id)
    }

    // ----- record-level -----

    pub async fn execute_action(
        &self,
        table: &str,
        record_id: i64,
        action: &str,
        remarks: Option<&str>,
        actor_id: i64,
    ) -> WorkflowResult<TransitionResult> {
        validate_table_name(table)?;
        let action: WorkflowAction = action.parse()?;

        let record = self.store.resolve_record(table, record_id).await?;
        self.transition(WorkflowTarget::Record(record), action, remarks, actor_id)
            .await
    }

    pub async fn get_audit_history(
        &self,
        table: &str,
        record_id: i64,
    ) -> WorkflowResult<Vec<AuditEntry>> {
        validate_table_name(table)?;
        let record = self.store.resolve_record(table, record_id).await?;
        self.store.record_history(&record.binding, record_id).await
    }

    pub async fn get_current_status(&self, table: &str, record_id: i64) -> WorkflowResult<i32> {
        validate_table_name(table)?;
        let record = self.store.resolve_record(table, record_id).await?;
        Ok(record.current_status_id)
    }

    // ----- screen-level -----

    pub async fn execute_screen_action(
        &self,
        screen_code: &str,
        action: &str,
        remarks: Option<&str>,
        actor_id: i64,
    ) -> WorkflowResult<TransitionResult> {
        let action: WorkflowAction = action.parse()?;

        let screen = self.store.find_screen(screen_code).await?;
        self.transition(WorkflowTarget::Screen(screen), action, remarks, actor_id)
            .await
    }

    pub async fn get_screen_audit_history(&self, screen_code: &str) -> WorkflowResult<Vec<AuditEntry>> {
        let screen = self.store.find_screen(screen_code).await?;
        self.store.screen_history(screen.screen_workflow_id).await
    }

    pub async fn get_screen_current_status(&self, screen_code: &str) -> WorkflowResult<i32> {
        let screen = self.store.find_screen(screen_code).await?;
        Ok(screen.current_status_id)
    }

    pub async fn get_screen(&self, screen_code: &str) -> WorkflowResult<ScreenWorkflow> {
        self.store.find_screen(screen_code).await
    }

    /// Register a screen at Maker Entry
    pub async fn register_screen(
        &self,
        screen_code: &str,
        table_name: &str,
        creator_id: i64,
    ) -> WorkflowResult<ScreenWorkflow> {
        validate_table_name(table_name)?;
        let screen_code = screen_code.trim();
        if screen_code.is_empty() {
            return Err(WorkflowError::InvalidScreenCode(screen_code.to_string()));
        }

        let initial = self.catalog.resolve_state(WorkflowState::MakerEntry)?;
        let new_screen = NewScreenWorkflow {
            screen_code: screen_code.to_string(),
            table_name: table_name.to_string(),
            created_by: creator_id,
        };

        let screen = self.store.register_screen(&new_screen, initial).await?;
        tracing::info!(
            screen_code = %screen.screen_code,
            screen_workflow_id = screen.screen_workflow_id,
            table = %screen.table_name,
            created_by = creator_id,
            "Screen workflow registered"
        );
        Ok(screen)
    }

    /// Soft-retire a screen; administrator only
    pub async fn deactivate_screen(&self, screen_code: &str, actor: &Actor) -> WorkflowResult<()> {
        actor.admin_grant()?;
        self.store.deactivate_screen(screen_code).await?;

        tracing::info!(
            screen_code = screen_code,
            administrator = actor.user_id,
            "Screen workflow deactivated"
        );
        Ok(())
    }

    /// Purge a screen's audit trail and force it back to Maker Entry,
    /// bypassing the transition table. No audit entry is written.
    pub async fn reset_screen_workflow(
        &self,
        screen_code: &str,
        actor: &Actor,
    ) -> WorkflowResult<TransitionResult> {
        let grant = actor.admin_grant()?;
        let screen = self.store.find_screen(screen_code).await?;
        let initial = self.catalog.resolve_state(WorkflowState::MakerEntry)?;

        let purged = self.store.reset_screen(&screen, initial, &grant).await?;
        log_screen_reset(
            &screen.screen_code,
            screen.screen_workflow_id,
            screen.current_status_id,
            purged,
            actor.user_id,
        );

        Ok(TransitionResult::reset(initial, purged))
    }

    // ----- shared -----

    async fn transition(
        &self,
        target: WorkflowTarget,
        action: WorkflowAction,
        remarks: Option<&str>,
        actor_id: i64,
    ) -> WorkflowResult<TransitionResult> {
        let started = Instant::now();
        let from_status_id = target.current_status_id();

        let planned = plan_transition(from_status_id, action, remarks).map_err(|err| {
            tracing::debug!(
                entity = %target.describe(),
                action = %action,
                current_status = from_status_id,
                error = %err,
                "Transition rejected"
            );
            err
        })?;
        let to_status = self.catalog.resolve_state(planned.to)?.clone();

        let commit = TransitionCommit {
            target,
            action,
            from_status_id,
            to_status,
            remarks: planned.remarks,
            actor_id,
        };
        let entry = self.store.commit_transition(&commit).await?;

        log_transition(
            &commit.target.describe(),
            action.name(),
            from_status_id,
            commit.to_status.workflow_status_id,
            actor_id,
            entry.audit_id,
            started.elapsed().as_millis() as u64,
        );

        Ok(TransitionResult::applied(action, &commit.to_status, &entry))
    }
}
