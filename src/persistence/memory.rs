//! Process-local workflow store.
//!
//! Holds business-record statuses, screens and the audit trail behind one
//! `parking_lot` mutex, so every operation is atomic with respect to every
//! other. Conditional-update semantics match [`super::PgWorkflowStore`].
//! Used for embedding the engine without a database and throughout the test
//! suite.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{RecordTarget, TransitionCommit, WorkflowStore, WorkflowTarget};
use crate::access::AdminGrant;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::{validate_table_name, StatusField, TableBinding, TableRegistry};
use crate::models::{AuditEntry, NewScreenWorkflow, ScreenWorkflow, WorkflowStatus};

#[derive(Debug, Default)]
struct MemoryState {
    /// registry key -> record id -> status id
    records: HashMap<String, HashMap<i64, i32>>,
    screens: HashMap<i64, ScreenWorkflow>,
    audit: Vec<AuditEntry>,
    next_screen_id: i64,
    next_audit_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    registry: TableRegistry,
    state: Mutex<MemoryState>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Make a table available for record-level workflow
    pub fn register_table(&self, binding: TableBinding) {
        self.state
            .lock()
            .records
            .entry(binding.registry_key())
            .or_default();
        self.registry.register_binding(binding);
    }

    /// Insert or overwrite a business record with the given status
    pub fn insert_record(&self, table: &str, record_id: i64, status_id: i32) -> WorkflowResult<()> {
        let binding = self.binding_for(table)?;
        self.state
            .lock()
            .records
            .entry(binding.registry_key())
            .or_default()
            .insert(record_id, status_id);
        Ok(())
    }

    /// Insert a typed record whose table is registered through [`StatusField`]
    pub fn insert<T: StatusField>(&self, record: &T) -> WorkflowResult<()> {
        if !self.registry.contains(T::TABLE) {
            self.register_table(T::binding()?);
        }
        self.insert_record(T::TABLE, record.record_id(), record.status_id())
    }

    pub fn remove_record(&self, table: &str, record_id: i64) -> bool {
        self.state
            .lock()
            .records
            .get_mut(&table.to_ascii_lowercase())
            .and_then(|rows| rows.remove(&record_id))
            .is_some()
    }

    /// Raw status, bypassing the engine
    pub fn record_status(&self, table: &str, record_id: i64) -> Option<i32> {
        self.state
            .lock()
            .records
            .get(&table.to_ascii_lowercase())
            .and_then(|rows| rows.get(&record_id).copied())
    }

    /// Overwrite a record's status outside the workflow, as a concurrent writer would
    pub fn set_record_status(&self, table: &str, record_id: i64, status_id: i32) -> bool {
        match self
            .state
            .lock()
            .records
            .get_mut(&table.to_ascii_lowercase())
            .and_then(|rows| rows.get_mut(&record_id))
        {
            Some(status) => {
                *status = status_id;
                true
            }
            None => false,
        }
    }

    /// Total audit entries across all targets
    pub fn audit_len(&self) -> usize {
        self.state.lock().audit.len()
    }

    fn binding_for(&self, table: &str) -> WorkflowResult<TableBinding> {
        validate_table_name(table)?;
        self.registry
            .get(table)
            .ok_or_else(|| WorkflowError::PrimaryKeyNotFound {
                table: table.to_string(),
            })
    }
}

fn newest_first(mut entries: Vec<AuditEntry>) -> Vec<AuditEntry> {
    entries.sort_by(|a, b| {
        b.acted_at
            .cmp(&a.acted_at)
            .then_with(|| b.audit_id.cmp(&a.audit_id))
    });
    entries
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn resolve_record(&self, table: &str, record_id: i64) -> WorkflowResult<RecordTarget> {
        let binding = self.binding_for(table)?;
        let current_status_id = self
            .record_status(&binding.table, record_id)
            .ok_or_else(|| WorkflowError::RecordNotFound {
                table: binding.table.clone(),
                record_id,
            })?;

        Ok(RecordTarget {
            binding,
            record_id,
            current_status_id,
        })
    }

    async fn find_screen(&self, screen_code: &str) -> WorkflowResult<ScreenWorkflow> {
        self.state
            .lock()
            .screens
            .values()
            .find(|s| s.screen_code == screen_code && s.is_active)
            .cloned()
            .ok_or_else(|| WorkflowError::ScreenNotFound {
                screen_code: screen_code.to_string(),
            })
    }

    async fn register_screen(
        &self,
        new_screen: &NewScreenWorkflow,
        initial: &WorkflowStatus,
    ) -> WorkflowResult<ScreenWorkflow> {
        validate_table_name(&new_screen.table_name)?;

        let mut state = self.state.lock();
        if state
            .screens
            .values()
            .any(|s| s.screen_code == new_screen.screen_code)
        {
            return Err(WorkflowError::ScreenAlreadyRegistered {
                screen_code: new_screen.screen_code.clone(),
            });
        }

        state.next_screen_id += 1;
        let now = Utc::now().naive_utc();
        let screen = ScreenWorkflow {
            screen_workflow_id: state.next_screen_id,
            screen_code: new_screen.screen_code.clone(),
            current_status_id: initial.workflow_status_id,
            current_status_name: initial.status_name.clone(),
            table_name: new_screen.table_name.clone(),
            created_by: new_screen.created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.screens.insert(screen.screen_workflow_id, screen.clone());

        Ok(screen)
    }

    async fn deactivate_screen(&self, screen_code: &str) -> WorkflowResult<()> {
        let mut state = self.state.lock();
        let screen = state
            .screens
            .values_mut()
            .find(|s| s.screen_code == screen_code && s.is_active)
            .ok_or_else(|| WorkflowError::ScreenNotFound {
                screen_code: screen_code.to_string(),
            })?;

        screen.is_active = false;
        screen.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> WorkflowResult<AuditEntry> {
        let mut state = self.state.lock();
        let now = Utc::now().naive_utc();

        match &commit.target {
            WorkflowTarget::Record(record) => {
                let status = state
                    .records
                    .get_mut(&record.binding.registry_key())
                    .and_then(|rows| rows.get_mut(&record.record_id))
                    .ok_or_else(|| WorkflowError::RecordNotFound {
                        table: record.binding.table.clone(),
                        record_id: record.record_id,
                    })?;

                if *status != commit.from_status_id {
                    return Err(WorkflowError::ConcurrentModification {
                        entity: commit.target.describe(),
                        expected_status: commit.from_status_id,
                    });
                }
                *status = commit.to_status.workflow_status_id;
            }
            WorkflowTarget::Screen(target) => {
                let screen = state
                    .screens
                    .get_mut(&target.screen_workflow_id)
                    .filter(|s| s.is_active)
                    .ok_or_else(|| WorkflowError::ScreenNotFound {
                        screen_code: target.screen_code.clone(),
                    })?;

                if screen.current_status_id != commit.from_status_id {
                    return Err(WorkflowError::ConcurrentModification {
                        entity: commit.target.describe(),
                        expected_status: commit.from_status_id,
                    });
                }
                screen.current_status_id = commit.to_status.workflow_status_id;
                screen.current_status_name = commit.to_status.status_name.clone();
                screen.updated_at = now;
            }
        }

        state.next_audit_id += 1;
        let new_entry = commit.audit_entry();
        let entry = AuditEntry {
            audit_id: state.next_audit_id,
            table_name: new_entry.table_name,
            record_id: new_entry.record_id,
            action_name: new_entry.action_name,
            from_status_id: new_entry.from_status_id,
            to_status_id: new_entry.to_status_id,
            remarks: new_entry.remarks,
            acted_by: new_entry.acted_by,
            acted_at: now,
            screen_workflow_id: new_entry.screen_workflow_id,
        };
        state.audit.push(entry.clone());

        Ok(entry)
    }

    async fn record_history(
        &self,
        binding: &TableBinding,
        record_id: i64,
    ) -> WorkflowResult<Vec<AuditEntry>> {
        let state = self.state.lock();
        let entries = state
            .audit
            .iter()
            .filter(|e| {
                e.screen_workflow_id.is_none()
                    && e.record_id == record_id
                    && e.table_name.eq_ignore_ascii_case(&binding.table)
            })
            .cloned()
            .collect();
        Ok(newest_first(entries))
    }

    async fn screen_history(&self, screen_workflow_id: i64) -> WorkflowResult<Vec<AuditEntry>> {
        let state = self.state.lock();
        let entries = state
            .audit
            .iter()
            .filter(|e| e.screen_workflow_id == Some(screen_workflow_id))
            .cloned()
            .collect();
        Ok(newest_first(entries))
    }

    async fn reset_screen(
        &self,
        screen: &ScreenWorkflow,
        status: &WorkflowStatus,
        grant: &AdminGrant,
    ) -> WorkflowResult<u64> {
        let mut state = self.state.lock();

        let target = state
            .screens
            .get_mut(&screen.screen_workflow_id)
            .ok_or_else(|| WorkflowError::ScreenNotFound {
                screen_code: screen.screen_code.clone(),
            })?;
        target.current_status_id = status.workflow_status_id;
        target.current_status_name = status.status_name.clone();
        target.updated_at = Utc::now().naive_utc();

        let before = state.audit.len();
        state
            .audit
            .retain(|e| e.screen_workflow_id != Some(screen.screen_workflow_id));
        let purged = (before - state.audit.len()) as u64;

        tracing::warn!(
            screen_workflow_id = screen.screen_workflow_id,
            purged = purged,
            administrator = grant.user_id(),
            "Purged screen audit trail"
        );

        Ok(purged)
    }
}
