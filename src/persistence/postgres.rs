//! PostgreSQL workflow store.
//!
//! Every mutating operation runs in a single sqlx transaction. A conditional
//! update that touches zero rows rolls the transaction back before any audit
//! row is written.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RecordTarget, TransitionCommit, WorkflowStore, WorkflowTarget};
use crate::access::AdminGrant;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::{validate_table_name, RecordLocator, TableBinding};
use crate::models::{AuditEntry, NewScreenWorkflow, ScreenWorkflow, WorkflowStatus};

#[derive(Debug, Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
    locator: RecordLocator,
}

impl PgWorkflowStore {
    pub fn new(pool: PgPool, locator: RecordLocator) -> Self {
        Self { pool, locator }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn locator(&self) -> &RecordLocator {
        &self.locator
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn resolve_record(&self, table: &str, record_id: i64) -> WorkflowResult<RecordTarget> {
        let binding = self.locator.resolve_binding(table).await?;

        let current_status_id = self
            .locator
            .read_current_status(&self.pool, &binding, record_id)
            .await?
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
        ScreenWorkflow::find_by_screen_code(&self.pool, screen_code)
            .await?
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

        ScreenWorkflow::create(&self.pool, new_screen, initial)
            .await?
            .ok_or_else(|| WorkflowError::ScreenAlreadyRegistered {
                screen_code: new_screen.screen_code.clone(),
            })
    }

    async fn deactivate_screen(&self, screen_code: &str) -> WorkflowResult<()> {
        match ScreenWorkflow::deactivate(&self.pool, screen_code).await? {
            0 => Err(WorkflowError::ScreenNotFound {
                screen_code: screen_code.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> WorkflowResult<AuditEntry> {
        let mut tx = self.pool.begin().await?;

        let rows_affected = match &commit.target {
            WorkflowTarget::Record(record) => {
                self.locator
                    .write_status_if(
                        &mut *tx,
                        &record.binding,
                        record.record_id,
                        commit.from_status_id,
                        commit.to_status.workflow_status_id,
                    )
                    .await?
            }
            WorkflowTarget::Screen(screen) => {
                ScreenWorkflow::update_status_if(
                    &mut *tx,
                    screen.screen_workflow_id,
                    commit.from_status_id,
                    &commit.to_status,
                )
                .await?
            }
        };

        if rows_affected != 1 {
            // Distinguish a vanished entity from a lost race before giving up
            let still_present = match &commit.target {
                WorkflowTarget::Record(record) => self
                    .locator
                    .read_current_status(&mut *tx, &record.binding, record.record_id)
                    .await?
                    .is_some(),
                WorkflowTarget::Screen(screen) => {
                    ScreenWorkflow::find_by_id(&mut *tx, screen.screen_workflow_id)
                        .await?
                        .is_some_and(|s| s.is_active)
                }
            };
            tx.rollback().await?;

            return Err(match (&commit.target, still_present) {
                (_, true) => WorkflowError::ConcurrentModification {
                    entity: commit.target.describe(),
                    expected_status: commit.from_status_id,
                },
                (WorkflowTarget::Record(record), false) => WorkflowError::RecordNotFound {
                    table: record.binding.table.clone(),
                    record_id: record.record_id,
                },
                (WorkflowTarget::Screen(screen), false) => WorkflowError::ScreenNotFound {
                    screen_code: screen.screen_code.clone(),
                },
            });
        }

        let entry = AuditEntry::append(&mut *tx, &commit.audit_entry()).await?;
        tx.commit().await?;

        Ok(entry)
    }

    async fn record_history(
        &self,
        binding: &TableBinding,
        record_id: i64,
    ) -> WorkflowResult<Vec<AuditEntry>> {
        Ok(AuditEntry::list_for_record(&self.pool, &binding.table, record_id).await?)
    }

    async fn screen_history(&self, screen_workflow_id: i64) -> WorkflowResult<Vec<AuditEntry>> {
        Ok(AuditEntry::list_for_screen(&self.pool, screen_workflow_id).await?)
    }

    async fn reset_screen(
        &self,
        screen: &ScreenWorkflow,
        status: &WorkflowStatus,
        grant: &AdminGrant,
    ) -> WorkflowResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Forcing the status first takes the row lock, so a transition in
        // flight either commits before the purge sees its audit row or
        // fails its conditional write after the reset commits.
        if ScreenWorkflow::force_status(&mut *tx, screen.screen_workflow_id, status).await? == 0 {
            tx.rollback().await?;
            return Err(WorkflowError::ScreenNotFound {
                screen_code: screen.screen_code.clone(),
            });
        }

        let purged =
            AuditEntry::purge_for_screen(&mut *tx, screen.screen_workflow_id, grant).await?;

        tx.commit().await?;
        Ok(purged)
    }
}
