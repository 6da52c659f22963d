//! # Screen Workflow Model
//!
//! One row per logical data-entry screen, holding the screen's approval
//! status independently of any business record.
//!
//! `current_status_name` is a denormalized cache of the catalog name; the
//! id is authoritative. Status changes go through
//! [`ScreenWorkflow::update_status_if`], a conditional update keyed on the
//! status the caller validated against, so two racing transitions cannot
//! both succeed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use super::workflow_status::WorkflowStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScreenWorkflow {
    pub screen_workflow_id: i64,
    pub screen_code: String,
    pub current_status_id: i32,
    pub current_status_name: String,
    pub table_name: String,
    pub created_by: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New ScreenWorkflow for registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScreenWorkflow {
    pub screen_code: String,
    pub table_name: String,
    pub created_by: i64,
}

impl ScreenWorkflow {
    /// Register a screen at `initial`. Returns `None` when the screen code is
    /// already taken (active or retired).
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        new_screen: &NewScreenWorkflow,
        initial: &WorkflowStatus,
    ) -> Result<Option<ScreenWorkflow>, sqlx::Error> {
        sqlx::query_as::<_, ScreenWorkflow>(
            r#"
            INSERT INTO screen_workflows
                (screen_code, current_status_id, current_status_name, table_name, created_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (screen_code) DO NOTHING
            RETURNING screen_workflow_id, screen_code, current_status_id, current_status_name,
                      table_name, created_by, is_active, created_at, updated_at
            "#,
        )
        .bind(&new_screen.screen_code)
        .bind(initial.workflow_status_id)
        .bind(&initial.status_name)
        .bind(&new_screen.table_name)
        .bind(new_screen.created_by)
        .fetch_optional(executor)
        .await
    }

    /// Active screen by its unique code
    pub async fn find_by_screen_code<'e>(
        executor: impl PgExecutor<'e>,
        screen_code: &str,
    ) -> Result<Option<ScreenWorkflow>, sqlx::Error> {
        sqlx::query_as::<_, ScreenWorkflow>(
            r#"
            SELECT screen_workflow_id, screen_code, current_status_id, current_status_name,
                   table_name, created_by, is_active, created_at, updated_at
            FROM screen_workflows
            WHERE screen_code = $1 AND is_active = true
            "#,
        )
        .bind(screen_code)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        screen_workflow_id: i64,
    ) -> Result<Option<ScreenWorkflow>, sqlx::Error> {
        sqlx::query_as::<_, ScreenWorkflow>(
            r#"
            SELECT screen_workflow_id, screen_code, current_status_id, current_status_name,
                   table_name, created_by, is_active, created_at, updated_at
            FROM screen_workflows
            WHERE screen_workflow_id = $1
            "#,
        )
        .bind(screen_workflow_id)
        .fetch_optional(executor)
        .await
    }

    /// Move an active screen from `expected_status_id` to `new_status`.
    /// Returns rows affected: 0 means the screen moved, retired or vanished.
    pub async fn update_status_if<'e>(
        executor: impl PgExecutor<'e>,
        screen_workflow_id: i64,
        expected_status_id: i32,
        new_status: &WorkflowStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE screen_workflows
            SET current_status_id = $1, current_status_name = $2, updated_at = NOW()
            WHERE screen_workflow_id = $3
              AND current_status_id = $4
              AND is_active = true
            "#,
        )
        .bind(new_status.workflow_status_id)
        .bind(&new_status.status_name)
        .bind(screen_workflow_id)
        .bind(expected_status_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Unconditional status overwrite, used only by the administrative reset
    pub async fn force_status<'e>(
        executor: impl PgExecutor<'e>,
        screen_workflow_id: i64,
        status: &WorkflowStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE screen_workflows
            SET current_status_id = $1, current_status_name = $2, updated_at = NOW()
            WHERE screen_workflow_id = $3
            "#,
        )
        .bind(status.workflow_status_id)
        .bind(&status.status_name)
        .bind(screen_workflow_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Soft-retire a screen
    pub async fn deactivate<'e>(
        executor: impl PgExecutor<'e>,
        screen_code: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE screen_workflows
            SET is_active = false, updated_at = NOW()
            WHERE screen_code = $1 AND is_active = true
            "#,
        )
        .bind(screen_code)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
