//! # Workflow Audit Entry Model
//!
//! Append-only log of executed transitions.
//!
//! ## Overview
//!
//! Every successful action writes exactly one row, inside the same
//! transaction as the status change it describes. Record-level entries are
//! keyed by `(table_name, record_id)` with no screen link; screen-level
//! entries carry `screen_workflow_id` and use `record_id = 0`.
//!
//! Rows are never updated (a trigger rejects `UPDATE`). The single deletion
//! path is [`AuditEntry::purge_for_screen`], which requires an
//! [`AdminGrant`].
//!
//! ## Database Schema
//!
//! Maps to `workflow_audit_entries`:
//! ```sql
//! CREATE TABLE workflow_audit_entries (
//!   audit_id BIGSERIAL PRIMARY KEY,
//!   table_name VARCHAR(128) NOT NULL,
//!   record_id BIGINT NOT NULL DEFAULT 0,
//!   action_name VARCHAR(50) NOT NULL,
//!   from_status_id INTEGER,
//!   to_status_id INTEGER NOT NULL,
//!   remarks TEXT,
//!   acted_by BIGINT NOT NULL,
//!   acted_at TIMESTAMP NOT NULL DEFAULT NOW(),
//!   screen_workflow_id BIGINT REFERENCES screen_workflows
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::access::AdminGrant;

/// Record id stored on screen-level entries
pub const SCREEN_RECORD_ID: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub audit_id: i64,
    pub table_name: String,
    pub record_id: i64,
    pub action_name: String,
    pub from_status_id: Option<i32>,
    pub to_status_id: i32,
    pub remarks: Option<String>,
    pub acted_by: i64,
    pub acted_at: NaiveDateTime,
    pub screen_workflow_id: Option<i64>,
}

/// New AuditEntry for creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub table_name: String,
    pub record_id: i64,
    pub action_name: String,
    pub from_status_id: Option<i32>,
    pub to_status_id: i32,
    pub remarks: Option<String>,
    pub acted_by: i64,
    pub screen_workflow_id: Option<i64>,
}

impl AuditEntry {
    /// Append one entry. Callers run this inside the transaction that
    /// changes the status it records.
    pub async fn append<'e>(
        executor: impl PgExecutor<'e>,
        new_entry: &NewAuditEntry,
    ) -> Result<AuditEntry, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO workflow_audit_entries
                (table_name, record_id, action_name, from_status_id, to_status_id,
                 remarks, acted_by, screen_workflow_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING audit_id, table_name, record_id, action_name, from_status_id,
                      to_status_id, remarks, acted_by, acted_at, screen_workflow_id
            "#,
        )
        .bind(&new_entry.table_name)
        .bind(new_entry.record_id)
        .bind(&new_entry.action_name)
        .bind(new_entry.from_status_id)
        .bind(new_entry.to_status_id)
        .bind(&new_entry.remarks)
        .bind(new_entry.acted_by)
        .bind(new_entry.screen_workflow_id)
        .fetch_one(executor)
        .await
    }

    /// Record-level history, newest first
    pub async fn list_for_record<'e>(
        executor: impl PgExecutor<'e>,
        table_name: &str,
        record_id: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT audit_id, table_name, record_id, action_name, from_status_id,
                   to_status_id, remarks, acted_by, acted_at, screen_workflow_id
            FROM workflow_audit_entries
            WHERE lower(table_name) = lower($1)
              AND record_id = $2
              AND screen_workflow_id IS NULL
            ORDER BY acted_at DESC, audit_id DESC
            "#,
        )
        .bind(table_name)
        .bind(record_id)
        .fetch_all(executor)
        .await
    }

    /// Screen-level history, newest first
    pub async fn list_for_screen<'e>(
        executor: impl PgExecutor<'e>,
        screen_workflow_id: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT audit_id, table_name, record_id, action_name, from_status_id,
                   to_status_id, remarks, acted_by, acted_at, screen_workflow_id
            FROM workflow_audit_entries
            WHERE screen_workflow_id = $1
            ORDER BY acted_at DESC, audit_id DESC
            "#,
        )
        .bind(screen_workflow_id)
        .fetch_all(executor)
        .await
    }

    /// Delete every entry linked to a screen. This is the only exception to
    /// the append-only rule and is reachable solely through the
    /// administrative reset.
    pub async fn purge_for_screen<'e>(
        executor: impl PgExecutor<'e>,
        screen_workflow_id: i64,
        grant: &AdminGrant,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM workflow_audit_entries
            WHERE screen_workflow_id = $1
            "#,
        )
        .bind(screen_workflow_id)
        .execute(executor)
        .await?;

        tracing::warn!(
            screen_workflow_id = screen_workflow_id,
            purged = result.rows_affected(),
            administrator = grant.user_id(),
            "Purged screen audit trail"
        );

        Ok(result.rows_affected())
    }
}
