//! PostgreSQL-backed record locator.

use sqlx::{PgExecutor, PgPool};

use super::{quote_identifier, validate_table_name, TableBinding, TableRegistry};
use crate::config::LocatorConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::state_machine::WorkflowState;

#[derive(Debug, Clone)]
pub struct RecordLocator {
    pool: PgPool,
    registry: TableRegistry,
    config: LocatorConfig,
}

impl RecordLocator {
    pub fn new(pool: PgPool, registry: TableRegistry, config: LocatorConfig) -> Self {
        Self {
            pool,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Binding for `table`: registry first, then the catalog when enabled
    pub async fn resolve_binding(&self, table: &str) -> WorkflowResult<TableBinding> {
        validate_table_name(table)?;

        if let Some(binding) = self.registry.get(table) {
            return Ok(binding);
        }

        if !self.config.catalog_fallback {
            return Err(WorkflowError::PrimaryKeyNotFound {
                table: table.to_string(),
            });
        }

        let (table_name, key_column) = self.find_primary_key_column(table).await?;
        let status_column = self.find_status_column(&table_name).await?;
        let binding = TableBinding::new(table_name, key_column, status_column)?;

        tracing::info!(
            table = %binding.table,
            key_column = %binding.key_column,
            "Resolved workflow table through catalog"
        );
        self.registry.register_binding(binding.clone());

        Ok(binding)
    }

    /// Single primary-key column of `table`, with the table's catalog name.
    /// Composite or missing keys are `PrimaryKeyNotFound`.
    pub async fn find_primary_key_column(&self, table: &str) -> WorkflowResult<(String, String)> {
        validate_table_name(table)?;

        let key_columns: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT kcu.table_name::text, kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_name = tc.constraint_name
             AND kcu.constraint_schema = tc.constraint_schema
             AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = $1
              AND lower(tc.table_name) = lower($2)
            ORDER BY kcu.ordinal_position
            "#,
        )
        .bind(&self.config.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        match key_columns.as_slice() {
            [single] => Ok(single.clone()),
            _ => {
                tracing::debug!(
                    table = table,
                    key_columns = key_columns.len(),
                    "Table has no single-column primary key"
                );
                Err(WorkflowError::PrimaryKeyNotFound {
                    table: table.to_string(),
                })
            }
        }
    }

    async fn find_status_column(&self, table_name: &str) -> WorkflowResult<String> {
        let column: Option<String> = sqlx::query_scalar(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = $1
              AND table_name = $2
              AND lower(column_name) = lower($3)
            LIMIT 1
            "#,
        )
        .bind(&self.config.schema)
        .bind(table_name)
        .bind(&self.config.status_column)
        .fetch_optional(&self.pool)
        .await?;

        column.ok_or_else(|| WorkflowError::StatusColumnNotFound {
            table: table_name.to_string(),
            column: self.config.status_column.clone(),
        })
    }

    fn qualified_table(&self, binding: &TableBinding) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.config.schema),
            quote_identifier(&binding.table)
        )
    }

    /// Current status of one record; `None` when the row does not exist.
    /// A NULL status reads as Maker Entry.
    pub async fn read_current_status<'e>(
        &self,
        executor: impl PgExecutor<'e>,
        binding: &TableBinding,
        record_id: i64,
    ) -> WorkflowResult<Option<i32>> {
        let sql = format!(
            "SELECT COALESCE({status}::integer, {default}) FROM {table} WHERE {key} = $1::bigint",
            status = quote_identifier(&binding.status_column),
            default = WorkflowState::default().id(),
            table = self.qualified_table(binding),
            key = quote_identifier(&binding.key_column),
        );

        let status: Option<i32> = sqlx::query_scalar(&sql)
            .bind(record_id)
            .fetch_optional(executor)
            .await?;

        Ok(status)
    }

    /// Conditional status write: succeeds only while the row still holds
    /// `expected_status_id`. Returns rows affected (0 or 1).
    pub async fn write_status_if<'e>(
        &self,
        executor: impl PgExecutor<'e>,
        binding: &TableBinding,
        record_id: i64,
        expected_status_id: i32,
        new_status_id: i32,
    ) -> WorkflowResult<u64> {
        let sql = format!(
            "UPDATE {table} SET {status} = $1 \
             WHERE {key} = $2::bigint AND COALESCE({status}::integer, {default}) = $3",
            table = self.qualified_table(binding),
            status = quote_identifier(&binding.status_column),
            key = quote_identifier(&binding.key_column),
            default = WorkflowState::default().id(),
        );

        let result = sqlx::query(&sql)
            .bind(new_status_id)
            .bind(record_id)
            .bind(expected_status_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
