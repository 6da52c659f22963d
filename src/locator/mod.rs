//! # Dynamic Record Locator
//!
//! Reads and writes the status column of business tables the engine has no
//! compile-time knowledge of.
//!
//! ## Resolution
//!
//! A table participates in record-level workflow through a [`TableBinding`]
//! (table, single-column key, numeric status column). Bindings come from two
//! places, in order:
//!
//! 1. **Static registration**: a record type implements [`StatusField`] and is
//!    registered with [`TableRegistry::register`].
//! 2. **Catalog fallback**: [`RecordLocator`] queries `information_schema` for
//!    the primary key and status column, then caches the binding in the
//!    registry.
//!
//! Call sites never see which path produced the binding.
//!
//! ## Injection Safety
//!
//! Table and column names are checked against `^[A-Za-z][A-Za-z0-9_]*$`
//! before they are interpolated (quoted) into SQL. Record ids and status
//! values are always bound parameters.

pub mod record_locator;

pub use record_locator::RecordLocator;

use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::constants::{DEFAULT_STATUS_COLUMN, IDENTIFIER_PATTERN, MAX_IDENTIFIER_LENGTH};
use crate::error::{WorkflowError, WorkflowResult};
use crate::state_machine::WorkflowState;

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX.get_or_init(|| {
        Regex::new(IDENTIFIER_PATTERN).unwrap_or_else(|e| unreachable!("static pattern: {e}"))
    })
}

/// True when `name` is safe to interpolate as a SQL identifier
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LENGTH && identifier_regex().is_match(name)
}

/// Reject unsafe table names before any query is built
pub fn validate_table_name(name: &str) -> WorkflowResult<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTableName(name.to_string()))
    }
}

/// Double-quote a validated identifier
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{name}\"")
}

/// How to find and mutate the status of one business table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableBinding {
    pub table: String,
    pub key_column: String,
    pub status_column: String,
}

impl TableBinding {
    pub fn new(
        table: impl Into<String>,
        key_column: impl Into<String>,
        status_column: impl Into<String>,
    ) -> WorkflowResult<Self> {
        let binding = Self {
            table: table.into(),
            key_column: key_column.into(),
            status_column: status_column.into(),
        };

        for identifier in [&binding.table, &binding.key_column, &binding.status_column] {
            validate_table_name(identifier)?;
        }

        Ok(binding)
    }

    /// Registry key; PostgreSQL folds unquoted names to lower case
    pub fn registry_key(&self) -> String {
        self.table.to_ascii_lowercase()
    }
}

/// A business record type whose rows carry a workflow status.
///
/// ```rust
/// use statportal_workflow::locator::StatusField;
///
/// struct GdpQuarterly {
///     gdp_quarterly_id: i64,
///     workflow_status_id: i32,
/// }
///
/// impl StatusField for GdpQuarterly {
///     const TABLE: &'static str = "gdp_quarterly";
///     const KEY_COLUMN: &'static str = "gdp_quarterly_id";
///
///     fn record_id(&self) -> i64 {
///         self.gdp_quarterly_id
///     }
///     fn status_id(&self) -> i32 {
///         self.workflow_status_id
///     }
///     fn set_status_id(&mut self, status_id: i32) {
///         self.workflow_status_id = status_id;
///     }
/// }
/// ```
pub trait StatusField {
    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    const STATUS_COLUMN: &'static str = DEFAULT_STATUS_COLUMN;

    fn record_id(&self) -> i64;
    fn status_id(&self) -> i32;
    fn set_status_id(&mut self, status_id: i32);

    fn workflow_state(&self) -> Option<WorkflowState> {
        WorkflowState::try_from(self.status_id()).ok()
    }

    fn binding() -> WorkflowResult<TableBinding>
    where
        Self: Sized,
    {
        TableBinding::new(Self::TABLE, Self::KEY_COLUMN, Self::STATUS_COLUMN)
    }
}

/// Thread-safe binding registry keyed by lower-cased table name
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    bindings: Arc<DashMap<String, TableBinding>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: StatusField>(&self) -> WorkflowResult<TableBinding> {
        let binding = T::binding()?;
        self.register_binding(binding.clone());
        Ok(binding)
    }

    pub fn register_binding(&self, binding: TableBinding) {
        tracing::debug!(
            table = %binding.table,
            key_column = %binding.key_column,
            status_column = %binding.status_column,
            "Registered workflow table binding"
        );
        self.bindings.insert(binding.registry_key(), binding);
    }

    pub fn get(&self, table: &str) -> Option<TableBinding> {
        self.bindings
            .get(&table.to_ascii_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.bindings.contains_key(&table.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
