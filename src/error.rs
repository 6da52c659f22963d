//! # Workflow Errors
//!
//! Single error taxonomy for the workflow core. Caller-facing variants are
//! recoverable and carry enough context for a UI to re-prompt; infrastructure
//! variants (`Database`, `Migration`, `Configuration`) propagate to the
//! boundary layer untouched.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Invalid operation: table {table} has no single-column primary key")]
    PrimaryKeyNotFound { table: String },

    #[error("Invalid operation: table {table} has no status column {column}")]
    StatusColumnNotFound { table: String, column: String },

    #[error("Record {record_id} not found in table {table}")]
    RecordNotFound { table: String, record_id: i64 },

    #[error("Screen workflow not found or inactive: {screen_code}")]
    ScreenNotFound { screen_code: String },

    #[error("Invalid screen code: {0:?}")]
    InvalidScreenCode(String),

    #[error("Screen workflow already registered: {screen_code}")]
    ScreenAlreadyRegistered { screen_code: String },

    #[error("Workflow status not found: {0}")]
    StatusNotFound(i32),

    #[error("Unknown workflow action: {0:?}")]
    UnknownAction(String),

    #[error("Action {action} is not valid from current status {current_status}")]
    InvalidTransition { action: String, current_status: i32 },

    #[error("Remarks are required for {action}")]
    RemarksRequired { action: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Concurrent modification of {entity}: status is no longer {expected_status}")]
    ConcurrentModification {
        entity: String,
        expected_status: i32,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl WorkflowError {
    /// True for the recoverable errors a caller is expected to act on.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            Self::Configuration(_) | Self::Database(_) | Self::Migration(_)
        )
    }

    /// Stable machine-readable code, used by the gateway.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTableName(_) => "invalid_table_name",
            Self::PrimaryKeyNotFound { .. } => "primary_key_not_found",
            Self::StatusColumnNotFound { .. } => "status_column_not_found",
            Self::RecordNotFound { .. } => "record_not_found",
            Self::ScreenNotFound { .. } => "screen_not_found",
            Self::InvalidScreenCode(_) => "invalid_screen_code",
            Self::ScreenAlreadyRegistered { .. } => "screen_already_registered",
            Self::StatusNotFound(_) => "status_not_found",
            Self::UnknownAction(_) => "unknown_action",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RemarksRequired { .. } => "remarks_required",
            Self::Unauthorized(_) => "unauthorized",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::Configuration(_) => "configuration_error",
            Self::Database(_) => "database_error",
            Self::Migration(_) => "migration_error",
        }
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
