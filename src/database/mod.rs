//! # Database Operations
//!
//! Connection pooling and the embedded schema migrations for the workflow
//! tables (`workflow_statuses`, `screen_workflows`,
//! `workflow_audit_entries`).
//!
//! ```rust,no_run
//! use statportal_workflow::config::WorkflowConfig;
//! use statportal_workflow::database::DatabaseConnection;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkflowConfig::load()?;
//! let db = DatabaseConnection::connect(&config.database).await?;
//! db.migrate().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;

pub use connection::{DatabaseConnection, MIGRATOR};
