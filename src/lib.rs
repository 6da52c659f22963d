#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Statistical Portal Workflow Core
//!
//! Maker-checker-approver workflow engine for the statistical data
//! publishing portal.
//!
//! ## Overview
//!
//! Department staff (makers) enter tabular statistics; a checker and a
//! department head must approve each dataset before it counts as published.
//! This crate owns the approval status of those datasets:
//!
//! - a fixed status graph shared by **record-level** workflows (status lives
//!   on an arbitrary business table) and **screen-level** workflows (status
//!   lives on a `screen_workflows` row)
//! - an append-only audit trail of every transition
//! - a dynamic record locator that mutates status on tables unknown at
//!   compile time
//!
//! ## Module Organization
//!
//! - [`state_machine`] - statuses, actions and the transition table
//! - [`catalog`] - read-only status reference data
//! - [`models`] - status, screen workflow and audit entry rows
//! - [`locator`] - table bindings and the catalog-backed record locator
//! - [`persistence`] - the `WorkflowStore` seam and its implementations
//! - [`engine`] - the workflow engine
//! - [`gateway`] - caller resolution and error masking for the boundary layer
//! - [`config`], [`logging`], [`database`], [`error`] - ambient plumbing
//!
//! ## Quick Start
//!
//! ```rust
//! use statportal_workflow::{InMemoryWorkflowStore, StatusCatalog, TableBinding, WorkflowEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryWorkflowStore::new();
//! store.register_table(TableBinding::new("gdp_quarterly", "gdp_quarterly_id", "workflow_status_id")?);
//! store.insert_record("gdp_quarterly", 1, 1)?;
//!
//! let engine = WorkflowEngine::new(store, StatusCatalog::canonical());
//! let result = engine
//!     .execute_action("gdp_quarterly", 1, "SubmitToChecker", None, 42)
//!     .await?;
//! assert_eq!(result.new_status_id, 2);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod database;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod locator;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod state_machine;

pub use access::{Actor, AdminGrant};
pub use catalog::StatusCatalog;
pub use config::WorkflowConfig;
pub use engine::{TransitionResult, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
pub use gateway::{ActorDirectory, ConfiguredAdministrators, GatewayError, WorkflowGateway};
pub use locator::{validate_table_name, RecordLocator, StatusField, TableBinding, TableRegistry};
pub use models::{AuditEntry, ScreenWorkflow, WorkflowStatus};
pub use persistence::{InMemoryWorkflowStore, PgWorkflowStore, WorkflowStore, WorkflowTarget};
pub use state_machine::{VisualStage, WorkflowAction, WorkflowState};
