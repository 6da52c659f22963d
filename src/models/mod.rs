pub mod audit_entry;
pub mod screen_workflow;
pub mod workflow_status;

// Re-export core models for easy access
pub use audit_entry::{AuditEntry, NewAuditEntry, SCREEN_RECORD_ID};
pub use screen_workflow::{NewScreenWorkflow, ScreenWorkflow};
pub use workflow_status::WorkflowStatus;
