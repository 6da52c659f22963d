//! # Workflow Gateway
//!
//! Boundary between transport/session code and the engine. The gateway
//! resolves who is calling through an [`ActorDirectory`] and translates
//! engine errors for end users:
//!
//! - caller errors keep their message and a stable code
//! - infrastructure errors are logged in full and replaced by a generic
//!   `internal_error` so no store detail leaks out

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::access::Actor;
use crate::config::SecurityConfig;
use crate::engine::{TransitionResult, WorkflowEngine};
use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::log_error;
use crate::models::{AuditEntry, WorkflowStatus};
use crate::persistence::WorkflowStore;

/// Resolves an authenticated user id into an [`Actor`]
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn resolve_actor(&self, user_id: i64) -> WorkflowResult<Actor>;
}

/// Directory backed by the configured administrator list
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAdministrators {
    administrator_ids: HashSet<i64>,
}

impl ConfiguredAdministrators {
    pub fn new(administrator_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            administrator_ids: administrator_ids.into_iter().collect(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.administrator_ids.iter().copied())
    }
}

#[async_trait]
impl ActorDirectory for ConfiguredAdministrators {
    async fn resolve_actor(&self, user_id: i64) -> WorkflowResult<Actor> {
        Ok(Actor {
            user_id,
            administrator: self.administrator_ids.contains(&user_id),
        })
    }
}

/// Error payload safe to return to an end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayError {
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

pub type GatewayResult<T> = Result<T, GatewayError>;

const INTERNAL_ERROR_MESSAGE: &str = "The workflow operation could not be completed. Please try again later.";

fn to_gateway_error(operation: &str, err: WorkflowError) -> GatewayError {
    if err.is_caller_error() {
        tracing::debug!(operation = operation, code = err.code(), error = %err, "Workflow request refused");
        GatewayError {
            code: err.code(),
            message: err.to_string(),
        }
    } else {
        log_error("workflow_gateway", operation, &err.to_string(), None);
        GatewayError {
            code: "internal_error",
            message: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

pub struct WorkflowGateway<S, D> {
    engine: Arc<WorkflowEngine<S>>,
    directory: D,
}

impl<S: WorkflowStore, D: ActorDirectory> WorkflowGateway<S, D> {
    pub fn new(engine: Arc<WorkflowEngine<S>>, directory: D) -> Self {
        Self { engine, directory }
    }

    pub fn engine(&self) -> &Arc<WorkflowEngine<S>> {
        &self.engine
    }

    async fn actor(&self, operation: &str, user_id: i64) -> GatewayResult<Actor> {
        self.directory
            .resolve_actor(user_id)
            .await
            .map_err(|err| to_gateway_error(operation, err))
    }

    pub async fn execute_action(
        &self,
        user_id: i64,
        table: &str,
        record_id: i64,
        action: &str,
        remarks: Option<&str>,
    ) -> GatewayResult<TransitionResult> {
        let actor = self.actor("execute_action", user_id).await?;
        self.engine
            .execute_action(table, record_id, action, remarks, actor.user_id)
            .await
            .map_err(|err| to_gateway_error("execute_action", err))
    }

    pub async fn get_audit_history(&self, table: &str, record_id: i64) -> GatewayResult<Vec<AuditEntry>> {
        self.engine
            .get_audit_history(table, record_id)
            .await
            .map_err(|err| to_gateway_error("get_audit_history", err))
    }

    pub async fn get_current_status(&self, table: &str, record_id: i64) -> GatewayResult<i32> {
        self.engine
            .get_current_status(table, record_id)
            .await
            .map_err(|err| to_gateway_error("get_current_status", err))
    }

    pub async fn execute_screen_action(
        &self,
        user_id: i64,
        screen_code: &str,
        action: &str,
        remarks: Option<&str>,
    ) -> GatewayResult<TransitionResult> {
        let actor = self.actor("execute_screen_action", user_id).await?;
        self.engine
            .execute_screen_action(screen_code, action, remarks, actor.user_id)
            .await
            .map_err(|err| to_gateway_error("execute_screen_action", err))
    }

    pub async fn get_screen_audit_history(&self, screen_code: &str) -> GatewayResult<Vec<AuditEntry>> {
        self.engine
            .get_screen_audit_history(screen_code)
            .await
            .map_err(|err| to_gateway_error("get_screen_audit_history", err))
    }

    pub async fn get_screen_current_status(&self, screen_code: &str) -> GatewayResult<i32> {
        self.engine
            .get_screen_current_status(screen_code)
            .await
            .map_err(|err| to_gateway_error("get_screen_current_status", err))
    }

    pub async fn reset_screen_workflow(
        &self,
        user_id: i64,
        screen_code: &str,
    ) -> GatewayResult<TransitionResult> {
        let actor = self.actor("reset_screen_workflow", user_id).await?;
        self.engine
            .reset_screen_workflow(screen_code, &actor)
            .await
            .map_err(|err| to_gateway_error("reset_screen_workflow", err))
    }

    pub fn list_statuses(&self) -> Vec<WorkflowStatus> {
        self.engine.list_statuses()
    }
}
