//! # Structured Logging Module
//!
//! Environment-aware structured logging for the workflow core, plus helpers
//! that emit transition and reset events with a consistent field set.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` wins over the configured level. If a global subscriber is
/// already installed (an embedding host, a test harness) it is left in place.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment, config)));

        let layer = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("STATPORTAL_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Configured level, raised to debug outside production when left at the default
fn get_log_level(environment: &str, config: &LoggingConfig) -> String {
    match (environment, config.level.as_str()) {
        ("production", level) => level.to_string(),
        ("development" | "test", "info") => "debug".to_string(),
        (_, level) => level.to_string(),
    }
}

/// Log a committed status transition
pub fn log_transition(
    entity: &str,
    action: &str,
    from_status: i32,
    to_status: i32,
    actor_id: i64,
    audit_id: i64,
    duration_ms: u64,
) {
    tracing::info!(
        entity = %entity,
        action = %action,
        from_status = from_status,
        to_status = to_status,
        actor_id = actor_id,
        audit_id = audit_id,
        duration_ms = duration_ms,
        timestamp = %Utc::now().to_rfc3339(),
        "WORKFLOW_TRANSITION"
    );
}

/// Log an administrative screen reset. Resets write no audit entry, so this
/// log line is their only trace.
pub fn log_screen_reset(
    screen_code: &str,
    screen_workflow_id: i64,
    previous_status: i32,
    purged_entries: u64,
    administrator_id: i64,
) {
    tracing::warn!(
        screen_code = %screen_code,
        screen_workflow_id = screen_workflow_id,
        previous_status = previous_status,
        purged_entries = purged_entries,
        administrator_id = administrator_id,
        timestamp = %Utc::now().to_rfc3339(),
        "WORKFLOW_RESET"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
