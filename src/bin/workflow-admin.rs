//! # Workflow Administration Tool
//!
//! Command-line access to the workflow core for operators: apply migrations,
//! inspect statuses and screen history, register screens and perform the
//! administrative screen reset.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use statportal_workflow::database::DatabaseConnection;
use statportal_workflow::logging::init_structured_logging;
use statportal_workflow::{
    ConfiguredAdministrators, PgWorkflowStore, RecordLocator, StatusCatalog, TableRegistry,
    WorkflowConfig, WorkflowEngine, WorkflowGateway,
};

#[derive(Parser)]
#[command(name = "workflow-admin")]
#[command(about = "Administer the statistical portal approval workflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (default: config/statportal.toml if present)
    #[arg(short, long, env = "STATPORTAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate configuration and print the effective values
    CheckConfig,

    /// Apply database migrations
    Migrate,

    /// List active workflow statuses
    Statuses,

    /// Register a new screen workflow at Maker Entry
    RegisterScreen {
        #[arg(long)]
        code: String,
        /// Business table the screen writes to
        #[arg(long)]
        table: String,
        #[arg(long)]
        creator: i64,
    },

    /// Show a screen's current status
    ScreenStatus {
        #[arg(long)]
        code: String,
    },

    /// Show a screen's audit trail, newest first
    ScreenHistory {
        #[arg(long)]
        code: String,
    },

    /// Show a record's current status
    RecordStatus {
        #[arg(long)]
        table: String,
        #[arg(long)]
        id: i64,
    },

    /// Purge a screen's audit trail and return it to Maker Entry
    ResetScreen {
        #[arg(long)]
        code: String,
        /// Acting administrator's user id
        #[arg(long)]
        actor: i64,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = WorkflowConfig::load_from(cli.config.as_deref())
        .context("failed to load workflow configuration")?;
    init_structured_logging(&config.logging);

    if let Commands::CheckConfig = cli.command {
        let mut shown = config.clone();
        shown.database.url = "[redacted]".to_string();
        return print_json(&shown);
    }

    let db = DatabaseConnection::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    let outcome = run(cli.command, &db, &config).await;
    db.close().await;
    outcome
}

async fn run(command: Commands, db: &DatabaseConnection, config: &WorkflowConfig) -> Result<()> {
    if let Commands::Migrate = command {
        db.migrate().await.context("migration failed")?;
        println!("migrations applied");
        return Ok(());
    }

    let catalog = StatusCatalog::load(db.pool()).await?;
    let locator = RecordLocator::new(db.pool().clone(), TableRegistry::new(), config.locator.clone());
    let engine = Arc::new(WorkflowEngine::new(
        PgWorkflowStore::new(db.pool().clone(), locator),
        catalog,
    ));
    let gateway = WorkflowGateway::new(
        Arc::clone(&engine),
        ConfiguredAdministrators::from_config(&config.security),
    );

    match command {
        Commands::CheckConfig | Commands::Migrate => Ok(()),
        Commands::Statuses => print_json(&gateway.list_statuses()),
        Commands::RegisterScreen {
            code,
            table,
            creator,
        } => print_json(&engine.register_screen(&code, &table, creator).await?),
        Commands::ScreenStatus { code } => print_json(&engine.get_screen(&code).await?),
        Commands::ScreenHistory { code } => {
            print_json(&gateway.get_screen_audit_history(&code).await?)
        }
        Commands::RecordStatus { table, id } => {
            let status_id = gateway.get_current_status(&table, id).await?;
            print_json(engine.catalog().resolve(status_id)?)
        }
        Commands::ResetScreen { code, actor } => {
            print_json(&gateway.reset_screen_workflow(actor, &code).await?)
        }
    }
}
