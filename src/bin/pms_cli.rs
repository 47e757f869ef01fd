//! PMS Command Line Interface
//!
//! Expands specifications and maintains the item cache, either against a YAML
//! fixture or (feature `database`) against Postgres.
//!
//! # Usage
//!
//! ```bash
//! # Expand one specification from a fixture
//! pms_cli --fixture demos/sample_spec.yaml expand <spec-id> --project <project-id>
//!
//! # Cache every item of a project and keep the result in the fixture
//! pms_cli --fixture demos/sample_spec.yaml --write-back load <project-id>
//!
//! # Set a unit weight
//! pms_cli --fixture demos/sample_spec.yaml --write-back weight RFS50XSTDXXR1M1 --set 12.5
//!
//! # Against the database
//! DATABASE_URL=postgresql://localhost/pms pms_cli --database expand <spec-id>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pms_engine::{
    CachedItemFilter, EngineConfig, ExpandResponse, ExpansionService, MemoryStore, PmsStore,
};

#[derive(Parser)]
#[command(name = "pms_cli")]
#[command(version = "0.1.0")]
#[command(about = "Piping material specification expansion and item cache CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML fixture holding every PMS table
    #[arg(long, global = true, conflicts_with = "database")]
    fixture: Option<PathBuf>,

    /// Write the fixture back after the command (persists cache changes)
    #[arg(long, global = true, requires = "fixture")]
    write_back: bool,

    /// Use the Postgres store configured by DATABASE_URL
    #[arg(long, global = true)]
    database: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand one specification into generated items
    Expand {
        spec_id: Uuid,

        /// Project whose overrides apply (defaults to PMS_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<Uuid>,

        /// Include cached unit weights
        #[arg(long)]
        with_weights: bool,
    },

    /// Expand every specification of a project and cache new item codes
    Load { project: Uuid },

    /// Show or set the unit weight of a cached item
    Weight {
        item_code: String,

        #[arg(long)]
        set: Option<Decimal>,
    },

    /// List cached items
    Filter {
        #[arg(long)]
        comp_type: Option<String>,
        #[arg(long)]
        size1: Option<String>,
        #[arg(long)]
        size2: Option<String>,
        #[arg(long)]
        rating: Option<String>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(output) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<Value> {
    if let Some(path) = cli.fixture {
        let service = ExpansionService::new(MemoryStore::from_yaml_file(&path)?);
        let output = run(&service, cli.command).await?;
        if cli.write_back {
            let seed = service.store().snapshot().await;
            let yaml = serde_yaml::to_string(&seed).context("Failed to serialize fixture")?;
            std::fs::write(&path, yaml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        return Ok(output);
    }

    if cli.database {
        return run_database(cli.command).await;
    }

    Err(anyhow!("Choose a store with --fixture <path> or --database"))
}

#[cfg(feature = "database")]
async fn run_database(command: Commands) -> Result<Value> {
    use pms_engine::DatabaseManager;

    let config = EngineConfig::from_env()?;
    let manager = DatabaseManager::new(config.database)
        .await
        .context("Failed to connect to PMS database")?;
    manager.verify_schema().await?;

    let service = ExpansionService::new(manager.pms_store());
    let output = run(&service, command).await;
    manager.close().await;
    output
}

#[cfg(not(feature = "database"))]
async fn run_database(_command: Commands) -> Result<Value> {
    Err(anyhow!("pms_cli was built without the `database` feature"))
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run<S: PmsStore>(service: &ExpansionService<S>, command: Commands) -> Result<Value> {
    match command {
        Commands::Expand {
            spec_id,
            project,
            with_weights,
        } => {
            let project = match project {
                Some(id) => Some(id),
                None => EngineConfig::from_env()?.default_project,
            };
            let result = if with_weights {
                service.expand_with_weights(spec_id, project).await
            } else {
                service.expand(spec_id, project).await
            };
            Ok(serde_json::to_value(ExpandResponse::from_result(result))?)
        }
        Commands::Load { project } => {
            let summary = service.load_and_cache(project).await?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Weight { item_code, set } => match set {
            Some(weight) => {
                let updated = service.update_unit_weight(&item_code, weight).await?;
                Ok(serde_json::to_value(updated)?)
            }
            None => {
                let weight = service.resolve_weight(&item_code).await?;
                Ok(json!({ "item_code": item_code, "unit_weight": weight }))
            }
        },
        Commands::Filter {
            comp_type,
            size1,
            size2,
            rating,
        } => {
            let filter = CachedItemFilter {
                comp_type,
                size1,
                size2,
                rating,
            };
            Ok(serde_json::to_value(service.filter_cached_items(&filter).await?)?)
        }
    }
}
