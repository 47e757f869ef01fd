//! PMS Engine - piping material specification expansion
//!
//! Expands the compact rules of a piping material specification (PMS) into the
//! full catalog of concrete, uniquely coded line items, one per valid
//! size/schedule/branch/reducer combination.
//!
//! ## Call chain
//! Store -> overlay resolution -> size range -> combination policy ->
//! code synthesis -> catalog/weight resolution -> generated items
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pms_engine::{ExpansionService, MemoryStore};
//! use uuid::Uuid;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = MemoryStore::from_yaml_file("demos/sample_spec.yaml")?;
//! let service = ExpansionService::new(store);
//! let output = service.expand(Uuid::nil(), None).await?;
//! println!("{} items", output.items.len());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;
pub mod models;
pub mod overlay;

// Pure expansion engine
pub mod expansion;

// Persistence seam and backends
pub mod database;
pub mod store;

pub mod services;

pub use config::EngineConfig;
pub use database::DatabaseConfig;
pub use error::{MissingReference, PmsError, PmsResult};
pub use expansion::{expand, DomainSnapshot, ExpansionDiagnostic, ExpansionOutput};
pub use models::{CachedItem, CachedItemFilter, GeneratedItem, Scope};
pub use services::{ExpandResponse, ExpansionService, LoadSummary};
pub use store::{MemorySeed, MemoryStore, PmsStore};

#[cfg(feature = "database")]
pub use database::{DatabaseManager, PgPmsStore};
