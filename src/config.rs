//! Engine configuration
//!
//! Read from the environment (with `.env` support) or from a YAML file.
//!
//! ```yaml
//! database_url: postgresql://localhost:5432/pms
//! pool_size: 10
//! default_project: 7f1c2d4e-0000-0000-0000-000000000001
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::database::{mask_database_url, DatabaseConfig};

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const POOL_SIZE_VAR: &str = "DATABASE_POOL_SIZE";
pub const DEFAULT_PROJECT_VAR: &str = "PMS_DEFAULT_PROJECT";

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    /// Project whose overrides apply when a caller names none
    pub default_project: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineConfigFile {
    database_url: Option<String>,
    pool_size: Option<u32>,
    default_project: Option<Uuid>,
}

impl EngineConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Only `lookup` overrides the
    /// built-in defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut database = DatabaseConfig::with_defaults();
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            database.database_url = url;
        }
        if let Some(size) = lookup(POOL_SIZE_VAR) {
            database.max_connections = size
                .parse()
                .with_context(|| format!("{POOL_SIZE_VAR} is not a number: {size}"))?;
        }
        let default_project = lookup(DEFAULT_PROJECT_VAR)
            .map(|raw| {
                Uuid::parse_str(raw.trim())
                    .with_context(|| format!("{DEFAULT_PROJECT_VAR} is not a UUID: {raw}"))
            })
            .transpose()?;

        let config = Self {
            database,
            default_project,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading engine configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: EngineConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let mut database = DatabaseConfig::default();
        if let Some(url) = file.database_url {
            database.database_url = url;
        }
        if let Some(size) = file.pool_size {
            database.max_connections = size;
        }

        let config = Self {
            database,
            default_project: file.default_project,
        };
        config.validate()?;
        info!(
            url = %mask_database_url(&config.database.database_url),
            default_project = ?config.default_project,
            "Engine configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("Database pool size must be at least 1"));
        }
        if self.database.database_url.trim().is_empty() {
            return Err(anyhow!("Database URL is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DEFAULT_DATABASE_URL, DEFAULT_POOL_SIZE};
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let env = vars(&[
            (DATABASE_URL_VAR, "postgresql://db:5432/pms"),
            (POOL_SIZE_VAR, "4"),
            (DEFAULT_PROJECT_VAR, "00000000-0000-0000-0000-0000000000aa"),
        ]);
        let config = EngineConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.database.database_url, "postgresql://db:5432/pms");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.default_project, Some(Uuid::from_u128(0xaa)));
    }

    #[test]
    fn test_from_lookup_ignores_process_environment() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.database.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, DEFAULT_POOL_SIZE);
        assert_eq!(config.default_project, None);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let env = vars(&[(POOL_SIZE_VAR, "many")]);
        assert!(EngineConfig::from_lookup(|k| env.get(k).cloned()).is_err());

        let env = vars(&[(POOL_SIZE_VAR, "0")]);
        assert!(EngineConfig::from_lookup(|k| env.get(k).cloned()).is_err());

        let env = vars(&[(DEFAULT_PROJECT_VAR, "project-a")]);
        assert!(EngineConfig::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_url: postgresql://pms:pw@db:5432/pms\npool_size: 3\ndefault_project: 00000000-0000-0000-0000-0000000000bb"
        )
        .unwrap();

        let config = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.default_project, Some(Uuid::from_u128(0xbb)));
    }

    #[test]
    fn test_from_yaml_file_with_unparseable_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_url: db host ééééééé name with spaces").unwrap();

        let config = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.database.database_url, "db host ééééééé name with spaces");
    }

    #[test]
    fn test_from_yaml_file_unknown_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pool: 3").unwrap();
        let err = EngineConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
