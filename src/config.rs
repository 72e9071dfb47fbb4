// ⚙️ Configuration - environment-driven settings and ledger bootstrap

use rusqlite::Connection;
use std::path::PathBuf;

use crate::error::LedgerResult;
use crate::import::{read_import_file, TRANSFER_DELIMITER};
use crate::store::{init_ledger, insert_batch, list_categories, open_ledger};

pub const DATABASE_VAR: &str = "AUTOFINANCE_DATABASE";
pub const DATA_SOURCE_VAR: &str = "AUTOFINANCE_DATA_SOURCE";
pub const BIND_VAR: &str = "AUTOFINANCE_BIND";

pub const DEFAULT_DATABASE: &str = "ledger.db";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Ledger file
    pub database: PathBuf,
    /// Pipe-delimited file imported when the ledger is first created
    pub data_source: Option<PathBuf>,
    /// Address the HTTP server listens on
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DEFAULT_DATABASE),
            data_source: None,
            bind_addr: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        Config {
            database: get(DATABASE_VAR).map(PathBuf::from).unwrap_or(defaults.database),
            data_source: get(DATA_SOURCE_VAR).map(PathBuf::from),
            bind_addr: get(BIND_VAR).unwrap_or(defaults.bind_addr),
        }
    }
}

/// Open the configured ledger, creating and seeding it on first run
pub fn bootstrap(config: &Config) -> LedgerResult<Connection> {
    if config.database.exists() {
        return open_ledger(&config.database);
    }

    let mut conn = init_ledger(&config.database)?;

    if let Some(source) = config.data_source.as_ref().filter(|path| path.is_file()) {
        let registry = list_categories(&conn)?;
        let report = read_import_file(source, &registry, TRANSFER_DELIMITER)?;
        let inserted = insert_batch(&mut conn, &report.records)?;
        tracing::info!(
            source = %source.display(),
            inserted,
            rejected = report.failures.len(),
            "seeded new ledger"
        );
    }

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::peek;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.database, PathBuf::from("ledger.db"));
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (DATABASE_VAR, "/tmp/money.db"),
            (DATA_SOURCE_VAR, "/tmp/seed.txt"),
            (BIND_VAR, ""),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.database, PathBuf::from("/tmp/money.db"));
        assert_eq!(config.data_source, Some(PathBuf::from("/tmp/seed.txt")));
        assert_eq!(config.bind_addr, DEFAULT_BIND);
    }

    #[test]
    fn test_bootstrap_seeds_only_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.txt");
        std::fs::write(
            &seed,
            "type|description|amount|date\nIncome|Salary|2000|2024-01-31\nIncome|Bonus|x|2024-02-01\n",
        )
        .unwrap();

        let config = Config {
            database: dir.path().join("ledger.db"),
            data_source: Some(seed),
            bind_addr: DEFAULT_BIND.to_string(),
        };

        let conn = bootstrap(&config).unwrap();
        assert_eq!(peek(&conn, None).unwrap().len(), 1);
        drop(conn);

        // Existing ledger is opened as-is, not re-seeded
        let conn = bootstrap(&config).unwrap();
        assert_eq!(peek(&conn, None).unwrap().len(), 1);
    }
}
