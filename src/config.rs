// ⚙️ Configuration
// Optional JSON file (BUDGET_CONFIG) overlaid with environment variables

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Rows shown by `/list` without an argument
    pub list_limit: u32,

    /// tracing-subscriber filter directive (RUST_LOG takes precedence)
    pub log_filter: String,

    /// Listen address for the HTTP transport
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("budget.db"),
            list_limit: 10,
            log_filter: "budget_ledger=info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injected variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("BUDGET_CONFIG") {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path))?
            }
            None => Config::default(),
        };

        if let Some(db) = lookup("BUDGET_DB") {
            config.db_path = PathBuf::from(db);
        }
        if let Some(limit) = lookup("BUDGET_LIST_LIMIT") {
            config.list_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("BUDGET_LIST_LIMIT is not a number: {}", limit))?;
        }
        if let Some(filter) = lookup("BUDGET_LOG") {
            config.log_filter = filter;
        }
        if let Some(bind) = lookup("BUDGET_BIND") {
            config.bind_addr = bind;
        }

        if config.list_limit == 0 {
            bail!("list_limit must be positive");
        }

        Ok(config)
    }
}
