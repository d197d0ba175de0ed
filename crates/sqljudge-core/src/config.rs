use crate::errors::ConfigError;
use crate::storage::catalog::{QueryCatalog, REFERENCE_PLACEHOLDER, SOLUTION_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MIN_FETCH_PERIOD_MS: u64 = 100;
pub const DEFAULT_FETCH_PERIOD_MS: u64 = 1000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
}

impl DbConfig {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid(format!("{}.path", field), "is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckingConfig {
    /// Polling period in whole milliseconds.
    pub fetch_period_ms: u64,
}

impl Default for CheckingConfig {
    fn default() -> Self {
        Self {
            fetch_period_ms: DEFAULT_FETCH_PERIOD_MS,
        }
    }
}

impl CheckingConfig {
    pub fn fetch_period(&self) -> Duration {
        Duration::from_millis(self.fetch_period_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub main_db: DbConfig,
    #[serde(default)]
    pub selection_dbs: BTreeMap<String, DbConfig>,
    #[serde(default)]
    pub checking: CheckingConfig,
    #[serde(default)]
    pub catalog: QueryCatalog,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!(
                    "unknown level {:?} (expected one of {})",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
        self.main_db.validate("main_db")?;
        for (name, db) in &self.selection_dbs {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid("selection_dbs", "schema name is empty"));
            }
            db.validate(&format!("selection_dbs.{}", name))?;
        }
        if self.checking.fetch_period_ms < MIN_FETCH_PERIOD_MS {
            return Err(ConfigError::invalid(
                "checking.fetch_period_ms",
                format!(
                    "must be at least {} (got {})",
                    MIN_FETCH_PERIOD_MS, self.checking.fetch_period_ms
                ),
            ));
        }
        for (field, template) in [
            ("catalog.ordered_difference", &self.catalog.ordered_difference),
            ("catalog.unordered_difference", &self.catalog.unordered_difference),
        ] {
            for placeholder in [SOLUTION_PLACEHOLDER, REFERENCE_PLACEHOLDER] {
                if !template.contains(placeholder) {
                    return Err(ConfigError::invalid(
                        field,
                        format!("missing placeholder {}", placeholder),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Parse a config from text in the format implied by `ext`.
pub fn parse_config(raw: &str, ext: &str) -> Result<Config, ConfigError> {
    let cfg: Config = match ext {
        "yaml" | "yml" => serde_yaml::from_str(raw)
            .map_err(|e| ConfigError::Parse(format!("failed to parse YAML: {}", e)))?,
        "json" => serde_json::from_str(raw)
            .map_err(|e| ConfigError::Parse(format!("failed to parse JSON: {}", e)))?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Read, parse and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "yaml" | "yml" | "json") {
        return Err(ConfigError::UnsupportedFormat(ext));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, &ext)
}
