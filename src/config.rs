//! Configuration types for range-relay
//!
//! This module contains the application configuration, loaded from YAML or
//! JSON. Every section and field has a default, so an empty file is a valid
//! configuration.

use crate::error::{Error, Result};
use crate::item::AttributeValue;
use crate::pagination::PaginationRequest;
use crate::types::SortDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `store.table_name`
pub const ENV_TABLE: &str = "RANGE_RELAY_TABLE";
/// Environment variable overriding `store.path`
pub const ENV_DB_PATH: &str = "RANGE_RELAY_DB_PATH";
/// Environment variable overriding `store.region`
pub const ENV_REGION: &str = "RANGE_RELAY_REGION";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Store connection settings
    pub store: StoreConfig,

    /// Defaults applied to requests that omit them
    pub defaults: RequestDefaults,

    /// HTTP server settings
    pub server: ServerSettings,
}

impl AppConfig {
    /// Load a configuration file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(table) = get(ENV_TABLE) {
            self.store.table_name = table;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            self.store.path = path;
        }
        if let Some(region) = get(ENV_REGION) {
            self.store.region = Some(region);
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Request for a partition, filled from the store settings and defaults
    pub fn request_for(&self, partition_key_value: impl Into<AttributeValue>) -> PaginationRequest {
        let mut request = PaginationRequest::new(
            &self.store.table_name,
            &self.store.partition_key_name,
            partition_key_value,
            &self.store.sort_key_name,
        )
        .with_sort(self.defaults.sort)
        .with_begins_with(&self.defaults.begins_with);
        request.index_name = self.store.index_name.clone();
        request
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let store = &self.store;
        if store.table_name.is_empty() {
            return Err(Error::invalid_config("store.table_name", "cannot be empty"));
        }
        if store.partition_key_name.is_empty() {
            return Err(Error::invalid_config(
                "store.partition_key_name",
                "cannot be empty",
            ));
        }
        if store.sort_key_name.is_empty() {
            return Err(Error::invalid_config("store.sort_key_name", "cannot be empty"));
        }
        if store.partition_key_name == store.sort_key_name {
            return Err(Error::invalid_config(
                "store.sort_key_name",
                "must differ from the partition key name",
            ));
        }
        if store.max_page_size == Some(0) {
            return Err(Error::invalid_config(
                "store.max_page_size",
                "must be greater than zero",
            ));
        }
        if store.backend == StoreBackend::Duckdb && store.path.is_empty() {
            return Err(Error::invalid_config(
                "store.path",
                "is required for the duckdb backend",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Store Config
// ============================================================================

/// Store implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, lost on exit
    #[default]
    Memory,
    /// Embedded DuckDB database
    Duckdb,
}

/// Store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use
    pub backend: StoreBackend,

    /// DuckDB database path (":memory:" for in-memory)
    pub path: String,

    /// Region label, logged with the store location
    pub region: Option<String>,

    /// Table to paginate
    pub table_name: String,

    /// Partition key attribute
    pub partition_key_name: String,

    /// Sort key attribute
    pub sort_key_name: String,

    /// Secondary index to query by default
    pub index_name: Option<String>,

    /// Page-size ceiling of the memory store
    pub max_page_size: Option<usize>,

    /// Demo items generated into a memory store at startup
    pub seed_items: usize,

    /// Partition receiving the demo items (default "default")
    pub seed_partition: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
            region: None,
            table_name: default_table_name(),
            partition_key_name: default_partition_key_name(),
            sort_key_name: default_sort_key_name(),
            index_name: None,
            max_page_size: None,
            seed_items: 0,
            seed_partition: None,
        }
    }
}

fn default_path() -> String {
    ":memory:".to_string()
}

fn default_table_name() -> String {
    "items".to_string()
}

fn default_partition_key_name() -> String {
    "pk".to_string()
}

fn default_sort_key_name() -> String {
    "sk".to_string()
}

// ============================================================================
// Request Defaults
// ============================================================================

/// Defaults applied to requests that omit them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Display order
    pub sort: SortDirection,

    /// Sort key prefix
    pub begins_with: String,

    /// Partition used when a request names none
    pub partition_key_value: Option<String>,
}

// ============================================================================
// Server Settings
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.path, ":memory:");
        assert_eq!(config.store.table_name, "items");
        assert_eq!(config.defaults.sort, SortDirection::Desc);
        assert_eq!(config.defaults.begins_with, "");
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_for_uses_defaults() {
        let mut config = AppConfig::default();
        config.store.index_name = Some("by-parity".to_string());
        config.defaults.sort = SortDirection::Asc;
        config.defaults.begins_with = "cursor-".to_string();

        let request = config.request_for("p1");
        assert_eq!(request.table_name, "items");
        assert_eq!(request.partition_key_name, "pk");
        assert_eq!(request.partition_key_value, AttributeValue::from("p1"));
        assert_eq!(request.sort_key_name, "sk");
        assert_eq!(request.index_name.as_deref(), Some("by-parity"));
        assert_eq!(request.sort, SortDirection::Asc);
        assert_eq!(request.begins_with, "cursor-");
        assert!(request.args.is_empty());
    }

    #[test]
    fn test_parse_empty_yaml() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
store:
  backend: duckdb
  path: /tmp/events.duckdb
  table_name: events
  partition_key_name: tenant
  sort_key_name: created_at
defaults:
  sort: ASC
  begins_with: "2024-"
server:
  port: 3000
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Duckdb);
        assert_eq!(config.store.path, "/tmp/events.duckdb");
        assert_eq!(config.store.partition_key_name, "tenant");
        assert_eq!(config.store.sort_key_name, "created_at");
        assert!(config.store.index_name.is_none());
        assert_eq!(config.defaults.sort, SortDirection::Asc);
        assert_eq!(config.defaults.begins_with, "2024-");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"store": {"table_name": "events", "seed_items": 25}}"#;
        let config = AppConfig::from_json_str(json).unwrap();
        assert_eq!(config.store.table_name, "events");
        assert_eq!(config.store.seed_items, 25);
        assert_eq!(config.store.sort_key_name, "sk");
    }

    #[test]
    fn test_validate_rejects_equal_keys() {
        let yaml = "store:\n  partition_key_name: id\n  sort_key_name: id\n";
        let err = AppConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "store.sort_key_name"));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let err = AppConfig::from_yaml_str("store:\n  max_page_size: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_parse_invalid_backend() {
        let err = AppConfig::from_yaml_str("store:\n  backend: dynamo\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_TABLE, "audit"),
            (ENV_DB_PATH, ""),
            (ENV_REGION, "eu-west-1"),
        ]);
        let config = AppConfig::default()
            .apply_overrides(|name| vars.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.store.table_name, "audit");
        assert_eq!(config.store.path, ":memory:");
        assert_eq!(config.store.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("config.yaml");
        std::fs::write(&yaml_path, "store:\n  table_name: from_yaml\n").unwrap();
        assert_eq!(
            AppConfig::from_file(&yaml_path).unwrap().store.table_name,
            "from_yaml"
        );

        let json_path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"store": {{"table_name": "from_json"}}}}"#).unwrap();
        drop(file);
        assert_eq!(
            AppConfig::from_file(&json_path).unwrap().store.table_name,
            "from_json"
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/range-relay.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
