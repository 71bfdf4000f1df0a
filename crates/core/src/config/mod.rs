//! Configuration module for graphrepo
//!
//! This module provides configuration structures and loading mechanisms for the
//! graph data-access layer. Configuration can be loaded from TOML files and/or
//! environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.graphrepo/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".graphrepo").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Neo4j connection configuration
    #[serde(default)]
    pub neo4j: Neo4jConfig,

    /// Per-label service configuration, keyed by node label
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Connection settings for the Neo4j session provider
#[derive(Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j host address
    #[serde(default = "default_neo4j_host")]
    pub host: String,

    /// Neo4j Bolt port (driver connection)
    #[serde(default = "default_neo4j_bolt_port")]
    pub bolt_port: u16,

    /// Neo4j username
    #[serde(default = "default_neo4j_user")]
    pub user: String,

    /// Neo4j password
    #[serde(default = "default_neo4j_password")]
    pub password: String,

    /// Database to run statements against (server default when unset)
    #[serde(default)]
    pub database: Option<String>,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Rows fetched per round trip
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

impl Neo4jConfig {
    /// Bolt URI built from host and port
    pub fn uri(&self) -> String {
        format!("bolt://{}:{}", self.host, self.bolt_port)
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            host: default_neo4j_host(),
            bolt_port: default_neo4j_bolt_port(),
            user: default_neo4j_user(),
            password: default_neo4j_password(),
            database: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl std::fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("host", &self.host)
            .field("bolt_port", &self.bolt_port)
            .field("user", &self.user)
            .field("password", &"***REDACTED***")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

/// Settings for a single label-bound model service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Property stamped with the server time when a node is created
    #[serde(default)]
    pub timestamp_property: Option<String>,

    /// Schema statements installed for this label, run in order
    #[serde(default)]
    pub constraints: Vec<String>,

    /// Properties that get a generated uniqueness constraint
    #[serde(default)]
    pub unique: Vec<String>,
}

impl Config {
    /// Look up the service configuration for a label
    pub fn service(&self, label: &str) -> Option<&ServiceConfig> {
        self.services.get(label)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.neo4j.host.trim().is_empty() {
            return Err(Error::config("neo4j.host must not be empty".to_string()));
        }

        if self.neo4j.max_connections == 0 {
            return Err(Error::config(
                "neo4j.max_connections must be greater than 0".to_string(),
            ));
        }

        if self.neo4j.fetch_size == 0 {
            return Err(Error::config(
                "neo4j.fetch_size must be greater than 0".to_string(),
            ));
        }

        for (label, service) in &self.services {
            if label.trim().is_empty() {
                return Err(Error::config("Service labels must not be empty".to_string()));
            }
            if let Some(prop) = &service.timestamp_property {
                if prop.trim().is_empty() {
                    return Err(Error::config(format!(
                        "services.{label}.timestamp_property must not be empty when set"
                    )));
                }
            }
            if service.unique.iter().any(|p| p.trim().is_empty()) {
                return Err(Error::config(format!(
                    "services.{label}.unique contains an empty property name"
                )));
            }
        }

        Ok(())
    }
}
