//! Configuration loading from files and environment variables

use crate::error::{Error, Result, ResultExt};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config, ServiceConfig};

/// The `[services.<Label>]` tables of a config file, keyed by exact label
#[derive(Debug, Default, Deserialize)]
struct ServiceSections {
    #[serde(default)]
    services: BTreeMap<String, ServiceConfig>,
}

/// Read service sections with `toml` so label case is preserved
fn read_service_sections(path: &Path) -> Result<BTreeMap<String, ServiceConfig>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read config file {}", path.display()))?;
    let sections: ServiceSections = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse services: {e}")))?;
    Ok(sections.services)
}

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `GRAPHREPO_` and use double underscores
    /// for nested values. For example:
    /// - `GRAPHREPO_NEO4J__HOST=db.internal`
    ///
    /// The conventional `NEO4J_HOST`, `NEO4J_BOLT_PORT`, `NEO4J_USER` and
    /// `NEO4J_PASSWORD` variables are honored as well and take precedence.
    ///
    /// `[services.<Label>]` sections come from the file only. Labels are
    /// case-sensitive and the layered loader does not guarantee key case, so
    /// they are parsed straight from the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        let builder = set_config_default(builder, "neo4j.host", default_neo4j_host())?;
        let builder = set_config_default(
            builder,
            "neo4j.bolt_port",
            i64::from(default_neo4j_bolt_port()),
        )?;
        let builder = set_config_default(builder, "neo4j.user", default_neo4j_user())?;
        let builder = set_config_default(builder, "neo4j.password", default_neo4j_password())?;
        let builder = set_config_default(
            builder,
            "neo4j.max_connections",
            default_max_connections() as i64,
        )?;
        let mut builder =
            set_config_default(builder, "neo4j.fetch_size", default_fetch_size() as i64)?;

        debug!(path = %path.display(), exists = path.exists(), "Loading configuration");

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("GRAPHREPO")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(host) = std::env::var("NEO4J_HOST") {
            builder = builder
                .set_override("neo4j.host", host)
                .map_err(|e| Error::config(format!("Failed to set NEO4J_HOST: {e}")))?;
        }
        if let Ok(port) = std::env::var("NEO4J_BOLT_PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                builder = builder
                    .set_override("neo4j.bolt_port", i64::from(port_num))
                    .map_err(|e| Error::config(format!("Failed to set NEO4J_BOLT_PORT: {e}")))?;
            }
        }
        if let Ok(user) = std::env::var("NEO4J_USER") {
            builder = builder
                .set_override("neo4j.user", user)
                .map_err(|e| Error::config(format!("Failed to set NEO4J_USER: {e}")))?;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            builder = builder
                .set_override("neo4j.password", password)
                .map_err(|e| Error::config(format!("Failed to set NEO4J_PASSWORD: {e}")))?;
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let mut config: Config = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;

        config.services = if path.exists() {
            read_service_sections(path)?
        } else {
            BTreeMap::new()
        };
        Ok(config)
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.graphrepo/config.toml or a custom path)
    /// 3. Environment variables (GRAPHREPO_*, then NEO4J_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
