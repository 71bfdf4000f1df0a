//! Test utilities for storage layer tests

use anyhow::{Context, Result};
use graphrepo_core::{Neo4jConfig, PropertyBag, PropertyValue};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber once per test binary
///
/// Level comes from `GRAPHREPO_TEST_LOG`, then `RUST_LOG`, defaulting to
/// `error`. Set it to `graphrepo_storage=debug` to see every statement.
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let log_level = std::env::var("GRAPHREPO_TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "error".to_string());

        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Property bag from `(key, value)` pairs
#[allow(dead_code)]
pub fn bag<V: Into<PropertyValue>>(
    pairs: impl IntoIterator<Item = (&'static str, V)>,
) -> PropertyBag {
    pairs.into_iter().collect()
}

/// Clock returning 1000, 2000, 3000, ... on successive calls
#[allow(dead_code)]
pub fn counting_clock() -> impl Fn() -> i64 + Send + Sync + 'static {
    let ticks = Arc::new(AtomicI64::new(0));
    move || (ticks.fetch_add(1, Ordering::SeqCst) + 1) * 1000
}

/// Unique label so tests sharing a database do not see each other's nodes
#[allow(dead_code)]
pub fn unique_label(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Neo4j Community container with authentication disabled
#[allow(dead_code)]
pub struct TestNeo4j {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    bolt_port: u16,
}

#[allow(dead_code)]
impl TestNeo4j {
    pub async fn start() -> Result<Self> {
        // with_wait_for must come before with_env_var, which converts the image
        // into a ContainerRequest
        let container = GenericImage::new("neo4j", "5-community")
            .with_exposed_port(ContainerPort::Tcp(7687))
            .with_wait_for(WaitFor::message_on_stdout("Started."))
            .with_env_var("NEO4J_AUTH", "none")
            .with_startup_timeout(Duration::from_secs(90))
            .start()
            .await
            .context("Failed to start Neo4j container")?;

        let bolt_port = container
            .get_host_port_ipv4(7687)
            .await
            .context("Failed to get Neo4j Bolt port")?;

        Ok(Self {
            container,
            bolt_port,
        })
    }

    pub fn config(&self) -> Neo4jConfig {
        Neo4jConfig {
            host: "localhost".to_string(),
            bolt_port: self.bolt_port,
            user: String::new(),
            password: String::new(),
            ..Neo4jConfig::default()
        }
    }
}
