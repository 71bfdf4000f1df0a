use super::traits::GraphSession;
use crate::statement::Statement;
use async_trait::async_trait;
use graphrepo_core::{Error, Neo4jConfig, PropertyValue, Record, Result, ResultExt};
use neo4rs::{BoltNull, BoltType, ConfigBuilder, Graph, Query, Row};
use std::sync::Arc;
use tracing::{info, warn};

/// Graph session backed by a pooled `neo4rs` connection
///
/// Write statements run in an explicit transaction that is committed once
/// all rows have been read; read statements run in auto-commit mode.
#[derive(Clone)]
pub struct Neo4jSession {
    graph: Arc<Graph>,
}

impl Neo4jSession {
    /// Connect to Neo4j with the provided configuration
    ///
    /// # Example
    /// ```no_run
    /// use graphrepo_core::Neo4jConfig;
    /// use graphrepo_storage::Neo4jSession;
    ///
    /// # async fn example(config: &Neo4jConfig) -> graphrepo_core::Result<()> {
    /// let session = Neo4jSession::connect(config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let uri = config.uri();

        info!("Connecting to Neo4j at {}", uri);

        let mut builder = ConfigBuilder::default()
            .uri(uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| Error::config(format!("Invalid Neo4j configuration: {e}")))?;

        let graph = Graph::connect(neo_config)
            .await
            .context("Failed to connect to Neo4j")?;

        Ok(Self::from_graph(graph))
    }

    /// Wrap an already-connected graph
    pub fn from_graph(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    /// Get a reference to the underlying Graph for direct query execution
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>> {
        let query = to_query(statement);
        let mut records = Vec::new();

        if statement.is_write() {
            let mut txn = self.graph.start_txn().await.map_err(driver_error)?;
            let mut stream = txn.execute(query).await.map_err(driver_error)?;
            while let Some(row) = stream.next(txn.handle()).await.map_err(driver_error)? {
                records.push(row_to_record(&row, statement.columns())?);
            }
            txn.commit().await.map_err(driver_error)?;
        } else {
            let mut stream = self.graph.execute(query).await.map_err(driver_error)?;
            while let Some(row) = stream.next().await.map_err(driver_error)? {
                records.push(row_to_record(&row, statement.columns())?);
            }
        }

        Ok(records)
    }

    async fn run_in_transaction(&self, statements: &[Statement]) -> Result<()> {
        let mut txn = self.graph.start_txn().await.map_err(driver_error)?;

        for statement in statements {
            if let Err(e) = txn.run(to_query(statement)).await {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back transaction");
                }
                return Err(Error::storage(format!(
                    "Failed to run statement '{}': {e}",
                    statement.text()
                )));
            }
        }

        txn.commit().await.map_err(driver_error)?;
        Ok(())
    }
}

fn driver_error(e: neo4rs::Error) -> Error {
    Error::storage(e.to_string())
}

fn to_query(statement: &Statement) -> Query {
    let mut query = Query::new(statement.text().to_string());
    for (key, value) in statement.params() {
        query = query.param(key.as_str(), to_bolt(value));
    }
    query
}

/// Convert a property value into the driver's wire type
///
/// Integers stay 64-bit Bolt integers end to end.
pub(crate) fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Null => BoltType::Null(BoltNull),
        PropertyValue::Bool(b) => BoltType::from(*b),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Float(x) => BoltType::from(*x),
        PropertyValue::String(s) => BoltType::from(s.clone()),
        PropertyValue::List(items) => {
            BoltType::from(items.iter().map(to_bolt).collect::<Vec<BoltType>>())
        }
    }
}

fn row_to_record(row: &Row, columns: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for column in columns {
        let value: serde_json::Value = row
            .get(column)
            .map_err(|e| Error::storage(format!("Failed to read column '{column}': {e}")))?;
        record.insert(column.clone(), value);
    }
    Ok(record)
}
