use crate::session::GraphSession;
use crate::statement::Statement;
use graphrepo_core::{Record, Result};
use std::sync::Arc;
use tracing::debug;

/// Runs built statements through a [`GraphSession`] with debug tracing around
/// every call
///
/// Failures from the session are returned unchanged.
#[derive(Clone)]
pub struct Executor {
    session: Arc<dyn GraphSession>,
}

impl Executor {
    pub fn new(session: Arc<dyn GraphSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<dyn GraphSession> {
        &self.session
    }

    /// Run one statement and return its rows as plain mappings
    pub async fn execute(&self, statement: &Statement) -> Result<Vec<Record>> {
        debug!(
            statement = statement.text(),
            params = ?statement.params(),
            write = statement.is_write(),
            "Executing statement"
        );

        let records = self.session.run(statement).await?;

        debug!(rows = records.len(), records = ?records, "Statement completed");
        Ok(records)
    }

    /// Run statements in order within a single transaction
    pub async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<()> {
        debug!(
            statements = ?statements.iter().map(Statement::text).collect::<Vec<_>>(),
            "Executing transaction"
        );

        self.session.run_in_transaction(statements).await?;

        debug!(count = statements.len(), "Transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::Label;
    use crate::pagination::PageParams;
    use crate::session::MemoryGraph;
    use crate::statement::StatementBuilder;
    use graphrepo_core::{Error, PropertyBag};

    #[tokio::test]
    async fn test_execute_without_subscriber() {
        let graph = MemoryGraph::new();
        let executor = Executor::new(Arc::new(graph.clone()));
        let builder = StatementBuilder::new(Label::new("Tag").unwrap());

        executor
            .execute(&builder.create(&PropertyBag::new().with("name", "rust")))
            .await
            .unwrap();
        let rows = executor
            .execute(&builder.find_all(&PageParams::default()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(graph.executed().await.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_propagates_session_errors() {
        let graph = MemoryGraph::new();
        graph.fail_on("MATCH").await;
        let executor = Executor::new(Arc::new(graph));
        let builder = StatementBuilder::new(Label::new("Tag").unwrap());

        let err = executor
            .execute(&builder.find_all(&PageParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
