use crate::statement::Statement;
use async_trait::async_trait;
use graphrepo_core::{Record, Result};

/// Connection to a graph database able to run built statements
///
/// Implementations own pooling, routing and transport. Each call is
/// self-contained: no session state is carried between calls.
#[async_trait]
pub trait GraphSession: Send + Sync {
    /// Run one statement and return every row as a plain mapping
    ///
    /// Statements with [`Statement::is_write`] set must go to a write-capable
    /// session. Each returned record has exactly the statement's columns.
    ///
    /// # Errors
    /// Driver, syntax and constraint failures are returned as-is; nothing is
    /// retried.
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>>;

    /// Run statements in order inside one transaction and commit
    ///
    /// If any statement fails nothing is committed.
    async fn run_in_transaction(&self, statements: &[Statement]) -> Result<()>;
}
