//! Label-bound model service
//!
//! [`ModelService`] is the entry point callers use: it builds a statement,
//! executes it, and maps the returned properties back into domain objects.

use crate::constraints::{ConstraintSource, StaticConstraints};
use crate::cypher::Label;
use crate::executor::Executor;
use crate::mapper::{IdentityMapper, Mapper};
use crate::pagination::PageParams;
use crate::search::{ScoredResult, SearchParams};
use crate::session::GraphSession;
use crate::statement::{Statement, StatementBuilder, COUNT_COLUMN, PROPS_COLUMN, SCORE_COLUMN};
use graphrepo_core::{Error, PropertyBag, Record, Result, ServiceConfig};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

/// Generic data-access service for one node label and one domain type
///
/// # Example
/// ```no_run
/// use graphrepo_core::PropertyBag;
/// use graphrepo_storage::{Label, MemoryGraph, ModelService, PageParams};
/// use std::sync::Arc;
///
/// # async fn example() -> graphrepo_core::Result<()> {
/// let service = ModelService::new(Label::new("Person")?, Arc::new(MemoryGraph::new()))
///     .with_timestamp("createdAt");
/// service.create(&PropertyBag::new().with("name", "ada")).await?;
/// let people = service.find_all(&PageParams::new().order_by("name")).await?;
/// # Ok(())
/// # }
/// ```
pub struct ModelService<T, M = IdentityMapper> {
    statements: StatementBuilder,
    executor: Executor,
    mapper: M,
    constraints: Arc<dyn ConstraintSource>,
    _marker: PhantomData<fn() -> T>,
}

impl ModelService<PropertyBag, IdentityMapper> {
    /// Service whose domain objects are plain property bags
    pub fn new(label: Label, session: Arc<dyn GraphSession>) -> Self {
        Self::with_mapper(label, session, IdentityMapper)
    }
}

impl<T, M> ModelService<T, M>
where
    M: Mapper<T>,
{
    /// Service using a custom mapper between `T` and stored properties
    pub fn with_mapper(label: Label, session: Arc<dyn GraphSession>, mapper: M) -> Self {
        Self {
            statements: StatementBuilder::new(label),
            executor: Executor::new(session),
            mapper,
            constraints: Arc::new(StaticConstraints::new()),
            _marker: PhantomData,
        }
    }

    /// Service configured from a `[services.<Label>]` section
    pub fn from_config(
        label: Label,
        config: &ServiceConfig,
        session: Arc<dyn GraphSession>,
        mapper: M,
    ) -> Self {
        let constraints = StaticConstraints::new()
            .with(label.as_str(), config.constraints.iter().cloned())
            .with(
                label.as_str(),
                config
                    .unique
                    .iter()
                    .map(|prop| crate::constraints::unique_constraint(label.as_str(), prop)),
            );

        let mut service =
            Self::with_mapper(label, session, mapper).with_constraints(Arc::new(constraints));
        if let Some(prop) = &config.timestamp_property {
            service = service.with_timestamp(prop.clone());
        }
        service
    }

    /// Stamp `property` with the server time when nodes are created
    pub fn with_timestamp(mut self, property: impl Into<String>) -> Self {
        self.statements = self.statements.with_timestamp(property);
        self
    }

    /// Source of the statements run by [`Self::install_constraints`]
    pub fn with_constraints(mut self, source: Arc<dyn ConstraintSource>) -> Self {
        self.constraints = source;
        self
    }

    pub fn label(&self) -> &Label {
        self.statements.label()
    }

    pub fn statements(&self) -> &StatementBuilder {
        &self.statements
    }

    /// Create a node from `object`
    ///
    /// Returns `None` if the database returned no row.
    pub async fn create(&self, object: &T) -> Result<Option<T>> {
        let props = self.mapper.to_storage(object)?;
        let statement = self.statements.create(&props);
        self.first_object(&statement).await
    }

    /// Match-or-create a node keyed by every property of `object`
    ///
    /// Returns `None` if the database returned no row.
    pub async fn merge(&self, object: &T) -> Result<Option<T>> {
        let props = self.mapper.to_storage(object)?;
        let statement = self.statements.merge(&props);
        self.first_object(&statement).await
    }

    /// Delete nodes matching `filter`, returning them as they were before deletion
    pub async fn delete(&self, filter: &PropertyBag) -> Result<Vec<T>> {
        let records = self.executor.execute(&self.statements.delete(filter)).await?;
        self.objects(records)
    }

    pub async fn find_all(&self, page: &PageParams) -> Result<Vec<T>> {
        let records = self
            .executor
            .execute(&self.statements.find_all(page))
            .await?;
        self.objects(records)
    }

    pub async fn find_by(&self, filter: &PropertyBag, page: &PageParams) -> Result<Vec<T>> {
        let records = self
            .executor
            .execute(&self.statements.find_by(filter, page))
            .await?;
        self.objects(records)
    }

    /// Number of nodes matching `filter`
    pub async fn count(&self, filter: &PropertyBag) -> Result<i64> {
        let records = self.executor.execute(&self.statements.count(filter)).await?;
        let Some(record) = records.first() else {
            return Ok(0);
        };
        record
            .get(COUNT_COLUMN)
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| Error::storage(format!("Result row has no integer '{COUNT_COLUMN}'")))
    }

    /// Token-overlap search, best matches first
    pub async fn search_by(&self, params: &SearchParams) -> Result<Vec<ScoredResult<T>>> {
        let records = self
            .executor
            .execute(&self.statements.search(params))
            .await?;

        records
            .into_iter()
            .map(|mut record| {
                let score = record
                    .get(SCORE_COLUMN)
                    .and_then(serde_json::Value::as_i64)
                    .ok_or_else(|| {
                        Error::storage(format!("Result row has no integer '{SCORE_COLUMN}'"))
                    })?;
                let object = self.object(&mut record)?;
                Ok(ScoredResult { object, score })
            })
            .collect()
    }

    /// Run this label's schema statements in one transaction
    ///
    /// Returns the number of statements committed.
    pub async fn install_constraints(&self) -> Result<usize> {
        let statements: Vec<Statement> = self
            .constraints
            .constraints(self.label())
            .into_iter()
            .map(Statement::raw)
            .collect();

        info!(
            label = %self.label(),
            count = statements.len(),
            "Installing constraints"
        );

        self.executor.execute_in_transaction(&statements).await?;
        Ok(statements.len())
    }

    async fn first_object(&self, statement: &Statement) -> Result<Option<T>> {
        let records = self.executor.execute(statement).await?;
        match records.into_iter().next() {
            Some(mut record) => self.object(&mut record).map(Some),
            None => Ok(None),
        }
    }

    fn objects(&self, records: Vec<Record>) -> Result<Vec<T>> {
        records
            .into_iter()
            .map(|mut record| self.object(&mut record))
            .collect()
    }

    fn object(&self, record: &mut Record) -> Result<T> {
        let props = record
            .remove(PROPS_COLUMN)
            .ok_or_else(|| Error::storage(format!("Result row has no '{PROPS_COLUMN}' column")))?;
        self.mapper.from_storage(PropertyBag::from_json(props)?)
    }
}
