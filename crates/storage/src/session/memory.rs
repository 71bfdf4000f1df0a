//! In-memory graph session
//!
//! Executes statements from their [`StatementKind`] instead of parsing Cypher,
//! with the same observable semantics as the Neo4j backend: insertion order is
//! database order, merge matches on every given property, timestamps are set on
//! creation only, and transactions either commit fully or not at all.

use super::traits::GraphSession;
use crate::pagination::{OrderBy, Page};
use crate::search;
use crate::statement::{Statement, StatementKind, COUNT_COLUMN, PROPS_COLUMN, SCORE_COLUMN};
use async_trait::async_trait;
use graphrepo_core::{Error, PropertyBag, PropertyValue, Record, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// In-memory node data
#[derive(Debug, Clone)]
struct Node {
    label: String,
    props: PropertyBag,
}

/// State a transaction works on; cloned per call so failures leave it untouched
#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: Vec<Node>,
    schema: Vec<String>,
    fail_on: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryData {
    state: GraphState,
    executed: Vec<Statement>,
}

/// Graph session holding nodes in process memory
#[derive(Clone)]
pub struct MemoryGraph {
    data: Arc<Mutex<MemoryData>>,
    clock: Clock,
}

impl MemoryGraph {
    /// Create an empty graph stamping wall-clock milliseconds
    pub fn new() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }

    /// Create an empty graph whose `timestamp()` comes from `clock`
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            data: Arc::new(Mutex::new(MemoryData::default())),
            clock: Arc::new(clock),
        }
    }

    /// Fail every statement whose text contains `fragment`
    pub async fn fail_on(&self, fragment: impl Into<String>) {
        self.data.lock().await.state.fail_on = Some(fragment.into());
    }

    /// Number of nodes stored, across all labels
    pub async fn node_count(&self) -> usize {
        self.data.lock().await.state.nodes.len()
    }

    /// Raw statements committed so far, in order
    pub async fn schema_statements(&self) -> Vec<String> {
        self.data.lock().await.state.schema.clone()
    }

    /// Every statement received, including ones that failed
    pub async fn executed(&self) -> Vec<Statement> {
        self.data.lock().await.executed.clone()
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphSession for MemoryGraph {
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>> {
        let mut data = self.data.lock().await;
        data.executed.push(statement.clone());

        let mut working = data.state.clone();
        let records = apply(&mut working, statement, &self.clock)?;
        data.state = working;
        Ok(records)
    }

    async fn run_in_transaction(&self, statements: &[Statement]) -> Result<()> {
        let mut data = self.data.lock().await;
        data.executed.extend(statements.iter().cloned());

        // All-or-nothing: work on a copy, swap it in only after every statement succeeded
        let mut working = data.state.clone();
        for statement in statements {
            apply(&mut working, statement, &self.clock)?;
        }
        data.state = working;
        Ok(())
    }
}

fn apply(data: &mut GraphState, statement: &Statement, clock: &Clock) -> Result<Vec<Record>> {
    if let Some(fragment) = &data.fail_on {
        if statement.text().contains(fragment.as_str()) {
            return Err(Error::storage(format!(
                "Statement rejected by memory graph: {}",
                statement.text()
            )));
        }
    }

    match statement.kind() {
        StatementKind::Create {
            label,
            props,
            timestamp,
        } => {
            let node = create_node(data, label.as_str(), props, timestamp.as_deref(), clock);
            Ok(vec![props_record(&node.props)?])
        }
        StatementKind::Merge {
            label,
            props,
            timestamp,
        } => {
            if let Some((key, _)) = props.iter().find(|(_, v)| v.is_null()) {
                return Err(Error::storage(format!(
                    "Cannot merge node using null property value for '{key}'"
                )));
            }
            let existing = data
                .nodes
                .iter()
                .find(|n| matches_node(n, label.as_str(), props))
                .cloned();
            let node = match existing {
                Some(node) => node,
                None => create_node(data, label.as_str(), props, timestamp.as_deref(), clock),
            };
            Ok(vec![props_record(&node.props)?])
        }
        StatementKind::Delete { label, filter } => {
            let (deleted, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut data.nodes)
                .into_iter()
                .partition(|n| matches_node(n, label.as_str(), filter));
            data.nodes = kept;
            deleted.iter().map(|n| props_record(&n.props)).collect()
        }
        StatementKind::Find {
            label,
            filter,
            order,
            page,
        } => {
            check_page(page)?;
            let mut matched: Vec<&Node> = data
                .nodes
                .iter()
                .filter(|n| matches_node(n, label.as_str(), filter))
                .collect();
            if let Some(order) = order {
                sort_nodes(&mut matched, order);
            }
            paginate(matched, page)
                .map(|n| props_record(&n.props))
                .collect()
        }
        StatementKind::Count { label, filter } => {
            let count = data
                .nodes
                .iter()
                .filter(|n| matches_node(n, label.as_str(), filter))
                .count();
            let mut record = Record::new();
            record.insert(COUNT_COLUMN.to_string(), serde_json::Value::from(count as i64));
            Ok(vec![record])
        }
        StatementKind::Search {
            label,
            property,
            terms,
            page,
        } => {
            check_page(page)?;
            let mut scored: Vec<(&Node, i64)> = data
                .nodes
                .iter()
                .filter(|n| n.label == label.as_str())
                .filter_map(|n| {
                    let text = search::searchable_text(n.props.get(property));
                    let words = search::tokenize(&text);
                    search::is_candidate(&words, terms.as_slice())
                        .then(|| (n, search::score(&words, terms.as_slice())))
                })
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            paginate(scored, page)
                .map(|(n, score)| {
                    let mut record = props_record(&n.props)?;
                    record.insert(SCORE_COLUMN.to_string(), serde_json::Value::from(score));
                    Ok(record)
                })
                .collect()
        }
        StatementKind::Raw => {
            data.schema.push(statement.text().to_string());
            Ok(Vec::new())
        }
    }
}

fn create_node(
    data: &mut GraphState,
    label: &str,
    props: &PropertyBag,
    timestamp: Option<&str>,
    clock: &Clock,
) -> Node {
    // Cypher drops null-valued properties on create
    let mut stored: PropertyBag = props
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(ts) = timestamp {
        stored.insert(ts, clock());
    }
    let node = Node {
        label: label.to_string(),
        props: stored,
    };
    data.nodes.push(node.clone());
    node
}

fn matches_node(node: &Node, label: &str, filter: &PropertyBag) -> bool {
    node.label == label
        && filter
            .iter()
            .all(|(k, v)| node.props.get(k).is_some_and(|actual| values_equal(actual, v)))
}

fn values_equal(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a, b) {
        (PropertyValue::Integer(x), PropertyValue::Float(y))
        | (PropertyValue::Float(y), PropertyValue::Integer(x)) => (*x as f64) == *y,
        (PropertyValue::List(xs), PropertyValue::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        // null never equals anything in a pattern match
        (PropertyValue::Null, _) | (_, PropertyValue::Null) => false,
        _ => a == b,
    }
}

fn check_page(page: &Page) -> Result<()> {
    if page.skip < 0 || page.limit < 0 {
        return Err(Error::storage(format!(
            "SKIP and LIMIT must be non-negative, got skip={} limit={}",
            page.skip, page.limit
        )));
    }
    Ok(())
}

fn paginate<T>(items: Vec<T>, page: &Page) -> impl Iterator<Item = T> {
    let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(limit)
}

/// Stable sort following Cypher orderability; missing values sort last ascending
fn sort_nodes(nodes: &mut [&Node], order: &OrderBy) {
    nodes.sort_by(|a, b| {
        let ordering = compare_values(
            a.props.get(&order.property),
            b.props.get(&order.property),
        );
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn type_rank(value: Option<&PropertyValue>) -> u8 {
    match value {
        Some(PropertyValue::List(_)) => 0,
        Some(PropertyValue::String(_)) => 1,
        Some(PropertyValue::Bool(_)) => 2,
        Some(PropertyValue::Integer(_)) | Some(PropertyValue::Float(_)) => 3,
        Some(PropertyValue::Null) | None => 4,
    }
}

fn compare_values(a: Option<&PropertyValue>, b: Option<&PropertyValue>) -> Ordering {
    match (a, b) {
        (Some(PropertyValue::String(x)), Some(PropertyValue::String(y))) => x.cmp(y),
        (Some(PropertyValue::Bool(x)), Some(PropertyValue::Bool(y))) => x.cmp(y),
        (Some(PropertyValue::Integer(x)), Some(PropertyValue::Integer(y))) => x.cmp(y),
        (
            Some(x @ (PropertyValue::Integer(_) | PropertyValue::Float(_))),
            Some(y @ (PropertyValue::Integer(_) | PropertyValue::Float(_))),
        ) => as_f64(x).total_cmp(&as_f64(y)),
        (Some(PropertyValue::List(xs)), Some(PropertyValue::List(ys))) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| compare_values(Some(x), Some(y)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn as_f64(value: &PropertyValue) -> f64 {
    match value {
        PropertyValue::Integer(i) => *i as f64,
        PropertyValue::Float(x) => *x,
        _ => f64::NAN,
    }
}

fn props_record(props: &PropertyBag) -> Result<Record> {
    let mut record = Record::new();
    record.insert(PROPS_COLUMN.to_string(), props.to_json()?);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::Label;
    use crate::pagination::PageParams;
    use crate::statement::StatementBuilder;
    use pretty_assertions::assert_eq;

    fn builder() -> StatementBuilder {
        StatementBuilder::new(Label::new("Person").unwrap()).with_timestamp("createdAt")
    }

    fn names(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r[PROPS_COLUMN]["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_merge_matches_existing_node() {
        let graph = MemoryGraph::with_clock(|| 7);
        let props = PropertyBag::new().with("name", "ada");

        graph.run(&builder().merge(&props)).await.unwrap();
        graph.run(&builder().merge(&props)).await.unwrap();
        assert_eq!(graph.node_count().await, 1);

        graph
            .run(&builder().merge(&props.clone().with("age", 36i64)))
            .await
            .unwrap();
        assert_eq!(graph.node_count().await, 2);
    }

    #[tokio::test]
    async fn test_merge_rejects_null_values() {
        let graph = MemoryGraph::new();
        let props = PropertyBag::new().with("name", PropertyValue::Null);
        assert!(graph.run(&builder().merge(&props)).await.is_err());
    }

    #[tokio::test]
    async fn test_create_drops_nulls_and_stamps() {
        let graph = MemoryGraph::with_clock(|| 1_700_000_000_000);
        let props = PropertyBag::new()
            .with("name", "ada")
            .with("nickname", PropertyValue::Null);
        let records = graph.run(&builder().create(&props)).await.unwrap();
        let stored = &records[0][PROPS_COLUMN];
        assert_eq!(stored["createdAt"], serde_json::json!(1_700_000_000_000i64));
        assert!(stored.get("nickname").is_none());
    }

    #[tokio::test]
    async fn test_find_orders_missing_values_last() {
        let graph = MemoryGraph::new();
        for name in ["bob", "ada", "cy"] {
            graph
                .run(&builder().create(&PropertyBag::new().with("name", name)))
                .await
                .unwrap();
        }
        graph
            .run(&builder().create(&PropertyBag::new().with("age", 1i64)))
            .await
            .unwrap();

        let asc = graph
            .run(&builder().find_all(&PageParams::new().order_by("name")))
            .await
            .unwrap();
        assert_eq!(names(&asc), vec!["ada", "bob", "cy", ""]);

        let desc = graph
            .run(&builder().find_all(&PageParams::new().order_by("name").descending()))
            .await
            .unwrap();
        assert_eq!(names(&desc), vec!["", "cy", "bob", "ada"]);
    }

    #[tokio::test]
    async fn test_negative_page_is_rejected_by_backend() {
        let graph = MemoryGraph::new();
        let result = graph
            .run(&builder().find_all(&PageParams::new().skip(-1)))
            .await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_transaction_is_all_or_nothing() {
        let graph = MemoryGraph::new();
        graph.fail_on("BROKEN").await;

        let statements = vec![
            Statement::raw("CREATE CONSTRAINT a IF NOT EXISTS FOR (n:Person) REQUIRE n.id IS UNIQUE"),
            Statement::raw("BROKEN STATEMENT"),
        ];
        assert!(graph.run_in_transaction(&statements).await.is_err());
        assert!(graph.schema_statements().await.is_empty());
        assert_eq!(graph.executed().await.len(), 2);

        graph
            .run_in_transaction(&statements[..1])
            .await
            .unwrap();
        assert_eq!(graph.schema_statements().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_statement_is_logged_and_leaves_nodes() {
        let graph = MemoryGraph::new();
        graph
            .run(&builder().create(&PropertyBag::new().with("name", "ada")))
            .await
            .unwrap();
        graph.fail_on("DETACH DELETE").await;

        assert!(graph.run(&builder().delete(&PropertyBag::new())).await.is_err());
        assert_eq!(graph.node_count().await, 1);

        let executed = graph.executed().await;
        assert_eq!(executed.len(), 2);
        assert!(executed[1].text().contains("DETACH DELETE"));
    }

    #[tokio::test]
    async fn test_non_finite_float_fails_without_storing() {
        let graph = MemoryGraph::new();
        let props = PropertyBag::new().with("ratio", f64::NAN);

        let result = graph.run(&builder().create(&props)).await;

        assert!(matches!(result, Err(Error::Mapping(_))));
        assert_eq!(graph.node_count().await, 0);
    }

    #[test]
    fn test_compare_values_mixed_numbers() {
        let one = PropertyValue::Integer(1);
        let one_and_half = PropertyValue::Float(1.5);
        assert_eq!(compare_values(Some(&one), Some(&one_and_half)), Ordering::Less);
        assert!(values_equal(&PropertyValue::Integer(2), &PropertyValue::Float(2.0)));
    }
}
