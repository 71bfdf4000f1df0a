//! Parameterized statement construction
//!
//! Every builder function is pure: it produces a [`Statement`] holding the
//! Cypher text, its bound parameters, the columns each row will carry, and a
//! routing hint. Nothing here touches the database.

use crate::cypher::{literal_node_pattern, property_access, quote_identifier, Label};
use crate::pagination::{OrderBy, Page, PageParams};
use crate::search::{self, SearchParams};
use graphrepo_core::{PropertyBag, PropertyValue};
use std::collections::BTreeMap;

/// Column holding a node's property map
pub const PROPS_COLUMN: &str = "props";
/// Column holding a search score
pub const SCORE_COLUMN: &str = "score";
/// Column holding a match count
pub const COUNT_COLUMN: &str = "count";

/// What a statement does, independent of its Cypher text
///
/// Backends that do not speak Cypher (the in-memory graph) execute statements
/// from this description.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Create {
        label: Label,
        props: PropertyBag,
        timestamp: Option<String>,
    },
    Merge {
        label: Label,
        props: PropertyBag,
        timestamp: Option<String>,
    },
    Delete {
        label: Label,
        filter: PropertyBag,
    },
    Find {
        label: Label,
        filter: PropertyBag,
        order: Option<OrderBy>,
        page: Page,
    },
    Count {
        label: Label,
        filter: PropertyBag,
    },
    Search {
        label: Label,
        property: String,
        terms: Vec<String>,
        page: Page,
    },
    /// Caller-supplied text, such as a schema constraint
    Raw,
}

/// An immutable query plus everything needed to run it
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, PropertyValue>,
    columns: Vec<String>,
    write: bool,
    kind: StatementKind,
}

impl Statement {
    /// A write statement run verbatim, returning no columns
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
            write: true,
            kind: StatementKind::Raw,
        }
    }

    pub(crate) fn new(
        text: String,
        params: BTreeMap<String, PropertyValue>,
        columns: &[&str],
        write: bool,
        kind: StatementKind,
    ) -> Self {
        Self {
            text,
            params,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            write,
            kind,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, PropertyValue> {
        &self.params
    }

    /// Names of the columns every returned row carries
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Routing hint: true when the statement needs a write-capable session
    pub fn is_write(&self) -> bool {
        self.write
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }
}

/// Builds statements for one label
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    label: Label,
    timestamp_property: Option<String>,
}

impl StatementBuilder {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            timestamp_property: None,
        }
    }

    /// Stamp `property` with the server time whenever a node is created
    pub fn with_timestamp(mut self, property: impl Into<String>) -> Self {
        self.timestamp_property = Some(property.into());
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn timestamp_property(&self) -> Option<&str> {
        self.timestamp_property.as_deref()
    }

    /// Create a node with all of `props` bound as parameters
    pub fn create(&self, props: &PropertyBag) -> Statement {
        let (pattern, params) = self.bound_node_pattern(props);
        let mut text = format!("CREATE {pattern}");
        if let Some(ts) = &self.timestamp_property {
            text.push_str(&format!(" SET {} = timestamp()", property_access("n", ts)));
        }
        text.push_str(&format!(" RETURN properties(n) AS {PROPS_COLUMN}"));

        Statement::new(
            text,
            params,
            &[PROPS_COLUMN],
            true,
            StatementKind::Create {
                label: self.label.clone(),
                props: props.clone(),
                timestamp: self.timestamp_property.clone(),
            },
        )
    }

    /// Match-or-create a node keyed by the whole of `props`
    ///
    /// The timestamp is set on the creation branch only.
    pub fn merge(&self, props: &PropertyBag) -> Statement {
        let (pattern, params) = self.bound_node_pattern(props);
        let mut text = format!("MERGE {pattern}");
        if let Some(ts) = &self.timestamp_property {
            text.push_str(&format!(
                " ON CREATE SET {} = timestamp()",
                property_access("n", ts)
            ));
        }
        text.push_str(&format!(" RETURN properties(n) AS {PROPS_COLUMN}"));

        Statement::new(
            text,
            params,
            &[PROPS_COLUMN],
            true,
            StatementKind::Merge {
                label: self.label.clone(),
                props: props.clone(),
                timestamp: self.timestamp_property.clone(),
            },
        )
    }

    /// Delete every node matching `filter`, returning each node's properties as
    /// they were before deletion
    pub fn delete(&self, filter: &PropertyBag) -> Statement {
        let text = format!(
            "MATCH {} WITH n, properties(n) AS {PROPS_COLUMN} DETACH DELETE n RETURN {PROPS_COLUMN}",
            literal_node_pattern("n", &self.label, filter)
        );

        Statement::new(
            text,
            BTreeMap::new(),
            &[PROPS_COLUMN],
            true,
            StatementKind::Delete {
                label: self.label.clone(),
                filter: filter.clone(),
            },
        )
    }

    /// Page through every node of the label
    pub fn find_all(&self, page: &PageParams) -> Statement {
        self.find_by(&PropertyBag::new(), page)
    }

    /// Page through nodes matching `filter`
    pub fn find_by(&self, filter: &PropertyBag, page: &PageParams) -> Statement {
        let order = page.ordering();
        let normalized = page.page();

        let mut text = format!(
            "MATCH {} RETURN properties(n) AS {PROPS_COLUMN}",
            literal_node_pattern("n", &self.label, filter)
        );
        if let Some(order) = &order {
            text.push_str(&order_clause(order));
        }
        text.push_str(" SKIP $skip LIMIT $limit");

        Statement::new(
            text,
            page_params(normalized),
            &[PROPS_COLUMN],
            false,
            StatementKind::Find {
                label: self.label.clone(),
                filter: filter.clone(),
                order,
                page: normalized,
            },
        )
    }

    /// Count nodes matching `filter`
    pub fn count(&self, filter: &PropertyBag) -> Statement {
        let text = format!(
            "MATCH {} RETURN count(n) AS {COUNT_COLUMN}",
            literal_node_pattern("n", &self.label, filter)
        );

        Statement::new(
            text,
            BTreeMap::new(),
            &[COUNT_COLUMN],
            false,
            StatementKind::Count {
                label: self.label.clone(),
                filter: filter.clone(),
            },
        )
    }

    /// Token-overlap text search over one property
    pub fn search(&self, params: &SearchParams) -> Statement {
        search::build_statement(&self.label, params)
    }

    /// `(n:`Label` {`k`: $p0, ...})` with one parameter per property, in key order
    fn bound_node_pattern(
        &self,
        props: &PropertyBag,
    ) -> (String, BTreeMap<String, PropertyValue>) {
        let mut params = BTreeMap::new();
        if props.is_empty() {
            return (format!("(n:{})", self.label.quoted()), params);
        }

        let mut pairs = Vec::with_capacity(props.len());
        for (i, (key, value)) in props.iter().enumerate() {
            let param = format!("p{i}");
            pairs.push(format!("{}: ${param}", quote_identifier(key)));
            params.insert(param, value.clone());
        }
        (
            format!("(n:{} {{{}}})", self.label.quoted(), pairs.join(", ")),
            params,
        )
    }
}

pub(crate) fn order_clause(order: &OrderBy) -> String {
    let direction = if order.descending { " DESC" } else { "" };
    format!(
        " ORDER BY {}{direction}",
        property_access("n", &order.property)
    )
}

pub(crate) fn page_params(page: Page) -> BTreeMap<String, PropertyValue> {
    let mut params = BTreeMap::new();
    params.insert("skip".to_string(), PropertyValue::Integer(page.skip));
    params.insert("limit".to_string(), PropertyValue::Integer(page.limit));
    params
}
