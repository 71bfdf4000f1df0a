//! Cypher text helpers: labels, identifier quoting and literal encoding
//!
//! Labels and property names are interpolated into statement text, so they
//! are always wrapped in backticks. They are still trusted identifiers: quoting
//! keeps them syntactically valid, it does not make untrusted input safe.
//!
//! Equality filters used by `delete`/`find_by` embed their values as Cypher
//! literals rather than bound parameters. Create and merge payloads are bound.

use graphrepo_core::{Error, PropertyBag, PropertyValue, Result};
use std::fmt;

/// The node label a service instance operates on
///
/// Fixed for the lifetime of a service; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Create a label
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] when `name` is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_input("Label must not be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label as it appears in statement text
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Label {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// Wrap an identifier in backticks, doubling any embedded backtick
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a value as a Cypher literal
pub fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(x) => float_literal(*x),
        PropertyValue::String(s) => string_literal(s),
        PropertyValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        "0.0/0.0".to_string()
    } else if x.is_infinite() {
        if x > 0.0 {
            "1.0/0.0".to_string()
        } else {
            "-1.0/0.0".to_string()
        }
    } else {
        // Debug formatting keeps the fractional part ("1.0"), so the literal stays a float
        format!("{x:?}")
    }
}

fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Node pattern `(n:`Label` {`k`: <literal>, ...})` for an equality filter
pub(crate) fn literal_node_pattern(var: &str, label: &Label, filter: &PropertyBag) -> String {
    if filter.is_empty() {
        return format!("({var}:{})", label.quoted());
    }
    let pairs: Vec<String> = filter
        .iter()
        .map(|(k, v)| format!("{}: {}", quote_identifier(k), literal(v)))
        .collect();
    format!("({var}:{} {{{}}})", label.quoted(), pairs.join(", "))
}

/// Property access `n.`name``
pub(crate) fn property_access(var: &str, name: &str) -> String {
    format!("{var}.{}", quote_identifier(name))
}
