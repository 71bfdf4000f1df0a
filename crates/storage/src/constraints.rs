//! Sources of schema-constraint statements for a label

use crate::cypher::{property_access, quote_identifier, Label};
use graphrepo_core::Config;
use std::collections::BTreeMap;

/// Supplies the schema statements to install for a label
pub trait ConstraintSource: Send + Sync {
    fn constraints(&self, label: &Label) -> Vec<String>;
}

impl<F> ConstraintSource for F
where
    F: Fn(&Label) -> Vec<String> + Send + Sync,
{
    fn constraints(&self, label: &Label) -> Vec<String> {
        self(label)
    }
}

/// Fixed per-label statement lists
#[derive(Debug, Clone, Default)]
pub struct StaticConstraints {
    by_label: BTreeMap<String, Vec<String>>,
}

impl StaticConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append statements for `label`
    pub fn with<I, S>(mut self, label: impl Into<String>, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_label
            .entry(label.into())
            .or_default()
            .extend(statements.into_iter().map(Into::into));
        self
    }

    /// Collect every service's statements from configuration
    ///
    /// Explicit statements come first, then one uniqueness constraint per
    /// property listed under `unique`.
    pub fn from_config(config: &Config) -> Self {
        let mut constraints = Self::new();
        for (label, service) in &config.services {
            let unique = service
                .unique
                .iter()
                .map(|prop| unique_constraint(label, prop));
            constraints = constraints
                .with(label.clone(), service.constraints.iter().cloned())
                .with(label.clone(), unique);
        }
        constraints
    }
}

impl ConstraintSource for StaticConstraints {
    fn constraints(&self, label: &Label) -> Vec<String> {
        self.by_label
            .get(label.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// `CREATE CONSTRAINT IF NOT EXISTS FOR (n:`Label`) REQUIRE n.`prop` IS UNIQUE`
pub fn unique_constraint(label: &str, property: &str) -> String {
    format!(
        "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{}) REQUIRE {} IS UNIQUE",
        quote_identifier(label),
        property_access("n", property)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unique_constraint_text() {
        assert_eq!(
            unique_constraint("Person", "email"),
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:`Person`) REQUIRE n.`email` IS UNIQUE"
        );
    }

    #[test]
    fn test_static_constraints_per_label() {
        let source = StaticConstraints::new()
            .with("Person", ["A", "B"])
            .with("Person", ["C"]);
        let person = Label::new("Person").unwrap();
        let other = Label::new("Other").unwrap();
        assert_eq!(source.constraints(&person), vec!["A", "B", "C"]);
        assert!(source.constraints(&other).is_empty());
    }

    #[test]
    fn test_from_config_appends_unique_constraints() {
        let config = Config::from_toml_str(
            r#"
            [services.Person]
            constraints = ["CREATE INDEX person_name IF NOT EXISTS FOR (n:Person) ON (n.name)"]
            unique = ["email"]
            "#,
        )
        .unwrap();
        let source = StaticConstraints::from_config(&config);
        let statements = source.constraints(&Label::new("Person").unwrap());
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE INDEX person_name"));
        assert_eq!(statements[1], unique_constraint("Person", "email"));
    }

    #[test]
    fn test_closure_source() {
        let source = |label: &Label| vec![format!("// {label}")];
        assert_eq!(
            source.constraints(&Label::new("Tag").unwrap()),
            vec!["// Tag".to_string()]
        );
    }
}
