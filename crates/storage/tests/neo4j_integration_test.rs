//! Integration tests against a real Neo4j server
//!
//! Each test starts its own Neo4j Community container, so they are ignored by
//! default. Run with `cargo test -p graphrepo-storage -- --ignored` with Docker
//! available.

mod common;

use anyhow::Result;
use common::{bag, init_test_logging, unique_label, TestNeo4j};
use graphrepo_core::{PropertyBag, PropertyValue};
use graphrepo_storage::{
    constraints::unique_constraint, create_session, Label, ModelService, PageParams, SearchParams,
    StaticConstraints,
};
use std::sync::Arc;

async fn service(neo4j: &TestNeo4j, prefix: &str) -> Result<ModelService<PropertyBag>> {
    init_test_logging();
    let session = create_session(&neo4j.config()).await?;
    let label = Label::new(unique_label(prefix))?;
    Ok(ModelService::new(label, session).with_timestamp("createdAt"))
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_merge_and_delete() -> Result<()> {
    let neo4j = TestNeo4j::start().await?;
    let people = service(&neo4j, "Person").await?;

    let created = people
        .create(&PropertyBag::new().with("name", "ada").with("age", 36))
        .await?
        .expect("create returns the node");
    assert!(matches!(
        created.get("createdAt"),
        Some(PropertyValue::Integer(ms)) if *ms > 0
    ));

    let first = people.merge(&bag([("name", "bob")])).await?;
    let second = people.merge(&bag([("name", "bob")])).await?;
    assert_eq!(first, second);
    assert_eq!(people.count(&PropertyBag::new()).await?, 2);

    let removed = people.delete(&bag([("name", "ada")])).await?;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].get("age"), Some(&PropertyValue::Integer(36)));
    assert_eq!(people.count(&PropertyBag::new()).await?, 1);

    Ok(())
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_find_orders_and_paginates() -> Result<()> {
    let neo4j = TestNeo4j::start().await?;
    let people = service(&neo4j, "Person").await?;
    for name in ["bob", "ada", "cy", "o'brien"] {
        people.create(&bag([("name", name)])).await?;
    }

    let page = people
        .find_all(&PageParams::new().order_by("name").skip(1).limit(2))
        .await?;
    let names: Vec<_> = page
        .iter()
        .filter_map(|p| p.get("name").and_then(PropertyValue::as_str))
        .collect();
    assert_eq!(names, vec!["bob", "cy"]);

    let quoted = people
        .find_by(&bag([("name", "o'brien")]), &PageParams::new())
        .await?;
    assert_eq!(quoted.len(), 1);

    Ok(())
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_search_scores_match_in_memory_scoring() -> Result<()> {
    let neo4j = TestNeo4j::start().await?;
    let docs = service(&neo4j, "Doc").await?;
    for title in ["red blue red", "reddish", "green", "ab cd"] {
        docs.create(&bag([("title", title)])).await?;
    }

    let results = docs
        .search_by(&SearchParams::new("title", ["red", "blue"]))
        .await?;
    let scores: Vec<i64> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![12, 2]);

    let full = docs
        .search_by(&SearchParams::new("title", ["ab", "cd"]))
        .await?;
    assert_eq!(full[0].score, 100);

    docs.create(&bag([("title", "fo\u{A0}ba")])).await?;
    let unsplit = docs
        .search_by(&SearchParams::new("title", ["fo", "ba"]))
        .await?;
    assert_eq!(unsplit.len(), 1);
    assert_eq!(unsplit[0].score, 4);

    Ok(())
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_install_unique_constraint() -> Result<()> {
    let neo4j = TestNeo4j::start().await?;
    let people = service(&neo4j, "Person").await?;
    let label = people.label().as_str().to_string();
    let people = people.with_constraints(Arc::new(
        StaticConstraints::new().with(label.clone(), [unique_constraint(&label, "email")]),
    ));

    assert_eq!(people.install_constraints().await?, 1);
    // Idempotent thanks to IF NOT EXISTS
    assert_eq!(people.install_constraints().await?, 1);

    people.create(&bag([("email", "ada@example.com")])).await?;
    let duplicate = people.create(&bag([("email", "ada@example.com")])).await;
    assert!(duplicate.is_err());

    Ok(())
}
