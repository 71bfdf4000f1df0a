use crate::cypher::Label;
use crate::service::ModelService;
use crate::session::{GraphSession, Neo4jSession};
use graphrepo_core::{Config, Neo4jConfig, PropertyBag, Result};
use std::sync::Arc;

/// Creates a graph session from connection configuration.
///
/// The returned session is shared by every service built on it; it owns the
/// connection pool.
///
/// # Errors
/// Returns an error if the configuration is invalid or the database cannot be reached
pub async fn create_session(config: &Neo4jConfig) -> Result<Arc<dyn GraphSession>> {
    let session = Neo4jSession::connect(config).await?;
    Ok(Arc::new(session) as Arc<dyn GraphSession>)
}

/// Creates a property-bag service for `label` using its `[services.<label>]`
/// section, or defaults when the label has no section.
///
/// # Example
/// ```ignore
/// let config = Config::load(None)?;
/// let session = create_session(&config.neo4j).await?;
/// let people = create_service(&config, "Person", session)?;
/// people.install_constraints().await?;
/// ```
pub fn create_service(
    config: &Config,
    label: &str,
    session: Arc<dyn GraphSession>,
) -> Result<ModelService<PropertyBag>> {
    let label = Label::new(label)?;
    let service_config = config.service(label.as_str()).cloned().unwrap_or_default();
    Ok(ModelService::from_config(
        label,
        &service_config,
        session,
        crate::mapper::IdentityMapper,
    ))
}

/// Creates and validates configuration, connects, and returns the session.
///
/// Equivalent to calling [`Config::validate`] followed by [`create_session`].
pub async fn connect_from_config(config: &Config) -> Result<Arc<dyn GraphSession>> {
    config.validate()?;
    create_session(&config.neo4j).await
}
