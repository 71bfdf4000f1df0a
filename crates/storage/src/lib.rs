//! Generic data-access layer over a labeled-property graph database
//!
//! Given a node label and a domain type, [`ModelService`] builds parameterized
//! Cypher statements for create, merge, delete, paginated listing, filtered
//! lookup and a token-overlap text search, runs them through a
//! [`GraphSession`], and maps the returned node properties to typed objects.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod constraints;
pub mod cypher;
mod executor;
mod factory;
pub mod mapper;
pub mod pagination;
pub mod search;
mod service;
pub mod session;
pub mod statement;

pub use constraints::{ConstraintSource, StaticConstraints};
pub use cypher::Label;
pub use executor::Executor;
pub use factory::{connect_from_config, create_service, create_session};
pub use mapper::{IdentityMapper, Mapper, SerdeMapper};
pub use pagination::{normalize, Page, PageParams};
pub use search::{ScoredResult, SearchParams};
pub use service::ModelService;
pub use session::{GraphSession, MemoryGraph, Neo4jSession};
pub use statement::{Statement, StatementBuilder, StatementKind};
