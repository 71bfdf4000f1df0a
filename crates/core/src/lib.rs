//! Core types for the graphrepo data-access layer
//!
//! This crate provides the foundational pieces shared by the storage crate:
//!
//! - **Properties**: the schema-less property value model stored on nodes
//! - **Configuration**: connection and per-label service settings
//! - **Error handling**: unified error types
//!

pub mod config;
pub mod error;
pub mod property;

// Re-export main types for convenience
pub use config::{Config, Neo4jConfig, ServiceConfig};
pub use error::{Error, Result, ResultExt};
pub use property::{PropertyBag, PropertyValue, Record};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Result, ResultExt};
    pub use crate::property::{PropertyBag, PropertyValue};
}
