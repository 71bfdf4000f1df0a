//! Skip/limit normalization and ordering parameters

use serde::{Deserialize, Serialize};

/// Default number of rows returned when no limit is given
pub const DEFAULT_LIMIT: i64 = 10;

/// Caller-facing paging and ordering parameters
///
/// Values are not validated here; a negative skip or limit is forwarded to the
/// database unchanged and the database decides what happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

impl PageParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order ascending by `property`
    pub fn order_by(mut self, property: impl Into<String>) -> Self {
        self.order_by = Some(property.into());
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn page(&self) -> Page {
        normalize(self.skip, self.limit)
    }

    pub fn ordering(&self) -> Option<OrderBy> {
        self.order_by.as_ref().map(|property| OrderBy {
            property: property.clone(),
            descending: self.descending,
        })
    }
}

/// Normalized skip/limit pair, always 64-bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        normalize(None, None)
    }
}

/// Ordering applied to list results; ties fall back to database order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub property: String,
    pub descending: bool,
}

/// Fill in defaults: skip 0, limit 10
pub fn normalize(skip: Option<i64>, limit: Option<i64>) -> Page {
    Page {
        skip: skip.unwrap_or(0),
        limit: limit.unwrap_or(DEFAULT_LIMIT),
    }
}
