//! Pagination query extractor shared by the queue and error-visualization endpoints.

use serde::Deserialize;

/// `?offset=&limit=` query parameters, defaulting to the first page.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "PaginationQuery::default_limit")]
    pub limit: usize,
}

impl PaginationQuery {
    const DEFAULT_LIMIT: usize = 50;

    fn default_limit() -> usize {
        Self::DEFAULT_LIMIT
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { offset: 0, limit: Self::DEFAULT_LIMIT }
    }
}
