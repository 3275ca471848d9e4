//! Range query executor
//!
//! Issues exactly one bounded, sorted range query against a store and
//! normalizes the raw response. The executor never retries and never
//! inspects items; store failures are returned as [`Error::Upstream`].
//!
//! [`Error::Upstream`]: crate::error::Error::Upstream

mod types;

pub use types::RangeQueryResult;

use crate::error::Result;
use crate::store::{RangeQuery, RangeStore};
use std::sync::Arc;

/// Executes range queries against a shared store
#[derive(Clone)]
pub struct RangeQueryExecutor {
    store: Arc<dyn RangeStore>,
}

impl std::fmt::Debug for RangeQueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeQueryExecutor")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl RangeQueryExecutor {
    /// Create an executor over a store
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn RangeStore> {
        &self.store
    }

    /// Run one range query
    pub async fn execute(&self, query: &RangeQuery) -> Result<RangeQueryResult> {
        tracing::debug!(
            backend = self.store.backend_name(),
            table = %query.table_name,
            index = query.index_name.as_deref().unwrap_or("-"),
            scan_forward = query.scan_forward,
            limit = ?query.limit,
            "Query: {}",
            query.key_condition_expression()
        );

        let raw = self.store.query(query).await?;
        let result = RangeQueryResult::from(raw);

        tracing::debug!(
            items = result.items.len(),
            truncated = result.truncated,
            scanned = ?result.scanned_count,
            "Query complete"
        );

        Ok(result)
    }
}
