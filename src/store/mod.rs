//! Range store module
//!
//! The storage collaborator the pagination engine queries. A store answers
//! exactly one kind of request: items of one partition, sorted by sort key,
//! optionally bounded and limited.
//!
//! # Backends
//!
//! - [`MemoryStore`] keeps tables in process memory
//! - [`DuckDbStore`](crate::database::DuckDbStore) keeps tables in DuckDB

mod filter;
mod memory;
pub mod seed;
mod types;

pub use filter::FilterExpression;
pub use memory::{KeySchema, MemoryStore};
pub use types::{ComparisonOperator, CursorBound, RangeQuery, RangeStore, RawQueryOutput};

use crate::config::{StoreBackend, StoreConfig};
use crate::database::DuckDbStore;
use crate::error::Result;
use std::sync::Arc;

/// Open the store described by a configuration
///
/// Memory stores get the configured table created and, when `seed_items`
/// is non-zero, filled with generated demo items.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn RangeStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let mut store = MemoryStore::new();
            if let Some(max) = config.max_page_size {
                store = store.with_max_page_size(max);
            }
            store
                .create_table(
                    &config.table_name,
                    KeySchema::new(&config.partition_key_name, &config.sort_key_name),
                )
                .await?;

            if config.seed_items > 0 {
                let partition = config.seed_partition.as_deref().unwrap_or("default");
                let items = seed::cursor_items(
                    &config.partition_key_name,
                    partition,
                    &config.sort_key_name,
                    config.seed_items,
                );
                let written = store.put_items(&config.table_name, items).await?;
                tracing::info!(
                    "Seeded {} items into memory table {}",
                    written,
                    config.table_name
                );
            }

            Ok(Arc::new(store))
        }
        StoreBackend::Duckdb => {
            let store = DuckDbStore::open(&config.path)?;
            tracing::info!(
                region = config.region.as_deref().unwrap_or("local"),
                "Opened DuckDB store at {}",
                store.path()
            );
            Ok(Arc::new(store))
        }
    }
}
