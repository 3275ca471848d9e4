//! Range store support via DuckDB
//!
//! This module provides a persistent range store using DuckDB as the
//! storage engine. Tables are created and filled through
//! [`DuckDbStore::create_table`] / [`DuckDbStore::put_items`] and queried
//! through the [`RangeStore`](crate::store::RangeStore) trait.

mod engine;

pub use engine::{ColumnDefinition, ColumnType, DuckDbStore, TableDefinition};
