// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # range-relay
//!
//! Relay-style cursor pagination over partitioned, range-sorted key-value
//! stores whose only read primitive is "query a contiguous range of one
//! partition, sorted by sort key, optionally limited".
//!
//! ## Features
//!
//! - **Relay Connections**: `after`/`first` and `before`/`last` arguments,
//!   edges with cursors, `PageInfo`
//! - **One Query Per Page**: every request becomes exactly one bounded range
//!   query; no retries, no loops
//! - **Key Prefixes**: page inside a sort key prefix with prefix-free cursors
//! - **Pluggable Stores**: in-memory and DuckDB backends behind one trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use range_relay::pagination::{PaginationRequest, Paginator};
//! use range_relay::store::{KeySchema, MemoryStore};
//! use range_relay::SortDirection;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> range_relay::Result<()> {
//!     let store = MemoryStore::new();
//!     store.create_table("events", KeySchema::new("pk", "sk")).await?;
//!
//!     let paginator = Paginator::new(Arc::new(store));
//!     let request = PaginationRequest::new("events", "pk", "tenant-1", "sk")
//!         .with_sort(SortDirection::Asc)
//!         .after(None, Some(10));
//!
//!     let page = paginator.paginate(&request).await?;
//!     println!("{:?}", page.page_info);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Cursor Pagination Engine                 │
//! │  validate → plan → execute → prefix filter → order → page   │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴───────────────────────────────┐
//! │                     Range Query Executor                    │
//! │        one bounded, sorted query; normalized result         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!               ┌───────────────┴───────────────┐
//!               │   MemoryStore  │  DuckDbStore │
//!               └───────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Items and attribute values
pub mod item;

/// Expression placeholders
pub mod expression;

/// Range store capability and the in-memory store
pub mod store;

/// Range store support via DuckDB
pub mod database;

/// Range query executor
pub mod query;

/// Relay cursor pagination
pub mod pagination;

/// Application configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use item::{AttributeValue, Item};
pub use pagination::{Connection, Edge, PageInfo, PaginationArgs, PaginationRequest, Paginator};
pub use store::{RangeQuery, RangeStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
