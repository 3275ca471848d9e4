//! Pagination module
//!
//! Relay-style cursor pagination over a range store.
//!
//! # Overview
//!
//! A request names one partition, a display order, an optional sort key
//! prefix and the Relay arguments (`after`/`first`, `before`/`last`). The
//! [`Paginator`] validates the arguments, sends exactly one range query and
//! returns a [`Connection`] whose edges are in display order.
//!
//! Cursors are sort keys with the prefix removed, so a cursor is only
//! meaningful together with the prefix it was produced under.

mod engine;
mod types;

pub use engine::{build_edges, derive_page_info, plan, validate, Paginator, QueryPlan};
pub use types::{
    Connection, Edge, PageDirection, PageInfo, PaginationArgs, PaginationRequest,
};
