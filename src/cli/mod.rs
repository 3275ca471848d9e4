//! CLI module
//!
//! Command-line interface for paginating range stores.
//!
//! # Commands
//!
//! - `paginate` - Fetch one page and print the connection
//! - `populate` - Write demo items into a DuckDB table
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat, PaginateArgs};
pub use runner::Runner;
pub use server::{build_router, serve};
