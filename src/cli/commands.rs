//! CLI commands and argument parsing

use crate::types::SortDirection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relay cursor pagination over range-sorted stores
#[derive(Parser, Debug)]
#[command(name = "range-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one page from the configured store
    Paginate(PaginateArgs),

    /// Create the configured DuckDB table and write demo items
    Populate {
        /// Number of items to write
        #[arg(short = 'n', long, default_value = "25")]
        count: usize,

        /// Partition receiving the items
        #[arg(short, long, default_value = "default")]
        partition: String,

        /// Key items by hourly timestamps instead of cursor-NN
        #[arg(long)]
        hourly: bool,

        /// First timestamp for --hourly (RFC 3339)
        #[arg(long, default_value = "2020-11-19T00:00:00Z")]
        start: String,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Arguments of the `paginate` command
#[derive(clap::Args, Debug, Default)]
pub struct PaginateArgs {
    /// Partition key value (defaults to defaults.partition_key_value)
    #[arg(short, long)]
    pub partition: Option<String>,

    /// Table to query (defaults to store.table_name)
    #[arg(long)]
    pub table: Option<String>,

    /// Secondary index to query
    #[arg(long)]
    pub index: Option<String>,

    /// Return items after this cursor
    #[arg(long)]
    pub after: Option<String>,

    /// Number of items after the cursor
    #[arg(long, allow_negative_numbers = true)]
    pub first: Option<i64>,

    /// Return items before this cursor
    #[arg(long)]
    pub before: Option<String>,

    /// Number of items before the cursor
    #[arg(long, allow_negative_numbers = true)]
    pub last: Option<i64>,

    /// Display order (ASC or DESC)
    #[arg(long)]
    pub sort: Option<SortDirection>,

    /// Sort key prefix
    #[arg(long)]
    pub begins_with: Option<String>,

    /// Filter expression passed to the store
    #[arg(long)]
    pub filter: Option<String>,

    /// Projection expression passed to the store
    #[arg(long)]
    pub projection: Option<String>,

    /// Attribute name binding, e.g. `#parity=parity` (repeatable)
    #[arg(long = "name", value_name = "PLACEHOLDER=ATTRIBUTE")]
    pub names: Vec<String>,

    /// Value binding as JSON, e.g. `:parity="ODD"` (repeatable)
    #[arg(long = "value", value_name = "PLACEHOLDER=JSON")]
    pub values: Vec<String>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paginate() {
        let cli = Cli::parse_from([
            "range-relay",
            "-C",
            "relay.yaml",
            "paginate",
            "--partition",
            "p1",
            "--after",
            "cursor-12",
            "--first",
            "3",
            "--sort",
            "asc",
            "--name",
            "#parity=parity",
            "--value",
            ":parity=\"ODD\"",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("relay.yaml")));
        let Commands::Paginate(args) = cli.command else {
            panic!("expected paginate");
        };
        assert_eq!(args.partition.as_deref(), Some("p1"));
        assert_eq!(args.first, Some(3));
        assert_eq!(args.sort, Some(SortDirection::Asc));
        assert_eq!(args.names, vec!["#parity=parity"]);
        assert_eq!(args.values, vec![":parity=\"ODD\""]);
    }

    #[test]
    fn test_parse_negative_first() {
        let cli = Cli::parse_from(["range-relay", "paginate", "--first", "-1"]);
        let Commands::Paginate(args) = cli.command else {
            panic!("expected paginate");
        };
        assert_eq!(args.first, Some(-1));
    }

    #[test]
    fn test_parse_populate_defaults() {
        let cli = Cli::parse_from(["range-relay", "populate"]);
        let Commands::Populate {
            count,
            partition,
            hourly,
            ..
        } = cli.command
        else {
            panic!("expected populate");
        };
        assert_eq!(count, 25);
        assert_eq!(partition, "default");
        assert!(!hourly);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
