//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PaginateArgs};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{ColumnType, DuckDbStore, TableDefinition};
use crate::error::{Error, Result, ResultExt};
use crate::expression::ExpressionBindings;
use crate::item::AttributeValue;
use crate::pagination::{plan, PaginationArgs, PaginationRequest, Paginator};
use crate::store::{open_store, seed};
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Paginate(args) => self.paginate(&config, args).await,
            Commands::Populate {
                count,
                partition,
                hourly,
                start,
            } => {
                let summary = self.populate(&config, *count, partition, *hourly, start)?;
                self.output(&summary);
                Ok(())
            }
            Commands::Serve { port } => {
                let port = port.unwrap_or(config.server.port);
                crate::cli::serve(config, port).await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<AppConfig> {
        let config = match &self.cli.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Fetch one page
    async fn paginate(&self, config: &AppConfig, args: &PaginateArgs) -> Result<()> {
        let request = build_request(config, args)?;

        if self.cli.verbose {
            let plan = plan(&request, &request.args.clone().normalize());
            tracing::info!(
                "Planned {:?} page: {} (scan_forward={}, limit={:?})",
                plan.direction,
                plan.query.key_condition_expression(),
                plan.query.scan_forward,
                plan.query.limit
            );
        }

        let store = open_store(&config.store).await?;
        let connection = Paginator::new(store).paginate(&request).await?;
        self.output(&connection);
        Ok(())
    }

    /// Create the DuckDB table and write demo items
    fn populate(
        &self,
        config: &AppConfig,
        count: usize,
        partition: &str,
        hourly: bool,
        start: &str,
    ) -> Result<JsonValue> {
        if config.store.backend != StoreBackend::Duckdb {
            return Err(Error::config(
                "populate writes to DuckDB; set store.backend to duckdb",
            ));
        }

        let store = &config.store;
        let items = if hourly {
            let start = DateTime::parse_from_rfc3339(start)
                .map_err(|e| Error::config(format!("Invalid --start '{start}': {e}")))?
                .with_timezone(&Utc);
            seed::hourly_items(
                &store.partition_key_name,
                partition,
                &store.sort_key_name,
                start,
                count,
            )
        } else {
            seed::cursor_items(
                &store.partition_key_name,
                partition,
                &store.sort_key_name,
                count,
            )
        };

        let table = TableDefinition::new(
            &store.table_name,
            &store.partition_key_name,
            &store.sort_key_name,
        )
        .with_column("index", ColumnType::Bigint)
        .with_column("parity", ColumnType::Varchar);

        let db = DuckDbStore::open(&store.path)?;
        let created = !db.list_tables()?.contains(&table.name);
        db.create_table(&table)
            .with_context(|| format!("Failed to create table '{}'", table.name))?;
        let written = db
            .put_items(&table, &items)
            .with_context(|| format!("Failed to write items to '{}'", table.name))?;
        tracing::info!(
            created,
            "Wrote {} items to {}.{}",
            written,
            db.path(),
            table.name
        );

        Ok(json!({
            "table": table.name,
            "partition": partition,
            "written": written,
            "created": created,
            "path": db.path(),
        }))
    }

    /// Output a value
    fn output<T: Serialize>(&self, value: &T) {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}

/// Build a pagination request from command arguments and configuration
pub(crate) fn build_request(config: &AppConfig, args: &PaginateArgs) -> Result<PaginationRequest> {
    let partition = args
        .partition
        .clone()
        .or_else(|| config.defaults.partition_key_value.clone())
        .ok_or_else(|| {
            Error::config("No partition given (use --partition or defaults.partition_key_value)")
        })?;

    let mut request = config.request_for(partition).with_args(PaginationArgs {
        after: args.after.clone(),
        first: args.first,
        before: args.before.clone(),
        last: args.last,
    });

    if let Some(table) = &args.table {
        request.table_name = table.clone();
    }
    if let Some(index) = &args.index {
        request = request.with_index(index);
    }
    if let Some(sort) = args.sort {
        request = request.with_sort(sort);
    }
    if let Some(prefix) = &args.begins_with {
        request = request.with_begins_with(prefix);
    }
    if let Some(projection) = &args.projection {
        request = request.with_projection(projection);
    }

    let bindings = parse_bindings(&args.names, &args.values)?;
    match &args.filter {
        Some(filter) => request = request.with_filter(filter, bindings),
        None => request.bindings = bindings,
    }

    Ok(request)
}

/// Parse `PLACEHOLDER=ATTRIBUTE` and `PLACEHOLDER=JSON` bindings
///
/// Values that are not valid JSON are taken as strings.
fn parse_bindings(names: &[String], values: &[String]) -> Result<ExpressionBindings> {
    let mut bindings = ExpressionBindings::new();

    for raw in names {
        let (placeholder, attribute) = raw.split_once('=').ok_or_else(|| {
            Error::config(format!(
                "Invalid --name binding '{raw}': expected PLACEHOLDER=ATTRIBUTE"
            ))
        })?;
        bindings = bindings.with_name(placeholder, attribute);
    }

    for raw in values {
        let (placeholder, value) = raw.split_once('=').ok_or_else(|| {
            Error::config(format!("Invalid --value binding '{raw}': expected PLACEHOLDER=JSON"))
        })?;
        let value = serde_json::from_str::<JsonValue>(value)
            .unwrap_or_else(|_| JsonValue::String(value.to_string()));
        bindings = bindings.with_value(placeholder, AttributeValue::from(value));
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use clap::Parser;

    #[test]
    fn test_parse_bindings() {
        let bindings = parse_bindings(
            &["#parity=parity".to_string()],
            &[":parity=\"ODD\"".to_string(), ":min=12".to_string(), ":raw=EVEN".to_string()],
        )
        .unwrap();

        assert_eq!(bindings.name("#parity").unwrap(), "parity");
        assert_eq!(bindings.value(":parity").unwrap(), &AttributeValue::from("ODD"));
        assert_eq!(bindings.value(":min").unwrap(), &AttributeValue::from(12_i64));
        assert_eq!(bindings.value(":raw").unwrap(), &AttributeValue::from("EVEN"));
    }

    #[test]
    fn test_parse_bindings_rejects_missing_separator() {
        let err = parse_bindings(&["#parity".to_string()], &[]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_populate_reports_table_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Duckdb;
        config.store.path = dir.path().join("demo.duckdb").display().to_string();

        let runner = Runner::new(Cli::parse_from(["range-relay", "populate"]));
        let first = runner.populate(&config, 5, "p1", false, "").unwrap();
        let second = runner.populate(&config, 5, "p1", false, "").unwrap();

        assert_eq!(first["created"], json!(true));
        assert_eq!(first["written"], json!(5));
        assert_eq!(second["created"], json!(false));
        assert_eq!(
            DuckDbStore::open(&config.store.path).unwrap().list_tables().unwrap(),
            vec![config.store.table_name.clone()]
        );
    }

    #[test]
    fn test_populate_requires_duckdb_backend() {
        let runner = Runner::new(Cli::parse_from(["range-relay", "populate"]));
        let err = runner
            .populate(&AppConfig::default(), 5, "p1", false, "")
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_request_requires_partition() {
        let err = build_request(&AppConfig::default(), &PaginateArgs::default()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_request_overrides_defaults() {
        let mut config = AppConfig::default();
        config.defaults.partition_key_value = Some("p1".to_string());

        let args = PaginateArgs {
            table: Some("events".to_string()),
            before: Some("cursor-20".to_string()),
            last: Some(2),
            sort: Some(SortDirection::Asc),
            filter: Some("#parity = :parity".to_string()),
            names: vec!["#parity=parity".to_string()],
            values: vec![":parity=\"ODD\"".to_string()],
            ..PaginateArgs::default()
        };
        let request = build_request(&config, &args).unwrap();

        assert_eq!(request.table_name, "events");
        assert_eq!(request.partition_key_value, AttributeValue::from("p1"));
        assert_eq!(request.sort, SortDirection::Asc);
        assert_eq!(request.args.before.as_deref(), Some("cursor-20"));
        assert_eq!(request.args.last, Some(2));
        assert_eq!(request.filter_expression.as_deref(), Some("#parity = :parity"));
        assert_eq!(request.bindings.name("#parity").unwrap(), "parity");
    }
}
