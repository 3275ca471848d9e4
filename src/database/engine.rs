//! DuckDB-backed range store
//!
//! Each table is a DuckDB table whose rows are items. The partition and sort
//! key of a query are plain columns, so any (partition, sort) column pair can
//! serve as an access path. Filter expressions are SQL boolean fragments
//! whose `#name` / `:value` placeholders are substituted before execution.

use crate::error::{Result, StoreError};
use crate::expression::{bind_values, parse_projection, render_names};
use crate::item::{project, AttributeValue, Item};
use crate::store::{RangeQuery, RangeStore, RawQueryOutput};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Column used to carry the filter verdict of each scanned row
const MATCHED_COLUMN: &str = "__range_relay_matched";

/// Column types supported when creating tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Varchar,
    Bigint,
    Double,
    Boolean,
    Blob,
    Json,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Bigint => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Blob => "BLOB",
            Self::Json => "JSON",
        }
    }
}

/// A column of a table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    /// Create a column definition
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Table layout used by [`DuckDbStore::create_table`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,
    /// Partition key column (VARCHAR)
    pub partition_key_name: String,
    /// Sort key column (VARCHAR)
    pub sort_key_name: String,
    /// Additional attribute columns
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a table definition with only key columns
    pub fn new(
        name: impl Into<String>,
        partition_key_name: impl Into<String>,
        sort_key_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key_name: partition_key_name.into(),
            sort_key_name: sort_key_name.into(),
            columns: Vec::new(),
        }
    }

    /// Add an attribute column
    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDefinition::new(name, column_type));
        self
    }

    fn column_names(&self) -> Vec<&str> {
        let mut names = vec![self.partition_key_name.as_str(), self.sort_key_name.as_str()];
        names.extend(self.columns.iter().map(|c| c.name.as_str()));
        names
    }
}

/// Range store using an embedded DuckDB database
pub struct DuckDbStore {
    /// DuckDB connection
    conn: Mutex<Connection>,
    /// Database path (":memory:" for in-memory)
    path: String,
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DuckDbStore {
    /// Open a database file, or an in-memory database for ":memory:"
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StoreError::backend(format!("Failed to open DuckDB at '{path}': {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_string(),
        })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Database path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::backend("DuckDB connection lock poisoned"))
    }

    /// Create a table if it does not exist
    pub fn create_table(&self, table: &TableDefinition) -> Result<()> {
        let mut columns = vec![
            format!("{} VARCHAR NOT NULL", quote_ident(&table.partition_key_name)),
            format!("{} VARCHAR NOT NULL", quote_ident(&table.sort_key_name)),
        ];
        columns.extend(
            table
                .columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql())),
        );

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}, {}))",
            quote_ident(&table.name),
            columns.join(", "),
            quote_ident(&table.partition_key_name),
            quote_ident(&table.sort_key_name)
        );

        tracing::debug!("Executing: {}", sql);
        self.lock()?.execute_batch(&sql)?;
        Ok(())
    }

    /// Insert or replace items, returning how many were written
    ///
    /// Attributes without a matching column are dropped; missing attributes
    /// are written as NULL.
    pub fn put_items(&self, table: &TableDefinition, items: &[Item]) -> Result<usize> {
        let names = table.column_names();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_ident(&table.name),
            names
                .iter()
                .map(|n| quote_ident(n))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; names.len()].join(", ")
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        for item in items {
            let row: Vec<Value> = names
                .iter()
                .map(|name| item.get(*name).map_or(Value::Null, attribute_to_duckdb))
                .collect();
            stmt.execute(duckdb::params_from_iter(row.iter()))?;
        }

        Ok(items.len())
    }

    /// Get list of tables in the database
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main'
             ORDER BY table_name",
        )?;

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(tables)
    }

    /// Column names of a table, in declaration order
    fn table_columns(conn: &Connection, table: &str) -> std::result::Result<Vec<String>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ?
             ORDER BY ordinal_position",
        )?;
        let columns: Vec<String> = stmt
            .query_map([table], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        if columns.is_empty() {
            return Err(StoreError::table_not_found(table));
        }
        Ok(columns)
    }

    fn run_query(&self, query: &RangeQuery) -> std::result::Result<RawQueryOutput, StoreError> {
        let conn = self.lock()?;
        let columns = Self::table_columns(&conn, &query.table_name)?;
        for key in [&query.partition_key_name, &query.sort_key_name] {
            if !columns.contains(key) {
                return Err(StoreError::validation(format!(
                    "Table '{}' has no column '{key}'",
                    query.table_name
                )));
            }
        }

        let (sql, params) = build_select(query, &columns)?;
        tracing::debug!("Executing range query: {}", sql);

        let width = columns.len() + usize::from(query.filter_expression.is_some());
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<Vec<Value>> = stmt
            .query_map(duckdb::params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<duckdb::Result<Vec<_>>>()
            })?
            .collect::<std::result::Result<_, _>>()?;

        let page_size = query.limit.map_or(usize::MAX, |l| l as usize);
        let truncated = rows.len() > page_size;

        let scanned: Vec<(Item, bool)> = rows
            .into_iter()
            .take(page_size)
            .map(|mut row| {
                let matched = if query.filter_expression.is_some() {
                    matches!(row.pop(), Some(Value::Boolean(true)))
                } else {
                    true
                };
                let item: Item = columns
                    .iter()
                    .cloned()
                    .zip(row)
                    .filter(|(_, value)| !matches!(value, Value::Null))
                    .map(|(name, value)| (name, duckdb_to_attribute(value)))
                    .collect();
                (item, matched)
            })
            .collect();

        let last_evaluated_key = if truncated {
            let mut key = Item::from([(
                query.partition_key_name.clone(),
                query.partition_key_value.clone(),
            )]);
            if let Some((last, _)) = scanned.last() {
                if let Some(sort_value) = last.get(&query.sort_key_name) {
                    key.insert(query.sort_key_name.clone(), sort_value.clone());
                }
            }
            Some(key)
        } else {
            None
        };

        let projection = query
            .projection_expression
            .as_deref()
            .map(|expr| parse_projection(expr, &query.bindings))
            .transpose()?;

        let scanned_count = scanned.len() as u64;
        let items: Vec<Item> = scanned
            .into_iter()
            .filter(|(_, matched)| *matched)
            .map(|(item, _)| match &projection {
                Some(attributes) => project(&item, attributes),
                None => item,
            })
            .collect();

        Ok(RawQueryOutput {
            count: Some(items.len() as u64),
            scanned_count: Some(scanned_count),
            items,
            last_evaluated_key,
            consumed_capacity: None,
        })
    }
}

#[async_trait]
impl RangeStore for DuckDbStore {
    async fn query(&self, query: &RangeQuery) -> std::result::Result<RawQueryOutput, StoreError> {
        self.run_query(query)
    }

    fn backend_name(&self) -> &'static str {
        "duckdb"
    }
}

/// Build the SELECT for a range query
///
/// The key condition and limit select the scanned rows (one extra row is
/// fetched to detect truncation); the filter verdict is computed per row in
/// an outer query so the limit applies before filtering.
fn build_select(
    query: &RangeQuery,
    columns: &[String],
) -> std::result::Result<(String, Vec<Value>), StoreError> {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let sort_key = quote_ident(&query.sort_key_name);
    let direction = if query.scan_forward { "ASC" } else { "DESC" };

    let mut params = vec![attribute_to_duckdb(&query.partition_key_value)];
    let mut inner = format!(
        "SELECT {column_list} FROM {} WHERE {} = ?",
        quote_ident(&query.table_name),
        quote_ident(&query.partition_key_name)
    );
    if let Some(bound) = &query.cursor_bound {
        inner.push_str(&format!(" AND {sort_key} {} ?", bound.operator.symbol()));
        params.push(Value::Text(bound.value.clone()));
    }
    inner.push_str(&format!(" ORDER BY {sort_key} {direction}"));
    if let Some(limit) = query.limit {
        inner.push_str(&format!(" LIMIT {}", u64::from(limit) + 1));
    }

    let Some(filter) = query.filter_expression.as_deref() else {
        return Ok((inner, params));
    };

    let named = render_names(filter, &query.bindings, quote_ident)?;
    let (condition, values) = bind_values(&named, &query.bindings, "?")?;
    let sql = format!(
        "SELECT {column_list}, COALESCE(({condition}), FALSE) AS {} FROM ({inner}) AS scanned ORDER BY {sort_key} {direction}",
        quote_ident(MATCHED_COLUMN)
    );

    // Filter parameters appear before the inner query's in the final SQL
    let mut ordered: Vec<Value> = values.iter().map(attribute_to_duckdb).collect();
    ordered.extend(params);
    Ok((sql, ordered))
}

/// Quote an identifier for DuckDB
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert an attribute value to a DuckDB parameter
fn attribute_to_duckdb(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Boolean(*b),
        AttributeValue::N(n) => match n.as_i64() {
            Some(i) => Value::BigInt(i),
            None => n.as_f64().map_or(Value::Null, Value::Double),
        },
        AttributeValue::S(s) => Value::Text(s.clone()),
        AttributeValue::B(b) => Value::Blob(b.clone()),
        AttributeValue::L(_) | AttributeValue::M(_) => Value::Text(value.to_json().to_string()),
    }
}

/// Convert a DuckDB value to an attribute value
fn duckdb_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Boolean(b) => AttributeValue::Bool(b),
        Value::TinyInt(i) => AttributeValue::from(i64::from(i)),
        Value::SmallInt(i) => AttributeValue::from(i64::from(i)),
        Value::Int(i) => AttributeValue::from(i64::from(i)),
        Value::BigInt(i) => AttributeValue::from(i),
        Value::HugeInt(i) => AttributeValue::S(i.to_string()),
        Value::UTinyInt(i) => AttributeValue::from(i64::from(i)),
        Value::USmallInt(i) => AttributeValue::from(i64::from(i)),
        Value::UInt(i) => AttributeValue::from(i64::from(i)),
        Value::UBigInt(i) => AttributeValue::N(i.into()),
        Value::Float(f) => AttributeValue::from(f64::from(f)),
        Value::Double(f) => AttributeValue::from(f),
        Value::Text(s) => AttributeValue::S(s),
        Value::Blob(b) => AttributeValue::B(b),
        Value::Timestamp(_, i) => {
            // Microseconds since epoch
            let secs = i / 1_000_000;
            let nsecs = ((i % 1_000_000) * 1000) as u32;
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| AttributeValue::S(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
                .unwrap_or(AttributeValue::from(i))
        }
        Value::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| AttributeValue::S(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(AttributeValue::from(i64::from(d)))
        }
        other => AttributeValue::S(format!("{other:?}")),
    }
}
