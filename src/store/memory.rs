//! In-memory range store
//!
//! Holds tables in a `BTreeMap` behind a tokio `RwLock`. Query semantics
//! follow a partitioned key-value store: the limit counts evaluated items,
//! the filter expression runs after the limit, and an optional page-size
//! ceiling stops a query early independently of the limit.

use super::filter::FilterExpression;
use super::types::{RangeQuery, RangeStore, RawQueryOutput};
use crate::error::StoreError;
use crate::expression::parse_projection;
use crate::item::{key_string, project, AttributeValue, Item};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Partition and sort key attribute names of a table or index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    /// Partition (hash) key attribute
    pub partition_key_name: String,
    /// Sort (range) key attribute
    pub sort_key_name: String,
}

impl KeySchema {
    /// Create a key schema
    pub fn new(partition_key_name: impl Into<String>, sort_key_name: impl Into<String>) -> Self {
        Self {
            partition_key_name: partition_key_name.into(),
            sort_key_name: sort_key_name.into(),
        }
    }
}

#[derive(Debug)]
struct MemoryTable {
    key_schema: KeySchema,
    indexes: BTreeMap<String, KeySchema>,
    /// Items keyed by (partition key, sort key) strings
    items: BTreeMap<(String, String), Item>,
}

impl MemoryTable {
    fn new(key_schema: KeySchema) -> Self {
        Self {
            key_schema,
            indexes: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    fn schema_for(&self, table: &str, index_name: Option<&str>) -> Result<&KeySchema, StoreError> {
        match index_name {
            None => Ok(&self.key_schema),
            Some(index) => self.indexes.get(index).ok_or_else(|| {
                StoreError::validation(format!("Table '{table}' has no index named '{index}'"))
            }),
        }
    }

    fn primary_key(&self, item: &Item) -> Result<(String, String), StoreError> {
        let pk = key_attribute(item, &self.key_schema.partition_key_name)?;
        let sk = key_attribute(item, &self.key_schema.sort_key_name)?;
        Ok((pk, sk))
    }

    /// Key attributes of an item under the table and index schemas
    fn key_of(&self, item: &Item, index_schema: &KeySchema) -> Item {
        let names = [
            &self.key_schema.partition_key_name,
            &self.key_schema.sort_key_name,
            &index_schema.partition_key_name,
            &index_schema.sort_key_name,
        ];
        names
            .into_iter()
            .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }
}

/// Range store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    max_page_size: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every query after this many evaluated items
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    /// Create a table
    pub async fn create_table(
        &self,
        table_name: impl Into<String>,
        key_schema: KeySchema,
    ) -> Result<(), StoreError> {
        let table_name = table_name.into();
        let mut tables = self.tables.write().await;
        if tables.contains_key(&table_name) {
            return Err(StoreError::validation(format!(
                "Table already exists: {table_name}"
            )));
        }
        tables.insert(table_name, MemoryTable::new(key_schema));
        Ok(())
    }

    /// Add a secondary index to a table
    pub async fn create_index(
        &self,
        table_name: &str,
        index_name: impl Into<String>,
        key_schema: KeySchema,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::table_not_found(table_name))?;
        table.indexes.insert(index_name.into(), key_schema);
        Ok(())
    }

    /// Insert or replace one item
    pub async fn put_item(&self, table_name: &str, item: Item) -> Result<(), StoreError> {
        self.put_items(table_name, vec![item]).await.map(|_| ())
    }

    /// Insert or replace items, returning how many were written
    pub async fn put_items(&self, table_name: &str, items: Vec<Item>) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::table_not_found(table_name))?;

        let mut written = 0;
        for item in items {
            let key = table.primary_key(&item)?;
            table.items.insert(key, item);
            written += 1;
        }
        Ok(written)
    }

    /// Number of items stored in a table
    pub async fn item_count(&self, table_name: &str) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        tables
            .get(table_name)
            .map(|table| table.items.len())
            .ok_or_else(|| StoreError::table_not_found(table_name))
    }

    fn page_size(&self, limit: Option<u32>) -> usize {
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        self.max_page_size.map_or(limit, |max| limit.min(max))
    }
}

#[async_trait]
impl RangeStore for MemoryStore {
    async fn query(&self, query: &RangeQuery) -> Result<RawQueryOutput, StoreError> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&query.table_name)
            .ok_or_else(|| StoreError::table_not_found(&query.table_name))?;

        let schema = table.schema_for(&query.table_name, query.index_name.as_deref())?;
        if schema.partition_key_name != query.partition_key_name
            || schema.sort_key_name != query.sort_key_name
        {
            return Err(StoreError::validation(format!(
                "Query key condition does not match the key schema ({}, {})",
                schema.partition_key_name, schema.sort_key_name
            )));
        }

        let filter = query
            .filter_expression
            .as_deref()
            .map(|expr| FilterExpression::parse(expr, &query.bindings))
            .transpose()?;
        let projection = query
            .projection_expression
            .as_deref()
            .map(|expr| parse_projection(expr, &query.bindings))
            .transpose()?;

        let mut candidates: Vec<(String, &Item)> = table
            .items
            .values()
            .filter(|item| {
                item.get(&schema.partition_key_name)
                    .and_then(|value| value.compare(&query.partition_key_value))
                    == Some(Ordering::Equal)
            })
            .filter_map(|item| key_string(item, &schema.sort_key_name).map(|key| (key, item)))
            .filter(|(key, _)| {
                query
                    .cursor_bound
                    .as_ref()
                    .map_or(true, |bound| bound.matches(key))
            })
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        if !query.scan_forward {
            candidates.reverse();
        }

        let page_size = self.page_size(query.limit);
        let truncated = candidates.len() > page_size;
        let scanned: Vec<&Item> = candidates
            .iter()
            .take(page_size)
            .map(|(_, item)| *item)
            .collect();

        let last_evaluated_key = if truncated {
            Some(match scanned.last() {
                Some(last) => table.key_of(last, schema),
                // Stopped before evaluating anything: resume from the partition start
                None => Item::from([(
                    schema.partition_key_name.clone(),
                    query.partition_key_value.clone(),
                )]),
            })
        } else {
            None
        };

        let items: Vec<Item> = scanned
            .iter()
            .filter(|item| filter.as_ref().map_or(true, |f| f.matches(item)))
            .map(|item| match &projection {
                Some(attributes) => project(item, attributes),
                None => (*item).clone(),
            })
            .collect();

        tracing::trace!(
            table = %query.table_name,
            scanned = scanned.len(),
            matched = items.len(),
            truncated,
            "memory store query"
        );

        Ok(RawQueryOutput {
            count: Some(items.len() as u64),
            scanned_count: Some(scanned.len() as u64),
            items,
            last_evaluated_key,
            consumed_capacity: None,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Convenience for building a key item in tests and seeds
pub(crate) fn key_item(
    partition_key_name: &str,
    partition_key_value: impl Into<AttributeValue>,
    sort_key_name: &str,
    sort_key_value: impl Into<AttributeValue>,
) -> Item {
    Item::from([
        (partition_key_name.to_string(), partition_key_value.into()),
        (sort_key_name.to_string(), sort_key_value.into()),
    ])
}

/// Scalar key attribute of an item being written
fn key_attribute(item: &Item, name: &str) -> Result<String, StoreError> {
    let value = item
        .get(name)
        .ok_or_else(|| StoreError::validation(format!("Item is missing key attribute '{name}'")))?;
    value.key_string().ok_or_else(|| {
        StoreError::validation(format!(
            "Key attribute '{name}' must be S, N or B, got {}",
            value.type_name()
        ))
    })
}
