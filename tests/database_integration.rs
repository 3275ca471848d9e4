//! DuckDB store integration tests
//!
//! Pages through a DuckDB file written with the same layout the `populate`
//! command uses.

use pretty_assertions::assert_eq;
use range_relay::config::{AppConfig, StoreBackend};
use range_relay::database::{ColumnType, DuckDbStore, TableDefinition};
use range_relay::expression::ExpressionBindings;
use range_relay::pagination::{PaginationRequest, Paginator};
use range_relay::store::{open_store, seed};
use range_relay::{Error, SortDirection};
use std::sync::Arc;

fn events_table() -> TableDefinition {
    TableDefinition::new("events", "pk", "sk")
        .with_column("index", ColumnType::Bigint)
        .with_column("parity", ColumnType::Varchar)
}

fn populate(path: &str, count: usize) {
    let store = DuckDbStore::open(path).unwrap();
    let table = events_table();
    store.create_table(&table).unwrap();
    store
        .put_items(&table, &seed::cursor_items("pk", "p1", "sk", count))
        .unwrap();
}

#[tokio::test]
async fn test_paginate_duckdb_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.duckdb");
    let path = path.to_str().unwrap();
    populate(path, 25);

    let paginator = Paginator::new(Arc::new(DuckDbStore::open(path).unwrap()));
    let request = PaginationRequest::new("events", "pk", "p1", "sk")
        .with_sort(SortDirection::Asc)
        .before(Some("cursor-16"), Some(3));
    let page = paginator.paginate(&request).await.unwrap();

    assert_eq!(page.cursors(), vec!["cursor-13", "cursor-14", "cursor-15"]);
    assert!(page.page_info.has_previous_page);
    assert!(page.page_info.has_next_page);
}

#[tokio::test]
async fn test_duckdb_prefix_suppresses_truncation() {
    let store = DuckDbStore::open_in_memory().unwrap();
    let table = events_table();
    store.create_table(&table).unwrap();
    store
        .put_items(&table, &seed::cursor_items("pk", "p1", "sk", 25))
        .unwrap();

    let request = PaginationRequest::new("events", "pk", "p1", "sk")
        .with_sort(SortDirection::Asc)
        .with_begins_with("cursor-2")
        .after(Some("5"), Some(6));
    let page = Paginator::new(Arc::new(store))
        .paginate(&request)
        .await
        .unwrap();

    assert_eq!(page.cursors(), vec!["6", "7", "8", "9"]);
    assert!(page.page_info.has_previous_page);
    assert!(!page.page_info.has_next_page);
}

#[tokio::test]
async fn test_duckdb_sql_filter() {
    let store = DuckDbStore::open_in_memory().unwrap();
    let table = events_table();
    store.create_table(&table).unwrap();
    store
        .put_items(&table, &seed::cursor_items("pk", "p1", "sk", 25))
        .unwrap();

    let bindings = ExpressionBindings::new()
        .with_name("#index", "index")
        .with_value(":min", 30_i64);
    let request = PaginationRequest::new("events", "pk", "p1", "sk")
        .with_filter("#index >= :min", bindings)
        .after(None, Some(10));
    let page = Paginator::new(Arc::new(store))
        .paginate(&request)
        .await
        .unwrap();

    assert_eq!(
        page.cursors(),
        vec!["cursor-34", "cursor-33", "cursor-32", "cursor-31", "cursor-30"]
    );
    assert_eq!(page.scanned_count, Some(10));
    assert_eq!(page.matched_count, Some(5));
    assert!(page.page_info.has_next_page);
}

#[tokio::test]
async fn test_open_duckdb_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.duckdb");
    populate(path.to_str().unwrap(), 5);

    let mut config = AppConfig::default();
    config.store.backend = StoreBackend::Duckdb;
    config.store.path = path.to_str().unwrap().to_string();
    config.store.table_name = "events".to_string();

    let store = open_store(&config.store).await.unwrap();
    assert_eq!(store.backend_name(), "duckdb");

    let page = Paginator::new(store)
        .paginate(&config.request_for("p1"))
        .await
        .unwrap();
    assert_eq!(page.edges.len(), 5);
    assert!(!page.page_info.has_next_page);
}

#[tokio::test]
async fn test_duckdb_missing_table_is_upstream() {
    let store = DuckDbStore::open_in_memory().unwrap();
    let err = Paginator::new(Arc::new(store))
        .paginate(&PaginationRequest::new("events", "pk", "p1", "sk"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upstream(_)));
}
