//! Integration tests for the public API
//!
//! Tests the full flow: request → paginator → memory store → connection,
//! both through the library and through the HTTP router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use range_relay::cli::build_router;
use range_relay::config::AppConfig;
use range_relay::pagination::{Connection, PaginationRequest, Paginator};
use range_relay::store::{open_store, seed, KeySchema, MemoryStore};
use range_relay::{Item, SortDirection};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn seeded_paginator() -> Paginator {
    let store = MemoryStore::new();
    store
        .create_table("events", KeySchema::new("pk", "sk"))
        .await
        .unwrap();
    store
        .put_items("events", seed::cursor_items("pk", "p1", "sk", 25))
        .await
        .unwrap();
    Paginator::new(Arc::new(store))
}

fn server_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.store.table_name = "events".to_string();
    config.defaults.partition_key_value = Some("p1".to_string());
    config
}

async fn post_paginate(body: Value) -> (StatusCode, Value) {
    let app = build_router(seeded_paginator().await, server_config());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/paginate")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ============================================================================
// Library Flow Tests
// ============================================================================

#[tokio::test]
async fn test_walk_forward_through_partition() {
    let paginator = seeded_paginator().await;
    let mut request = PaginationRequest::new("events", "pk", "p1", "sk")
        .with_sort(SortDirection::Asc)
        .after(None, Some(10));

    let mut seen = Vec::new();
    let mut pages = 0;
    loop {
        let page: Connection<Item> = paginator.paginate(&request).await.unwrap();
        pages += 1;
        seen.extend(page.cursors().into_iter().map(str::to_string));
        if !page.page_info.has_next_page {
            break;
        }
        let end = page.page_info.end_cursor.clone().unwrap();
        request = request.after(Some(end.as_str()), Some(10));
    }

    let expected: Vec<String> = (10..35).map(|n| format!("cursor-{n}")).collect();
    assert_eq!(seen, expected);
    assert_eq!(pages, 3);
}

#[tokio::test]
async fn test_walk_backward_through_partition() {
    let paginator = seeded_paginator().await;
    let mut request = PaginationRequest::new("events", "pk", "p1", "sk")
        .with_sort(SortDirection::Asc)
        .before(None, Some(10));

    let mut seen = Vec::new();
    loop {
        let page = paginator.paginate(&request).await.unwrap();
        let mut cursors: Vec<String> = page.cursors().into_iter().map(str::to_string).collect();
        cursors.extend(seen);
        seen = cursors;
        if !page.page_info.has_previous_page {
            break;
        }
        let start = page.page_info.start_cursor.clone().unwrap();
        request = request.before(Some(start.as_str()), Some(10));
    }

    let expected: Vec<String> = (10..35).map(|n| format!("cursor-{n}")).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_open_store_from_config() {
    let config = AppConfig::from_yaml_str(
        "store:\n  table_name: events\n  seed_items: 12\n  seed_partition: p1\n",
    )
    .unwrap();
    let store = open_store(&config.store).await.unwrap();

    let page = Paginator::new(store)
        .paginate(&config.request_for("p1").after(None, Some(5)))
        .await
        .unwrap();

    // Default order is newest first
    assert_eq!(
        page.cursors(),
        vec!["cursor-21", "cursor-20", "cursor-19", "cursor-18", "cursor-17"]
    );
    assert!(page.page_info.has_next_page);
}

// ============================================================================
// HTTP Tests
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = build_router(seeded_paginator().await, server_config());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "backend": "memory", "table": "events"}));
}

#[tokio::test]
async fn test_http_paginate_with_prefix() {
    let (status, body) = post_paginate(json!({
        "sort": "ASC",
        "beginsWith": "cursor-2",
        "after": "5",
        "first": 6
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    let cursors: Vec<&str> = data["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["cursor"].as_str().unwrap())
        .collect();
    assert_eq!(cursors, vec!["6", "7", "8", "9"]);
    assert_eq!(
        data["pageInfo"],
        json!({
            "hasPreviousPage": true,
            "hasNextPage": false,
            "startCursor": "6",
            "endCursor": "9"
        })
    );
    assert_eq!(data["edges"][0]["node"]["sk"], json!("cursor-26"));
}

#[tokio::test]
async fn test_http_negative_first_is_bad_request() {
    let (status, body) = post_paginate(json!({"first": -1})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"],
        json!("Invalid argument: FirstMustNotBeNegative")
    );
}

#[tokio::test]
async fn test_http_unbound_placeholder_is_bad_request() {
    let (status, body) = post_paginate(json!({
        "filterExpression": "#parity = :parity"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("#parity"));
}

#[tokio::test]
async fn test_http_unknown_table_is_bad_gateway() {
    let (status, body) = post_paginate(json!({"tableName": "missing"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_http_filter_with_bindings() {
    let (status, body) = post_paginate(json!({
        "sort": "ASC",
        "first": 4,
        "filterExpression": "#parity = :parity",
        "bindings": {
            "names": {"#parity": "parity"},
            "values": {":parity": "EVEN"}
        }
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["edges"].as_array().unwrap().len(), 2);
    assert_eq!(data["scannedCount"], json!(4));
    assert_eq!(data["matchedCount"], json!(2));
    assert_eq!(data["pageInfo"]["hasNextPage"], json!(true));
}
