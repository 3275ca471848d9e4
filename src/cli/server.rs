//! HTTP server mode for REST API access to pagination

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::{Error, Result, StoreError};
use crate::expression::ExpressionBindings;
use crate::item::AttributeValue;
use crate::pagination::{PaginationArgs, PaginationRequest, Paginator};
use crate::store::open_store;
use crate::types::SortDirection;

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    paginator: Paginator,
    config: Arc<AppConfig>,
}

/// Request body for the paginate endpoint
///
/// Store-level fields fall back to the server configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginateBody {
    #[serde(default)]
    table_name: Option<String>,
    #[serde(default)]
    partition_key_name: Option<String>,
    #[serde(default)]
    partition_key_value: Option<AttributeValue>,
    #[serde(default)]
    sort_key_name: Option<String>,
    #[serde(default)]
    index_name: Option<String>,
    #[serde(default)]
    begins_with: Option<String>,
    #[serde(default)]
    filter_expression: Option<String>,
    #[serde(default)]
    projection_expression: Option<String>,
    #[serde(default)]
    bindings: ExpressionBindings,
    #[serde(default)]
    sort: Option<SortDirection>,
    #[serde(flatten)]
    args: PaginationArgs,
}

impl PaginateBody {
    fn into_request(self, config: &AppConfig) -> Result<PaginationRequest> {
        let partition = self
            .partition_key_value
            .or_else(|| {
                config
                    .defaults
                    .partition_key_value
                    .clone()
                    .map(AttributeValue::from)
            })
            .ok_or_else(|| Error::config("partitionKeyValue is required"))?;

        let mut request = config.request_for(partition).with_args(self.args);
        if let Some(table) = self.table_name {
            request.table_name = table;
        }
        if let Some(name) = self.partition_key_name {
            request.partition_key_name = name;
        }
        if let Some(name) = self.sort_key_name {
            request.sort_key_name = name;
        }
        if self.index_name.is_some() {
            request.index_name = self.index_name;
        }
        if let Some(prefix) = self.begins_with {
            request.begins_with = prefix;
        }
        if let Some(sort) = self.sort {
            request.sort = sort;
        }
        request.filter_expression = self.filter_expression;
        request.projection_expression = self.projection_expression;
        request.bindings = self.bindings;

        Ok(request)
    }
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// HTTP status for an error
fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::InvalidArgument(_)
        | Error::Upstream(StoreError::Validation { .. })
        | Error::Config { .. }
        | Error::InvalidConfigValue { .. } => StatusCode::BAD_REQUEST,
        Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> Response {
    let status = error_status(err);
    if status.is_server_error() {
        tracing::warn!("Paginate failed: {}", err);
    }
    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

/// Build the router over an existing paginator
pub fn build_router(paginator: Paginator, config: AppConfig) -> Router {
    let state = AppState {
        paginator,
        config: Arc::new(config),
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/paginate", post(paginate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: AppConfig, port: u16) -> Result<()> {
    let store = open_store(&config.store).await?;
    let app = build_router(Paginator::new(store), config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "backend": state.paginator.executor().store().backend_name(),
        "table": state.config.store.table_name,
    }))
}

/// Fetch one page
async fn paginate(State(state): State<Arc<AppState>>, Json(body): Json<PaginateBody>) -> Response {
    let request = match body.into_request(&state.config) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match state.paginator.paginate(&request).await {
        Ok(connection) => (StatusCode::OK, Json(ApiResponse::success(connection))).into_response(),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidArgument;

    #[test]
    fn test_error_status() {
        assert_eq!(
            error_status(&InvalidArgument::FirstMustNotBeNegative.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&StoreError::validation("bad filter").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&StoreError::table_not_found("events").into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&Error::decode("bad item")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_falls_back_to_config() {
        let mut config = AppConfig::default();
        config.defaults.partition_key_value = Some("p1".to_string());
        config.defaults.sort = SortDirection::Asc;

        let body: PaginateBody = serde_json::from_value(json!({"first": 2})).unwrap();
        let request = body.into_request(&config).unwrap();

        assert_eq!(request.table_name, "items");
        assert_eq!(request.partition_key_value, AttributeValue::from("p1"));
        assert_eq!(request.sort, SortDirection::Asc);
        assert_eq!(request.args.first, Some(2));
    }

    #[test]
    fn test_body_without_partition_is_rejected() {
        let err = PaginateBody::default()
            .into_request(&AppConfig::default())
            .unwrap_err();
        assert_eq!(error_status(&err), StatusCode::BAD_REQUEST);
    }
}
