//! Cursor pagination engine
//!
//! Turns Relay arguments into a single range query, then rebuilds edges and
//! page info from the raw result. Everything except the query itself is a
//! pure function of the request and the result.

use super::types::{Connection, Edge, PageDirection, PageInfo, PaginationArgs, PaginationRequest};
use crate::error::{InvalidArgument, Result};
use crate::item::{decode_item, key_string, Item};
use crate::query::{RangeQueryExecutor, RangeQueryResult};
use crate::store::{ComparisonOperator, CursorBound, RangeQuery, RangeStore};
use crate::types::SortDirection;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// The range query derived from a request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Page direction the arguments selected
    pub direction: PageDirection,
    /// Query to send to the store
    pub query: RangeQuery,
}

/// Relay cursor paginator over a range store
///
/// Stateless; one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Paginator {
    executor: RangeQueryExecutor,
}

impl Paginator {
    /// Create a paginator over a store
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self::with_executor(RangeQueryExecutor::new(store))
    }

    /// Create a paginator around an existing executor
    pub fn with_executor(executor: RangeQueryExecutor) -> Self {
        Self { executor }
    }

    /// Get the executor
    pub fn executor(&self) -> &RangeQueryExecutor {
        &self.executor
    }

    /// Fetch one page
    ///
    /// Argument errors are returned before the store is contacted; store
    /// errors are returned unchanged.
    pub async fn paginate(&self, request: &PaginationRequest) -> Result<Connection<Item>> {
        let args = request.args.clone().normalize();
        validate(&args)?;

        let plan = plan(request, &args);
        let result = self.executor.execute(&plan.query).await?;
        let connection = assemble(request, &args, plan.direction, result);

        tracing::debug!(
            direction = ?plan.direction,
            sort = %request.sort,
            edges = connection.edges.len(),
            truncated = connection.truncated,
            has_previous_page = connection.page_info.has_previous_page,
            has_next_page = connection.page_info.has_next_page,
            "Paginated {}",
            request.table_name
        );

        Ok(connection)
    }

    /// Fetch one page and decode every node into `T`
    pub async fn paginate_as<T: DeserializeOwned>(
        &self,
        request: &PaginationRequest,
    ) -> Result<Connection<T>> {
        self.paginate(request)
            .await?
            .try_map(|item| decode_item(&item))
    }
}

/// Reject negative page sizes
pub fn validate(args: &PaginationArgs) -> Result<()> {
    if args.first.is_some_and(|n| n < 0) {
        return Err(InvalidArgument::FirstMustNotBeNegative.into());
    }
    if args.last.is_some_and(|n| n < 0) {
        return Err(InvalidArgument::LastMustNotBeNegative.into());
    }
    Ok(())
}

/// Derive the range query for a request
///
/// `args` must already be normalized and validated.
pub fn plan(request: &PaginationRequest, args: &PaginationArgs) -> QueryPlan {
    let direction = args.direction();
    let ascending = request.sort.is_ascending();

    // Forward pages scan in display order, backward pages against it
    let (scan_forward, cursor, operator, limit) = match direction {
        PageDirection::Forward => (
            ascending,
            args.after.as_deref(),
            if ascending {
                ComparisonOperator::GreaterThan
            } else {
                ComparisonOperator::LessThan
            },
            args.first,
        ),
        PageDirection::Backward => (
            !ascending,
            args.before.as_deref(),
            if ascending {
                ComparisonOperator::LessThan
            } else {
                ComparisonOperator::GreaterThan
            },
            args.last,
        ),
    };

    let mut query = RangeQuery::new(
        &request.table_name,
        &request.partition_key_name,
        request.partition_key_value.clone(),
        &request.sort_key_name,
    )
    .with_scan_forward(scan_forward);

    if let Some(cursor) = cursor {
        query = query.with_bound(CursorBound::new(
            operator,
            format!("{}{cursor}", request.begins_with),
        ));
    }
    if let Some(limit) = limit {
        query = query.with_limit(u32::try_from(limit.max(0)).unwrap_or(u32::MAX));
    }
    if let Some(index) = &request.index_name {
        query = query.with_index(index);
    }
    if let Some(filter) = &request.filter_expression {
        query = query.with_filter(filter, request.bindings.clone());
    } else {
        query.bindings = request.bindings.clone();
    }
    if let Some(projection) = &request.projection_expression {
        query = query.with_projection(projection);
    }

    QueryPlan { direction, query }
}

/// Keep items under the prefix and order them for display
///
/// Returns the edges and whether any item was dropped. Items without a
/// scalar sort key are dropped too.
pub fn build_edges(
    items: Vec<Item>,
    sort_key_name: &str,
    begins_with: &str,
    sort: SortDirection,
) -> (Vec<Edge<Item>>, bool) {
    let total = items.len();

    let mut edges: Vec<Edge<Item>> = items
        .into_iter()
        .filter_map(|node| {
            let key = key_string(&node, sort_key_name)?;
            let cursor = key.strip_prefix(begins_with)?.to_string();
            Some(Edge { cursor, node })
        })
        .collect();

    edges.sort_by(|a, b| sort.apply(a.cursor.cmp(&b.cursor)));

    let filtered = edges.len() != total;
    (edges, filtered)
}

/// Derive page info from the arguments and the query outcome
///
/// Truncation only counts as "more pages" when no item was filtered out;
/// a filtered page may still have neighbours, but they are not reported.
pub fn derive_page_info<T>(
    args: &PaginationArgs,
    direction: PageDirection,
    truncated: bool,
    filtered: bool,
    edges: &[Edge<T>],
) -> PageInfo {
    let more = truncated && !filtered;

    PageInfo {
        has_previous_page: args.after.is_some() || (more && !direction.is_forward()),
        has_next_page: args.before.is_some() || (more && direction.is_forward()),
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    }
}

fn assemble(
    request: &PaginationRequest,
    args: &PaginationArgs,
    direction: PageDirection,
    result: RangeQueryResult,
) -> Connection<Item> {
    let (edges, filtered) = build_edges(
        result.items,
        &request.sort_key_name,
        &request.begins_with,
        request.sort,
    );
    let page_info = derive_page_info(args, direction, result.truncated, filtered, &edges);

    Connection {
        edges,
        page_info,
        truncated: result.truncated,
        consumed_capacity: result.consumed_capacity,
        scanned_count: result.scanned_count,
        matched_count: result.matched_count,
        last_evaluated_key: result.last_evaluated_key,
    }
}
