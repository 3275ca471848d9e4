//! Pagination types
//!
//! Request and response shapes of the cursor pagination engine. Responses
//! follow the Relay connection model: edges carrying a cursor and a node,
//! plus page info.

use crate::error::Result;
use crate::expression::ExpressionBindings;
use crate::item::{AttributeValue, Item};
use crate::types::{OptionStringExt, SortDirection};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

/// Relay pagination arguments
///
/// `first` and `last` are signed so negative values can be rejected instead
/// of silently clamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationArgs {
    /// Return items after this cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Return at most this many items after `after`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<i64>,
    /// Return items before this cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Return at most this many items before `before`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
}

impl PaginationArgs {
    /// Arguments for a forward page
    pub fn forward(after: Option<&str>, first: Option<i64>) -> Self {
        Self {
            after: after.map(str::to_string),
            first,
            ..Self::default()
        }
    }

    /// Arguments for a backward page
    pub fn backward(before: Option<&str>, last: Option<i64>) -> Self {
        Self {
            before: before.map(str::to_string),
            last,
            ..Self::default()
        }
    }

    /// Treat empty cursors as absent
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            after: self.after.none_if_empty(),
            before: self.before.none_if_empty(),
            ..self
        }
    }

    /// Check if no argument is present
    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.first.is_none() && self.before.is_none() && self.last.is_none()
    }

    /// Page direction implied by the arguments
    ///
    /// Forward when `after` or `first` is present, or when nothing is;
    /// backward only when `before`/`last` alone are present.
    pub fn direction(&self) -> PageDirection {
        if self.after.is_some() || self.first.is_some() || self.is_empty() {
            PageDirection::Forward
        } else {
            PageDirection::Backward
        }
    }
}

/// Which side of a cursor a page is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// Items after the `after` cursor
    Forward,
    /// Items before the `before` cursor
    Backward,
}

impl PageDirection {
    /// Check if this is forward paging
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}

/// One pagination call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationRequest {
    /// Table to query
    pub table_name: String,
    /// Partition key attribute name
    pub partition_key_name: String,
    /// Partition to page through
    pub partition_key_value: AttributeValue,
    /// Sort key attribute name
    pub sort_key_name: String,
    /// Secondary index to query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Sort key prefix; stripped from cursors
    #[serde(default)]
    pub begins_with: String,
    /// Filter expression passed to the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Projection expression passed to the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// Placeholder bindings for the filter and projection expressions
    #[serde(default, skip_serializing_if = "ExpressionBindings::is_empty")]
    pub bindings: ExpressionBindings,
    /// Display order of the returned edges
    #[serde(default)]
    pub sort: SortDirection,
    /// Relay arguments
    #[serde(flatten)]
    pub args: PaginationArgs,
}

impl PaginationRequest {
    /// Create a request for the first page of a partition, newest first
    pub fn new(
        table_name: impl Into<String>,
        partition_key_name: impl Into<String>,
        partition_key_value: impl Into<AttributeValue>,
        sort_key_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key_name: partition_key_name.into(),
            partition_key_value: partition_key_value.into(),
            sort_key_name: sort_key_name.into(),
            index_name: None,
            begins_with: String::new(),
            filter_expression: None,
            projection_expression: None,
            bindings: ExpressionBindings::default(),
            sort: SortDirection::default(),
            args: PaginationArgs::default(),
        }
    }

    /// Set the display order
    #[must_use]
    pub fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    /// Set the sort key prefix
    #[must_use]
    pub fn with_begins_with(mut self, prefix: impl Into<String>) -> Self {
        self.begins_with = prefix.into();
        self
    }

    /// Set the Relay arguments
    #[must_use]
    pub fn with_args(mut self, args: PaginationArgs) -> Self {
        self.args = args;
        self
    }

    /// Page forward
    #[must_use]
    pub fn after(mut self, after: Option<&str>, first: Option<i64>) -> Self {
        self.args.after = after.map(str::to_string);
        self.args.first = first;
        self
    }

    /// Page backward
    #[must_use]
    pub fn before(mut self, before: Option<&str>, last: Option<i64>) -> Self {
        self.args.before = before.map(str::to_string);
        self.args.last = last;
        self
    }

    /// Query a secondary index
    #[must_use]
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Set a filter expression with its bindings
    #[must_use]
    pub fn with_filter(mut self, expression: impl Into<String>, bindings: ExpressionBindings) -> Self {
        self.filter_expression = Some(expression.into());
        self.bindings = bindings;
        self
    }

    /// Set a projection expression
    #[must_use]
    pub fn with_projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }
}

// ============================================================================
// Response
// ============================================================================

/// One item of a connection with its cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    /// Sort key with the request prefix removed
    pub cursor: String,
    /// The item
    pub node: T,
}

/// Relay page info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    /// Edges in display order
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    /// Store reported that it stopped early
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}

impl<T> Connection<T> {
    /// Cursors of all edges, in display order
    pub fn cursors(&self) -> Vec<&str> {
        self.edges.iter().map(|e| e.cursor.as_str()).collect()
    }

    /// Nodes of all edges, in display order
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }

    /// Convert every node, failing on the first conversion error
    pub fn try_map<U, F>(self, mut f: F) -> Result<Connection<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                Ok(Edge {
                    cursor: edge.cursor,
                    node: f(edge.node)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Connection {
            edges,
            page_info: self.page_info,
            truncated: self.truncated,
            consumed_capacity: self.consumed_capacity,
            scanned_count: self.scanned_count,
            matched_count: self.matched_count,
            last_evaluated_key: self.last_evaluated_key,
        })
    }
}
