//! Range store types and traits
//!
//! Defines the single read capability the pagination engine consumes:
//! query one partition, optionally bounded on the sort key, in a given
//! scan direction, optionally limited.

use crate::error::StoreError;
use crate::expression::ExpressionBindings;
use crate::item::{AttributeValue, Item};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strict comparison applied to the sort key, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    /// Strictly after the bound (`>`)
    #[serde(rename = ">")]
    GreaterThan,
    /// Strictly before the bound (`<`)
    #[serde(rename = "<")]
    LessThan,
}

impl ComparisonOperator {
    /// Operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
        }
    }

    /// Check whether `key` satisfies this comparison against `bound`
    pub fn matches(self, key: &str, bound: &str) -> bool {
        match self {
            Self::GreaterThan => key > bound,
            Self::LessThan => key < bound,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Bound on the sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorBound {
    /// Sort key value to compare against
    pub value: String,
    /// Comparison to apply
    pub operator: ComparisonOperator,
}

impl CursorBound {
    /// Create a bound
    pub fn new(operator: ComparisonOperator, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            operator,
        }
    }

    /// Check whether a sort key satisfies the bound
    pub fn matches(&self, key: &str) -> bool {
        self.operator.matches(key, &self.value)
    }
}

/// One bounded, sorted range query against a single partition
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    /// Table (collection) to query
    pub table_name: String,
    /// Secondary index to query instead of the base table
    pub index_name: Option<String>,
    /// Partition key attribute name
    pub partition_key_name: String,
    /// Partition key value
    pub partition_key_value: AttributeValue,
    /// Sort key attribute name
    pub sort_key_name: String,
    /// Scan in ascending sort key order when true
    pub scan_forward: bool,
    /// Optional strict bound on the sort key
    pub cursor_bound: Option<CursorBound>,
    /// Maximum number of items to evaluate (None = store default)
    pub limit: Option<u32>,
    /// Opaque filter expression, applied by the store after the limit
    pub filter_expression: Option<String>,
    /// Opaque projection expression
    pub projection_expression: Option<String>,
    /// Placeholder bindings for the filter and projection expressions
    pub bindings: ExpressionBindings,
}

impl RangeQuery {
    /// Create an unbounded forward query over one partition
    pub fn new(
        table_name: impl Into<String>,
        partition_key_name: impl Into<String>,
        partition_key_value: impl Into<AttributeValue>,
        sort_key_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: None,
            partition_key_name: partition_key_name.into(),
            partition_key_value: partition_key_value.into(),
            sort_key_name: sort_key_name.into(),
            scan_forward: true,
            cursor_bound: None,
            limit: None,
            filter_expression: None,
            projection_expression: None,
            bindings: ExpressionBindings::default(),
        }
    }

    /// Set the scan direction
    pub fn with_scan_forward(mut self, scan_forward: bool) -> Self {
        self.scan_forward = scan_forward;
        self
    }

    /// Bound the sort key
    pub fn with_bound(mut self, bound: CursorBound) -> Self {
        self.cursor_bound = Some(bound);
        self
    }

    /// Limit the number of evaluated items
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query a secondary index
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Set a filter expression with its bindings
    pub fn with_filter(mut self, expression: impl Into<String>, bindings: ExpressionBindings) -> Self {
        self.filter_expression = Some(expression.into());
        self.bindings = bindings;
        self
    }

    /// Set a projection expression
    pub fn with_projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }

    /// Key condition in the store's expression syntax, for logging
    pub fn key_condition_expression(&self) -> String {
        match &self.cursor_bound {
            Some(bound) => format!(
                "{} = {:?} AND {} {} {:?}",
                self.partition_key_name,
                self.partition_key_value.key_string().unwrap_or_default(),
                self.sort_key_name,
                bound.operator,
                bound.value
            ),
            None => format!(
                "{} = {:?}",
                self.partition_key_name,
                self.partition_key_value.key_string().unwrap_or_default()
            ),
        }
    }
}

/// Raw store response, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryOutput {
    /// Matching items in scan order
    pub items: Vec<Item>,
    /// Key of the last evaluated item when the store stopped early
    pub last_evaluated_key: Option<Item>,
    /// Capacity units consumed, if the store reports them
    pub consumed_capacity: Option<f64>,
    /// Items returned after the filter expression
    pub count: Option<u64>,
    /// Items evaluated before the filter expression
    pub scanned_count: Option<u64>,
}

/// The range query capability of a partitioned, range-sorted store
///
/// Implementations must not retry; errors are returned as reported.
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Run one range query
    async fn query(&self, query: &RangeQuery) -> Result<RawQueryOutput, StoreError>;

    /// Short backend name for logging
    fn backend_name(&self) -> &'static str;
}
