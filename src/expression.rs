//! Expression placeholders
//!
//! Filter and projection expressions are opaque to the pagination engine and
//! travel to the store untouched. They may reference attribute names through
//! `#name` placeholders and values through `:value` placeholders, resolved
//! against [`ExpressionBindings`]. The helpers here are used by store
//! implementations to resolve those placeholders.

use crate::error::StoreError;
use crate::item::AttributeValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Regex for attribute name placeholders: #name
static NAME_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Regex for value placeholders: :value
///
/// The leading group keeps `::` casts and `a:b` tokens from matching.
static VALUE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^:A-Za-z0-9_]):([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Placeholder resolution failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Unbound attribute name placeholder: {0}")]
    UnboundName(String),

    #[error("Unbound value placeholder: {0}")]
    UnboundValue(String),

    #[error("Unsupported expression '{expression}': {message}")]
    Unsupported { expression: String, message: String },
}

impl ExpressionError {
    /// Create an unsupported-expression error
    pub fn unsupported(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

impl From<ExpressionError> for StoreError {
    fn from(err: ExpressionError) -> Self {
        StoreError::validation(err.to_string())
    }
}

/// Named placeholder bindings for filter and projection expressions
///
/// Keys include their sigil, e.g. `#parity` and `:odd`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionBindings {
    /// Attribute name placeholders (`#name` → attribute name)
    #[serde(default)]
    pub names: BTreeMap<String, String>,
    /// Value placeholders (`:value` → value)
    #[serde(default)]
    pub values: BTreeMap<String, AttributeValue>,
}

impl ExpressionBindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute name binding
    pub fn with_name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), attribute.into());
        self
    }

    /// Add a value binding
    pub fn with_value(
        mut self,
        placeholder: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.values.insert(placeholder.into(), value.into());
        self
    }

    /// Check if there are no bindings
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// Resolve a `#name` placeholder
    pub fn name(&self, placeholder: &str) -> Result<&str, ExpressionError> {
        self.names
            .get(placeholder)
            .map(String::as_str)
            .ok_or_else(|| ExpressionError::UnboundName(placeholder.to_string()))
    }

    /// Resolve a `:value` placeholder
    pub fn value(&self, placeholder: &str) -> Result<&AttributeValue, ExpressionError> {
        self.values
            .get(placeholder)
            .ok_or_else(|| ExpressionError::UnboundValue(placeholder.to_string()))
    }
}

/// Resolve a single operand token to an attribute name
///
/// `#name` tokens go through the bindings; bare tokens are attribute names.
pub fn attribute_name(token: &str, bindings: &ExpressionBindings) -> Result<String, ExpressionError> {
    if token.starts_with('#') {
        bindings.name(token).map(str::to_string)
    } else {
        Ok(token.to_string())
    }
}

/// Replace every `#name` placeholder using a rendering function
pub fn render_names<F>(
    expression: &str,
    bindings: &ExpressionBindings,
    render: F,
) -> Result<String, ExpressionError>
where
    F: Fn(&str) -> String,
{
    let mut result = String::with_capacity(expression.len());
    let mut last = 0;

    for m in NAME_PLACEHOLDER.find_iter(expression) {
        result.push_str(&expression[last..m.start()]);
        result.push_str(&render(bindings.name(m.as_str())?));
        last = m.end();
    }
    result.push_str(&expression[last..]);

    Ok(result)
}

/// Replace every `:value` placeholder with a positional marker
///
/// Returns the rewritten expression and the bound values in the order their
/// markers appear.
pub fn bind_values(
    expression: &str,
    bindings: &ExpressionBindings,
    marker: &str,
) -> Result<(String, Vec<AttributeValue>), ExpressionError> {
    let mut result = String::with_capacity(expression.len());
    let mut values = Vec::new();
    let mut last = 0;

    for cap in VALUE_PLACEHOLDER.captures_iter(expression) {
        let (Some(prefix), Some(name)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let placeholder = &expression[prefix.end()..name.end()];

        result.push_str(&expression[last..prefix.end()]);
        result.push_str(marker);
        values.push(bindings.value(placeholder)?.clone());
        last = name.end();
    }
    result.push_str(&expression[last..]);

    Ok((result, values))
}

/// Parse a projection expression into attribute names
pub fn parse_projection(
    expression: &str,
    bindings: &ExpressionBindings,
) -> Result<Vec<String>, ExpressionError> {
    expression
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| attribute_name(token, bindings))
        .collect()
}
