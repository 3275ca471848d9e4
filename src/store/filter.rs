//! Filter expressions for the in-memory store
//!
//! Supports conjunctions of simple comparisons:
//! `#parity = :odd AND index >= :min`. Operands are attribute names (bare or
//! `#name` placeholders) or `:value` placeholders.

use crate::expression::{attribute_name, ExpressionBindings, ExpressionError};
use crate::item::{AttributeValue, Item};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Regex splitting clauses on AND (case-insensitive)
static AND_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+AND\s+").unwrap());

/// Regex for a single comparison clause
static COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s*(<>|<=|>=|=|<|>)\s*(\S+)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Attribute(String),
    Value(AttributeValue),
}

impl Operand {
    fn parse(token: &str, bindings: &ExpressionBindings) -> Result<Self, ExpressionError> {
        if token.starts_with(':') {
            Ok(Self::Value(bindings.value(token)?.clone()))
        } else {
            Ok(Self::Attribute(attribute_name(token, bindings)?))
        }
    }

    fn resolve<'a>(&'a self, item: &'a Item) -> Option<&'a AttributeValue> {
        match self {
            Self::Attribute(name) => item.get(name),
            Self::Value(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    left: Operand,
    comparator: Comparator,
    right: Operand,
}

/// A parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    clauses: Vec<Clause>,
}

impl FilterExpression {
    /// Parse an expression, resolving its placeholders
    pub fn parse(expression: &str, bindings: &ExpressionBindings) -> Result<Self, ExpressionError> {
        let clauses = AND_SPLIT
            .split(expression.trim())
            .map(|clause| {
                let caps = COMPARISON.captures(clause).ok_or_else(|| {
                    ExpressionError::unsupported(
                        expression,
                        format!("cannot parse clause '{clause}'"),
                    )
                })?;
                let comparator = Comparator::parse(&caps[2]).ok_or_else(|| {
                    ExpressionError::unsupported(expression, format!("unknown operator '{}'", &caps[2]))
                })?;
                Ok(Clause {
                    left: Operand::parse(&caps[1], bindings)?,
                    comparator,
                    right: Operand::parse(&caps[3], bindings)?,
                })
            })
            .collect::<Result<Vec<_>, ExpressionError>>()?;

        Ok(Self { clauses })
    }

    /// Check whether an item satisfies every clause
    ///
    /// A clause over a missing attribute or mismatched kinds is false.
    pub fn matches(&self, item: &Item) -> bool {
        self.clauses.iter().all(|clause| {
            match (clause.left.resolve(item), clause.right.resolve(item)) {
                (Some(left), Some(right)) => left
                    .compare(right)
                    .is_some_and(|ordering| clause.comparator.accepts(ordering)),
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_from_json;
    use serde_json::json;

    fn item(index: i64, parity: &str) -> Item {
        item_from_json(json!({"pk": "p", "sk": format!("cursor-{index}"), "index": index, "parity": parity}))
            .unwrap()
    }

    #[test]
    fn test_equality_with_placeholders() {
        let bindings = ExpressionBindings::new()
            .with_name("#parity", "parity")
            .with_value(":parity", "ODD");
        let filter = FilterExpression::parse("#parity = :parity", &bindings).unwrap();

        assert!(filter.matches(&item(11, "ODD")));
        assert!(!filter.matches(&item(12, "EVEN")));
    }

    #[test]
    fn test_conjunction_and_numeric_ranges() {
        let bindings = ExpressionBindings::new()
            .with_value(":min", 12_i64)
            .with_value(":even", "EVEN");
        let filter = FilterExpression::parse("index >= :min and parity <> :even", &bindings).unwrap();

        assert!(filter.matches(&item(13, "ODD")));
        assert!(!filter.matches(&item(11, "ODD")));
        assert!(!filter.matches(&item(14, "EVEN")));
    }

    #[test]
    fn test_missing_attribute_is_false() {
        let bindings = ExpressionBindings::new().with_value(":v", "x");
        let filter = FilterExpression::parse("color = :v", &bindings).unwrap();
        assert!(!filter.matches(&item(10, "EVEN")));
    }

    #[test]
    fn test_unsupported_syntax() {
        let bindings = ExpressionBindings::new();
        let err = FilterExpression::parse("begins_with(sk, :p)", &bindings).unwrap_err();
        assert!(matches!(err, ExpressionError::Unsupported { .. }));
    }

    #[test]
    fn test_unbound_placeholder() {
        let err = FilterExpression::parse("parity = :nope", &ExpressionBindings::new()).unwrap_err();
        assert_eq!(err, ExpressionError::UnboundValue(":nope".to_string()));
    }
}
