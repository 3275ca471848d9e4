//! Executor types

use crate::item::Item;
use crate::store::RawQueryOutput;

/// Normalized result of one range query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeQueryResult {
    /// Items in storage scan order
    pub items: Vec<Item>,
    /// True when the store stopped before exhausting the candidate range
    pub truncated: bool,
    /// Key of the last evaluated item, when truncated
    pub last_evaluated_key: Option<Item>,
    /// Capacity units consumed, if reported
    pub consumed_capacity: Option<f64>,
    /// Items evaluated before filtering, if reported
    pub scanned_count: Option<u64>,
    /// Items that passed the store-side filter, if reported
    pub matched_count: Option<u64>,
}

impl From<RawQueryOutput> for RangeQueryResult {
    fn from(raw: RawQueryOutput) -> Self {
        Self {
            items: raw.items,
            truncated: raw.last_evaluated_key.is_some(),
            last_evaluated_key: raw.last_evaluated_key,
            consumed_capacity: raw.consumed_capacity,
            scanned_count: raw.scanned_count,
            matched_count: raw.count,
        }
    }
}
