//! Demo item generators
//!
//! Used by the `populate` command, by memory-backed servers started with
//! seed items, and by tests.

use super::memory::key_item;
use crate::item::{AttributeValue, Item};
use chrono::{DateTime, Duration, Utc};

/// First numeric suffix of generated cursor keys
///
/// Starting at 10 keeps every generated key the same length, so string
/// order matches numeric order for up to 90 items.
pub const CURSOR_OFFSET: usize = 10;

/// Items keyed `cursor-10`, `cursor-11`, ... with `index` and `parity` fields
pub fn cursor_items(
    partition_key_name: &str,
    partition_key_value: &str,
    sort_key_name: &str,
    count: usize,
) -> Vec<Item> {
    (0..count)
        .map(|n| {
            let index = n + CURSOR_OFFSET;
            let mut item = key_item(
                partition_key_name,
                partition_key_value,
                sort_key_name,
                format!("cursor-{index}"),
            );
            item.insert("index".to_string(), AttributeValue::from(index as i64));
            let parity = if index % 2 == 1 { "ODD" } else { "EVEN" };
            item.insert("parity".to_string(), AttributeValue::from(parity));
            item
        })
        .collect()
}

/// Items keyed by hourly ISO-8601 timestamps starting at `start`
pub fn hourly_items(
    partition_key_name: &str,
    partition_key_value: &str,
    sort_key_name: &str,
    start: DateTime<Utc>,
    count: usize,
) -> Vec<Item> {
    (0..count)
        .map(|n| {
            let at = start + Duration::hours(n as i64);
            key_item(
                partition_key_name,
                partition_key_value,
                sort_key_name,
                format_timestamp(at),
            )
        })
        .collect()
}

/// Format a timestamp the way generated sort keys are written
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::key_string;
    use chrono::TimeZone;

    #[test]
    fn test_cursor_items() {
        let items = cursor_items("pk", "events", "sk", 3);
        assert_eq!(items.len(), 3);
        assert_eq!(key_string(&items[0], "sk"), Some("cursor-10".to_string()));
        assert_eq!(items[0].get("parity"), Some(&AttributeValue::from("EVEN")));
        assert_eq!(items[1].get("parity"), Some(&AttributeValue::from("ODD")));
        assert_eq!(items[2].get("index"), Some(&AttributeValue::from(12_i64)));
    }

    #[test]
    fn test_hourly_items() {
        let start = Utc.with_ymd_and_hms(2020, 11, 19, 0, 0, 0).unwrap();
        let items = hourly_items("pk", "events", "sk", start, 11);
        assert_eq!(items.len(), 11);
        assert_eq!(
            key_string(&items[0], "sk"),
            Some("2020-11-19T00:00:00.000Z".to_string())
        );
        assert_eq!(
            key_string(&items[10], "sk"),
            Some("2020-11-19T10:00:00.000Z".to_string())
        );
    }
}
