//! Items and attribute values
//!
//! An item is an ordered mapping of field names to [`AttributeValue`]s.
//! Every item a store returns carries at least its partition key and
//! sort key fields.

mod value;

pub use value::AttributeValue;

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// A stored record
pub type Item = BTreeMap<String, AttributeValue>;

/// Build an item from a JSON object
pub fn item_from_json(value: JsonValue) -> Result<Item> {
    match value {
        JsonValue::Object(map) => Ok(item_from_object(map)),
        other => Err(Error::decode(format!(
            "expected a JSON object for an item, got {other}"
        ))),
    }
}

/// Build an item from a JSON map
pub fn item_from_object(map: JsonObject) -> Item {
    map.into_iter()
        .map(|(k, v)| (k, AttributeValue::from(v)))
        .collect()
}

/// Render an item as a JSON object
pub fn item_to_json(item: &Item) -> JsonValue {
    JsonValue::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Decode an item into a caller-defined type
pub fn decode_item<T: DeserializeOwned>(item: &Item) -> Result<T> {
    serde_json::from_value(item_to_json(item))
        .map_err(|e| Error::decode(format!("item does not match the expected shape: {e}")))
}

/// String form of an item's key attribute, if present and scalar
pub fn key_string(item: &Item, attribute: &str) -> Option<String> {
    item.get(attribute).and_then(AttributeValue::key_string)
}

/// Keep only the listed attributes
pub fn project(item: &Item, attributes: &[String]) -> Item {
    attributes
        .iter()
        .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}
