//! JSON encoding of collection items
//!
//! Create: `{ ...fields, order, <parent>: parentId }`
//! Update: `{ id, order, ...fields, <parent>: parentId }`

use serde_json::{Map, Value};

use super::ApiError;
use crate::domain::{CollectionKind, CollectionRef, ItemId, ItemRecord, Payload};

fn fields<P: Payload>(payload: &P) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::Decode(format!("payload is not an object: {}", other))),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

/// Body for `POST /{collection}`
pub fn encode_create<P: Payload>(collection: &CollectionRef, order: u32, payload: &P) -> Result<Value, ApiError> {
    let mut body = fields(payload)?;
    body.insert(collection.order_field().to_string(), Value::from(order));
    body.insert(collection.parent_field().to_string(), Value::from(collection.parent.id.clone()));
    Ok(Value::Object(body))
}

/// Body for `PUT /{collection}/{id}`
pub fn encode_update<P: Payload>(
    collection: &CollectionRef,
    id: &ItemId,
    order: u32,
    payload: &P,
) -> Result<Value, ApiError> {
    let mut body = fields(payload)?;
    body.insert("id".to_string(), Value::from(id.as_str()));
    body.insert(collection.order_field().to_string(), Value::from(order));
    body.insert(collection.parent_field().to_string(), Value::from(collection.parent.id.clone()));
    Ok(Value::Object(body))
}

fn read_id(value: &Value) -> Option<ItemId> {
    match value.get("id")? {
        Value::String(s) if !s.is_empty() => Some(ItemId::new(s.clone())),
        Value::Number(n) => Some(ItemId::new(n.to_string())),
        _ => None,
    }
}

/// Server id from a create response
pub fn decode_created_id(value: &Value) -> Result<ItemId, ApiError> {
    read_id(value).ok_or_else(|| ApiError::Decode("created item has no id".to_string()))
}

/// One server item; `fallback_order` is used when the order field is absent
pub fn decode_record<P: Payload>(
    collection: &CollectionRef,
    value: &Value,
    fallback_order: u32,
) -> Result<ItemRecord<P>, ApiError> {
    let order = value
        .get(collection.order_field())
        .and_then(Value::as_u64)
        .map(|o| o as u32)
        .unwrap_or(fallback_order);
    let payload: P = serde_json::from_value(value.clone()).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(ItemRecord { id: read_id(value), order, payload })
}

pub fn decode_records<P: Payload>(collection: &CollectionRef, values: &[Value]) -> Result<Vec<ItemRecord<P>>, ApiError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| decode_record(collection, value, i as u32))
        .collect()
}

/// Pull the embedded collection array out of a parent entity response
pub(crate) fn embedded_items(kind: CollectionKind, parent: &Value) -> Vec<Value> {
    kind.embedded_fields()
        .iter()
        .find_map(|field| parent.get(*field).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Human message from an error body (`message`, `error`, `detail`, `errors`,
/// then any string values)
pub fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in ["message", "error", "detail"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }
            if let Some(Value::Array(errors)) = map.get("errors") {
                let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
                if !joined.is_empty() {
                    return Some(joined.join(", "));
                }
            }
            let values: Vec<&str> = map
                .values()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .collect();
            if values.is_empty() {
                None
            } else {
                Some(values.join(", "))
            }
        }
        _ => None,
    }
}
