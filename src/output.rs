//! JSON bridging for evaluation results and CLI input documents.
//!
//! The expression language's value type is richer than JSON (dates,
//! entity handles), so the conversion is lossy in one direction: dates
//! render as ISO-8601 strings and entities as objects of their
//! properties plus `id` and `type`.

use std::collections::HashMap;

use serde_json::{Map, Number, json};

use crate::value::Value;

/// Convert a parsed JSON document into the language's value space.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(items.iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => {
            let converted: HashMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect();
            Value::Object(converted)
        }
    }
}

/// Render an evaluation result as JSON.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => json!(b),
        Value::Number(n) => match Number::from_f64(*n) {
            Some(number) => serde_json::Value::Number(number),
            None => serde_json::Value::Null,
        },
        Value::String(s) => json!(s),
        Value::Date(_) => json!(value.string_form()),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect())
        }
        Value::Object(map) => {
            let mut rendered = Map::new();
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            for key in keys {
                rendered.insert(key.clone(), to_json(&map[key]));
            }
            serde_json::Value::Object(rendered)
        }
        Value::Entity(entity) => {
            let mut rendered = Map::new();
            rendered.insert("id".to_string(), json!(entity.id()));
            rendered.insert("type".to_string(), json!(entity.type_name()));
            let mut keys = entity.property_keys();
            keys.sort();
            for key in keys {
                if let Some(property) = entity.get_property(&key) {
                    rendered.insert(key, to_json(&property));
                }
            }
            serde_json::Value::Object(rendered)
        }
    }
}
