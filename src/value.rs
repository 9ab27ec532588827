use std::collections::HashMap;

use crate::context::EntityRef;

/// A dynamic value used throughout the sprig expression language.
///
/// Expressions read and write entity data, so the value space covers the
/// JSON-like scalars plus two domain types: `Date` (an epoch-millisecond
/// timestamp) and `Entity` (a shared handle to a graph object supplied by
/// the embedding application).
///
/// # Numbers
///
/// The language has a single numeric type: 64-bit floating point. Numeric
/// literals lex as `f64`, and comparison/arithmetic builtins coerce their
/// arguments to `f64` by text parsing (see [`Value::to_number`]).
///
/// # Examples
///
/// ```
/// use sprig_lang::Value;
///
/// let n = Value::Number(42.0);
/// let s = Value::String("hello".to_string());
/// let list = Value::List(vec![n, s]);
/// assert_eq!(list.string_form(), "42, hello");
/// ```
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// 64-bit floating-point number
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Timestamp in milliseconds since the Unix epoch
    Date(i64),

    /// Ordered sequence of values
    List(Vec<Value>),

    /// String-keyed map (used for geocoding results and JSON documents)
    Object(HashMap<String, Value>),

    /// Shared handle to an entity supplied by the embedding application
    Entity(EntityRef),
}

impl Value {
    /// Empty text value, the lenient "this call was malformed" result.
    pub fn empty_text() -> Value {
        Value::String(String::new())
    }

    /// Condition check used by `if` and `filter`: boolean `true` or the
    /// string `"true"`, nothing else.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        }
    }

    /// Numeric coercion used by comparison and arithmetic builtins.
    ///
    /// Dates compare by their epoch-millisecond value; every other value
    /// is rendered to text and parsed as `f64`. Parse failure returns the
    /// parser's message, which callers surface as a value instead of
    /// raising.
    pub fn to_number(&self) -> Result<f64, String> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Date(ms) => Ok(*ms as f64),
            other => {
                let text = other.string_form();
                text.trim().parse::<f64>().map_err(|e| e.to_string())
            }
        }
    }

    /// The string form used by group concatenation and the text builtins.
    ///
    /// Nulls render as the empty string so templates can interpolate
    /// optional properties without "null" artifacts. Whole numbers render
    /// without a fractional part.
    pub fn string_form(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(ms) => format_date(*ms),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.string_form()).collect();
                parts.join(", ")
            }
            Value::Object(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys
                    .iter()
                    .map(|k| format!("{}: {}", k, map[*k].string_form()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Entity(e) => e.id(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the elements of a sequence value. Lists yield their items;
    /// everything else is not a sequence.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Whole numbers print without a trailing ".0" so template output reads
/// naturally ("3 items", not "3.0 items").
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_date(ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.to_rfc3339(),
        None => ms.to_string(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Entity(a), Entity(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Date(ms) => write!(f, "Date({})", ms),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(map) => f.debug_tuple("Object").field(map).finish(),
            Value::Entity(e) => write!(f, "Entity({}:{})", e.type_name(), e.id()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
