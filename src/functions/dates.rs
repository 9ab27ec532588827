use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::{Applied, Builtin, FunctionContext, add, empty, has_min_args, ok, text};
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "date_format", "Usage: ${date_format(date, pattern)}. Example: ${date_format(this.created, '%Y-%m-%d')}", func_date_format);
    add(map, "parse_date", "Usage: ${parse_date(string, pattern)}. Example: ${parse_date('2024-03-01 12:00', '%Y-%m-%d %H:%M')}", func_parse_date);
}

fn func_date_format(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let millis = match &args[0] {
        Value::Date(ms) => *ms,
        other => match other.to_number() {
            Ok(n) => n as i64,
            Err(message) => return text(message),
        },
    };
    let Some(timestamp) = Utc.timestamp_millis_opt(millis).single() else {
        return empty();
    };
    let pattern = args[1].string_form();
    text(format_checked(&timestamp, &pattern))
}

/// chrono panics on malformed format strings when formatting eagerly;
/// collect through `format` items instead so a bad pattern degrades to
/// its literal text.
fn format_checked(timestamp: &DateTime<Utc>, pattern: &str) -> String {
    use std::fmt::Write;
    let mut formatted = String::new();
    if write!(formatted, "{}", timestamp.format(pattern)).is_err() {
        return pattern.to_string();
    }
    formatted
}

fn func_parse_date(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let source = args[0].string_form();
    let pattern = args[1].string_form();
    match NaiveDateTime::parse_from_str(&source, &pattern) {
        Ok(parsed) => ok(Value::Date(parsed.and_utc().timestamp_millis())),
        Err(e) => text(e.to_string()),
    }
}
