use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Applied, Builtin, FunctionContext, add, empty, has_min_args, number, ok, text};
use crate::sequence::LazySequence;
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "extract", "Usage: ${extract(list, propertyName)}. Example: ${extract(this.children, 'name')}", func_extract);
    add(map, "merge", "Usage: ${merge(lists...)}. Example: ${merge(this.children, this.owners)}", func_merge);
    add(map, "sort", "Usage: ${sort(list, propertyName[, descending])}. Example: ${sort(find('User'), 'name', true)}", func_sort);
    add(map, "first", "Usage: ${first(list)}. Example: ${first(this.children)}", func_first);
    add(map, "last", "Usage: ${last(list)}. Example: ${last(this.children)}", func_last);
    add(map, "nth", "Usage: ${nth(list, index)}. Example: ${nth(this.children, 2)}", func_nth);
    add(map, "size", "Usage: ${size(list)}. Example: ${size(this.children)}", func_size);
    add(map, "reverse", "Usage: ${reverse(list)}. Example: ${reverse(this.children)}", func_reverse);
    add(map, "join", "Usage: ${join(list, separator)}. Example: ${join(this.names, ', ')}", func_join);
    add(map, "concat", "Usage: ${concat(values...)}. Example: ${concat(this.first_name, ' ', this.last_name)}", func_concat);
    add(map, "get", "Usage: ${get(entity, propertyKey)}. Example: ${get(this, 'name')}", func_get);
}

/// Pull one property out of each element, skipping elements without it.
/// Input order is preserved.
fn func_extract(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let Some(items) = args[0].as_list() else {
        return empty();
    };
    let key = args[1].string_form();
    let sequence = LazySequence::new(items.to_vec(), move |element| {
        let extracted = property_of(element, &key);
        if extracted.is_null() {
            None
        } else {
            Some(extracted)
        }
    });
    ok(Value::List(sequence.iter().collect()))
}

/// Flatten lists and scalars into one list, dropping nulls.
fn func_merge(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    let mut flattened = Vec::new();
    for arg in args {
        match arg {
            Value::List(items) => flattened.extend(items.iter().cloned()),
            other => flattened.push(other.clone()),
        }
    }
    let sequence = LazySequence::new(flattened, |element| {
        if element.is_null() {
            None
        } else {
            Some(element.clone())
        }
    });
    ok(Value::List(sequence.iter().collect()))
}

/// Sort by a named property, ascending by default; a true third argument
/// sorts descending. The sort is stable, so equal keys keep their input
/// order.
fn func_sort(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let Some(items) = args[0].as_list() else {
        return empty();
    };
    let key = args[1].string_form();
    let descending = args.get(2).map(|v| v.is_true()).unwrap_or(false);

    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_values(&property_of(a, &key), &property_of(b, &key));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    ok(Value::List(sorted))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (x, y) => x.string_form().cmp(&y.string_form()),
    }
}

fn func_first(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].as_list() {
        Some(items) => ok(items.first().cloned().unwrap_or(Value::Null)),
        None => empty(),
    }
}

fn func_last(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].as_list() {
        Some(items) => ok(items.last().cloned().unwrap_or(Value::Null)),
        None => empty(),
    }
}

fn func_nth(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let Some(items) = args[0].as_list() else {
        return empty();
    };
    let index = match args[1].to_number() {
        Ok(n) if n >= 0.0 => n as usize,
        Ok(_) => return ok(Value::Null),
        Err(message) => return text(message),
    };
    ok(items.get(index).cloned().unwrap_or(Value::Null))
}

fn func_size(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match &args[0] {
        Value::List(items) => number(items.len() as f64),
        Value::Object(map) => number(map.len() as f64),
        Value::String(s) => number(s.chars().count() as f64),
        _ => empty(),
    }
}

fn func_reverse(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].as_list() {
        Some(items) => {
            let mut reversed = items.to_vec();
            reversed.reverse();
            ok(Value::List(reversed))
        }
        None => empty(),
    }
}

fn func_join(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let Some(items) = args[0].as_list() else {
        return empty();
    };
    let separator = args[1].string_form();
    let parts: Vec<String> = items.iter().map(|v| v.string_form()).collect();
    text(parts.join(&separator))
}

/// Concatenate the string forms of all arguments; list arguments are
/// flattened first.
fn func_concat(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::List(items) => {
                for item in items {
                    result.push_str(&item.string_form());
                }
            }
            other => result.push_str(&other.string_form()),
        }
    }
    text(result)
}

fn func_get(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !super::has_exact_args(args, 2) {
        return empty();
    }
    ok(property_of(&args[0], &args[1].string_form()))
}

/// Property access shared by the collection builtins: entities resolve
/// through their property table, objects through their keys.
pub(super) fn property_of(value: &Value, key: &str) -> Value {
    match value {
        Value::Entity(e) => e.get_property(key).unwrap_or(Value::Null),
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
