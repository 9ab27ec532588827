use std::collections::HashMap;

use super::{Applied, Builtin, FunctionContext, add, boolean, empty, has_min_args, text};
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "not", "Usage: ${not(value)}. Example: ${not(empty(this.name))}", func_not);
    add(map, "and", "Usage: ${and(values...)}. Example: ${and(this.a, this.b)}", func_and);
    add(map, "or", "Usage: ${or(values...)}. Example: ${or(this.a, this.b)}", func_or);
    add(map, "equal", "Usage: ${equal(value1, value2)}. Example: ${equal(this.a, this.b)}", func_equal);
    add(map, "eq", "Usage: ${eq(value1, value2)}. Example: ${eq(this.a, this.b)}", func_equal);
    add(map, "lt", "Usage: ${lt(value1, value2)}. Example: ${lt(this.a, this.b)}", func_lt);
    add(map, "gt", "Usage: ${gt(value1, value2)}. Example: ${gt(this.a, this.b)}", func_gt);
    add(map, "lte", "Usage: ${lte(value1, value2)}. Example: ${lte(this.a, this.b)}", func_lte);
    add(map, "gte", "Usage: ${gte(value1, value2)}. Example: ${gte(this.a, this.b)}", func_gte);
    add(map, "empty", "Usage: ${empty(value)}. Example: ${empty(this.name)}", func_empty);
}

fn func_not(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    boolean(!args[0].is_true())
}

fn func_and(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    boolean(args.iter().all(|a| a.is_true()))
}

fn func_or(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    boolean(args.iter().any(|a| a.is_true()))
}

/// Two numeric values are equal by floating-point value even across
/// different argument types; everything else falls back to native
/// equality. Nulls are allowed: `equal(null, null)` is true.
fn func_equal(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.len() < 2 {
        return empty();
    }
    if let (Ok(a), Ok(b)) = (args[0].to_number(), args[1].to_number()) {
        return boolean(a == b);
    }
    boolean(args[0] == args[1])
}

fn func_lt(_fc: &FunctionContext, args: &[Value]) -> Applied {
    compare(args, |a, b| a < b)
}

fn func_gt(_fc: &FunctionContext, args: &[Value]) -> Applied {
    compare(args, |a, b| a > b)
}

fn func_lte(_fc: &FunctionContext, args: &[Value]) -> Applied {
    compare(args, |a, b| a <= b)
}

fn func_gte(_fc: &FunctionContext, args: &[Value]) -> Applied {
    compare(args, |a, b| a >= b)
}

fn compare(args: &[Value], op: fn(f64, f64) -> bool) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let a = match args[0].to_number() {
        Ok(n) => n,
        Err(message) => return text(message),
    };
    let b = match args[1].to_number() {
        Ok(n) => n,
        Err(message) => return text(message),
    };
    boolean(op(a, b))
}

fn func_empty(_fc: &FunctionContext, args: &[Value]) -> Applied {
    let Some(value) = args.first() else {
        return empty();
    };
    let is_empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    boolean(is_empty)
}
