use std::collections::HashMap;

use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::{
    Applied, Builtin, FunctionContext, add, empty, has_min_args, number, numeric_args, text,
};
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "add", "Usage: ${add(values...)}. Example: ${add(1, 2, 3)}", func_add);
    add(map, "subt", "Usage: ${subt(value, values...)}. Example: ${subt(10, 3, 2)}", func_subt);
    add(map, "mult", "Usage: ${mult(values...)}. Example: ${mult(4, 5)}", func_mult);
    add(map, "quot", "Usage: ${quot(dividend, divisor)}. Example: ${quot(10, 4)}", func_quot);
    add(map, "mod", "Usage: ${mod(dividend, divisor)}. Example: ${mod(10, 4)}", func_mod);
    add(map, "round", "Usage: ${round(value[, digits])}. Example: ${round(2.345678, 2)}", func_round);
    add(map, "floor", "Usage: ${floor(value)}. Example: ${floor(2.7)}", func_floor);
    add(map, "ceil", "Usage: ${ceil(value)}. Example: ${ceil(2.2)}", func_ceil);
    add(map, "abs", "Usage: ${abs(value)}. Example: ${abs(-5)}", func_abs);
    add(map, "max", "Usage: ${max(values...)}. Example: ${max(this.a, this.b)}", func_max);
    add(map, "min", "Usage: ${min(values...)}. Example: ${min(this.a, this.b)}", func_min);
    add(map, "num", "Usage: ${num(value)}. Example: ${num(this.count)}", func_num);
    add(map, "int", "Usage: ${int(value)}. Example: ${int(2.7)}", func_int);
    add(map, "number_format", "Usage: ${number_format(value, digits[, decimalSep, thousandsSep])}. Example: ${number_format(1234.5, 2)}", func_number_format);
    add(map, "rand_int", "Usage: ${rand_int(bound)}. Example: ${rand_int(100)}", func_rand_int);
}

fn func_add(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers.iter().sum()),
        Err(message) => text(message),
    }
}

fn func_subt(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers[1..].iter().fold(numbers[0], |acc, n| acc - n)),
        Err(message) => text(message),
    }
}

fn func_mult(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers.iter().product()),
        Err(message) => text(message),
    }
}

fn func_quot(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers[0] / numbers[1]),
        Err(message) => text(message),
    }
}

fn func_mod(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers[0] % numbers[1]),
        Err(message) => text(message),
    }
}

/// Half-up rounding at a digit count, exact via decimal arithmetic so
/// `round(2.345678, 2)` is 2.35 and not a float artifact.
fn func_round(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let value = match args[0].to_number() {
        Ok(n) => n,
        Err(message) => return text(message),
    };
    let digits = match args.get(1) {
        Some(v) => match v.to_number() {
            Ok(n) if n >= 0.0 => n as u32,
            Ok(_) => 0,
            Err(message) => return text(message),
        },
        None => 0,
    };
    match Decimal::from_f64(value) {
        Some(decimal) => {
            let rounded =
                decimal.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            number(rounded.to_f64().unwrap_or(value))
        }
        None => number(value),
    }
}

fn func_floor(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].to_number() {
        Ok(n) => number(n.floor()),
        Err(message) => text(message),
    }
}

fn func_ceil(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].to_number() {
        Ok(n) => number(n.ceil()),
        Err(message) => text(message),
    }
}

fn func_abs(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].to_number() {
        Ok(n) => number(n.abs()),
        Err(message) => text(message),
    }
}

fn func_max(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        Err(message) => text(message),
    }
}

fn func_min(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match numeric_args(args) {
        Ok(numbers) => number(numbers.iter().copied().fold(f64::INFINITY, f64::min)),
        Err(message) => text(message),
    }
}

fn func_num(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].to_number() {
        Ok(n) => number(n),
        Err(message) => text(message),
    }
}

fn func_int(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    match args[0].to_number() {
        Ok(n) => number(n.trunc()),
        Err(message) => text(message),
    }
}

fn func_number_format(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let value = match args[0].to_number() {
        Ok(n) => n,
        Err(message) => return text(message),
    };
    let digits = match args[1].to_number() {
        Ok(n) if n >= 0.0 => n as u32,
        Ok(_) => 0,
        Err(message) => return text(message),
    };
    let decimal_sep = args
        .get(2)
        .map(|v| v.string_form())
        .unwrap_or_else(|| ".".to_string());
    let thousands_sep = args.get(3).map(|v| v.string_form()).unwrap_or_default();

    let rounded = Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or_default();
    let plain = format!("{:.*}", digits as usize, rounded);

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (plain, String::new()),
    };

    let grouped = if thousands_sep.is_empty() {
        int_part
    } else {
        group_thousands(&int_part, &thousands_sep)
    };

    if frac_part.is_empty() {
        text(grouped)
    } else {
        text(format!("{}{}{}", grouped, decimal_sep, frac_part))
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let (sign, magnitude) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let chars: Vec<char> = magnitude.chars().collect();
    let mut grouped = String::new();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(*ch);
    }
    format!("{}{}", sign, grouped)
}

fn func_rand_int(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let bound = match args[0].to_number() {
        Ok(n) if n >= 1.0 => n as i64,
        Ok(_) => return empty(),
        Err(message) => return text(message),
    };
    number(rand::rng().random_range(0..bound) as f64)
}
