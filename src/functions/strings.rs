use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use rand::Rng;
use rand::distr::Alphanumeric;

use super::{Applied, Builtin, FunctionContext, add, boolean, empty, has_min_args, number, ok, text};
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "upper", "Usage: ${upper(string)}. Example: ${upper(this.name)}", func_upper);
    add(map, "lower", "Usage: ${lower(string)}. Example: ${lower(this.email)}", func_lower);
    add(map, "capitalize", "Usage: ${capitalize(string)}. Example: ${capitalize(this.nickname)}", func_capitalize);
    add(map, "titleize", "Usage: ${titleize(string)}. Example: ${titleize(this.title)}", func_titleize);
    add(map, "abbr", "Usage: ${abbr(string, maxLength)}. Example: ${abbr(this.description, 80)}", func_abbr);
    add(map, "trim", "Usage: ${trim(string)}. Example: ${trim(this.input)}", func_trim);
    add(map, "split", "Usage: ${split(string[, separator])}. Example: ${split('a,b,c', ',')}", func_split);
    add(map, "substring", "Usage: ${substring(string, start[, end])}. Example: ${substring(this.name, 0, 3)}", func_substring);
    add(map, "length", "Usage: ${length(string)}. Example: ${length(this.name)}", func_length);
    add(map, "index_of", "Usage: ${index_of(string, word)}. Example: ${index_of(this.name, 'the')}", func_index_of);
    add(map, "contains", "Usage: ${contains(string, word)}. Example: ${contains(this.name, 'the')}", func_contains);
    add(map, "starts_with", "Usage: ${starts_with(string, prefix)}. Example: ${starts_with(this.name, 'A')}", func_starts_with);
    add(map, "ends_with", "Usage: ${ends_with(string, suffix)}. Example: ${ends_with(this.file, '.txt')}", func_ends_with);
    add(map, "replace", "Usage: ${replace(string, search, replacement)}. Example: ${replace(this.name, ' ', '_')}", func_replace);
    add(map, "clean", "Usage: ${clean(string)}. Example: ${clean(this.title)}", func_clean);
    add(map, "matches", "Usage: ${matches(string, pattern)}. Example: ${matches(this.zip, '[0-9]{5}')}", func_matches);
    add(map, "urlencode", "Usage: ${urlencode(string)}. Example: ${urlencode(this.email)}", func_urlencode);
    add(map, "escape_javascript", "Usage: ${escape_javascript(string)}. Example: ${escape_javascript(this.name)}", func_escape_javascript);
    add(map, "hash", "Usage: ${hash(value)}. Example: ${hash(this.email)}", func_hash);
    add(map, "random", "Usage: ${random(length)}. Example: ${random(8)}", func_random);
}

fn func_upper(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    text(args[0].string_form().to_uppercase())
}

fn func_lower(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    text(args[0].string_form().to_lowercase())
}

fn func_capitalize(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    text(capitalize(&args[0].string_form()))
}

fn func_titleize(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let source = args[0].string_form();
    let titled: Vec<String> = source.split_whitespace().map(capitalize).collect();
    text(titled.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn func_abbr(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let source = args[0].string_form();
    let max = match args[1].to_number() {
        Ok(n) if n >= 0.0 => n as usize,
        Ok(_) => return empty(),
        Err(message) => return text(message),
    };
    if source.chars().count() <= max {
        return text(source);
    }
    let truncated: String = source.chars().take(max).collect();
    // Cut at the last word boundary so the ellipsis never splits a word.
    let cut = truncated.rfind(' ').unwrap_or(truncated.len());
    text(format!("{}\u{2026}", &truncated[..cut]))
}

fn func_trim(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    text(args[0].string_form().trim().to_string())
}

fn func_split(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let source = args[0].string_form();
    let parts: Vec<Value> = if args.len() >= 2 {
        let separator = args[1].string_form();
        source
            .split(separator.as_str())
            .map(|p| Value::String(p.to_string()))
            .collect()
    } else {
        // Default separator: runs of commas, semicolons or whitespace.
        static SPLITTER: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        let splitter = SPLITTER.get_or_init(|| {
            regex::Regex::new(r"[,;\s]+").expect("static split pattern is valid")
        });
        splitter
            .split(&source)
            .filter(|p| !p.is_empty())
            .map(|p| Value::String(p.to_string()))
            .collect()
    };
    ok(Value::List(parts))
}

fn func_substring(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let source: Vec<char> = args[0].string_form().chars().collect();
    let start = match args[1].to_number() {
        Ok(n) if n >= 0.0 => n as usize,
        Ok(_) => 0,
        Err(message) => return text(message),
    };
    let end = match args.get(2) {
        Some(v) => match v.to_number() {
            Ok(n) if n >= 0.0 => n as usize,
            Ok(_) => 0,
            Err(message) => return text(message),
        },
        None => source.len(),
    };
    if start > end || start > source.len() {
        return text("");
    }
    let end = end.min(source.len());
    text(source[start..end].iter().collect::<String>())
}

fn func_length(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    number(args[0].string_form().chars().count() as f64)
}

fn func_index_of(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let source = args[0].string_form();
    let needle = args[1].string_form();
    match source.find(&needle) {
        Some(byte_pos) => number(source[..byte_pos].chars().count() as f64),
        None => number(-1.0),
    }
}

fn func_contains(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match &args[0] {
        Value::List(items) => boolean(items.contains(&args[1])),
        other => boolean(other.string_form().contains(&args[1].string_form())),
    }
}

fn func_starts_with(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    boolean(args[0].string_form().starts_with(&args[1].string_form()))
}

fn func_ends_with(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    boolean(args[0].string_form().ends_with(&args[1].string_form()))
}

fn func_replace(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 3) {
        return empty();
    }
    let source = args[0].string_form();
    let search = args[1].string_form();
    let replacement = args[2].string_form();
    if search.is_empty() {
        return text(source);
    }
    text(source.replace(&search, &replacement))
}

/// Lowercase and reduce to a url/slug-safe form: every run of characters
/// outside `[a-z0-9]` becomes a single dash.
fn func_clean(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    static CLEANER: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let cleaner = CLEANER
        .get_or_init(|| regex::Regex::new(r"[^a-z0-9]+").expect("static clean pattern is valid"));
    let lowered = args[0].string_form().to_lowercase();
    let cleaned = cleaner.replace_all(&lowered, "-");
    text(cleaned.trim_matches('-').to_string())
}

fn func_matches(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    match regex::Regex::new(&args[1].string_form()) {
        Ok(pattern) => boolean(pattern.is_match(&args[0].string_form())),
        Err(e) => text(e.to_string()),
    }
}

fn func_urlencode(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let source = args[0].string_form();
    let mut encoded = String::with_capacity(source.len());
    for byte in source.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    text(encoded)
}

fn func_escape_javascript(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let source = args[0].string_form();
    let mut escaped = String::with_capacity(source.len());
    for ch in source.chars() {
        match ch {
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '/' => escaped.push_str("\\/"),
            c => escaped.push(c),
        }
    }
    text(escaped)
}

fn func_hash(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let mut hasher = DefaultHasher::new();
    hasher.write(args[0].string_form().as_bytes());
    text(format!("{:016x}", hasher.finish()))
}

fn func_random(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let length = match args[0].to_number() {
        Ok(n) if n >= 0.0 => n as usize,
        Ok(_) => return empty(),
        Err(message) => return text(message),
    };
    let generated: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    text(generated)
}
