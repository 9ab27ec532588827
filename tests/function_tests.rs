// tests/function_tests.rs

use sprig_lang::memory::MemoryApp;
use sprig_lang::{ActionContext, EvalError, SecurityContext, Settings, Value, evaluate};

fn eval(expression: &str) -> Result<Value, EvalError> {
    let app = MemoryApp::new();
    let settings = Settings::new(std::env::temp_dir());
    let ctx = ActionContext::new(&app, &settings);
    evaluate(&SecurityContext::superuser(), &ctx, None, expression)
}

fn eval_ok(expression: &str) -> Value {
    eval(expression).unwrap_or_else(|e| panic!("'{}' failed: {}", expression, e))
}

fn assert_text(expression: &str, expected: &str) {
    assert_eq!(
        eval_ok(expression),
        Value::String(expected.to_string()),
        "Failed for input: {}",
        expression
    );
}

fn assert_number(expression: &str, expected: f64) {
    assert_eq!(
        eval_ok(expression),
        Value::Number(expected),
        "Failed for input: {}",
        expression
    );
}

fn assert_boolean(expression: &str, expected: bool) {
    assert_eq!(
        eval_ok(expression),
        Value::Boolean(expected),
        "Failed for input: {}",
        expression
    );
}

// ============================================================================
// String functions
// ============================================================================

#[test]
fn test_case_functions() {
    assert_text("upper('hello')", "HELLO");
    assert_text("lower('HELLO')", "hello");
    assert_text("capitalize('ada')", "Ada");
    assert_text("titleize('war and peace')", "War And Peace");
}

#[test]
fn test_trim_and_substring() {
    assert_text("trim('  x  ')", "x");
    assert_text("substring('abcdef', 1, 3)", "bc");
    assert_text("substring('abcdef', 2)", "cdef");
    assert_text("substring('abc', 5, 9)", "");
}

#[test]
fn test_length_and_index_of() {
    assert_number("length('hello')", 5.0);
    assert_number("index_of('hello', 'll')", 2.0);
    assert_number("index_of('hello', 'z')", -1.0);
}

#[test]
fn test_contains_on_strings_and_lists() {
    assert_boolean("contains('hello', 'ell')", true);
    assert_boolean("contains('hello', 'z')", false);
    assert_boolean("contains(merge('a', 'b'), 'b')", true);
    assert_boolean("contains(merge('a', 'b'), 'z')", false);
}

#[test]
fn test_starts_and_ends_with() {
    assert_boolean("starts_with('hello', 'he')", true);
    assert_boolean("ends_with('hello', 'lo')", true);
    assert_boolean("starts_with('hello', 'lo')", false);
}

#[test]
fn test_replace() {
    assert_text("replace('a b c', ' ', '_')", "a_b_c");
    assert_text("replace('aaa', 'a', 'b')", "bbb");
}

#[test]
fn test_clean_produces_slug() {
    assert_text("clean('Hello, World!')", "hello-world");
    assert_text("clean('  --Weird__ input--  ')", "weird-input");
}

#[test]
fn test_matches_regex() {
    assert_boolean("matches('12345', '^[0-9]{5}$')", true);
    assert_boolean("matches('1234', '^[0-9]{5}$')", false);
}

#[test]
fn test_urlencode() {
    assert_text("urlencode('a b&c')", "a+b%26c");
    assert_text("urlencode('safe-chars_1.2~')", "safe-chars_1.2~");
}

#[test]
fn test_escape_javascript() {
    assert_text("escape_javascript('a\"b')", "a\\\"b");
}

#[test]
fn test_abbr_cuts_at_word_boundary() {
    assert_text("abbr('the quick brown fox', 12)", "the quick\u{2026}");
    assert_text("abbr('short', 10)", "short");
}

#[test]
fn test_split_with_explicit_and_default_separator() {
    assert_eq!(
        eval_ok("split('a,b,c', ',')"),
        Value::List(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
    assert_eq!(
        eval_ok("split('a, b; c')"),
        Value::List(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
}

#[test]
fn test_hash_is_deterministic() {
    assert_eq!(eval_ok("hash('x')"), eval_ok("hash('x')"));
    assert_ne!(eval_ok("hash('x')"), eval_ok("hash('y')"));
}

#[test]
fn test_random_produces_requested_length() {
    match eval_ok("random(8)") {
        Value::String(s) => {
            assert_eq!(s.len(), 8);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
        other => panic!("expected string, got {:?}", other),
    }
}

// ============================================================================
// Numeric functions
// ============================================================================

#[test]
fn test_arithmetic_family() {
    assert_number("add(1, 2, 3)", 6.0);
    assert_number("subt(10, 3, 2)", 5.0);
    assert_number("mult(4, 5)", 20.0);
    assert_number("quot(10, 4)", 2.5);
    assert_number("mod(10, 4)", 2.0);
}

#[test]
fn test_numbers_coerce_from_text() {
    assert_number("add('1', '2')", 3.0);
    assert_number("mult('3', 4)", 12.0);
}

#[test]
fn test_rounding_family() {
    assert_number("round(2.345678, 2)", 2.35);
    assert_number("round(2.5)", 3.0);
    assert_number("floor(2.7)", 2.0);
    assert_number("ceil(2.2)", 3.0);
    assert_number("abs(-5)", 5.0);
}

#[test]
fn test_min_max() {
    assert_number("max(1, 9, 5)", 9.0);
    assert_number("min(1, 9, 5)", 1.0);
}

#[test]
fn test_num_and_int() {
    assert_number("num('2.5')", 2.5);
    assert_number("int(2.9)", 2.0);
    assert_number("int('-3.7')", -3.0);
}

#[test]
fn test_number_format() {
    assert_text("number_format(1234.5, 2)", "1234.50");
    assert_text("number_format(1234567.891, 2, ',', '.')", "1.234.567,89");
    assert_text("number_format(1234.5, 0, '.', ',')", "1,235");
}

#[test]
fn test_rand_int_stays_below_bound() {
    for _ in 0..20 {
        match eval_ok("rand_int(10)") {
            Value::Number(n) => assert!((0.0..10.0).contains(&n)),
            other => panic!("expected number, got {:?}", other),
        }
    }
}

// ============================================================================
// Logic functions
// ============================================================================

#[test]
fn test_boolean_functions() {
    assert_boolean("not(true)", false);
    assert_boolean("not(false)", true);
    assert_boolean("and(true, true)", true);
    assert_boolean("and(true, false)", false);
    assert_boolean("or(false, true)", true);
    assert_boolean("or(false, false)", false);
}

#[test]
fn test_comparisons() {
    assert_boolean("lt(1, 2)", true);
    assert_boolean("gt(2, 1)", true);
    assert_boolean("lte(2, 2)", true);
    assert_boolean("gte(2, 3)", false);
    // Text numerals coerce.
    assert_boolean("lt('1', '02')", true);
}

#[test]
fn test_empty_function() {
    assert_boolean("empty('')", true);
    assert_boolean("empty(null)", true);
    assert_boolean("empty('x')", false);
    assert_boolean("empty(merge('a'))", false);
}

// ============================================================================
// Collection functions
// ============================================================================

#[test]
fn test_merge_flattens_and_skips_nulls() {
    assert_eq!(
        eval_ok("merge('a', null, merge('b', 'c'))"),
        Value::List(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
}

#[test]
fn test_size_and_reverse() {
    assert_number("size(merge(1, 2, 3))", 3.0);
    assert_number("size('hello')", 5.0);
    assert_eq!(
        eval_ok("reverse(merge(1, 2))"),
        Value::List(vec![Value::Number(2.0), Value::Number(1.0)])
    );
}

#[test]
fn test_concat_flattens_lists() {
    assert_text("concat('a', 'b')", "ab");
    assert_text("concat(merge('a', 'b'), '-')", "ab-");
    assert_text("concat('n=', 42)", "n=42");
}

#[test]
fn test_nth_out_of_range_is_null() {
    assert_eq!(eval_ok("nth(merge('x'), 5)"), Value::Null);
    assert_eq!(eval_ok("first(merge())"), Value::String(String::new()));
}

// ============================================================================
// Date functions
// ============================================================================

#[test]
fn test_parse_date_then_format() {
    assert_text(
        "date_format(parse_date('2024-03-01 12:30', '%Y-%m-%d %H:%M'), '%Y/%m/%d')",
        "2024/03/01",
    );
}

#[test]
fn test_parse_date_failure_surfaces_message() {
    match eval_ok("parse_date('not a date', '%Y-%m-%d')") {
        Value::String(message) => assert!(!message.is_empty()),
        other => panic!("expected message text, got {:?}", other),
    }
}

#[test]
fn test_date_format_accepts_epoch_millis() {
    // 2024-03-01T00:00:00Z
    assert_text("date_format(1709251200000, '%Y-%m-%d')", "2024-03-01");
}

#[test]
fn test_dates_compare_by_epoch_value() {
    let app = MemoryApp::new();
    let settings = Settings::new(std::env::temp_dir());
    let ctx = ActionContext::new(&app, &settings);
    let security = SecurityContext::superuser();

    ctx.store("earlier", Value::Date(1_000));
    ctx.store("later", Value::Date(2_000));
    let result = evaluate(&security, &ctx, None, "lt(earlier, later)").unwrap();
    assert_eq!(result, Value::Boolean(true));
    let equal = evaluate(&security, &ctx, None, "equal(earlier, 1000)").unwrap();
    assert_eq!(equal, Value::Boolean(true));
}

// ============================================================================
// Leniency across the board
// ============================================================================

#[test]
fn test_malformed_calls_degrade_to_empty_text() {
    let malformed = vec![
        "upper(null)",
        "substring('x')",
        "abbr('x')",
        "sort('not a list', 'key')",
        "extract('not a list', 'key')",
        "nth('not a list', 0)",
        "mult(1)",
    ];
    for expression in malformed {
        assert_eq!(
            eval_ok(expression),
            Value::String(String::new()),
            "Failed for input: {}",
            expression
        );
    }
}
