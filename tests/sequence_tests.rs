// tests/sequence_tests.rs

use sprig_lang::sequence::{LazySequence, NoMoreElements};
use sprig_lang::Value;

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().map(|n| Value::Number(*n)).collect()
}

// ============================================================================
// Skip-null mapping
// ============================================================================

#[test]
fn test_skipped_element_is_absent_and_order_is_preserved() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]), |v| match v {
        Value::Number(n) if *n == 3.0 => None,
        other => Some(other.clone()),
    });

    let collected: Vec<Value> = sequence.iter().collect();
    assert_eq!(collected, numbers(&[1.0, 2.0, 4.0, 5.0]));
}

#[test]
fn test_mapping_is_applied_per_element() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0]), |v| {
        v.to_number().ok().map(|n| Value::Number(n * 10.0))
    });
    let collected: Vec<Value> = sequence.iter().collect();
    assert_eq!(collected, numbers(&[10.0, 20.0]));
}

#[test]
fn test_all_skipped_yields_empty() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0]), |_| None);
    assert_eq!(sequence.iter().count(), 0);
}

// ============================================================================
// Exhaustion
// ============================================================================

#[test]
fn test_next_past_exhaustion_fails() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0]), |v| Some(v.clone()));
    let mut cursor = sequence.iter();

    assert_eq!(cursor.try_next(), Ok(Value::Number(1.0)));
    assert_eq!(cursor.try_next(), Ok(Value::Number(2.0)));
    assert_eq!(cursor.try_next(), Err(NoMoreElements));
    // Still exhausted on repeated calls.
    assert_eq!(cursor.try_next(), Err(NoMoreElements));
}

#[test]
fn test_exhaustion_with_trailing_skips() {
    // The last source elements map to null: exhaustion is reported as the
    // condition, not as a null element.
    let sequence = LazySequence::new(numbers(&[1.0, 2.0, 3.0]), |v| match v {
        Value::Number(n) if *n >= 2.0 => None,
        other => Some(other.clone()),
    });
    let mut cursor = sequence.iter();
    assert_eq!(cursor.try_next(), Ok(Value::Number(1.0)));
    assert_eq!(cursor.try_next(), Err(NoMoreElements));
}

#[test]
fn test_iterator_interface_ends_with_none() {
    let sequence = LazySequence::new(numbers(&[1.0]), |v| Some(v.clone()));
    let mut cursor = sequence.iter();
    assert_eq!(cursor.next(), Some(Value::Number(1.0)));
    assert_eq!(cursor.next(), None);
    assert_eq!(cursor.next(), None);
}

// ============================================================================
// Restartability
// ============================================================================

#[test]
fn test_each_iter_call_starts_fresh() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0]), |v| Some(v.clone()));

    let first: Vec<Value> = sequence.iter().collect();
    let second: Vec<Value> = sequence.iter().collect();
    assert_eq!(first, second);

    // A drained cursor does not affect a fresh one.
    let mut drained = sequence.iter();
    while drained.try_next().is_ok() {}
    assert_eq!(sequence.iter().count(), 2);
}

// ============================================================================
// Size hints
// ============================================================================

#[test]
fn test_size_hint_copies_source_size() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0, 3.0]), |v| Some(v.clone()));
    let cursor = sequence.iter();
    assert_eq!(cursor.size_hint(), (0, Some(3)));
    assert_eq!(sequence.source_len(), 3);
}

#[test]
fn test_size_hint_shrinks_as_cursor_advances() {
    let sequence = LazySequence::new(numbers(&[1.0, 2.0, 3.0]), |v| Some(v.clone()));
    let mut cursor = sequence.iter();
    cursor.try_next().unwrap();
    assert_eq!(cursor.size_hint(), (0, Some(2)));

    while cursor.try_next().is_ok() {}
    assert_eq!(cursor.size_hint(), (0, Some(0)));
}

#[test]
fn test_identity_adapter() {
    let sequence = LazySequence::identity(numbers(&[1.0, 2.0]));
    let collected: Vec<Value> = sequence.iter().collect();
    assert_eq!(collected, numbers(&[1.0, 2.0]));
}
