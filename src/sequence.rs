use std::rc::Rc;

use crate::value::Value;

/// Raised when an iteration cursor is asked for an element after the
/// source is exhausted. Exhaustion is a hard condition, not a null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMoreElements;

impl std::fmt::Display for NoMoreElements {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no more elements")
    }
}

impl std::error::Error for NoMoreElements {}

/// A restartable, skip-null lazy sequence: a source sequence plus a
/// one-to-one element mapping, evaluated on demand.
///
/// Each call to [`LazySequence::iter`] produces a fresh cursor, so the
/// sequence can be walked any number of times. Source elements whose
/// mapped result is `None` are skipped entirely; they do not appear as
/// nulls in the output.
///
/// # Examples
///
/// ```
/// use sprig_lang::sequence::LazySequence;
/// use sprig_lang::Value;
///
/// let source = vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];
/// let seq = LazySequence::new(source, |v| match v {
///     Value::Number(n) if *n != 2.0 => Some(Value::Number(n * 10.0)),
///     _ => None,
/// });
/// let collected: Vec<Value> = seq.iter().collect();
/// assert_eq!(collected, vec![Value::Number(10.0), Value::Number(30.0)]);
/// ```
pub struct LazySequence<'f> {
    source: Vec<Value>,
    map: Rc<dyn Fn(&Value) -> Option<Value> + 'f>,
}

impl<'f> LazySequence<'f> {
    pub fn new(source: Vec<Value>, map: impl Fn(&Value) -> Option<Value> + 'f) -> Self {
        LazySequence {
            source,
            map: Rc::new(map),
        }
    }

    /// Identity adapter over a source sequence.
    pub fn identity(source: Vec<Value>) -> LazySequence<'static> {
        LazySequence::new(source, |v| Some(v.clone()))
    }

    /// Start a fresh pass over the source.
    pub fn iter(&self) -> LazyIter<'_, 'f> {
        LazyIter {
            sequence: self,
            position: 0,
            exhausted: false,
        }
    }

    /// Number of source elements. The mapped element count is unknown
    /// until iteration because the mapping may skip.
    pub fn source_len(&self) -> usize {
        self.source.len()
    }
}

/// One pass over a [`LazySequence`]. Each mapped element is computed on
/// demand; nothing is materialized up front.
pub struct LazyIter<'a, 'f> {
    sequence: &'a LazySequence<'f>,
    position: usize,
    exhausted: bool,
}

impl LazyIter<'_, '_> {
    /// Compute the next mapped element, skipping source elements whose
    /// mapped result is `None`. Once the source is exhausted with no
    /// pending valid element, every further call fails with
    /// [`NoMoreElements`].
    pub fn try_next(&mut self) -> Result<Value, NoMoreElements> {
        if self.exhausted {
            return Err(NoMoreElements);
        }
        while self.position < self.sequence.source.len() {
            let element = &self.sequence.source[self.position];
            self.position += 1;
            if let Some(mapped) = (*self.sequence.map)(element) {
                return Ok(mapped);
            }
        }
        self.exhausted = true;
        Err(NoMoreElements)
    }
}

impl Iterator for LazyIter<'_, '_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.try_next().ok()
    }

    /// Best-effort: the lower bound is always zero (the mapping may skip
    /// everything), the upper bound is the remaining source size when
    /// known.
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            (0, Some(self.sequence.source.len() - self.position))
        }
    }
}
