//! The builtin function registry and the builtins themselves.
//!
//! The registry is populated once at process start and never mutated
//! afterwards, which makes unsynchronized concurrent reads safe. Each
//! entry carries the function name, a human-readable usage string and an
//! apply operation receiving already-evaluated argument values in
//! left-to-right order.
//!
//! Most builtins are forgiving of malformed calls: arity or null-ness
//! violations degrade to an empty text value, and numeric parse failures
//! surface the parser's message as the result. Only the explicitly
//! data-mutating operations (`create`, the search-key checks in `find`)
//! raise structured errors, because silently doing nothing there would be
//! a correctness hazard.

mod collections;
mod dates;
mod entities;
mod io;
mod logic;
mod numbers;
mod strings;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{
    context::{ActionContext, EntityRef, SecurityContext},
    evaluator::EvalError,
    value::Value,
};

/// Everything a builtin may reach: the security principal, the evaluation
/// context with its collaborators, and the entity the expression runs on.
pub struct FunctionContext<'a, 'c> {
    pub security: &'a SecurityContext,
    pub ctx: &'a ActionContext<'c>,
    pub entity: Option<&'a EntityRef>,
}

/// Result of a successful builtin invocation.
///
/// The lenient failure channel is `Empty`, rendered as an empty text
/// value by the caller; it stays statically distinguishable from a real
/// value and from the fatal [`EvalError`] channel.
pub enum Outcome {
    Value(Value),
    Empty,
}

pub type Applied = Result<Outcome, EvalError>;

pub type ApplyFn = for<'a, 'c> fn(&FunctionContext<'a, 'c>, &[Value]) -> Applied;

/// One registry entry.
pub struct Builtin {
    pub name: &'static str,
    pub usage: &'static str,
    pub apply: ApplyFn,
}

/// The fixed name-to-function table.
pub struct Registry {
    functions: HashMap<&'static str, Builtin>,
}

impl Registry {
    /// The process-wide registry, built on first use.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    fn build() -> Registry {
        let mut functions = HashMap::new();
        strings::register(&mut functions);
        numbers::register(&mut functions);
        logic::register(&mut functions);
        collections::register(&mut functions);
        dates::register(&mut functions);
        entities::register(&mut functions);
        io::register(&mut functions);
        Registry { functions }
    }

    pub fn lookup(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    /// All registered names, sorted. Used by the CLI documentation
    /// commands.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

pub(crate) fn add(
    map: &mut HashMap<&'static str, Builtin>,
    name: &'static str,
    usage: &'static str,
    apply: ApplyFn,
) {
    map.insert(name, Builtin { name, usage, apply });
}

// --- result helpers ---

pub(crate) fn ok(value: Value) -> Applied {
    Ok(Outcome::Value(value))
}

pub(crate) fn empty() -> Applied {
    Ok(Outcome::Empty)
}

pub(crate) fn text(s: impl Into<String>) -> Applied {
    ok(Value::String(s.into()))
}

pub(crate) fn number(n: f64) -> Applied {
    ok(Value::Number(n))
}

pub(crate) fn boolean(b: bool) -> Applied {
    ok(Value::Boolean(b))
}

// --- argument validation ---

/// At least `n` arguments, all non-null.
pub(crate) fn has_min_args(args: &[Value], n: usize) -> bool {
    args.len() >= n && args.iter().all(|a| !a.is_null())
}

/// Exactly `n` arguments, all non-null.
pub(crate) fn has_exact_args(args: &[Value], n: usize) -> bool {
    args.len() == n && args.iter().all(|a| !a.is_null())
}

/// Coerce every argument to a number, or report the first parse failure.
/// Callers surface the message as the call's result, not as an error.
pub(crate) fn numeric_args(args: &[Value]) -> Result<Vec<f64>, String> {
    args.iter().map(|a| a.to_number()).collect()
}
