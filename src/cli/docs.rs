use std::fmt::Write;

use super::CliError;
use crate::functions::Registry;

/// One line per registered builtin: the name and its usage text. The
/// usage strings double as the language's inline help, so this is the
/// whole reference.
pub fn docs_overview() -> String {
    let registry = Registry::global();
    let mut out = String::new();
    let _ = writeln!(out, "Built-in functions ({}):", registry.len());
    let _ = writeln!(out);
    for name in registry.names() {
        if let Some(function) = registry.lookup(name) {
            let _ = writeln!(out, "  {:<22} {}", function.name, function.usage);
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Run 'sprig doc <name>' for a single function.");
    out
}

pub fn doc_for(name: &str) -> Result<String, CliError> {
    match Registry::global().lookup(name) {
        Some(function) => Ok(format!("{}\n", function.usage)),
        None => Err(CliError::UnknownFunction(name.to_string())),
    }
}
