use std::collections::HashMap;
use std::path::PathBuf;

use super::CliError;
use crate::context::{ActionContext, SecurityContext, Settings};
use crate::memory::{MemoryApp, MemoryEntity};
use crate::output::{from_json, to_json};
use crate::value::Value;

/// Options for a single `sprig eval` run.
pub struct EvalOptions {
    /// The expression to evaluate, with or without `${...}` delimiters
    pub expression: String,
    /// JSON input document (the entity the expression runs on)
    pub input: Option<String>,
    /// Pretty-print the result
    pub pretty: bool,
    /// Exchange directory for the sandboxed file builtins
    pub exchange_dir: Option<PathBuf>,
}

/// What an evaluation produced: the rendered result plus whatever the
/// expression wrote through `print`.
pub struct EvalReport {
    pub rendered: String,
    pub printed: String,
}

/// Strip surrounding `${...}` if present. Delimiter scanning is a caller
/// concern; the CLI is a caller.
pub fn strip_delimiters(expression: &str) -> &str {
    let trimmed = expression.trim();
    match trimmed.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(inner) => inner,
        None => trimmed,
    }
}

pub fn execute_eval(options: &EvalOptions) -> Result<EvalReport, CliError> {
    let expression = strip_delimiters(&options.expression);

    // The input document becomes the evaluated entity, so `this.*` paths
    // resolve to its top-level fields. Non-object documents get wrapped
    // under a single `value` field.
    let properties = match &options.input {
        Some(text) => {
            let document = from_json(&serde_json::from_str(text)?);
            match document {
                Value::Object(map) => map,
                other => {
                    let mut map = HashMap::new();
                    map.insert("value".to_string(), other);
                    map
                }
            }
        }
        None => HashMap::new(),
    };
    let entity = MemoryEntity::from_object("document-1", properties).into_ref();

    let app = MemoryApp::new();
    let settings = Settings::new(
        options
            .exchange_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir),
    );
    let ctx = ActionContext::new(&app, &settings);
    let security = SecurityContext::superuser();

    let result = crate::evaluate(&security, &ctx, Some(&entity), expression)?;

    let rendered = if options.pretty {
        serde_json::to_string_pretty(&to_json(&result))?
    } else {
        serde_json::to_string(&to_json(&result))?
    };

    Ok(EvalReport {
        rendered,
        printed: ctx.take_output(),
    })
}
