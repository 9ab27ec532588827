use crate::{
    ast::{ExprKind, ExprTree, NodeId},
    context::{ActionContext, EntityRef, SecurityContext},
    functions::{FunctionContext, Outcome, Registry},
    lexer::Tokenizer,
    parser::{ParseError, TreeBuilder},
    value::Value,
};

/// Errors raised through the fatal channel.
///
/// Two error channels coexist in this language. Structural violations
/// (this type) stop evaluation and carry a numeric status class. Lenient
/// builtin failures never appear here: they degrade to an empty text
/// value or a message-text value inside the result.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Malformed expression: builder errors, missing `if` branches,
    /// wrong child counts on the control forms. Status 422.
    Syntax { message: String },

    /// `find`/`create` asked to search on a key that is missing or not
    /// indexed. Status 400.
    InvalidSearchKey { key: String, type_name: String },

    /// Invalid type usage in a data-mutating builtin, e.g. `create` of
    /// the evaluating entity's own type. Status 422.
    TypeViolation { message: String },

    /// A collaborator (application layer, mail gateway) failed. Status 500.
    Collaborator { message: String },

    /// Sandboxed file I/O failed. Status 500.
    Io { message: String },
}

impl EvalError {
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax {
            message: message.into(),
        }
    }

    /// The numeric error class: 422 for structural and type violations,
    /// 400 for invalid search keys, 500 for collaborator and I/O failures.
    pub fn status(&self) -> u16 {
        match self {
            EvalError::Syntax { .. } | EvalError::TypeViolation { .. } => 422,
            EvalError::InvalidSearchKey { .. } => 400,
            EvalError::Collaborator { .. } | EvalError::Io { .. } => 500,
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Syntax { message } => write!(f, "Syntax error: {}", message),
            EvalError::InvalidSearchKey { key, type_name } => write!(
                f,
                "Search key '{}' is not indexed for type '{}'",
                key, type_name
            ),
            EvalError::TypeViolation { message } => write!(f, "Type violation: {}", message),
            EvalError::Collaborator { message } => write!(f, "Collaborator error: {}", message),
            EvalError::Io { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::Syntax {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for EvalError {
    fn from(e: std::io::Error) -> Self {
        EvalError::Io {
            message: e.to_string(),
        }
    }
}

/// Evaluate an expression against an entity.
///
/// This is the top-level entry point: it tokenizes, builds the tree and
/// evaluates it in one synchronous pass. Tokens and tree are created
/// fresh for this invocation and discarded when it returns.
///
/// # Examples
///
/// ```
/// use sprig_lang::{evaluate, ActionContext, SecurityContext, Settings, Value};
/// use sprig_lang::memory::MemoryApp;
///
/// let app = MemoryApp::new();
/// let settings = Settings::new(std::env::temp_dir());
/// let ctx = ActionContext::new(&app, &settings);
/// let security = SecurityContext::superuser();
///
/// let result = evaluate(&security, &ctx, None, "add(1, 2, 3)").unwrap();
/// assert_eq!(result, Value::Number(6.0));
/// ```
pub fn evaluate(
    security: &SecurityContext,
    ctx: &ActionContext<'_>,
    entity: Option<&EntityRef>,
    source: &str,
) -> Result<Value, EvalError> {
    let tokens = Tokenizer::new(source).tokenize();
    let tree = TreeBuilder::build(&tokens)?;
    Evaluator::new(security, entity).run(&tree, ctx)
}

/// Walks an expression tree, dispatching on node kind.
///
/// Each node kind implements `evaluate`; the value-producing kinds also
/// implement `transform`, which threads a value through a chain of
/// postfix operations left to right.
pub struct Evaluator<'a> {
    security: &'a SecurityContext,
    entity: Option<&'a EntityRef>,
}

impl<'a> Evaluator<'a> {
    pub fn new(security: &'a SecurityContext, entity: Option<&'a EntityRef>) -> Self {
        Evaluator { security, entity }
    }

    pub fn run(&self, tree: &ExprTree, ctx: &ActionContext<'_>) -> Result<Value, EvalError> {
        self.eval(tree, tree.root(), ctx)
    }

    pub fn eval(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let node = tree.node(id);
        match &node.kind {
            ExprKind::Root | ExprKind::Group => self.eval_sequence(tree, id, ctx),
            ExprKind::Constant(value) => Ok(value.clone()),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Value(path) => Ok(ctx.resolve_path(self.security, self.entity, path)),
            ExprKind::FunctionCall => self.eval_call(tree, id, ctx),
            ExprKind::FunctionValueChain => self.eval_chain(tree, id, ctx),
            ExprKind::If => self.eval_if(tree, id, ctx),
            ExprKind::Each => self.eval_each(tree, id, ctx),
            ExprKind::Filter => self.eval_filter(tree, id, ctx),
            ExprKind::Array => self.eval_index(tree, id, ctx),
            ExprKind::LazyFunctionValue(supplier) => Ok((**supplier)()),
        }
    }

    /// Thread a value through one postfix operation. Array nodes index
    /// into the value, trailing paths navigate it, filters reduce it;
    /// anything else ignores the incoming value and evaluates plainly.
    pub fn transform(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
        value: Value,
    ) -> Result<Value, EvalError> {
        let node = tree.node(id);
        match &node.kind {
            ExprKind::Array => self.transform_index(tree, id, ctx, value),
            ExprKind::Value(path) => Ok(navigate(&value, path)),
            ExprKind::Filter => self.transform_filter(tree, id, ctx, value),
            _ => self.eval(tree, id, ctx),
        }
    }

    /// Root and Group: empty evaluates to null, a single child passes its
    /// value through unchanged, two or more children concatenate their
    /// string forms (nulls render as the empty string).
    fn eval_sequence(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        match children {
            [] => Ok(Value::Null),
            [only] => self.eval(tree, *only, ctx),
            _ => {
                let mut text = String::new();
                for &child in children {
                    let value = self.eval(tree, child, ctx)?;
                    text.push_str(&value.string_form());
                }
                Ok(Value::String(text))
            }
        }
    }

    fn eval_call(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let node = tree.node(id);
        let name = node.name.as_deref().unwrap_or_default();
        let function = Registry::global()
            .lookup(name)
            .ok_or_else(|| EvalError::syntax(format!("unknown function '{}'", name)))?;

        // Zero argument expressions: surface the usage text instead of
        // applying. This doubles as inline help.
        if node.children.is_empty() {
            return Ok(Value::String(function.usage.to_string()));
        }

        let mut args = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            args.push(self.eval(tree, child, ctx)?);
        }

        let fc = FunctionContext {
            security: self.security,
            ctx,
            entity: self.entity,
        };
        match (function.apply)(&fc, &args)? {
            Outcome::Value(value) => Ok(value),
            Outcome::Empty => Ok(Value::empty_text()),
        }
    }

    /// A function call followed by postfix transforms: evaluate the call,
    /// then fold the result through each trailing expression's transform,
    /// left to right.
    fn eval_chain(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        let Some((&head, rest)) = children.split_first() else {
            return Ok(Value::Null);
        };
        let mut value = self.eval(tree, head, ctx)?;
        for &postfix in rest {
            value = self.transform(tree, postfix, ctx, value)?;
        }
        Ok(value)
    }

    fn eval_if(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        let Some(&condition) = children.first() else {
            return Err(EvalError::syntax("if() requires a condition"));
        };
        let holds = self.eval(tree, condition, ctx)?.is_true();
        if holds {
            match children.get(1) {
                Some(&branch) => self.eval(tree, branch, ctx),
                None => Err(EvalError::syntax("if() is missing its true branch")),
            }
        } else {
            match children.get(2) {
                Some(&branch) => self.eval(tree, branch, ctx),
                None => Err(EvalError::syntax("if() is missing its false branch")),
            }
        }
    }

    /// `each(list, body)`: evaluate the body once per element with the
    /// context scoped to that element. Results are discarded; the form
    /// exists purely for its side effects.
    fn eval_each(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        let [list_expr, body] = children else {
            return Err(EvalError::syntax("each() requires a list and a body"));
        };
        let source = self.eval(tree, *list_expr, ctx)?;
        if let Value::List(items) = source {
            for item in items {
                let scoped = ctx.with_data(item);
                self.eval(tree, *body, &scoped)?;
            }
        }
        Ok(Value::Null)
    }

    /// `filter(list, predicate)`: keep elements for which the predicate,
    /// evaluated with the context scoped to the element, is true. Order
    /// is preserved.
    fn eval_filter(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        let [list_expr, predicate] = children else {
            return Err(EvalError::syntax("filter() requires a list and a predicate"));
        };
        let source = self.eval(tree, *list_expr, ctx)?;
        let Value::List(items) = source else {
            return Ok(Value::Null);
        };
        let mut kept = Vec::new();
        for item in items {
            let scoped = ctx.with_data(item.clone());
            if self.eval(tree, *predicate, &scoped)?.is_true() {
                kept.push(item);
            }
        }
        Ok(Value::List(kept))
    }

    /// Standalone array index: evaluates its single child and, only if
    /// the result is numeric, returns its integer form.
    fn eval_index(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, EvalError> {
        let index = self.index_of(tree, id, ctx)?;
        Ok(match index {
            Some(i) => Value::Number(i as f64),
            None => Value::Null,
        })
    }

    /// Array index in transform position: apply the index to a sequence
    /// value, yielding null on any out-of-range access.
    fn transform_index(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
        value: Value,
    ) -> Result<Value, EvalError> {
        let Some(index) = self.index_of(tree, id, ctx)? else {
            return Ok(Value::Null);
        };
        let Some(items) = value.as_list() else {
            return Ok(Value::Null);
        };
        if index < 0 {
            return Ok(Value::Null);
        }
        Ok(items.get(index as usize).cloned().unwrap_or(Value::Null))
    }

    /// Filter in transform position: reduce the piped list with this
    /// node's predicate, the context scoped to each element in turn.
    fn transform_filter(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
        value: Value,
    ) -> Result<Value, EvalError> {
        let children = tree.children(id);
        let Some(&predicate) = children.last() else {
            return Ok(Value::Null);
        };
        let Value::List(items) = value else {
            return Ok(Value::Null);
        };
        let mut kept = Vec::new();
        for item in items {
            let scoped = ctx.with_data(item.clone());
            if self.eval(tree, predicate, &scoped)?.is_true() {
                kept.push(item);
            }
        }
        Ok(Value::List(kept))
    }

    fn index_of(
        &self,
        tree: &ExprTree,
        id: NodeId,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<i64>, EvalError> {
        let children = tree.children(id);
        let [child] = children else {
            return Err(EvalError::syntax(
                "array index requires exactly one parameter",
            ));
        };
        match self.eval(tree, *child, ctx)? {
            Value::Number(n) => Ok(Some(n.trunc() as i64)),
            _ => Ok(None),
        }
    }
}

/// Navigate a trailing dotted path against a piped value (the `.name` in
/// `find('User')[0].name`). Misses yield null.
fn navigate(value: &Value, path: &str) -> Value {
    let mut current = value.clone();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match &current {
            Value::Entity(e) => e.get_property(segment).unwrap_or(Value::Null),
            Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        if current.is_null() {
            break;
        }
    }
    current
}
