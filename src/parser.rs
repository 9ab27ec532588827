use crate::{
    ast::{ExprKind, ExprTree, NodeId, Token},
    functions::Registry,
    value::Value,
};

/// Structural errors raised by the tree builder.
///
/// These are the fatal channel: a malformed expression stops evaluation
/// before it starts. Every variant maps to status class 422.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// More `(` than `)` at end of input
    MismatchedOpeningBracket { last_token: String },

    /// A `)` with no bracket open
    MismatchedClosingBracket { last_token: String },

    /// A `,` with nothing appended since the previous separator
    UnexpectedSeparator { last_token: String },

    /// A `)` closing a bare group with no content
    EmptyGroup,

    /// A `[` or `]` outside a function-value chain
    UnexpectedBracket { bracket: char, last_token: String },

    /// A control form received more children than its fixed arity allows
    TooManyParameters { kind: &'static str },
}

impl ParseError {
    /// Numeric error class carried by structural errors.
    pub fn status(&self) -> u16 {
        422
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MismatchedOpeningBracket { last_token } => {
                write!(f, "Invalid expression: mismatched opening bracket before {}", last_token)
            }
            ParseError::MismatchedClosingBracket { last_token } => {
                write!(f, "Invalid expression: mismatched closing bracket after {}", last_token)
            }
            ParseError::UnexpectedSeparator { last_token } => {
                write!(f, "Invalid expression: unexpected ',' after {}", last_token)
            }
            ParseError::EmptyGroup => {
                write!(f, "Invalid expression: unexpected ')' in empty group")
            }
            ParseError::UnexpectedBracket { bracket, last_token } => {
                write!(f, "Invalid expression: unexpected '{}' after {}", bracket, last_token)
            }
            ParseError::TooManyParameters { kind } => {
                write!(f, "Invalid expression: too many parameters for {}", kind)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Builds an expression tree from a token stream in a single forward pass.
///
/// There is no lookahead and no explicit parse stack. The builder keeps
/// two node references instead:
///
/// - `current` - the node currently accepting appended children
/// - `next` - the node the most recent word created (or the call a `)` or
///   `]` just completed), which is the candidate a following `(` or `[`
///   descends into
///
/// Depth is tracked implicitly through the parent links; the `level`
/// counter only exists to detect unbalanced brackets.
pub struct TreeBuilder {
    tree: ExprTree,
    current: NodeId,
    next: Option<NodeId>,
    level: usize,
    last_token: String,
    separator_pending: bool,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = ExprTree::new();
        let current = tree.root();
        TreeBuilder {
            tree,
            current,
            next: None,
            level: 0,
            last_token: String::new(),
            separator_pending: false,
        }
    }

    /// Consume a full token stream and return the finished tree.
    pub fn build(tokens: &[Token]) -> Result<ExprTree, ParseError> {
        let mut builder = TreeBuilder::new();
        for token in tokens {
            builder.accept(token)?;
        }
        builder.finish()
    }

    pub fn finish(self) -> Result<ExprTree, ParseError> {
        if self.level != 0 {
            return Err(ParseError::MismatchedOpeningBracket {
                last_token: self.last_token,
            });
        }
        Ok(self.tree)
    }

    pub fn accept(&mut self, token: &Token) -> Result<(), ParseError> {
        match token {
            Token::Number(n) => {
                self.append(ExprKind::Constant(Value::Number(*n)), None)?;
            }
            Token::Quoted(text) => {
                self.append(ExprKind::Constant(Value::String(text.clone())), None)?;
            }
            Token::Word(word) => self.accept_word(word)?,
            Token::Punctuation('(') => self.open_bracket()?,
            Token::Punctuation(')') => self.close_bracket()?,
            Token::Punctuation('[') => self.open_index()?,
            Token::Punctuation(']') => self.close_index()?,
            Token::Punctuation(',') => self.separator()?,
            Token::Punctuation(';') => {
                // Statement separator: permit a fresh top-level expression
                // instead of folding into the preceding call.
                self.next = None;
                self.separator_pending = false;
            }
            Token::Punctuation(ch) => {
                self.append(ExprKind::Constant(Value::String(ch.to_string())), None)?;
            }
            Token::Eol => {}
            Token::Eof => {}
        }
        self.last_token = token.to_string();
        Ok(())
    }

    /// Reserved-word resolution: control forms and literals get their own
    /// node kinds, registered function names become calls, and everything
    /// else is a dotted path resolved at evaluation time.
    fn accept_word(&mut self, word: &str) -> Result<(), ParseError> {
        // A trailing ".path" word directly after a completed chain is a
        // postfix transform of the chain result, not a fresh path.
        if word.starts_with('.') {
            if let Some(chain) = self.next {
                if matches!(self.tree.node(chain).kind, ExprKind::FunctionValueChain) {
                    self.append_to(chain, ExprKind::Value(word.to_string()), None)?;
                    self.separator_pending = false;
                    return Ok(());
                }
            }
        }

        let (kind, name) = match word {
            "true" => (ExprKind::Constant(Value::Boolean(true)), None),
            "false" => (ExprKind::Constant(Value::Boolean(false)), None),
            "null" => (ExprKind::Constant(Value::Null), None),
            "if" => (ExprKind::If, Some(word.to_string())),
            "each" => (ExprKind::Each, Some(word.to_string())),
            "filter" => (ExprKind::Filter, Some(word.to_string())),
            "data" => (ExprKind::Value("data".to_string()), None),
            _ => {
                if Registry::global().lookup(word).is_some() {
                    (ExprKind::FunctionCall, Some(word.to_string()))
                } else {
                    (ExprKind::Value(word.to_string()), None)
                }
            }
        };

        let id = self.append(kind, name)?;
        self.next = Some(id);
        Ok(())
    }

    fn open_bracket(&mut self) -> Result<(), ParseError> {
        match self.next {
            // Descend into the pending word node: it becomes the function
            // or control-form body.
            Some(next) if next != self.current => {
                self.current = next;
            }
            // No pending node (or it was already re-opened): this is a
            // bare grouping.
            _ => {
                let group = self.append_to(self.current, ExprKind::Group, None)?;
                self.current = group;
                self.next = Some(group);
            }
        }
        self.level += 1;
        self.separator_pending = false;
        Ok(())
    }

    fn close_bracket(&mut self) -> Result<(), ParseError> {
        if self.level == 0 {
            return Err(ParseError::MismatchedClosingBracket {
                last_token: self.last_token.clone(),
            });
        }
        if matches!(self.tree.node(self.current).kind, ExprKind::Group)
            && self.tree.children(self.current).is_empty()
        {
            return Err(ParseError::EmptyGroup);
        }
        let closed = self.current;
        self.current = match self.tree.parent(closed) {
            Some(parent) => parent,
            None => {
                return Err(ParseError::MismatchedClosingBracket {
                    last_token: self.last_token.clone(),
                })
            }
        };
        // The completed node stays reachable so a following `[` can wrap
        // it into a function-value chain.
        self.next = Some(closed);
        self.level -= 1;
        self.separator_pending = false;
        Ok(())
    }

    fn open_index(&mut self) -> Result<(), ParseError> {
        let target = self.next.ok_or_else(|| ParseError::UnexpectedBracket {
            bracket: '[',
            last_token: self.last_token.clone(),
        })?;

        let chain = if matches!(self.tree.node(target).kind, ExprKind::FunctionCall) {
            self.tree.wrap(target, ExprKind::FunctionValueChain)
        } else if matches!(self.tree.node(target).kind, ExprKind::FunctionValueChain) {
            target
        } else {
            return Err(ParseError::UnexpectedBracket {
                bracket: '[',
                last_token: self.last_token.clone(),
            });
        };

        let array = self.append_to(chain, ExprKind::Array, None)?;
        self.current = array;
        self.next = Some(array);
        self.separator_pending = false;
        Ok(())
    }

    fn close_index(&mut self) -> Result<(), ParseError> {
        if !matches!(self.tree.node(self.current).kind, ExprKind::Array) {
            return Err(ParseError::UnexpectedBracket {
                bracket: ']',
                last_token: self.last_token.clone(),
            });
        }
        let array = self.current;
        let chain = self.tree.parent(array).ok_or_else(|| {
            ParseError::UnexpectedBracket {
                bracket: ']',
                last_token: self.last_token.clone(),
            }
        })?;
        self.current = self.tree.parent(chain).ok_or_else(|| {
            ParseError::UnexpectedBracket {
                bracket: ']',
                last_token: self.last_token.clone(),
            }
        })?;
        self.next = Some(chain);
        self.separator_pending = false;
        Ok(())
    }

    /// Argument separator: re-open `current` so a following `(` attaches
    /// another sibling argument instead of descending into the previous
    /// one.
    fn separator(&mut self) -> Result<(), ParseError> {
        if self.separator_pending || self.tree.children(self.current).is_empty() {
            return Err(ParseError::UnexpectedSeparator {
                last_token: self.last_token.clone(),
            });
        }
        self.separator_pending = true;
        self.next = Some(self.current);
        Ok(())
    }

    fn append(&mut self, kind: ExprKind, name: Option<String>) -> Result<NodeId, ParseError> {
        let id = self.append_to(self.current, kind, name)?;
        self.separator_pending = false;
        Ok(id)
    }

    fn append_to(
        &mut self,
        parent: NodeId,
        kind: ExprKind,
        name: Option<String>,
    ) -> Result<NodeId, ParseError> {
        self.tree
            .append(parent, kind, name)
            .map_err(|kind| ParseError::TooManyParameters { kind })
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
