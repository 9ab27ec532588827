//! # Sprig expression language - Abstract Syntax Tree
//!
//! This module defines the token type and the expression tree for the
//! sprig language, the `${function(args...)}`-style snippets used for
//! computed properties, validation rules, page templates and automation
//! scripts.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the tokenizer
//! - **[nodes]** - Arena-allocated expression nodes and the tree type
//!
//! ## Core Concepts
//!
//! ### One pass, two pointers
//!
//! The tree is built in a single forward pass over the token stream with
//! no lookahead and no explicit parse stack. The builder keeps two node
//! references: *current* (the node accepting appended children) and
//! *next* (the node a following `(` will descend into). Depth lives
//! implicitly in the parent links.
//!
//! ### Evaluate and transform
//!
//! Every node evaluates to a value. Value-producing nodes additionally
//! implement a *transform* step that threads a value through a chain of
//! postfix operations, which is how `find('User')[0].name` works: the
//! call result flows through the array index and then the trailing path.
//!
//! ## Examples
//!
//! ### Property interpolation
//!
//! ```text
//! (this.first_name, ' ', this.last_name)
//! ```
//!
//! ### Conditional defaults
//!
//! ```text
//! if(empty(this.nickname), this.name, this.nickname)
//! ```
//!
//! ### Iteration with side effects
//!
//! ```text
//! each(find('User'), (set(data, 'active', true); print(data.name)))
//! ```
pub mod nodes;
pub mod tokens;

pub use nodes::{ExprKind, ExprNode, ExprTree, NodeId, Supplier};
pub use tokens::Token;
