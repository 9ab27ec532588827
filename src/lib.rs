pub mod ast;
pub mod cli;
pub mod context;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod memory;
pub mod output;
pub mod parser;
pub mod sequence;
pub mod value;

pub use ast::{ExprKind, ExprNode, ExprTree, NodeId, Token};
pub use context::{
    ActionContext, Application, Entity, EntityRef, Geocoder, MailGateway, MailMessage,
    PropertyKey, SecurityContext, Settings,
};
pub use evaluator::{EvalError, Evaluator, evaluate};
pub use functions::{Builtin, Registry};
pub use lexer::{Tokenizer, WordChars};
pub use output::{from_json, to_json};
pub use parser::{ParseError, TreeBuilder};
pub use sequence::{LazySequence, NoMoreElements};
pub use value::Value;
