//! Parser for a small Python subset, as found in neural-network forward
//! methods: `def`, assignments (plain, augmented, destructuring), `return`,
//! `if`/`elif`/`else`, `for`/`while`, calls with keyword arguments,
//! attributes, subscripts, arithmetic/comparison operators, and
//! tuple/list/number/string literals.
//!
//! The pipeline is lexing ([`token`], [`lexer`]) with a Python-style
//! indentation layout pass, then recursive descent ([`parser`]) into the
//! normalized AST of [`ast`]. Every statement and expression node carries a
//! source line and an id slot for the consumer to stamp.
//!
//! ```
//! use subset_py_typing_parser::{parse_module, StmtKind};
//!
//! let module = parse_module("def f(x):\n    return x + 1\n").unwrap();
//! assert_eq!(module.body.len(), 1);
//! match &module.body[0].kind {
//!     StmtKind::FunctionDef { name, params, body } => {
//!         assert_eq!(name, "f");
//!         assert_eq!(params.len(), 1);
//!         assert_eq!(body.len(), 1);
//!     }
//!     _ => panic!("expected a function definition"),
//! }
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{
    BinOpKind, CmpOpKind, Expr, ExprKind, Keyword, Literal, Module, NodeId, Param, Stmt, StmtKind,
    UnaryOpKind, UNASSIGNED,
};
pub use error::{ParseError, ParseErrors, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use parser::{parse_module, Parser};
pub use span::{SourceMap, Span};
pub use token::Token;
