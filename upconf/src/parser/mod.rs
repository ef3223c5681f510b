//! Parsing pipeline: lexer, document model, and recursive-descent parser.

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::*;
pub use lexer::{tokenize, LexError, Quote, QuotedValue, Span, Spanned, Token};
pub use parser::{parse, ParseError, Parser, StatementParser};
