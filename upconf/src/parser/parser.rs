//! Recursive-descent parser for nginx-style configuration.
//!
//! Statements are parsed generically (`name params... ;` or
//! `name params... { ... }`) and then upgraded through name-keyed
//! dispatch tables: block wrappers for `http`, `server`, `location`,
//! `upstream`, and directive wrappers for simple `server` (upstream
//! member) and `include`. Unrecognized names stay generic. The first
//! error aborts the whole parse; there is no recovery.

use crate::parser::ast::*;
use crate::parser::lexer::{tokenize, LexError, Span, Spanned, Token};
use std::collections::HashMap;
use thiserror::Error;

/// Parser error types. `Lex` is a lexical error, `UnexpectedToken` /
/// `UnexpectedEof` are syntax errors, and the remaining variants are
/// semantic errors raised by the typed wrappers.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token `{kind}` (`{literal}`) at {span}")]
    UnexpectedToken {
        kind: &'static str,
        literal: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected} at {span}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("include expects exactly one path parameter, got {got} at {span}")]
    IncludeParameters { got: usize, span: Span },

    #[error("include cannot carry a block, missing semicolon after the path? at {span}")]
    IncludeBlock { span: Span },

    #[error("location expects one or two parameters, got {got} at {span}")]
    LocationParameters { got: usize, span: Span },
}

impl ParseError {
    /// Source location of the failure, for diagnostics.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(e) => e.span(),
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::IncludeParameters { span, .. } => *span,
            ParseError::IncludeBlock { span } => *span,
            ParseError::LocationParameters { span, .. } => *span,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// A statement parser registered for a directive name takes full
/// control of parsing that statement. None are registered by default;
/// the hook exists for grammars the generic form cannot express.
pub type StatementParser = fn(&mut Parser) -> ParseResult<Entry>;

/// Converts a fully parsed generic directive into its typed variant.
/// The span is the position of the directive name, for diagnostics.
type Wrapper = fn(Directive, Span) -> ParseResult<Entry>;

/// Parser state: the token stream plus a cursor giving the
/// current/following two-token window.
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    eof_span: Span,
    statement_parsers: HashMap<String, StatementParser>,
    block_wrappers: HashMap<&'static str, Wrapper>,
    directive_wrappers: HashMap<&'static str, Wrapper>,
}

impl Parser {
    /// Create a new parser from source text. Fails on lexical errors.
    pub fn new(source: &str) -> ParseResult<Self> {
        let tokens = tokenize(source)?;
        tracing::debug!(tokens = tokens.len(), "tokenized configuration source");

        let block_wrappers: HashMap<&'static str, Wrapper> = HashMap::from([
            ("http", wrap_http as Wrapper),
            ("server", wrap_server),
            ("location", wrap_location),
            ("upstream", wrap_upstream),
            ("include", reject_include_block),
        ]);
        let directive_wrappers: HashMap<&'static str, Wrapper> = HashMap::from([
            ("server", wrap_upstream_server as Wrapper),
            ("include", wrap_include),
        ]);

        Ok(Self {
            tokens,
            pos: 0,
            eof_span: end_of_input_span(source),
            statement_parsers: HashMap::new(),
            block_wrappers,
            directive_wrappers,
        })
    }

    /// Register a statement parser that takes over whenever a statement
    /// starts with the given directive name.
    pub fn register_statement_parser(&mut self, name: impl Into<String>, parser: StatementParser) {
        self.statement_parsers.insert(name.into(), parser);
    }

    /// Parse the whole document into a [`Config`].
    pub fn parse(&mut self) -> ParseResult<Config> {
        let block = self.parse_block()?;
        // the top level has no opening brace, so a block end here is stray
        if let Some(token) = self.current() {
            return Err(ParseError::UnexpectedToken {
                kind: token.value.kind(),
                literal: token.value.literal(),
                span: token.span,
            });
        }
        tracing::debug!(entries = block.len(), "parsed configuration");
        Ok(Config::new(block))
    }

    /// Parse entries until end of input or a block end; the block end
    /// is left for the caller to consume.
    fn parse_block(&mut self) -> ParseResult<Block> {
        let mut block = Block::new();

        loop {
            match self.current() {
                None | Some(Spanned { value: Token::BlockEnd, .. }) => break,
                Some(Spanned { value: Token::Word(_), .. }) => {
                    let entry = self.parse_statement()?;
                    block.push(entry);
                    // step past the statement terminator (`;` or `}`)
                    self.advance();
                }
                Some(Spanned { value: Token::Comment(text), .. }) => {
                    block.push(Entry::Comment(Comment::new(text.clone())));
                    self.advance();
                }
                Some(token) => {
                    return Err(ParseError::UnexpectedToken {
                        kind: token.value.kind(),
                        literal: token.value.literal(),
                        span: token.span,
                    });
                }
            }
        }

        Ok(block)
    }

    /// Parse one statement. On success the cursor is left on the
    /// statement terminator.
    fn parse_statement(&mut self) -> ParseResult<Entry> {
        let (name, name_span) = match self.current() {
            Some(Spanned { value: Token::Word(word), span }) => (word.clone(), *span),
            Some(token) => {
                return Err(ParseError::UnexpectedToken {
                    kind: token.value.kind(),
                    literal: token.value.literal(),
                    span: token.span,
                });
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "a directive name".to_string(),
                    span: self.eof_span,
                });
            }
        };

        if let Some(statement_parser) = self.statement_parsers.get(name.as_str()).copied() {
            return statement_parser(self);
        }

        let mut directive = Directive::new(name);
        self.advance();

        // accumulate parameters until a terminator
        loop {
            match self.current().map(|t| &t.value) {
                Some(Token::Word(word)) => {
                    directive.parameters.push(Parameter::bare(word.clone()));
                }
                Some(Token::Variable(name)) => {
                    directive.parameters.push(Parameter::bare(name.clone()));
                }
                Some(Token::Quoted(quoted)) => {
                    directive
                        .parameters
                        .push(Parameter::quoted(quoted.value.clone(), quoted.quote));
                }
                // an inline comment cannot become a parameter
                Some(Token::Comment(_)) => {}
                _ => break,
            }
            self.advance();
        }

        match self.current() {
            Some(Spanned { value: Token::Semicolon, .. }) => {
                match self.directive_wrappers.get(directive.name.as_str()).copied() {
                    Some(wrap) => wrap(directive, name_span),
                    None => Ok(Entry::Directive(directive)),
                }
            }
            Some(Spanned { value: Token::BlockStart, .. }) => {
                self.advance();
                let block = self.parse_block()?;
                if !matches!(self.current(), Some(Spanned { value: Token::BlockEnd, .. })) {
                    return Err(ParseError::UnexpectedEof {
                        expected: "`}`".to_string(),
                        span: self.eof_span,
                    });
                }
                directive.block = Some(block);
                match self.block_wrappers.get(directive.name.as_str()).copied() {
                    Some(wrap) => wrap(directive, name_span),
                    None => Ok(Entry::Directive(directive)),
                }
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                kind: token.value.kind(),
                literal: token.value.literal(),
                span: token.span,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "`;` or `{`".to_string(),
                span: self.eof_span,
            }),
        }
    }

    // ========================================
    // Cursor
    // ========================================

    fn current(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    /// One token of lookahead past the current one.
    #[allow(dead_code)]
    fn following(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }
}

/// Span pointing just past the last character of the source.
fn end_of_input_span(source: &str) -> Span {
    let line = source.bytes().filter(|&b| b == b'\n').count() + 1;
    let last_line_start = source.rfind('\n').map(|i| i + 1).unwrap_or(0);
    // Columns count characters, not bytes
    let column = source[last_line_start..].chars().count() + 1;
    Span::new(source.len(), source.len(), line, column)
}

// ============================================================
// Name-keyed wrappers
// ============================================================

fn wrap_http(directive: Directive, _span: Span) -> ParseResult<Entry> {
    Ok(Entry::Http(Http::new(directive)))
}

fn wrap_server(directive: Directive, _span: Span) -> ParseResult<Entry> {
    Ok(Entry::Server(Server::new(directive)))
}

fn wrap_upstream(directive: Directive, _span: Span) -> ParseResult<Entry> {
    Ok(Entry::Upstream(Upstream::new(directive)))
}

fn wrap_location(directive: Directive, span: Span) -> ParseResult<Entry> {
    let got = directive.parameters.len();
    if got == 0 || got > 2 {
        return Err(ParseError::LocationParameters { got, span });
    }
    Ok(Entry::Location(Location::new(directive)))
}

/// A simple `server` directive denotes an upstream pool member.
fn wrap_upstream_server(directive: Directive, _span: Span) -> ParseResult<Entry> {
    Ok(Entry::UpstreamServer(UpstreamServer::from_directive(&directive)))
}

fn wrap_include(directive: Directive, span: Span) -> ParseResult<Entry> {
    let got = directive.parameters.len();
    if got != 1 {
        return Err(ParseError::IncludeParameters { got, span });
    }
    if directive.block.is_some() {
        return Err(ParseError::IncludeBlock { span });
    }
    Ok(Entry::Include(Include::new(directive)))
}

fn reject_include_block(_directive: Directive, span: Span) -> ParseResult<Entry> {
    Err(ParseError::IncludeBlock { span })
}

/// Parse a configuration source string into a [`Config`].
pub fn parse(source: &str) -> ParseResult<Config> {
    let mut parser = Parser::new(source)?;
    parser.parse()
}
