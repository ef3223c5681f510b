//! Lexer for nginx-style configuration syntax.
//!
//! Tokenizes the directive/block dialect:
//! - whitespace (including newlines) separates tokens and is never emitted
//! - `;` terminates simple directives, `{` / `}` delimit blocks
//! - `#` starts a comment running to end of line; comments are emitted
//!   so the renderer can reproduce them in position
//! - `$name` is a variable reference
//! - `"..."`, `'...'` and backtick strings carry escape sequences and
//!   remember their delimiter for faithful re-quoting

use logos::Logos;
use serde::Serialize;
use std::fmt;

/// Source location of a token: byte range plus 1-based line/column of
/// its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Which delimiter a parameter was quoted with in the source, if any.
/// Preserved through the document model so output re-quotes the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Quote {
    #[default]
    Bare,
    Double,
    Single,
    Backtick,
}

impl Quote {
    /// The delimiter character, for quoted styles.
    pub fn delimiter(self) -> Option<char> {
        match self {
            Quote::Bare => None,
            Quote::Double => Some('"'),
            Quote::Single => Some('\''),
            Quote::Backtick => Some('`'),
        }
    }
}

/// Decoded quoted-string payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedValue {
    pub value: String,
    pub quote: Quote,
}

/// Token types for the configuration syntax
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    /// Comment text after `#`, without the marker
    #[regex(r"#[^\n]*", |lex| lex.slice()[1..].trim().to_string())]
    Comment(String),

    #[token(";")]
    Semicolon,

    #[token("{")]
    BlockStart,

    #[token("}")]
    BlockEnd,

    /// Variable reference, `$` included in the literal
    #[regex(r"\$[^ \t\r\n\f{};#]*", |lex| lex.slice().to_string())]
    Variable(String),

    /// Quoted string, decoded, with its original delimiter
    #[regex(r#""([^"\\]|\\.)*""#, |lex| decode_quoted(lex.slice(), Quote::Double))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| decode_quoted(lex.slice(), Quote::Single))]
    #[regex(r"`([^`\\]|\\.)*`", |lex| decode_quoted(lex.slice(), Quote::Backtick))]
    Quoted(QuotedValue),

    /// Bare word: directive names, parameters, addresses, paths.
    /// `$`, `#` and quote characters are only special at token start;
    /// mid-word they are ordinary characters, so `/tmp#frag` and `it's`
    /// are single words. Only whitespace, `;` and braces terminate.
    #[regex(r#"[^ \t\r\n\f{};#"'`$][^ \t\r\n\f{};]*"#, |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Comment(_) => "comment",
            Token::Semicolon => "semicolon",
            Token::BlockStart => "block start",
            Token::BlockEnd => "block end",
            Token::Variable(_) => "variable",
            Token::Quoted(_) => "quoted string",
            Token::Word(_) => "keyword",
        }
    }

    /// The literal text a token stands for, as shown in diagnostics.
    pub fn literal(&self) -> String {
        match self {
            Token::Comment(text) => format!("# {text}"),
            Token::Semicolon => ";".to_string(),
            Token::BlockStart => "{".to_string(),
            Token::BlockEnd => "}".to_string(),
            Token::Variable(name) => name.clone(),
            Token::Quoted(q) => q.value.clone(),
            Token::Word(word) => word.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal())
    }
}

/// Strip delimiters and decode escape sequences.
///
/// Recognized escapes: `\n`, `\r`, `\t`, `\\`, and `\<delimiter>`.
/// Any other backslash is kept literally.
fn decode_quoted(slice: &str, quote: Quote) -> QuotedValue {
    let inner = &slice[1..slice.len() - 1];
    let delimiter = quote.delimiter().unwrap_or('"');
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some('\\') => value.push('\\'),
            Some(d) if d == delimiter => value.push(d),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }

    QuotedValue { value, quote }
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("unexpected character `{found}` at {span}")]
    UnexpectedChar { found: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span } => *span,
            LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}

/// Tracks 1-based line/column while walking byte offsets in order.
struct LineCursor<'s> {
    source: &'s str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'s> LineCursor<'s> {
    fn new(source: &'s str) -> Self {
        Self { source, offset: 0, line: 1, column: 1 }
    }

    /// Line/column of `target`; offsets must be requested in ascending order.
    fn locate(&mut self, target: usize) -> (usize, usize) {
        for c in self.source[self.offset..target].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        (self.line, self.column)
    }
}

/// Tokenize a configuration source string
pub fn tokenize(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut cursor = LineCursor::new(source);
    let mut tokens = Vec::new();

    for (result, range) in lexer.spanned() {
        let (line, column) = cursor.locate(range.start);
        let span = Span::new(range.start, range.end, line, column);
        match result {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(_) => {
                // The word regex is permissive, so the only realistic
                // failures are an unterminated quote or a lone backslash.
                let found = source[range.start..].chars().next().unwrap_or('\0');
                if matches!(found, '"' | '\'' | '`') {
                    return Err(LexError::UnterminatedString { span });
                }
                return Err(LexError::UnexpectedChar { found, span });
            }
        }
    }

    Ok(tokens)
}
