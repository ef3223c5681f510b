//! upconf — parser, document model, and renderer for nginx-style
//! configuration files.
//!
//! Parses directive/block configuration text into a mutable document
//! tree, supports querying and editing it (finding upstream pools,
//! appending backend servers), and serializes the tree back to valid
//! syntax under a configurable formatting style.
//!
//! # Example
//!
//! ```
//! use upconf::{parse, dump_config, Style, UpstreamServer};
//!
//! let mut config = parse(
//!     "http{ upstream my_backend{ server 127.0.0.1:443; server 127.0.0.2:443 backup; } }",
//! )
//! .unwrap();
//!
//! let upstreams = config.find_upstreams_mut();
//! upstreams.into_iter().next().unwrap().add_server(
//!     UpstreamServer::new("127.0.0.1:443")
//!         .parameter("weight", "5")
//!         .flag("down"),
//! );
//!
//! let rendered = dump_config(&config, &Style::indented());
//! assert!(rendered.contains("server 127.0.0.1:443 weight=5 down;"));
//! ```

pub mod dump;
pub mod parser;

pub use dump::{dump_block, dump_config, Style};
pub use parser::{
    parse, tokenize, Block, Comment, Config, Directive, Entry, Http, Include, LexError, Location,
    Parameter, ParseError, Parser, Quote, Server, Span, Spanned, StatementParser, Token, Upstream,
    UpstreamServer,
};

use std::path::Path;

/// Unified error type for the whole pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(ParseError),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Lex(lex) => Error::Lex(lex),
            other => Error::Parse(other),
        }
    }
}

/// Parse an in-memory configuration string.
pub fn parse_str(source: &str) -> Result<Config, Error> {
    Ok(parse(source)?)
}

/// Read and parse a configuration file, recording the source path in
/// the resulting [`Config`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config, Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let mut config = parse(&source)?;
    config.path = Some(path.to_path_buf());
    tracing::debug!(path = %path.display(), "parsed configuration file");
    Ok(config)
}
