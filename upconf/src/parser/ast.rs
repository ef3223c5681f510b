//! Document model for nginx-style configuration files.
//!
//! The universal node is [`Directive`]: a name, ordered parameters, and
//! an optional nested [`Block`]. Recognized directive names are upgraded
//! during parsing to typed wrappers (`Http`, `Server`, `Upstream`,
//! `Location`, `Include`, and `server` entries inside upstream pools as
//! [`UpstreamServer`]). Every typed wrapper owns its generic directive
//! and derives its view from it, so there is a single mutable copy of
//! each fact and the rendered text can never disagree with the typed
//! accessors. `UpstreamServer` is the one fully typed node: it is
//! rendered from its own fields and never materializes a generic form.

use crate::parser::lexer::Quote;
use serde::Serialize;
use std::path::PathBuf;

/// One directive parameter with the quoting it had in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub value: String,
    pub quote: Quote,
}

impl Parameter {
    /// A bare (unquoted) parameter.
    pub fn bare(value: impl Into<String>) -> Self {
        Self { value: value.into(), quote: Quote::Bare }
    }

    pub fn quoted(value: impl Into<String>, quote: Quote) -> Self {
        Self { value: value.into(), quote }
    }
}

/// A generic directive: `name param1 param2;` or `name param1 { ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Directive {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub block: Option<Block>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parameters: Vec::new(), block: None }
    }

    /// Parameter values in order, without quoting information.
    pub fn parameter_values(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.value.as_str())
    }
}

/// An ordered, brace-delimited sequence of entries. Order is source
/// order and is significant.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub entries: Vec<Entry>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the block.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A comment, kept at its position between sibling directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One directive-like entry of a block: either the generic form or one
/// of the typed refinements produced by the parser's dispatch tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entry {
    Directive(Directive),
    Http(Http),
    Server(Server),
    Upstream(Upstream),
    UpstreamServer(UpstreamServer),
    Location(Location),
    Include(Include),
    Comment(Comment),
}

impl Entry {
    /// The directive name this entry renders under.
    pub fn name(&self) -> &str {
        match self {
            Entry::Directive(d) => &d.name,
            Entry::Http(h) => &h.directive.name,
            Entry::Server(s) => &s.directive.name,
            Entry::Upstream(u) => &u.directive.name,
            Entry::UpstreamServer(_) => "server",
            Entry::Location(l) => &l.directive.name,
            Entry::Include(i) => &i.directive.name,
            Entry::Comment(_) => "#",
        }
    }

    /// The nested block, for entries that carry one.
    pub fn block(&self) -> Option<&Block> {
        match self {
            Entry::Directive(d) => d.block.as_ref(),
            Entry::Http(h) => h.directive.block.as_ref(),
            Entry::Server(s) => s.directive.block.as_ref(),
            Entry::Upstream(u) => u.directive.block.as_ref(),
            Entry::Location(l) => l.directive.block.as_ref(),
            Entry::UpstreamServer(_) | Entry::Include(_) | Entry::Comment(_) => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Entry::Directive(d) => d.block.as_mut(),
            Entry::Http(h) => h.directive.block.as_mut(),
            Entry::Server(s) => s.directive.block.as_mut(),
            Entry::Upstream(u) => u.directive.block.as_mut(),
            Entry::Location(l) => l.directive.block.as_mut(),
            Entry::UpstreamServer(_) | Entry::Include(_) | Entry::Comment(_) => None,
        }
    }
}

/// Root of a parsed configuration: the top-level block plus the source
/// path when the document came from a file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub block: Block,
}

impl Config {
    pub fn new(block: Block) -> Self {
        Self { path: None, block }
    }

    /// Every upstream pool in the document, in source order, at any
    /// nesting depth.
    pub fn find_upstreams(&self) -> Vec<&Upstream> {
        let mut found = Vec::new();
        collect_upstreams(&self.block, &mut found);
        found
    }

    /// Mutable variant of [`Config::find_upstreams`], for edits such as
    /// [`Upstream::add_server`].
    pub fn find_upstreams_mut(&mut self) -> Vec<&mut Upstream> {
        let mut found = Vec::new();
        collect_upstreams_mut(&mut self.block, &mut found);
        found
    }
}

fn collect_upstreams<'a>(block: &'a Block, found: &mut Vec<&'a Upstream>) {
    for entry in &block.entries {
        if let Entry::Upstream(upstream) = entry {
            found.push(upstream);
        } else if let Some(nested) = entry.block() {
            collect_upstreams(nested, found);
        }
    }
}

fn collect_upstreams_mut<'a>(block: &'a mut Block, found: &mut Vec<&'a mut Upstream>) {
    for entry in &mut block.entries {
        if let Entry::Upstream(upstream) = entry {
            found.push(upstream);
        } else if let Some(nested) = entry.block_mut() {
            collect_upstreams_mut(nested, found);
        }
    }
}

// ============================================================
// Typed wrappers
// ============================================================

/// The `http { ... }` context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Http {
    pub directive: Directive,
}

impl Http {
    pub fn new(directive: Directive) -> Self {
        Self { directive }
    }

    pub fn block(&self) -> Option<&Block> {
        self.directive.block.as_ref()
    }
}

/// A `server { ... }` virtual-host context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    pub directive: Directive,
}

impl Server {
    pub fn new(directive: Directive) -> Self {
        Self { directive }
    }

    pub fn block(&self) -> Option<&Block> {
        self.directive.block.as_ref()
    }
}

/// A named pool of backend servers: `upstream name { server ...; }`.
///
/// The server list is a live projection over the owned block, so
/// [`Upstream::add_server`] is the only write path and the renderer
/// always agrees with [`Upstream::servers`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upstream {
    pub directive: Directive,
}

impl Upstream {
    pub fn new(directive: Directive) -> Self {
        Self { directive }
    }

    /// Pool name: the first parameter, or empty for a malformed pool.
    pub fn name(&self) -> &str {
        self.directive.parameters.first().map(|p| p.value.as_str()).unwrap_or("")
    }

    pub fn block(&self) -> Option<&Block> {
        self.directive.block.as_ref()
    }

    /// Backend entries of this pool, in source order.
    pub fn servers(&self) -> impl Iterator<Item = &UpstreamServer> {
        self.directive
            .block
            .iter()
            .flat_map(|b| &b.entries)
            .filter_map(|entry| match entry {
                Entry::UpstreamServer(server) => Some(server),
                _ => None,
            })
    }

    /// Append a backend server to the pool. The entry lands in the
    /// owned block, so subsequent rendering emits it as well.
    pub fn add_server(&mut self, server: UpstreamServer) {
        self.directive
            .block
            .get_or_insert_with(Block::new)
            .push(Entry::UpstreamServer(server));
    }
}

/// One backend entry of an upstream pool:
/// `server <address> <key=value>... <flag>...;`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UpstreamServer {
    pub address: String,
    /// `key=value` parameters, insertion order preserved for output.
    pub parameters: Vec<(String, String)>,
    /// Bare flags such as `backup` or `down`, in order.
    pub flags: Vec<String>,
}

impl UpstreamServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Default::default() }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Split a generic `server` directive into address, `key=value`
    /// parameters, and bare flags. The first bare parameter is the
    /// address; later bare parameters are flags.
    pub fn from_directive(directive: &Directive) -> Self {
        let mut server = UpstreamServer::default();
        for parameter in directive.parameter_values() {
            match parameter.split_once('=') {
                Some((key, value)) => {
                    server.parameters.push((key.to_string(), value.to_string()));
                }
                None if server.address.is_empty() => {
                    server.address = parameter.to_string();
                }
                None => server.flags.push(parameter.to_string()),
            }
        }
        server
    }
}

/// A `location [modifier] pattern { ... }` directive.
///
/// Modifier and pattern are projections of the generic parameters; the
/// parser guarantees one or two parameters at construction time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub directive: Directive,
}

impl Location {
    pub fn new(directive: Directive) -> Self {
        Self { directive }
    }

    /// Match-semantics modifier such as `~` or `=`; empty when absent.
    pub fn modifier(&self) -> &str {
        if self.directive.parameters.len() == 2 {
            &self.directive.parameters[0].value
        } else {
            ""
        }
    }

    /// The request-path match pattern.
    pub fn pattern(&self) -> &str {
        self.directive.parameters.last().map(|p| p.value.as_str()).unwrap_or("")
    }

    pub fn block(&self) -> Option<&Block> {
        self.directive.block.as_ref()
    }
}

/// An `include <path>;` directive. Structural only: the referenced file
/// is never opened here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Include {
    pub directive: Directive,
}

impl Include {
    pub fn new(directive: Directive) -> Self {
        Self { directive }
    }

    /// The included path; the parser guarantees exactly one parameter.
    pub fn path(&self) -> &str {
        self.directive.parameters.first().map(|p| p.value.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(name: &str, servers: &[&str]) -> Upstream {
        let mut directive = Directive::new("upstream");
        directive.parameters.push(Parameter::bare(name));
        let mut block = Block::new();
        for address in servers {
            block.push(Entry::UpstreamServer(UpstreamServer::new(*address)));
        }
        directive.block = Some(block);
        Upstream::new(directive)
    }

    #[test]
    fn test_upstream_name_and_servers() {
        let pool = upstream("backend", &["127.0.0.1:8080", "127.0.0.2:8080"]);
        assert_eq!(pool.name(), "backend");
        let addrs: Vec<_> = pool.servers().map(|s| s.address.as_str()).collect();
        assert_eq!(addrs, vec!["127.0.0.1:8080", "127.0.0.2:8080"]);
    }

    #[test]
    fn test_add_server_appends_to_block() {
        let mut pool = upstream("backend", &["127.0.0.1:443"]);
        pool.add_server(
            UpstreamServer::new("127.0.0.2:443")
                .parameter("weight", "5")
                .flag("down"),
        );
        assert_eq!(pool.servers().count(), 2);
        // the entry is in the owned block, not a shadow list
        assert_eq!(pool.block().unwrap().len(), 2);
        let added = pool.servers().last().unwrap();
        assert_eq!(added.parameters, vec![("weight".to_string(), "5".to_string())]);
        assert_eq!(added.flags, vec!["down".to_string()]);
    }

    #[test]
    fn test_add_server_creates_missing_block() {
        let mut directive = Directive::new("upstream");
        directive.parameters.push(Parameter::bare("empty"));
        let mut pool = Upstream::new(directive);
        pool.add_server(UpstreamServer::new("10.0.0.1:80"));
        assert_eq!(pool.servers().count(), 1);
    }

    #[test]
    fn test_upstream_server_from_directive_partition() {
        let mut directive = Directive::new("server");
        for p in ["127.0.0.3:8000", "weight=5", "backup", "max_fails=3"] {
            directive.parameters.push(Parameter::bare(p));
        }
        let server = UpstreamServer::from_directive(&directive);
        assert_eq!(server.address, "127.0.0.3:8000");
        assert_eq!(
            server.parameters,
            vec![
                ("weight".to_string(), "5".to_string()),
                ("max_fails".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(server.flags, vec!["backup".to_string()]);
    }

    #[test]
    fn test_location_projections() {
        let mut directive = Directive::new("location");
        directive.parameters.push(Parameter::bare("~"));
        directive.parameters.push(Parameter::bare("/(.*)php/"));
        let location = Location::new(directive);
        assert_eq!(location.modifier(), "~");
        assert_eq!(location.pattern(), "/(.*)php/");

        let mut directive = Directive::new("location");
        directive.parameters.push(Parameter::bare("/admin"));
        let location = Location::new(directive);
        assert_eq!(location.modifier(), "");
        assert_eq!(location.pattern(), "/admin");
    }

    #[test]
    fn test_find_upstreams_source_order_and_depth() {
        let mut http_block = Block::new();
        http_block.push(Entry::Upstream(upstream("first", &[])));
        let mut server_block = Block::new();
        server_block.push(Entry::Upstream(upstream("nested", &[])));
        let mut server_dir = Directive::new("server");
        server_dir.block = Some(server_block);
        http_block.push(Entry::Server(Server::new(server_dir)));
        http_block.push(Entry::Upstream(upstream("last", &[])));

        let mut http_dir = Directive::new("http");
        http_dir.block = Some(http_block);
        let mut root = Block::new();
        root.push(Entry::Http(Http::new(http_dir)));
        let config = Config::new(root);

        let names: Vec<_> = config.find_upstreams().iter().map(|u| u.name()).collect();
        assert_eq!(names, vec!["first", "nested", "last"]);
    }
}
