//! Renderer: serializes a document tree back to configuration text.
//!
//! Rendering is infallible for trees built by the parser or through the
//! mutation API, and re-parsing the output yields a structurally equal
//! tree (same names, parameter order, nesting, and typed classification),
//! though not necessarily byte-identical text.

use crate::parser::ast::{Block, Config, Directive, Entry, Parameter, UpstreamServer};
use std::fmt::Write;

/// Formatting style for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    /// Spaces added per nesting level.
    pub indent: usize,
    /// Indentation of the outermost level.
    pub start_indent: usize,
    /// Put a space between a directive and its opening brace.
    pub space_before_blocks: bool,
}

impl Style {
    /// Four-space indentation, space before `{`.
    pub fn indented() -> Self {
        Self { indent: 4, start_indent: 0, space_before_blocks: true }
    }

    /// No indentation, braces glued to the directive.
    pub fn compact() -> Self {
        Self { indent: 0, start_indent: 0, space_before_blocks: false }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::indented()
    }
}

/// Render a whole configuration.
pub fn dump_config(config: &Config, style: &Style) -> String {
    dump_block(&config.block, style)
}

/// Render a block and everything below it.
pub fn dump_block(block: &Block, style: &Style) -> String {
    tracing::trace!(entries = block.len(), "rendering block");
    let mut out = String::new();
    write_block(&mut out, block, style, style.start_indent);
    out
}

fn write_block(out: &mut String, block: &Block, style: &Style, indent: usize) {
    for entry in &block.entries {
        write_entry(out, entry, style, indent);
    }
}

fn write_entry(out: &mut String, entry: &Entry, style: &Style, indent: usize) {
    match entry {
        Entry::Directive(d) => write_directive(out, d, style, indent),
        Entry::Http(h) => write_directive(out, &h.directive, style, indent),
        Entry::Server(s) => write_directive(out, &s.directive, style, indent),
        Entry::Upstream(u) => write_directive(out, &u.directive, style, indent),
        Entry::Location(l) => write_directive(out, &l.directive, style, indent),
        Entry::Include(i) => write_directive(out, &i.directive, style, indent),
        Entry::UpstreamServer(s) => write_upstream_server(out, s, indent),
        Entry::Comment(c) => {
            let _ = writeln!(out, "{:indent$}# {}", "", c.text, indent = indent);
        }
    }
}

fn write_directive(out: &mut String, directive: &Directive, style: &Style, indent: usize) {
    let _ = write!(out, "{:indent$}{}", "", directive.name, indent = indent);
    for parameter in &directive.parameters {
        let _ = write!(out, " {}", quote_parameter(parameter));
    }
    match &directive.block {
        Some(block) => {
            if style.space_before_blocks {
                out.push(' ');
            }
            out.push_str("{\n");
            write_block(out, block, style, indent + style.indent);
            let _ = writeln!(out, "{:indent$}}}", "", indent = indent);
        }
        None => out.push_str(";\n"),
    }
}

fn write_upstream_server(out: &mut String, server: &UpstreamServer, indent: usize) {
    let _ = write!(out, "{:indent$}server {}", "", server.address, indent = indent);
    for (key, value) in &server.parameters {
        let _ = write!(out, " {key}={value}");
    }
    for flag in &server.flags {
        let _ = write!(out, " {flag}");
    }
    out.push_str(";\n");
}

/// Re-quote a parameter with its original delimiter, re-encoding escapes.
fn quote_parameter(parameter: &Parameter) -> String {
    match parameter.quote.delimiter() {
        None => parameter.value.clone(),
        Some(delimiter) => {
            let mut quoted = String::with_capacity(parameter.value.len() + 2);
            quoted.push(delimiter);
            for c in parameter.value.chars() {
                match c {
                    '\n' => quoted.push_str("\\n"),
                    '\r' => quoted.push_str("\\r"),
                    '\t' => quoted.push_str("\\t"),
                    '\\' => quoted.push_str("\\\\"),
                    c if c == delimiter => {
                        quoted.push('\\');
                        quoted.push(c);
                    }
                    c => quoted.push(c),
                }
            }
            quoted.push(delimiter);
            quoted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    #[test]
    fn test_dump_indented() {
        let config = parse("http{upstream backend{server 127.0.0.1:443;}}").unwrap();
        let text = dump_config(&config, &Style::indented());
        assert_eq!(
            text,
            "http {\n    upstream backend {\n        server 127.0.0.1:443;\n    }\n}\n"
        );
    }

    #[test]
    fn test_dump_compact() {
        let config = parse("http { upstream backend { server 127.0.0.1:443; } }").unwrap();
        let text = dump_config(&config, &Style::compact());
        assert_eq!(text, "http{\nupstream backend{\nserver 127.0.0.1:443;\n}\n}\n");
    }

    #[test]
    fn test_comments_render_in_position() {
        let source = "# header\nuser www;\nserver {\n    # inside\n    listen 80;\n}\n";
        let config = parse(source).unwrap();
        let text = dump_config(&config, &Style::indented());
        assert_eq!(text, "# header\nuser www;\nserver {\n    # inside\n    listen 80;\n}\n");
    }

    #[test]
    fn test_requoting_preserves_delimiter_and_escapes() {
        let source = "log_format main 'a\\nb' \"c\\\"d\";";
        let config = parse(source).unwrap();
        let text = dump_config(&config, &Style::indented());
        assert_eq!(text, "log_format main 'a\\nb' \"c\\\"d\";\n");
    }

    #[test]
    fn test_quote_parameter_backslash() {
        let parameter = Parameter::quoted("a\\b", crate::parser::lexer::Quote::Double);
        assert_eq!(quote_parameter(&parameter), "\"a\\\\b\"");
    }

    #[test]
    fn test_variables_render_bare() {
        let config = parse("proxy_set_header Host $host;").unwrap();
        let text = dump_config(&config, &Style::indented());
        assert_eq!(text, "proxy_set_header Host $host;\n");
    }

    #[test]
    fn test_added_server_renders() {
        let mut config = parse("upstream pool { server 10.0.0.1:80; }").unwrap();
        config.find_upstreams_mut()[0].add_server(
            UpstreamServer::new("10.0.0.2:80").parameter("weight", "5").flag("down"),
        );
        let text = dump_config(&config, &Style::indented());
        assert!(text.contains("server 10.0.0.2:80 weight=5 down;"), "{text}");
    }

    #[test]
    fn test_roundtrip_structural_equality() {
        let source = "user www www;\nhttp {\n  include mime.types;\n  upstream backend {\n    server 127.0.0.1:8080 weight=5;\n    server 127.0.0.2:8080 backup;\n  }\n  server {\n    listen 80;\n    location ~ /(.*)php/ {\n      fastcgi_pass 127.0.0.1:1025;\n    }\n  }\n}\n";
        let parsed = parse(source).unwrap();
        for style in [Style::indented(), Style::compact()] {
            let reparsed = parse(&dump_config(&parsed, &style)).unwrap();
            assert_eq!(parsed.block, reparsed.block, "round-trip failed for {style:?}");
        }
    }
}
