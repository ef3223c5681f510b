//! upconf - format, validate, and inspect nginx-style configuration files.

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upconf::{dump_config, Config, Error, Span, Style};

/// upconf - directive/block configuration toolkit
#[derive(Parser)]
#[command(name = "upconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-format a configuration file to stdout
    Fmt {
        /// Path to the configuration file
        config: String,

        /// Emit compact output instead of indented
        #[arg(long)]
        compact: bool,

        /// Spaces per indentation level (ignored with --compact)
        #[arg(long, default_value_t = 4)]
        indent: usize,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        config: String,
    },

    /// Dump the parsed document tree as JSON
    Json {
        /// Path to the configuration file
        config: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Fmt { config, compact, indent } => {
            let parsed = load(&config)?;
            let style = if compact {
                Style::compact()
            } else {
                Style { indent, ..Style::indented() }
            };
            print!("{}", dump_config(&parsed, &style));
        }

        Commands::Validate { config } => {
            let _ = load(&config)?;
            println!("{config} is valid");
        }

        Commands::Json { config } => {
            let parsed = load(&config)?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
    }

    Ok(())
}

/// Parse a file, printing a caret diagnostic on parse failure.
fn load(path: &str) -> anyhow::Result<Config> {
    match upconf::parse_file(path) {
        Ok(config) => Ok(config),
        Err(err) => {
            if let Some(span) = error_span(&err) {
                let source = std::fs::read_to_string(path).unwrap_or_default();
                report(path, &source, span, &err.to_string());
                std::process::exit(1);
            }
            Err(err.into())
        }
    }
}

fn error_span(err: &Error) -> Option<Span> {
    match err {
        Error::Lex(e) => Some(e.span()),
        Error::Parse(e) => Some(e.span()),
        Error::Io(_) => None,
    }
}

fn report(path: &str, source: &str, span: Span, message: &str) {
    // widen empty end-of-input spans so the label stays visible
    let start = span.start.min(source.len());
    let end = span.end.clamp(start + 1, source.len().max(start + 1));

    let _ = Report::build(ReportKind::Error, (path, start..end))
        .with_message(message)
        .with_label(
            Label::new((path, start..end))
                .with_message("parsing stopped here")
                .with_color(Color::Red),
        )
        .finish()
        .eprint((path, Source::from(source)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
