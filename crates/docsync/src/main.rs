//! docsync CLI - publish mkdocs documentation to Confluence.
//!
//! Provides commands for:
//! - `publish`: Create and update Confluence pages from the mkdocs navigation
//! - `nav`: Show the navigation tree and the remote parents each page gets

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{NavArgs, PublishArgs};
use output::Output;

/// docsync - mkdocs to Confluence publisher.
#[derive(Parser)]
#[command(name = "docsync", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish pages and attachments to Confluence.
    Publish(PublishArgs),
    /// Print the navigation tree with resolved parent pages.
    Nav(NavArgs),
}

/// Initialize tracing.
///
/// `--debug` enables DEBUG level, `--verbose` INFO, otherwise `RUST_LOG` or
/// WARN.
pub(crate) fn init_tracing(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let result = match cli.command {
        Commands::Publish(args) => args.execute(),
        Commands::Nav(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_publish_flags() {
        let cli = Cli::try_parse_from([
            "docsync",
            "publish",
            "--dry-run",
            "--config",
            "docs/docsync.toml",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Publish(_)));
    }

    #[test]
    fn test_parse_nav() {
        let cli = Cli::try_parse_from(["docsync", "nav", "--docs-dir", "docs"]).unwrap();
        assert!(matches!(cli.command, Commands::Nav(_)));
    }
}
