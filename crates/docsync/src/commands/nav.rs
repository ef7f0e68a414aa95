//! `docsync nav` command implementation.

use std::path::PathBuf;

use clap::Args;
use docsync_config::{CliSettings, Config, ConfluenceConfig};
use docsync_confluence::sync::HierarchyResolver;
use docsync_nav::{NavTree, load_mkdocs_nav};

use crate::error::CliError;
use crate::output::Output;

/// Root title shown when no Confluence section is configured.
const UNCONFIGURED_ROOT: &str = "<root>";

/// Arguments for the nav command.
#[derive(Args)]
pub(crate) struct NavArgs {
    /// Path to configuration file (default: auto-discover docsync.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(long)]
    docs_dir: Option<PathBuf>,
}

impl NavArgs {
    /// Execute the nav command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or navigation cannot be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        crate::init_tracing(false, false);
        let output = Output::new();

        let cli_settings = CliSettings {
            docs_dir: self.docs_dir,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let docs = &config.docs_resolved;
        let tree = load_mkdocs_nav(&docs.mkdocs_file, &docs.docs_dir)?;
        let root_title = config
            .confluence
            .as_ref()
            .map_or(UNCONFIGURED_ROOT, ConfluenceConfig::root_title);

        output.highlight(root_title);
        for line in describe(&tree, root_title) {
            output.info(&line);
        }
        Ok(())
    }
}

/// One line per node: indented title, and for pages the source path and the
/// parent they are published under.
fn describe(tree: &NavTree, root_title: &str) -> Vec<String> {
    let resolver = HierarchyResolver::new(tree, root_title);
    tree.nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let indent = "  ".repeat(node.depth + 1);
            let title = node.display_title();
            match (&node.path, node.is_page()) {
                (Some(path), true) => {
                    let plan = resolver.resolve(index);
                    format!(
                        "{indent}{title} ({}) -> {}",
                        path.display(),
                        plan.immediate_parent_title
                    )
                }
                _ => format!("{indent}{title}/"),
            }
        })
        .collect()
}
