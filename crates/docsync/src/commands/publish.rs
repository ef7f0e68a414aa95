//! `docsync publish` command implementation.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use docsync_config::{CliSettings, Config, RunGate};
use docsync_confluence::{ConfluenceClient, Publisher, RetryPolicy, RunContext, RunReport};
use docsync_nav::load_mkdocs_nav;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to configuration file (default: auto-discover docsync.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Perform all lookups but write nothing to Confluence.
    #[arg(long)]
    dry_run: bool,

    /// Log every remote operation instead of showing a progress bar.
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Exit with an error when any page or attachment failed or was skipped.
    #[arg(long)]
    strict: bool,

    /// Markdown source directory (overrides config).
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Built site directory to take attachments from (overrides config).
    #[arg(long)]
    site_dir: Option<PathBuf>,

    /// Confluence account name (overrides config).
    #[arg(long, env = "CONFLUENCE_USERNAME")]
    username: Option<String>,

    /// Confluence API token (overrides config).
    #[arg(long, env = "CONFLUENCE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Confluence password, used when no API token is set.
    #[arg(long, env = "CONFLUENCE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or navigation cannot be loaded.
    /// With `--strict`, also returns an error if any page or attachment
    /// failed or was skipped.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            dry_run: self.dry_run.then_some(true),
            verbose: self.verbose.then_some(true),
            debug: self.debug.then_some(true),
            docs_dir: self.docs_dir,
            site_dir: self.site_dir,
            username: self.username,
            api_token: self.api_token,
            password: self.password,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let Some(conf) = config.confluence.as_ref() else {
            output.error("Error: confluence configuration required in docsync.toml");
            output.info("\nAdd the following to your docsync.toml:");
            output.info("\n[confluence]");
            output.info(r#"host_url = "https://example.atlassian.net/wiki""#);
            output.info(r#"space = "DOCS""#);
            output.info(r#"username = "${CONFLUENCE_USERNAME}""#);
            output.info(r#"api_token = "${CONFLUENCE_API_TOKEN}""#);
            return Err(CliError::Publish(
                "confluence configuration required".to_owned(),
            ));
        };

        crate::init_tracing(conf.verbose, conf.debug);

        match conf.run_gate() {
            RunGate::Disabled(name) if name.is_empty() => {
                output.warning("Publishing disabled: confluence.enabled_if_env is empty.");
                return Ok(());
            }
            RunGate::Disabled(name) => {
                output.warning(&format!("Publishing disabled: set {name}=1 to enable it."));
                return Ok(());
            }
            RunGate::EnabledByEnv(name) => {
                info!(variable = %name, "Publishing enabled by environment");
            }
            RunGate::EnabledByDefault => {}
        }

        let conf = config.require_confluence()?;
        let docs = &config.docs_resolved;
        let tree = load_mkdocs_nav(&docs.mkdocs_file, &docs.docs_dir)?;

        if conf.dryrun {
            output.highlight("[DRY RUN] No changes will be made to Confluence.");
        }
        output.info(&format!(
            "Publishing {} page(s) to space {} under '{}'",
            tree.page_count(),
            conf.space,
            conf.root_title()
        ));

        let secret = conf.secret().unwrap_or_default();
        let client = ConfluenceClient::new(&conf.host_url, &conf.username, secret);
        let publisher = Publisher::new(&client, &conf.space, conf.dryrun, RetryPolicy::default());

        let pages: Vec<(usize, String, PathBuf)> = tree
            .pages()
            .filter_map(|(index, node)| {
                let path = node.path.clone()?;
                Some((index, node.display_title().into_owned(), path))
            })
            .collect();
        let mut ctx = RunContext::new(tree, conf.root_title());
        let show_progress = shows_progress(conf.verbose, conf.debug);

        for (index, title, path) in &pages {
            let source = docs.docs_dir.join(path);
            let progress = match fs::read_to_string(&source) {
                Ok(markdown) => {
                    publisher.on_page_markdown(&mut ctx, *index, &markdown);
                    ctx.progress()
                }
                Err(err) => {
                    warn!(path = %source.display(), error = %err, "Failed to read page source");
                    ctx.record_unreadable_page()
                }
            };
            if show_progress {
                output.progress(progress.current, progress.total, title);
            }
        }

        for (_, title, _) in &pages {
            publisher.on_post_page(&mut ctx, title, &docs.site_dir);
        }

        let report = ctx.into_report();
        print_report(&output, &report);
        check_report(&report, self.strict)
    }
}

/// Progress bar is drawn only when verbose and debug logging are off.
fn shows_progress(verbose: bool, debug: bool) -> bool {
    !(verbose || debug)
}

/// Sync problems are reported but only fail the command in strict mode.
fn check_report(report: &RunReport, strict: bool) -> Result<(), CliError> {
    if strict && !report.is_clean() {
        return Err(CliError::Publish(
            "some pages or attachments were not published".to_owned(),
        ));
    }
    Ok(())
}

fn print_report(output: &Output, report: &RunReport) {
    output.separator();
    output.info(&format!(
        "Pages: {} created, {} updated, {} unchanged",
        report.pages_created, report.pages_updated, report.pages_unchanged
    ));
    output.info(&format!(
        "Attachments: {} created, {} updated, {} unchanged, {} skipped",
        report.attachments_created,
        report.attachments_updated,
        report.attachments_unchanged,
        report.attachments_skipped
    ));

    if report.pages_created_at_root > 0 {
        output.warning(&format!(
            "{} page(s) created at the space root, their parent was not visible in time",
            report.pages_created_at_root
        ));
    }
    if report.pages_mismatched > 0 {
        output.warning(&format!(
            "{} page(s) skipped: remote parent differs from nav",
            report.pages_mismatched
        ));
    }
    if report.pages_failed > 0 {
        output.warning(&format!("{} page(s) failed", report.pages_failed));
    }
    if report.attachments_failed > 0 {
        output.warning(&format!(
            "{} attachment(s) failed",
            report.attachments_failed
        ));
    }
    if report.is_clean() {
        output.success("Done.");
    }
}
