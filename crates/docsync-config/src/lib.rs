//! Configuration management for docsync.
//!
//! Parses `docsync.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields: every string in the `[confluence]` section.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Force dry-run mode on or off.
    pub dry_run: Option<bool>,
    /// Override verbose logging flag.
    pub verbose: Option<bool>,
    /// Override debug logging flag.
    pub debug: Option<bool>,
    /// Override markdown source directory.
    pub docs_dir: Option<PathBuf>,
    /// Override built site directory.
    pub site_dir: Option<PathBuf>,
    /// Override Confluence username.
    pub username: Option<String>,
    /// Override Confluence API token.
    pub api_token: Option<String>,
    /// Override Confluence password.
    pub password: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docsync.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence configuration.
    pub confluence: Option<ConfluenceConfig>,
    /// Documentation paths (relative strings from TOML).
    docs: DocsConfigRaw,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    mkdocs_file: Option<String>,
    docs_dir: Option<String>,
    site_dir: Option<String>,
}

/// Resolved documentation paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    /// Navigation source (`mkdocs.yml`).
    pub mkdocs_file: PathBuf,
    /// Markdown sources.
    pub docs_dir: PathBuf,
    /// Built HTML output, searched for attachment files.
    pub site_dir: PathBuf,
}

/// Confluence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence base URL (e.g. `https://example.atlassian.net/wiki`).
    pub host_url: String,
    /// Space key all pages live in.
    pub space: String,
    /// Title of the page the synchronized tree hangs from.
    #[serde(default)]
    pub parent_page_name: Option<String>,
    /// Account name for basic auth.
    #[serde(default)]
    pub username: String,
    /// API token. Takes precedence over `password` when non-empty.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Account password.
    #[serde(default)]
    pub password: Option<String>,
    /// Name of an environment variable that must equal `1` to run.
    #[serde(default)]
    pub enabled_if_env: Option<String>,
    /// Suppress every mutating remote call.
    #[serde(default)]
    pub dryrun: bool,
    /// Log at info level.
    #[serde(default)]
    pub verbose: bool,
    /// Log at debug level.
    #[serde(default)]
    pub debug: bool,
}

/// Outcome of evaluating the `enabled_if_env` gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunGate {
    /// No gate configured.
    EnabledByDefault,
    /// Gate variable is set to `1`.
    EnabledByEnv(String),
    /// Gate variable is unset, not `1`, or the gate name is empty.
    Disabled(String),
}

impl RunGate {
    /// Whether the run should proceed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled(_))
    }
}

impl ConfluenceConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.host_url, "confluence.host_url")?;
        require_http_url(&self.host_url, "confluence.host_url")?;
        require_non_empty(&self.space, "confluence.space")?;
        require_non_empty(&self.username, "confluence.username")?;
        if self.secret().is_none() {
            return Err(ConfigError::Validation(
                "confluence.api_token or confluence.password must be set".to_owned(),
            ));
        }
        Ok(())
    }

    /// Secret used for basic auth: the API token if set, else the password.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        non_empty(self.api_token.as_deref()).or_else(|| non_empty(self.password.as_deref()))
    }

    /// Title every synchronized page is ultimately anchored under.
    ///
    /// The explicit `parent_page_name` when configured, else the space key.
    #[must_use]
    pub fn root_title(&self) -> &str {
        non_empty(self.parent_page_name.as_deref()).unwrap_or(&self.space)
    }

    /// Evaluate the `enabled_if_env` gate against the process environment.
    #[must_use]
    pub fn run_gate(&self) -> RunGate {
        self.run_gate_with(|name| std::env::var(name).ok())
    }

    /// Evaluate the `enabled_if_env` gate with a custom variable lookup.
    pub fn run_gate_with(&self, lookup: impl Fn(&str) -> Option<String>) -> RunGate {
        match self.enabled_if_env.as_deref() {
            None => RunGate::EnabledByDefault,
            Some("") => RunGate::Disabled(String::new()),
            Some(name) if lookup(name).as_deref() == Some("1") => {
                RunGate::EnabledByEnv(name.to_owned())
            }
            Some(name) => RunGate::Disabled(name.to_owned()),
        }
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.host_url = expand::expand_env(&self.host_url, "confluence.host_url")?;
        self.space = expand::expand_env(&self.space, "confluence.space")?;
        self.username = expand::expand_env(&self.username, "confluence.username")?;
        expand::expand_opt(&mut self.parent_page_name, "confluence.parent_page_name")?;
        expand::expand_opt(&mut self.api_token, "confluence.api_token")?;
        expand::expand_opt(&mut self.password, "confluence.password")?;
        expand::expand_opt(&mut self.enabled_if_env, "confluence.enabled_if_env")?;
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.api_token`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_API_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docsync.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            self.docs_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(site_dir) = &settings.site_dir {
            self.docs_resolved.site_dir.clone_from(site_dir);
        }
        let Some(confluence) = self.confluence.as_mut() else {
            return;
        };
        if let Some(dry_run) = settings.dry_run {
            confluence.dryrun = dry_run;
        }
        if let Some(verbose) = settings.verbose {
            confluence.verbose = verbose;
        }
        if let Some(debug) = settings.debug {
            confluence.debug = debug;
        }
        if let Some(username) = &settings.username {
            confluence.username.clone_from(username);
        }
        if let Some(api_token) = &settings.api_token {
            confluence.api_token = Some(api_token.clone());
        }
        if let Some(password) = &settings.password {
            confluence.password = Some(password.clone());
        }
    }

    /// Get validated Confluence configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            confluence: None,
            docs: DocsConfigRaw::default(),
            docs_resolved: DocsConfig {
                mkdocs_file: base.join("mkdocs.yml"),
                docs_dir: base.join("docs"),
                site_dir: base.join("site"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        if let Some(confluence) = config.confluence.as_mut() {
            confluence.expand_env_vars()?;
        }

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Resolve relative paths against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            mkdocs_file: resolve(self.docs.mkdocs_file.as_deref(), "mkdocs.yml"),
            docs_dir: resolve(self.docs.docs_dir.as_deref(), "docs"),
            site_dir: resolve(self.docs.site_dir.as_deref(), "site"),
        };
    }
}
