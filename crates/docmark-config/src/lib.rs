//! Configuration management for docmark.
//!
//! Parses `docmark.toml` with serde and discovers it in the current directory
//! or any parent. CLI flags are applied on top through [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `page.package_name`
//! - `page.version`
//! - `page.language`
//! - `components.source_dir`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docmark.toml";

const DEFAULT_VERSION: &str = "main";
const DEFAULT_LANGUAGE: &str = "en";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override `page.package_name`; enables page info when no `[page]` exists.
    pub package_name: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
    /// Override the component directory.
    pub components_dir: Option<PathBuf>,
    pub gfm: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    page: Option<PageConfigRaw>,
    components: ComponentsConfigRaw,
    /// Markdown dialect options.
    pub markdown: MarkdownConfig,

    /// Resolved page configuration (set after loading).
    #[serde(skip)]
    pub page_resolved: Option<PageConfig>,
    /// Resolved component directory (set after loading).
    #[serde(skip)]
    pub components_dir: Option<PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageConfigRaw {
    package_name: String,
    version: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComponentsConfigRaw {
    source_dir: Option<String>,
}

/// Where converted pages are published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageConfig {
    pub package_name: String,
    /// Defaults to `main`.
    pub version: String,
    /// Defaults to `en`.
    pub language: String,
}

/// Markdown configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// GitHub-flavored extensions: tables, strikethrough, task lists, alerts.
    pub gfm: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { gfm: true }
    }
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
        /// Config field path (e.g., "`page.package_name`").
        field: String,
        /// Error message (e.g., "${`DOC_PACKAGE`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `docmark.toml` in the current directory and its parents, falling
    /// back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or if reading,
    /// parsing, expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Search for the config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(package_name) = &settings.package_name {
            match &mut self.page_resolved {
                Some(page) => page.package_name.clone_from(package_name),
                None => {
                    self.page_resolved = Some(PageConfig {
                        package_name: package_name.clone(),
                        version: DEFAULT_VERSION.to_owned(),
                        language: DEFAULT_LANGUAGE.to_owned(),
                    });
                }
            }
        }
        if let Some(page) = &mut self.page_resolved {
            if let Some(version) = &settings.version {
                page.version.clone_from(version);
            }
            if let Some(language) = &settings.language {
                page.language.clone_from(language);
            }
        }
        if let Some(dir) = &settings.components_dir {
            self.components_dir = Some(dir.clone());
        }
        if let Some(gfm) = settings.gfm {
            self.markdown.gfm = gfm;
        }
    }

    /// Validate resolved values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the page package name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(page) = &self.page_resolved
            && page.package_name.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "page.package_name cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(page) = &mut self.page {
            page.package_name = expand::expand_env(&page.package_name, "page.package_name")?
                .into_owned();
            expand::expand_opt(&mut page.version, "page.version")?;
            expand::expand_opt(&mut page.language, "page.language")?;
        }
        expand::expand_opt(&mut self.components.source_dir, "components.source_dir")?;
        Ok(())
    }

    /// Fill in defaults and resolve relative paths against `config_dir`.
    fn resolve(&mut self, config_dir: &Path) {
        self.page_resolved = self.page.as_ref().map(|page| PageConfig {
            package_name: page.package_name.clone(),
            version: page
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            language: page
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        });
        self.components_dir = self
            .components
            .source_dir
            .as_deref()
            .map(|dir| config_dir.join(dir));
    }
}
