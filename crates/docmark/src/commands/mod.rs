//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod outline;

pub(crate) use convert::ConvertArgs;
pub(crate) use outline::OutlineArgs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use docmark_config::{CliSettings, Config};
use docmark_renderer::{ArboriumHighlighter, KnownTags, PageInfo, Pipeline};

use crate::error::CliError;

/// Configuration flags shared by every command.
#[derive(Args, Default)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover docmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Package name used for image links (overrides config).
    #[arg(long)]
    package: Option<String>,

    /// Documentation version used for image links (overrides config).
    #[arg(long)]
    version: Option<String>,

    /// Documentation language used for image links (overrides config).
    #[arg(long)]
    language: Option<String>,

    /// Directory scanned for `*.svelte` component names (overrides config).
    #[arg(long)]
    components: Option<PathBuf>,

    /// Disable GitHub-flavored Markdown extensions (overrides config).
    #[arg(long)]
    no_gfm: bool,
}

impl ConfigArgs {
    /// Load the configuration with these flags applied.
    pub(crate) fn load(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            package_name: self.package.clone(),
            version: self.version.clone(),
            language: self.language.clone(),
            components_dir: self.components.clone(),
            gfm: self.no_gfm.then_some(false),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Build the conversion pipeline for a loaded configuration.
///
/// Included files are resolved against the directory of `input`.
pub(crate) fn build_pipeline(config: &Config, input: &Path) -> Result<Pipeline, CliError> {
    let known_tags = match &config.components_dir {
        Some(dir) => KnownTags::discover(dir)?,
        None => KnownTags::standard(),
    };
    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
    let mut pipeline = Pipeline::new()
        .with_highlighter(Arc::new(ArboriumHighlighter))
        .with_known_tags(known_tags)
        .with_gfm(config.markdown.gfm)
        .with_base_dir(base_dir);
    if let Some(page) = &config.page_resolved {
        pipeline = pipeline.with_page(PageInfo {
            package_name: page.package_name.clone(),
            version: page.version.clone(),
            language: page.language.clone(),
        });
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_gfm_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("docmark.toml");
        std::fs::write(&config_path, "[markdown]\ngfm = true\n").unwrap();

        let args = ConfigArgs {
            config: Some(config_path.clone()),
            ..Default::default()
        };
        assert!(args.load().unwrap().markdown.gfm);

        let args = ConfigArgs {
            config: Some(config_path),
            no_gfm: true,
            ..Default::default()
        };
        assert!(!args.load().unwrap().markdown.gfm);
    }

    #[test]
    fn test_no_gfm_flag_parses() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            config: ConfigArgs,
        }

        let harness = Harness::try_parse_from(["docmark", "--no-gfm"]).unwrap();
        assert!(harness.config.no_gfm);
        let harness = Harness::try_parse_from(["docmark"]).unwrap();
        assert!(!harness.config.no_gfm);
    }
}
