//! `docmark outline` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{ConfigArgs, build_pipeline};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the outline command.
#[derive(Args)]
pub(crate) struct OutlineArgs {
    /// Documentation source to read.
    input: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

impl OutlineArgs {
    /// Execute the outline command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// conversion hits a fatal error.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.config.load()?;
        let pipeline = build_pipeline(&config, &self.input)?;

        let source = tokio::fs::read_to_string(&self.input).await?;
        let document = pipeline.render_document(&source).await?;

        let json = serde_json::to_string_pretty(&document.metadata)?;
        output.document(&json)?;
        Ok(())
    }
}
