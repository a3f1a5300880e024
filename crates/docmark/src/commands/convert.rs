//! `docmark convert` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{ConfigArgs, build_pipeline};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Documentation source to convert.
    input: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// conversion hits a fatal error. Nothing is written in that case.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.config.load()?;
        let pipeline = build_pipeline(&config, &self.input)?;

        let source = tokio::fs::read_to_string(&self.input).await?;
        let document = pipeline.render_document(&source).await?;
        tracing::info!(
            input = %self.input.display(),
            warnings = document.warnings.len(),
            "Converted document"
        );

        for warning in &document.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &document.html).await?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.document(&document.html)?,
        }
        Ok(())
    }
}
