//! CLI error types.

use docmark_config::ConfigError;
use docmark_renderer::{DiscoveryError, RenderError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("failed to discover components: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
