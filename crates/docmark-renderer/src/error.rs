//! Error types for document rendering.

use std::path::PathBuf;

use crate::math::MathError;

/// Fatal error while converting a document.
///
/// Any of these aborts the whole document; no partial output is returned.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A mandatory sub-field is absent from a recognized tag body.
    #[error("<{field}> is missing in <docstring> for {context}")]
    MissingField {
        /// Tag name of the missing field.
        field: &'static str,
        /// Anchor or name identifying the offending docstring.
        context: String,
    },

    /// The math renderer rejected an expression.
    #[error("failed to render math `{tex}`: {source}")]
    Math { tex: String, source: MathError },

    /// A `<literalinclude>` payload is not valid JSON or lacks `path`.
    #[error("invalid <literalinclude> payload `{payload}`: {source}")]
    IncludeSpec {
        payload: String,
        source: serde_json::Error,
    },

    /// An included file could not be read.
    #[error("failed to read included file {}: {source}", path.display())]
    IncludeRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A `start-after` or `end-before` anchor matches no line of the file.
    #[error("anchor `{anchor}` not found in {}", path.display())]
    IncludeAnchor { anchor: String, path: PathBuf },

    /// Component props could not be serialized.
    #[error("failed to serialize component props")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = RenderError::MissingField {
            field: "anchor",
            context: "foo".to_owned(),
        };
        assert_eq!(err.to_string(), "<anchor> is missing in <docstring> for foo");
    }

    #[test]
    fn test_include_anchor_message() {
        let err = RenderError::IncludeAnchor {
            anchor: "# START".to_owned(),
            path: PathBuf::from("docs/run.py"),
        };
        assert_eq!(err.to_string(), "anchor `# START` not found in docs/run.py");
    }

    #[test]
    fn test_math_message() {
        let err = RenderError::Math {
            tex: r"\frac{".to_owned(),
            source: MathError::new("unexpected end of input"),
        };
        assert_eq!(
            err.to_string(),
            r"failed to render math `\frac{`: unexpected end of input"
        );
    }
}
