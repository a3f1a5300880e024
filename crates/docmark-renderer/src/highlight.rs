//! Syntax highlighting seam.

use arborium::html_escape;

use crate::state::escape_html;

/// Turns source code into highlighted HTML.
///
/// Implementations must escape everything they do not wrap in markup; the
/// result is embedded as-is in component props.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` written in `language` (empty when the fence has none).
    fn highlight(&self, code: &str, language: &str) -> String;
}

/// Tree-sitter highlighting through arborium.
///
/// Unknown languages, grammar errors and grammar panics fall back to escaped
/// plain text.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArboriumHighlighter;

impl Highlighter for ArboriumHighlighter {
    fn highlight(&self, code: &str, language: &str) -> String {
        let language = normalize_language(language);
        let highlighted = std::panic::catch_unwind(|| {
            arborium::Highlighter::new().highlight_to_html(&language, code).ok()
        });
        match highlighted {
            Ok(Some(html)) => html,
            Ok(None) => html_escape(code),
            Err(_) => {
                tracing::warn!(language = %language, "Highlighter panicked, emitting plain code");
                html_escape(code)
            }
        }
    }
}

/// Map fence language aliases to arborium grammar names.
fn normalize_language(language: &str) -> String {
    let language = language.to_lowercase();
    match language.as_str() {
        "py" | "python3" | "pycon" => "python".to_owned(),
        "js" => "javascript".to_owned(),
        "ts" => "typescript".to_owned(),
        "rs" => "rust".to_owned(),
        "sh" | "shell" | "zsh" | "console" => "bash".to_owned(),
        "yml" => "yaml".to_owned(),
        "md" => "markdown".to_owned(),
        "c++" | "cc" | "cxx" => "cpp".to_owned(),
        "" | "text" | "plain" | "plaintext" => "text".to_owned(),
        _ => language,
    }
}

/// Highlighter that only escapes the code.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscapeHighlighter;

impl Highlighter for EscapeHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> String {
        escape_html(code)
    }
}
