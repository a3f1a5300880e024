//! Math rendering seam.

use crate::state::escape_html;

/// Error reported by a [`MathRenderer`]. Always fatal for the document.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MathError {
    pub message: String,
}

impl MathError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Renders TeX into HTML.
pub trait MathRenderer: Send + Sync {
    /// Render `tex`; `display` is set for block math (`$$...$$`).
    fn render(&self, tex: &str, display: bool) -> Result<String, MathError>;
}

/// Leaves the TeX source in place for client-side typesetting.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainMath;

impl MathRenderer for PlainMath {
    fn render(&self, tex: &str, display: bool) -> Result<String, MathError> {
        let escaped = escape_html(tex).replace('{', "&lcub;");
        Ok(if display {
            format!(r#"<span class="math math-display">\[{escaped}\]</span>"#)
        } else {
            format!(r#"<span class="math math-inline">\({escaped}\)</span>"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_plain_math_inline() {
        let html = PlainMath.render("x^{2} < y", false).unwrap();
        assert_eq!(html, r#"<span class="math math-inline">\(x^&lcub;2} &lt; y\)</span>"#);
    }

    #[test]
    fn test_plain_math_display() {
        let html = PlainMath.render("a", true).unwrap();
        assert_eq!(html, r#"<span class="math math-display">\[a\]</span>"#);
    }
}
