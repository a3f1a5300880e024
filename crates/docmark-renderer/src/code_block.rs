//! Code block processor hook.
//!
//! Processors are registered with the renderer and asked, in order, to handle
//! each fenced or indented code block. The first one returning something other
//! than [`ProcessResult::PassThrough`] wins; unhandled blocks fall back to a
//! plain `<pre><code>` rendering.

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with this markup.
    Inline(String),

    /// Not handled; try the next processor.
    PassThrough,
}

/// Handles code blocks during rendering.
pub trait CodeBlockProcessor: Send {
    /// Process a code block.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from the fence info string (empty when absent)
    /// * `source` - Raw content of the code block
    /// * `index` - Zero-based position of the block in the document
    fn process(&mut self, language: &str, source: &str, index: usize) -> ProcessResult;

    /// Warnings collected while processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Language of a fence info string: its first word.
///
/// Anything after the language (`py title="x.py"`) is ignored.
#[must_use]
pub(crate) fn fence_language(info: &str) -> Option<&str> {
    info.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("python"), Some("python"));
        assert_eq!(fence_language("py title=\"example.py\" wrap=yes"), Some("py"));
        assert_eq!(fence_language("   "), None);
    }

    #[test]
    fn test_default_warnings() {
        struct Minimal;

        impl CodeBlockProcessor for Minimal {
            fn process(&mut self, _language: &str, _source: &str, _index: usize) -> ProcessResult {
                ProcessResult::PassThrough
            }
        }

        let mut processor = Minimal;
        assert_eq!(processor.process("", "", 0), ProcessResult::PassThrough);
        assert!(processor.warnings().is_empty());
    }
}
