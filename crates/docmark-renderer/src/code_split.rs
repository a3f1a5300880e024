//! Code blocks as copyable, highlighted components.
//!
//! A block containing a split marker holds two framework variants one after
//! the other; it becomes a two-column `CodeBlockFw`. Any other block becomes a
//! `CodeBlock`. The copy payload is base64 encoded and has REPL output lines
//! filtered out.

use std::borrow::Cow;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::code_block::{CodeBlockProcessor, ProcessResult};
use crate::component::Component;
use crate::highlight::Highlighter;

/// Marker comment, added anywhere in a document, that turns on line wrapping.
pub const WRAP_MARKER: &str = "<!-- WRAP CODE BLOCKS -->";

/// Split literals and the ids of the two groups they separate.
const SPLIT_MARKERS: [(&str, &str, &str); 2] = [
    ("===PT-TF-SPLIT===", "pt", "tf"),
    ("===STRINGAPI-READINSTRUCTION-SPLIT===", "stringapi", "readinstruction"),
];

const PROMPT: &str = ">>>";
const CONTINUATION: &str = "...";

/// Which split marker a code block contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitSelection {
    pub is_pt_tf_split: bool,
    pub group_a: &'static str,
    pub group_b: &'static str,
    marker: &'static str,
}

impl SplitSelection {
    /// Detect a split marker anywhere in `source`.
    #[must_use]
    pub fn detect(source: &str) -> Option<Self> {
        SPLIT_MARKERS
            .iter()
            .enumerate()
            .find(|(_, (marker, _, _))| source.contains(marker))
            .map(|(i, &(marker, group_a, group_b))| Self {
                is_pt_tf_split: i == 0,
                group_a,
                group_b,
                marker,
            })
    }

    /// Split `source` at the first marker; surrounding blank lines are trimmed.
    #[must_use]
    pub fn split<'s>(&self, source: &'s str) -> (&'s str, &'s str) {
        match source.split_once(self.marker) {
            Some((a, b)) => (a.trim_matches('\n'), b.trim_matches('\n')),
            None => (source.trim_matches('\n'), ""),
        }
    }
}

/// Keep only REPL input from an interactive transcript.
///
/// When any line starts with `>>>`, lines that start with neither `>>>` nor
/// `...` are dropped and the marker (plus one space) is stripped from the rest.
#[must_use]
pub fn filter_prompts(code: &str) -> Cow<'_, str> {
    if !code.lines().any(|line| line.starts_with(PROMPT)) {
        return Cow::Borrowed(code);
    }
    let kept: Vec<&str> = code
        .lines()
        .filter_map(|line| {
            line.strip_prefix(PROMPT)
                .or_else(|| line.strip_prefix(CONTINUATION))
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        })
        .collect();
    Cow::Owned(kept.join("\n"))
}

#[derive(Serialize)]
struct CodeGroup<'a> {
    id: &'a str,
    code: String,
    highlighted: String,
}

/// Code block processor emitting `CodeBlock` / `CodeBlockFw` components.
pub struct CodeSplitProcessor {
    highlighter: Arc<dyn Highlighter>,
    wrap: bool,
    warnings: Vec<String>,
}

impl CodeSplitProcessor {
    #[must_use]
    pub fn new(highlighter: Arc<dyn Highlighter>, wrap: bool) -> Self {
        Self {
            highlighter,
            wrap,
            warnings: Vec::new(),
        }
    }

    fn wrap_expr(&self) -> &'static str {
        if self.wrap { "true" } else { "false" }
    }

    fn group<'a>(&self, id: &'a str, segment: &str, language: &str) -> CodeGroup<'a> {
        CodeGroup {
            id,
            code: STANDARD.encode(filter_prompts(segment).as_bytes()),
            highlighted: self.highlighter.highlight(segment, language),
        }
    }

    fn render(&self, language: &str, source: &str) -> Result<String, serde_json::Error> {
        let component = match SplitSelection::detect(source) {
            Some(selection) => {
                tracing::debug!(
                    language,
                    is_pt_tf_split = selection.is_pt_tf_split,
                    "Splitting code block"
                );
                let (a, b) = selection.split(source);
                Component::new("CodeBlockFw")
                    .prop("group1", &self.group(selection.group_a, a, language))?
                    .prop("group2", &self.group(selection.group_b, b, language))?
            }
            None => {
                let source = source.trim_end_matches('\n');
                Component::new("CodeBlock")
                    .prop("code", &STANDARD.encode(filter_prompts(source).as_bytes()))?
                    .prop("highlighted", &self.highlighter.highlight(source, language))?
            }
        };
        Ok(component.expr("wrap", self.wrap_expr()).self_closing())
    }
}

impl CodeBlockProcessor for CodeSplitProcessor {
    fn process(&mut self, language: &str, source: &str, index: usize) -> ProcessResult {
        match self.render(language, source) {
            Ok(html) => ProcessResult::Inline(html),
            Err(err) => {
                tracing::warn!(index, error = %err, "Failed to build code block component");
                self.warnings
                    .push(format!("code block {index}: failed to build component: {err}"));
                ProcessResult::PassThrough
            }
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::highlight::EscapeHighlighter;

    struct LabelHighlighter;

    impl Highlighter for LabelHighlighter {
        fn highlight(&self, code: &str, language: &str) -> String {
            format!("[{language}]{code}")
        }
    }

    fn process(processor: &mut CodeSplitProcessor, language: &str, source: &str) -> String {
        match processor.process(language, source, 0) {
            ProcessResult::Inline(html) => html,
            ProcessResult::PassThrough => panic!("code block was not handled"),
        }
    }

    #[test]
    fn test_detect_markers() {
        let pt_tf = SplitSelection::detect("a\n===PT-TF-SPLIT===\nb").unwrap();
        assert!(pt_tf.is_pt_tf_split);
        assert_eq!((pt_tf.group_a, pt_tf.group_b), ("pt", "tf"));

        let api = SplitSelection::detect("a\n===STRINGAPI-READINSTRUCTION-SPLIT===\nb").unwrap();
        assert!(!api.is_pt_tf_split);
        assert_eq!((api.group_a, api.group_b), ("stringapi", "readinstruction"));

        assert!(SplitSelection::detect("plain").is_none());
    }

    #[test]
    fn test_split_at_first_marker() {
        let source = "\na\n===PT-TF-SPLIT===\nb\n===PT-TF-SPLIT===\nc\n";
        let selection = SplitSelection::detect(source).unwrap();
        assert_eq!(selection.split(source), ("a", "b\n===PT-TF-SPLIT===\nc"));
    }

    #[test]
    fn test_filter_prompts() {
        let code = ">>> a = 1\n... b\noutput line\n>>>c";
        assert_eq!(filter_prompts(code), "a = 1\nb\nc");
    }

    #[test]
    fn test_filter_prompts_without_prompt() {
        let code = "x = 1\n... not a continuation";
        assert!(matches!(filter_prompts(code), Cow::Borrowed(_)));
    }

    #[test]
    fn test_plain_block() {
        let mut processor = CodeSplitProcessor::new(Arc::new(EscapeHighlighter), false);
        assert_eq!(
            process(&mut processor, "python", "x = {1}\n"),
            r#"<CodeBlock code={"eCA9IHsxfQ=="} highlighted={"x = {1}"} wrap={false} />"#
        );
    }

    #[test]
    fn test_split_block() {
        let mut processor = CodeSplitProcessor::new(Arc::new(EscapeHighlighter), false);
        assert_eq!(
            process(&mut processor, "py", "codeA\n===PT-TF-SPLIT===\ncodeB\n"),
            concat!(
                r#"<CodeBlockFw group1={{"id":"pt","code":"Y29kZUE=","highlighted":"codeA"}}"#,
                r#" group2={{"id":"tf","code":"Y29kZUI=","highlighted":"codeB"}} wrap={false} />"#
            )
        );
    }

    #[test]
    fn test_split_filters_prompts_per_segment() {
        let mut processor = CodeSplitProcessor::new(Arc::new(LabelHighlighter), true);
        let html = process(
            &mut processor,
            "py",
            ">>> a\noutput\n===PT-TF-SPLIT===\nb = 1\n",
        );
        // Prompt filtering applies to the first segment only.
        assert!(html.contains(r#"{"id":"pt","code":"YQ==","highlighted":"[py]\u003e\u003e\u003e a\noutput"}"#));
        assert!(html.contains(r#"{"id":"tf","code":"YiA9IDE=","highlighted":"[py]b = 1"}"#));
        assert!(html.ends_with("wrap={true} />"));
    }

    #[test]
    fn test_language_reaches_highlighter() {
        let mut processor = CodeSplitProcessor::new(Arc::new(LabelHighlighter), false);
        let html = process(&mut processor, "", "a = 1\n");
        assert!(html.contains(r#"highlighted={"[]a = 1"}"#));
        assert!(processor.warnings().is_empty());
    }
}
