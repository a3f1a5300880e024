//! `<literalinclude>`: fenced code blocks copied from files.
//!
//! The tag body is a JSON object:
//!
//! ```json
//! {"path": "run.py", "start-after": "START", "end-before": "END", "dedent": 4, "language": "python"}
//! ```
//!
//! Only `path` is required. `path` is resolved against the pipeline's base
//! directory (the directory of the document being converted).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RenderError;
use crate::substitute::substitute;
use crate::tags::{TagKind, TagMatch, TagPattern};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct IncludeSpec {
    path: PathBuf,
    start_after: Option<String>,
    end_before: Option<String>,
    #[serde(default)]
    dedent: usize,
    #[serde(default)]
    language: String,
}

/// Replace every `<literalinclude>` in `text` with a fenced code block.
pub(crate) async fn expand_includes(text: &str, base_dir: &Path) -> Result<String, RenderError> {
    substitute(text, &TagPattern::new(TagKind::LiteralInclude), |m| {
        let indent = leading_indent(&text[..m.range.start]);
        async move { include(&m, indent, base_dir) }
    })
    .await
}

/// Spaces and tabs directly before `end` of `prefix`.
fn leading_indent(prefix: &str) -> &str {
    let trimmed = prefix.trim_end_matches([' ', '\t']);
    &prefix[trimmed.len()..]
}

fn include(found: &TagMatch, indent: &str, base_dir: &Path) -> Result<String, RenderError> {
    let payload = found.body.trim();
    let spec: IncludeSpec =
        serde_json::from_str(payload).map_err(|source| RenderError::IncludeSpec {
            payload: payload.to_owned(),
            source,
        })?;

    let path = base_dir.join(&spec.path);
    let contents = std::fs::read_to_string(&path).map_err(|source| RenderError::IncludeRead {
        path: path.clone(),
        source,
    })?;
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);
    let lines: Vec<&str> = contents.split_inclusive('\n').collect();

    let selected = select_lines(&lines, &spec, &path)?;
    tracing::debug!(path = %path.display(), lines = selected.len(), "Included file");

    let body: String = selected
        .iter()
        .map(|line| format!("{indent}{}", dedent(line, spec.dedent)))
        .collect();
    Ok(format!(
        "```{}\n{}\n{indent}```",
        spec.language,
        body.trim_end()
    ))
}

/// Lines strictly between the anchors; the whole file when neither is set.
///
/// A line matches an anchor when, with surrounding whitespace and trailing
/// punctuation removed, it ends with the anchor text. The last matching
/// line wins.
fn select_lines<'l>(
    lines: &[&'l str],
    spec: &IncludeSpec,
    path: &Path,
) -> Result<Vec<&'l str>, RenderError> {
    if spec.start_after.is_none() && spec.end_before.is_none() {
        return Ok(lines.to_vec());
    }
    let find = |anchor: Option<&str>| -> Result<Option<usize>, RenderError> {
        let Some(anchor) = anchor else {
            return Ok(None);
        };
        lines
            .iter()
            .rposition(|line| anchor_text(line).ends_with(anchor))
            .map(Some)
            .ok_or_else(|| RenderError::IncludeAnchor {
                anchor: anchor.to_owned(),
                path: path.to_owned(),
            })
    };

    let start = find(spec.start_after.as_deref())?.map_or(0, |idx| idx + 1);
    let end = find(spec.end_before.as_deref())?.unwrap_or(lines.len());
    Ok(lines.get(start..end).map(<[&str]>::to_vec).unwrap_or_default())
}

fn anchor_text(line: &str) -> &str {
    line.trim()
        .trim_end_matches(|c: char| !(c.is_alphanumeric() || c == '_'))
}

/// Drop up to `width` leading characters, keeping the line terminator.
fn dedent(line: &str, width: usize) -> &str {
    let content = line.trim_end_matches(['\n', '\r']);
    let cut = content
        .char_indices()
        .nth(width)
        .map_or(content.len(), |(idx, _)| idx);
    &line[cut..]
}
