//! Body-region sentinels, known-safe tags and region escaping.
//!
//! Between the body start and end sentinels, literal `{` must not reach the
//! component compiler as an expression opener. Text gets `{` rewritten to
//! `&lcub;`; raw HTML is kept as markup only when every tag in it is a known
//! HTML element or component.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::state::escape_html;

pub const BODY_START_COMMENT: &str = "<!--HF DOCBUILD BODY START-->";
pub const BODY_END_COMMENT: &str = "<!--HF DOCBUILD BODY END-->";
pub const BODY_START_TOKEN: &str = "HF_DOC_BODY_START";
pub const BODY_END_TOKEN: &str = "HF_DOC_BODY_END";

static SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--HF DOCBUILD BODY (START|END)-->|HF_DOC_BODY_(START|END)")
        .expect("invalid body sentinel regex")
});

/// An opening or closing tag, or a comment.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?([A-Za-z][A-Za-z0-9:._-]*)(?:\s[^<>]*)?/?>")
        .expect("invalid markup regex")
});

/// Standard HTML elements accepted in raw HTML inside the body region.
const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "audio", "b", "blockquote", "br", "button",
    "caption", "center", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div",
    "dl", "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "i", "iframe", "img", "input", "ins", "kbd", "label", "li", "main", "mark",
    "nav", "ol", "p", "picture", "pre", "q", "s", "samp", "section", "small", "source", "span",
    "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u",
    "ul", "var", "video", "wbr", "svg", "path", "g",
];

/// Components every documentation build ships, known even without discovery.
const BUILTIN_COMPONENTS: &[&str] = &["Tip", "Added", "Changed", "Deprecated"];

/// Error while enumerating component files.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Component directory path is not a valid glob pattern.
    #[error("invalid component directory pattern")]
    Pattern(#[from] glob::PatternError),

    /// Directory entry could not be read.
    #[error("failed to read component directory")]
    Walk(#[from] glob::GlobError),
}

/// Tag names treated as safe markup inside the body region.
///
/// Built once at startup and shared read-only across renders.
#[derive(Clone, Debug)]
pub struct KnownTags {
    names: HashSet<String>,
}

impl Default for KnownTags {
    fn default() -> Self {
        Self::standard()
    }
}

impl KnownTags {
    /// Standard HTML elements plus the built-in components.
    #[must_use]
    pub fn standard() -> Self {
        let names = HTML_TAGS
            .iter()
            .chain(BUILTIN_COMPONENTS)
            .map(|name| (*name).to_owned())
            .collect();
        Self { names }
    }

    /// Add component names.
    #[must_use]
    pub fn with_components<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Standard tags plus the stem of every `*.svelte` file under `dir`.
    pub fn discover(dir: &Path) -> Result<Self, DiscoveryError> {
        let pattern = dir.join("**").join("*.svelte");
        let mut components = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let path = entry?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                components.push(stem.to_owned());
            }
        }
        tracing::debug!(dir = %dir.display(), count = components.len(), "Discovered components");
        Ok(Self::standard().with_components(components))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name) || self.names.contains(&name.to_ascii_lowercase())
    }
}

/// Which side of the body sentinels a position is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BodyRegion {
    started: bool,
    ended: bool,
}

impl BodyRegion {
    /// Region state already inside the body.
    #[must_use]
    pub fn inside() -> Self {
        Self {
            started: true,
            ended: false,
        }
    }

    /// State after reading every sentinel in `prefix`.
    #[must_use]
    pub fn after(prefix: &str) -> Self {
        Self::default().advanced(prefix)
    }

    /// This state advanced over every sentinel in `text`.
    #[must_use]
    pub fn advanced(mut self, text: &str) -> Self {
        for caps in SENTINEL.captures_iter(text) {
            let is_start = caps.get(1).or_else(|| caps.get(2)).is_some_and(|m| m.as_str() == "START");
            self.mark(is_start);
        }
        self
    }

    /// Record a sentinel.
    pub fn mark(&mut self, is_start: bool) {
        if is_start {
            self.started = true;
        } else if self.started {
            self.ended = true;
        }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        self.started && !self.ended
    }
}

/// Classify a raw chunk or text as a sentinel: `Some(true)` start, `Some(false)` end.
#[must_use]
pub fn sentinel(chunk: &str) -> Option<bool> {
    match chunk.trim() {
        BODY_START_COMMENT | BODY_START_TOKEN => Some(true),
        BODY_END_COMMENT | BODY_END_TOKEN => Some(false),
        _ => None,
    }
}

/// Escape plain text for the body region.
#[must_use]
pub fn escape_text(text: &str) -> String {
    escape_html(text).replace('{', "&lcub;")
}

/// Escape a raw HTML chunk for the body region.
///
/// If every tag in the chunk is known, markup is kept and `{` is escaped in
/// the text between tags. Otherwise the whole chunk is escaped as text.
/// Comments are always kept.
#[must_use]
pub fn escape_html_chunk(chunk: &str, known: &KnownTags) -> String {
    let all_known = MARKUP
        .captures_iter(chunk)
        .all(|caps| caps.get(1).is_none_or(|name| known.contains(name.as_str())));
    if !all_known {
        return chunk.replace('<', "&lt;").replace('{', "&lcub;");
    }

    let mut out = String::with_capacity(chunk.len());
    let mut last = 0;
    for m in MARKUP.find_iter(chunk) {
        out.push_str(&escape_loose_text(&chunk[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&escape_loose_text(&chunk[last..]));
    out
}

/// Escape text found between tags of a raw chunk.
fn escape_loose_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('{', "&lcub;")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_region_after_prefix() {
        assert!(!BodyRegion::after("intro").is_active());
        assert!(BodyRegion::after("x <!--HF DOCBUILD BODY START--> y").is_active());
        assert!(!BodyRegion::after("HF_DOC_BODY_START a HF_DOC_BODY_END").is_active());
        // An end sentinel before any start is ignored.
        assert!(BodyRegion::after("HF_DOC_BODY_END then HF_DOC_BODY_START").is_active());
    }

    #[test]
    fn test_region_advanced_from_inside() {
        assert!(BodyRegion::inside().advanced("no sentinels").is_active());
        assert!(!BodyRegion::inside().advanced("a HF_DOC_BODY_END b").is_active());
    }

    #[test]
    fn test_region_does_not_reopen() {
        let mut region = BodyRegion::default();
        region.mark(true);
        region.mark(false);
        region.mark(true);
        assert!(!region.is_active());
    }

    #[test]
    fn test_sentinel_forms() {
        assert_eq!(sentinel("<!--HF DOCBUILD BODY START-->\n"), Some(true));
        assert_eq!(sentinel(" HF_DOC_BODY_END "), Some(false));
        assert_eq!(sentinel("<!-- other -->"), None);
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("f(x) = {a < b}"), "f(x) = &lcub;a &lt; b}");
    }

    #[test]
    fn test_escape_text_is_stable_on_escaped_braces() {
        let once = escape_text("{x}");
        assert_eq!(once.replace('{', "&lcub;"), once);
    }

    #[test]
    fn test_known_chunk_keeps_markup() {
        let known = KnownTags::standard();
        assert_eq!(
            escape_html_chunk(r#"<div class="x">{value}</div>"#, &known),
            r#"<div class="x">&lcub;value}</div>"#
        );
        assert_eq!(
            escape_html_chunk("<Tip warning={true}>\n", &known),
            "<Tip warning={true}>\n"
        );
    }

    #[test]
    fn test_unknown_chunk_is_escaped() {
        let known = KnownTags::standard();
        assert_eq!(
            escape_html_chunk("<Widget value={x}>", &known),
            "&lt;Widget value=&lcub;x}>"
        );
    }

    #[test]
    fn test_chunk_without_tags() {
        let known = KnownTags::standard();
        assert_eq!(escape_html_chunk("{x} < y\n", &known), "&lcub;x} &lt; y\n");
    }

    #[test]
    fn test_comments_pass_through() {
        let known = KnownTags::standard();
        assert_eq!(
            escape_html_chunk("<!--docmark-component-3-->\n", &known),
            "<!--docmark-component-3-->\n"
        );
    }

    #[test]
    fn test_discover_components() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("Widget.svelte"), "").unwrap();
        std::fs::write(dir.path().join("nested/Gallery.svelte"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let known = KnownTags::discover(dir.path()).unwrap();
        assert!(known.contains("Widget"));
        assert!(known.contains("Gallery"));
        assert!(known.contains("div"));
        assert!(!known.contains("notes"));
    }
}
