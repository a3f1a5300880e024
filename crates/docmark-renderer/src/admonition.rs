//! Styled tip and warning containers.
//!
//! Used for GFM alert blockquotes and for the `<Tip>`, `<Added>`, `<Changed>`
//! and `<Deprecated>` components inside docstring parameter descriptions.

use std::sync::LazyLock;

use pulldown_cmark::BlockQuoteKind;
use regex::Regex;

static TIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Tip( warning=\{true\})?>(.*?)</Tip>").expect("invalid tip regex")
});

static VERSION_NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(Added|Changed|Deprecated) version="([0-9.v]+)" ?(/?)>"#)
        .expect("invalid version note regex")
});

pub(crate) const CONTAINER_END: &str = "</div>";

/// Visual kind of an admonition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmonitionKind {
    Tip,
    Warning,
}

impl From<BlockQuoteKind> for AdmonitionKind {
    fn from(kind: BlockQuoteKind) -> Self {
        match kind {
            BlockQuoteKind::Note | BlockQuoteKind::Tip | BlockQuoteKind::Important => Self::Tip,
            BlockQuoteKind::Warning | BlockQuoteKind::Caution => Self::Warning,
        }
    }
}

impl AdmonitionKind {
    fn color(self) -> &'static str {
        match self {
            Self::Tip => "green",
            Self::Warning => "orange",
        }
    }

    /// Opening `<div>` of the styled container.
    #[must_use]
    pub fn container_start(self) -> String {
        let c = self.color();
        let modifier = match self {
            Self::Tip => "",
            Self::Warning => " course-tip-orange",
        };
        format!(
            r#"<div class="course-tip{modifier} bg-gradient-to-br dark:bg-gradient-to-r before:border-{c}-500 dark:before:border-{c}-800 from-{c}-50 dark:from-gray-900 to-white dark:to-gray-950 border border-{c}-50 text-{c}-700 dark:text-gray-400">"#
        )
    }
}

/// Rewrite inline tip and version-note components into styled containers.
#[must_use]
pub fn rewrite_inline(html: &str) -> String {
    let html = TIP.replace_all(html, |caps: &regex::Captures<'_>| {
        let kind = if caps.get(1).is_some() {
            AdmonitionKind::Warning
        } else {
            AdmonitionKind::Tip
        };
        format!("{}{}{CONTAINER_END}", kind.container_start(), &caps[2])
    });
    rewrite_version_notes(&html)
}

/// `<Added version="..."/>` or `<Changed version="...">body</Changed>`.
fn rewrite_version_notes(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(caps) = VERSION_NOTE.captures_at(html, pos) {
        let (Some(whole), Some(label), Some(version)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
        let close = format!("</{}>", label.as_str());

        let (body, end) = match html[whole.end()..].find(&close) {
            Some(offset) if !self_closing => (
                &html[whole.end()..whole.end() + offset],
                whole.end() + offset + close.len(),
            ),
            _ => ("", whole.end()),
        };

        let kind = if label.as_str() == "Deprecated" {
            AdmonitionKind::Warning
        } else {
            AdmonitionKind::Tip
        };
        out.push_str(&html[pos..whole.start()]);
        out.push_str(&kind.container_start());
        out.push_str(&format!(
            r#"<p class="font-medium">{} in {}</p>"#,
            label.as_str(),
            version.as_str()
        ));
        out.push_str(body);
        out.push_str(CONTAINER_END);
        pos = end;
    }
    out.push_str(&html[pos..]);
    out
}
