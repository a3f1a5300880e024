//! Heading outline and document metadata.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `Title[ slug ]` (spaces required) or `Title [[slug]]` at the end of a
/// heading.
static EXPLICIT_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*(?:\[\[\s*([^\[\]\s]+)\s*\]\]|\[\s+([^\[\]\s]+)\s+\])$")
        .expect("invalid explicit slug regex")
});

/// One heading in the outline forest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub title: String,
    pub local: String,
    pub depth: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<HeadingNode>,
}

impl HeadingNode {
    #[must_use]
    pub fn new(title: impl Into<String>, local: impl Into<String>, depth: u8) -> Self {
        Self {
            title: title.into(),
            local: local.into(),
            depth,
            sections: Vec::new(),
        }
    }
}

/// Builds the outline forest in document order.
///
/// A heading nests under the most recent heading with a smaller depth, so
/// `#`, `###`, `##` yields a root with two children.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    roots: Vec<HeadingNode>,
    /// Depths of the open ancestors, outermost first.
    open: Vec<u8>,
}

impl OutlineBuilder {
    pub fn push(&mut self, node: HeadingNode) {
        while self.open.last().is_some_and(|&depth| depth >= node.depth) {
            self.open.pop();
        }
        let depth = node.depth;
        insert_at(&mut self.roots, self.open.len(), node);
        self.open.push(depth);
    }

    #[must_use]
    pub fn finish(self) -> Vec<HeadingNode> {
        self.roots
    }

    /// Build the forest from headings in document order.
    #[must_use]
    pub fn build(nodes: impl IntoIterator<Item = HeadingNode>) -> Vec<HeadingNode> {
        let mut builder = Self::default();
        for node in nodes {
            builder.push(node);
        }
        builder.finish()
    }
}

/// A heading emitted by the renderer and where its component starts in the
/// rendered HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub offset: usize,
    pub node: HeadingNode,
}

/// Insert `node` as the last child `levels` deep along the last-child path.
fn insert_at(nodes: &mut Vec<HeadingNode>, levels: usize, node: HeadingNode) {
    if levels > 0 && !nodes.is_empty() {
        let last = nodes.len() - 1;
        insert_at(&mut nodes[last].sections, levels - 1, node);
    } else {
        nodes.push(node);
    }
}

/// Metadata record exported by each converted document.
///
/// A document whose outline is a single level-1 heading takes that heading
/// as its title; its sub-headings become the sections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    pub sections: Vec<HeadingNode>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn from_outline(mut roots: Vec<HeadingNode>) -> Self {
        if roots.len() == 1 && roots[0].depth == 1 {
            if let Some(root) = roots.pop() {
                return Self {
                    title: Some(root.title),
                    local: Some(root.local),
                    sections: root.sections,
                };
            }
        }
        Self {
            title: None,
            local: None,
            sections: roots,
        }
    }
}

/// Split `Title[ slug ]` into the title and the explicit slug.
#[must_use]
pub fn split_explicit_slug(text: &str) -> (&str, Option<&str>) {
    match EXPLICIT_SLUG.captures(text) {
        Some(caps) => match (caps.get(1), caps.get(2).or_else(|| caps.get(3))) {
            (Some(title), Some(slug)) => (title.as_str(), Some(slug.as_str())),
            _ => (text, None),
        },
        None => (text, None),
    }
}

/// Derive an anchor slug from heading text.
///
/// Lowercases, turns each run of whitespace into one hyphen, and drops
/// everything that is not a letter, digit or hyphen (Unicode-aware).
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
        } else if c.is_alphanumeric() || c == '-' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.extend(c.to_lowercase());
        }
    }
    slug
}
