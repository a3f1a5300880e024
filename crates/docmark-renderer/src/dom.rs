//! Minimal HTML tree for harvesting rendered fragments.
//!
//! Rendered Markdown is parsed with quick-xml into [`HtmlNode`]s using the
//! text/tail model: `text` is the content before the first child, each child's
//! `tail` is the content between it and its next sibling. Text and attribute
//! values are kept raw (entity references included) so [`HtmlNode::inner_html`]
//! reproduces the markup; [`HtmlNode::inner_text`] decodes them.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

/// HTML void elements, rewritten to self-closing form before parsing.
static VOID_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(area|base|br|col|embed|hr|img|input|link|meta|source|track|wbr)(\s[^<>]*?)?\s*/?>")
        .expect("invalid void element regex")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("invalid entity regex")
});

/// Error while parsing a rendered fragment.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Markup quick-xml could not read.
    #[error("HTML parse error")]
    Xml(#[from] quick_xml::Error),

    /// Byte sequence that is not valid in the input encoding.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}

/// Element node of a parsed fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlNode {
    tag: String,
    /// Raw opening tag content between `<` and `>`, name and attributes.
    start: String,
    text: String,
    tail: String,
    children: Vec<HtmlNode>,
    self_closing: bool,
}

/// Parse an HTML fragment into a tree rooted at a synthetic `<root>` element.
pub fn parse_html(html: &str) -> Result<HtmlNode, DomError> {
    let normalized = VOID_ELEMENT.replace_all(html, "<${1}${2} />");
    let wrapped = format!("<root>{normalized}</root>");

    let mut reader = Reader::from_str(&wrapped);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut document = HtmlNode::default();
    parse_children(&mut reader, &mut document)?;
    Ok(document.children.into_iter().next().unwrap_or_default())
}

fn parse_children(reader: &mut Reader<&[u8]>, node: &mut HtmlNode) -> Result<(), DomError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let mut child = HtmlNode {
                    tag: reader.decoder().decode(e.name().as_ref())?.into_owned(),
                    start: reader.decoder().decode(&e)?.trim_end().to_owned(),
                    ..HtmlNode::default()
                };
                parse_children(reader, &mut child)?;
                node.children.push(child);
            }
            Event::Empty(e) => {
                let start = reader.decoder().decode(&e)?;
                node.children.push(HtmlNode {
                    tag: reader.decoder().decode(e.name().as_ref())?.into_owned(),
                    start: start.trim_end().trim_end_matches('/').trim_end().to_owned(),
                    self_closing: true,
                    ..HtmlNode::default()
                });
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                node.append_text(&text);
            }
            Event::GeneralRef(e) => {
                let name = reader.decoder().decode(&e)?;
                node.append_text(&format!("&{name};"));
            }
            Event::CData(e) => {
                node.append_text(&String::from_utf8_lossy(&e));
            }
            Event::End(_) | Event::Eof => return Ok(()),
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

impl HtmlNode {
    /// Tag name as written.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Direct element children.
    #[must_use]
    pub fn children(&self) -> &[HtmlNode] {
        &self.children
    }

    /// All descendant elements named `tag`, in document order.
    #[must_use]
    pub fn elements_by_tag(&self, tag: &str) -> Vec<&HtmlNode> {
        let mut found = Vec::new();
        self.collect_by_tag(tag, &mut found);
        found
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, found: &mut Vec<&'a HtmlNode>) {
        for child in &self.children {
            if child.tag.eq_ignore_ascii_case(tag) {
                found.push(child);
            }
            child.collect_by_tag(tag, found);
        }
    }

    /// Concatenated, entity-decoded text content.
    #[must_use]
    pub fn inner_text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw);
        decode_entities(&raw).into_owned()
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Markup of the node's content, without its own tags.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_inner(&mut out);
        out
    }

    fn write_inner(&self, out: &mut String) {
        out.push_str(&self.text);
        self.write_children(0, out);
    }

    /// Write children from index `from` on, each followed by its tail.
    fn write_children(&self, from: usize, out: &mut String) {
        for child in self.children.iter().skip(from) {
            child.write_outer(out);
            out.push_str(&child.tail);
        }
    }

    /// Markup of a list item after its lead term.
    ///
    /// A `<p>` opening the item (loose lists) is unwrapped. The first
    /// `<strong>` child is dropped, then everything up to and including the
    /// first `--` or `—` found in the text between the following children.
    /// Markup inside those children is never cut. Without a separator, all
    /// content after the lead term is kept. `None` when there is no
    /// `<strong>` child.
    #[must_use]
    pub fn content_after_lead_term(&self) -> Option<String> {
        let paragraph = self
            .children
            .first()
            .filter(|first| self.text.trim().is_empty() && first.tag.eq_ignore_ascii_case("p"));
        let node = paragraph.unwrap_or(self);

        let lead = node
            .children
            .iter()
            .position(|child| child.tag.eq_ignore_ascii_case("strong"))?;
        let separator = node.children[lead..]
            .iter()
            .enumerate()
            .find_map(|(offset, child)| separator_end(&child.tail).map(|end| (lead + offset, end)));

        let mut out = String::new();
        let next = match separator {
            Some((index, end)) => {
                out.push_str(&node.children[index].tail[end..]);
                index + 1
            }
            None => {
                out.push_str(&node.children[lead].tail);
                lead + 1
            }
        };
        node.write_children(next, &mut out);

        if let Some(paragraph) = paragraph {
            out.push_str(&paragraph.tail);
            self.write_children(1, &mut out);
        }
        Some(out.trim().to_owned())
    }

    fn write_outer(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.start);
        if self.self_closing {
            out.push_str(" />");
            return;
        }
        out.push('>');
        self.write_inner(out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(text),
            None => self.text.push_str(text),
        }
    }
}

/// Byte offset just past the first `--` or `—` in `text`.
fn separator_end(text: &str) -> Option<usize> {
    let dashes = text.find("--").map(|i| (i, i + 2));
    let em_dash = text.find('\u{2014}').map(|i| (i, i + '\u{2014}'.len_utf8()));
    match (dashes, em_dash) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a.1 } else { b.1 }),
        (a, b) => a.or(b).map(|(_, end)| end),
    }
}

/// Decode character references; unknown named entities are left as written.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    ENTITY.replace_all(raw, |caps: &regex::Captures<'_>| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse().ok().and_then(char::from_u32)
        } else {
            match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "lcub" => Some('{'),
                "rcub" => Some('}'),
                "zwnj" => Some('\u{200c}'),
                _ => None,
            }
        };
        decoded.map_or_else(|| caps[0].to_owned(), String::from)
    })
}
