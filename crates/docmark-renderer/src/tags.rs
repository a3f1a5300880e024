//! Pseudo-XML tag kinds and the non-nesting tag matcher.
//!
//! Every tag the pipeline understands is a [`TagKind`]. A [`TagPattern`] finds
//! `<name>...</name>` spans (optionally `<name id="...">`) whose body never
//! crosses another opening tag of the same name.

use std::borrow::Cow;
use std::ops::Range;

/// Closed set of tags recognized in documentation sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Docstring,
    Name,
    Anchor,
    Parameters,
    ParamsDesc,
    ParamGroups,
    /// `<paramsdesc{N}title>`, the title of the N-th parameter group (1-based).
    ParamGroupTitle(usize),
    /// `<paramsdesc{N}>`, the parameter list of the N-th group (1-based).
    ParamGroupDesc(usize),
    RetDesc,
    RetType,
    YieldDesc,
    YieldType,
    Raises,
    RaisedErrors,
    Source,
    IsGetSetDescriptor,
    FrameworkContent,
    Pt,
    Tf,
    Jax,
    HfOptions,
    HfOption,
    InferenceSnippet,
    Python,
    Js,
    Curl,
    TokenizersLangContent,
    Rust,
    Node,
    LiteralInclude,
}

impl TagKind {
    /// Tag name as written in the source.
    #[must_use]
    pub fn name(self) -> Cow<'static, str> {
        let name = match self {
            Self::ParamGroupTitle(n) => return Cow::Owned(format!("paramsdesc{n}title")),
            Self::ParamGroupDesc(n) => return Cow::Owned(format!("paramsdesc{n}")),
            Self::Docstring => "docstring",
            Self::Name => "name",
            Self::Anchor => "anchor",
            Self::Parameters => "parameters",
            Self::ParamsDesc => "paramsdesc",
            Self::ParamGroups => "paramgroups",
            Self::RetDesc => "retdesc",
            Self::RetType => "rettype",
            Self::YieldDesc => "yieldesc",
            Self::YieldType => "yieldtype",
            Self::Raises => "raises",
            Self::RaisedErrors => "raisederrors",
            Self::Source => "source",
            Self::IsGetSetDescriptor => "isgetsetdescriptor",
            Self::FrameworkContent => "frameworkcontent",
            Self::Pt => "pt",
            Self::Tf => "tf",
            Self::Jax => "jax",
            Self::HfOptions => "hfoptions",
            Self::HfOption => "hfoption",
            Self::InferenceSnippet => "inferencesnippet",
            Self::Python => "python",
            Self::Js => "js",
            Self::Curl => "curl",
            Self::TokenizersLangContent => "tokenizerslangcontent",
            Self::Rust => "rust",
            Self::Node => "node",
            Self::LiteralInclude => "literalinclude",
        };
        Cow::Borrowed(name)
    }
}

/// A matched `<tag>body</tag>` span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagMatch {
    /// Byte range of the whole span, opening and closing tag included.
    pub range: Range<usize>,
    /// Value of the `id` attribute, when the opening tag carries one.
    pub id: Option<String>,
    /// Text between the opening and closing tag.
    pub body: String,
}

/// Matcher for one tag kind.
#[derive(Clone, Debug)]
pub struct TagPattern {
    kind: TagKind,
    requires_id: bool,
    open_prefix: String,
    close: String,
}

/// An opening tag of the pattern's name found in the text.
struct OpeningTag {
    start: usize,
    end: usize,
    id: Option<String>,
    /// Whether the attributes fit the pattern (bare, or `id="..."`).
    well_formed: bool,
}

impl TagPattern {
    /// Pattern for `<name>...</name>`; an `id="..."` attribute is tolerated.
    #[must_use]
    pub fn new(kind: TagKind) -> Self {
        Self::build(kind, false)
    }

    /// Pattern for `<name id="...">...</name>`; tags without an id never match.
    #[must_use]
    pub fn with_id(kind: TagKind) -> Self {
        Self::build(kind, true)
    }

    fn build(kind: TagKind, requires_id: bool) -> Self {
        let name = kind.name();
        Self {
            kind,
            requires_id,
            open_prefix: format!("<{name}"),
            close: format!("</{name}>"),
        }
    }

    /// Tag kind this pattern matches.
    #[must_use]
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// First match in `text`, if any.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<TagMatch> {
        self.matches(text).next()
    }

    /// All non-overlapping matches in source order.
    #[must_use]
    pub fn find_all(&self, text: &str) -> Vec<TagMatch> {
        self.matches(text).collect()
    }

    /// Whether an opening tag of this name occurs anywhere in `text`.
    ///
    /// Used for flag tags such as `<isgetsetdescriptor>` that carry no body.
    #[must_use]
    pub fn is_present(&self, text: &str) -> bool {
        self.next_opening(text, 0).is_some()
    }

    /// Lazily iterate matches in source order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = TagMatch> + 'a {
        let mut pos = 0;
        std::iter::from_fn(move || {
            loop {
                let open = self.next_opening(text, pos)?;
                if !open.well_formed || (self.requires_id && open.id.is_none()) {
                    pos = open.end;
                    continue;
                }

                // No closing tag after this opening means none after any later one either.
                let close_start = open.end + text[open.end..].find(&self.close)?;
                let end = close_start + self.close.len();

                // A same-name opening before the close leaves the outer tag unterminated.
                if self.next_opening(&text[..close_start], open.end).is_some() {
                    pos = end;
                    continue;
                }

                pos = end;
                return Some(TagMatch {
                    range: open.start..end,
                    id: open.id,
                    body: text[open.end..close_start].to_owned(),
                });
            }
        })
    }

    fn next_opening(&self, text: &str, from: usize) -> Option<OpeningTag> {
        let mut search = from;
        loop {
            let start = search + text.get(search..)?.find(&self.open_prefix)?;
            let after_name = start + self.open_prefix.len();
            let rest = &text[after_name..];

            // `<python` must not match `<pythonic>`.
            if !rest.starts_with(|c: char| c == '>' || c.is_whitespace()) {
                search = after_name;
                continue;
            }

            let gt = rest.find('>')?;
            let attrs = rest[..gt].trim();
            let (id, well_formed) = if attrs.is_empty() {
                (None, true)
            } else {
                match parse_id_attr(attrs) {
                    Some(id) => (Some(id.to_owned()), true),
                    None => (None, false),
                }
            };

            return Some(OpeningTag {
                start,
                end: after_name + gt + 1,
                id,
                well_formed,
            });
        }
    }
}

/// Parse an attribute list consisting of exactly `id="value"`.
fn parse_id_attr(attrs: &str) -> Option<&str> {
    let value = attrs
        .strip_prefix("id")?
        .trim_start()
        .strip_prefix('=')?
        .trim_start()
        .strip_prefix('"')?
        .strip_suffix('"')?;
    (!value.contains('"')).then_some(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_find_simple() {
        let pattern = TagPattern::new(TagKind::Name);
        let m = pattern.find("<name>foo</name>").unwrap();
        assert_eq!(m.range, 0..16);
        assert_eq!(m.body, "foo");
        assert_eq!(m.id, None);
    }

    #[test]
    fn test_find_all_in_order() {
        let pattern = TagPattern::new(TagKind::Pt);
        let text = "a <pt>one</pt> b <pt>two</pt> c";
        let bodies: Vec<_> = pattern.find_all(text).into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["one", "two"]);
    }

    #[test]
    fn test_nested_same_name_does_not_match() {
        let pattern = TagPattern::new(TagKind::Docstring);
        assert!(pattern.find("<docstring>A<docstring>B</docstring>").is_none());
    }

    #[test]
    fn test_nested_span_skipped_then_later_match_found() {
        let pattern = TagPattern::new(TagKind::Docstring);
        let text = "<docstring>A<docstring>B</docstring> <docstring>C</docstring>";
        let matches = pattern.find_all(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].body, "C");
    }

    #[test]
    fn test_missing_close_is_absent() {
        let pattern = TagPattern::new(TagKind::RetDesc);
        assert!(pattern.find("<retdesc>never closed").is_none());
    }

    #[test]
    fn test_with_id_requires_id() {
        let pattern = TagPattern::with_id(TagKind::HfOption);
        assert!(pattern.find("<hfoption>x</hfoption>").is_none());

        let m = pattern.find(r#"<hfoption id="pipeline">x</hfoption>"#).unwrap();
        assert_eq!(m.id.as_deref(), Some("pipeline"));
        assert_eq!(m.body, "x");
    }

    #[test]
    fn test_prefix_names_are_distinct() {
        // `<hfoption` is a prefix of `<hfoptions`, `<paramsdesc` of `<paramsdesc1>`.
        let option = TagPattern::with_id(TagKind::HfOption);
        let text = r#"<hfoptions id="a"><hfoption id="b">body</hfoption></hfoptions>"#;
        let m = option.find(text).unwrap();
        assert_eq!(m.id.as_deref(), Some("b"));

        let desc = TagPattern::new(TagKind::ParamsDesc);
        assert!(desc.find("<paramsdesc1>x</paramsdesc1>").is_none());
        let group = TagPattern::new(TagKind::ParamGroupDesc(1));
        assert_eq!(group.find("<paramsdesc1>x</paramsdesc1>").unwrap().body, "x");
    }

    #[test]
    fn test_other_attributes_are_not_matched() {
        let pattern = TagPattern::new(TagKind::Pt);
        assert!(pattern.find(r#"<pt class="x">body</pt>"#).is_none());
    }

    #[test]
    fn test_is_present_without_body() {
        let pattern = TagPattern::new(TagKind::IsGetSetDescriptor);
        assert!(pattern.is_present("<name>x</name><isgetsetdescriptor>"));
        assert!(!pattern.is_present("<name>x</name>"));
    }

    #[test]
    fn test_numbered_names() {
        assert_eq!(TagKind::ParamGroupTitle(2).name(), "paramsdesc2title");
        assert_eq!(TagKind::ParamGroupDesc(3).name(), "paramsdesc3");
        assert_eq!(TagKind::TokenizersLangContent.name(), "tokenizerslangcontent");
    }
}
