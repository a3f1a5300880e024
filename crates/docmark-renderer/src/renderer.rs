//! Markdown renderer emitting HTML and component invocations.
//!
//! One pass over `pulldown-cmark` events does the HTML rendering together with
//! heading and outline handling, body-region escaping, alert admonitions and
//! math.

use std::sync::Arc;

use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream,
};

use crate::admonition::{AdmonitionKind, CONTAINER_END};
use crate::code_block::{CodeBlockProcessor, ProcessResult, fence_language};
use crate::component::Component;
use crate::error::RenderError;
use crate::math::{MathRenderer, PlainMath};
use crate::outline::{HeadingNode, OutlineBuilder, OutlineEntry};
use crate::region::{self, BodyRegion, KnownTags};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, escape_html};

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML with component invocations.
    pub html: String,
    /// Headings in document order.
    pub headings: Vec<OutlineEntry>,
    /// Warnings reported by code block processors.
    pub warnings: Vec<String>,
}

impl RenderResult {
    /// Heading forest built from [`headings`](Self::headings).
    #[must_use]
    pub fn outline(&self) -> Vec<HeadingNode> {
        OutlineBuilder::build(self.headings.iter().map(|entry| entry.node.clone()))
    }
}

/// Markdown renderer for documentation pages.
///
/// Headings become `<Heading>` components, GFM alerts become styled
/// containers, and everything between the body-region sentinels is escaped so
/// that no literal `{` reaches the component compiler.
///
/// # Code Block Processors
///
/// Code blocks are offered to processors added with
/// [`with_processor`](Self::with_processor), in order.
pub struct MarkdownRenderer {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    gfm: bool,
    /// Admonition kinds of the open blockquotes (plain blockquotes are `None`).
    admonition_stack: Vec<Option<AdmonitionKind>>,
    known_tags: Arc<KnownTags>,
    math: Arc<dyn MathRenderer>,
    region: BodyRegion,
    headings: Vec<OutlineEntry>,
}

impl MarkdownRenderer {
    /// Create a renderer with GFM enabled, standard known tags and plain math.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            processors: Vec::new(),
            code_block_index: 0,
            gfm: true,
            admonition_stack: Vec::new(),
            known_tags: Arc::new(KnownTags::standard()),
            math: Arc::new(PlainMath),
            region: BodyRegion::default(),
            headings: Vec::new(),
        }
    }

    /// Enable or disable GitHub Flavored Markdown (tables, strikethrough,
    /// task lists and alerts).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Tags kept as markup inside the body region.
    #[must_use]
    pub fn with_known_tags(mut self, known_tags: Arc<KnownTags>) -> Self {
        self.known_tags = known_tags;
        self
    }

    #[must_use]
    pub fn with_math(mut self, math: Arc<dyn MathRenderer>) -> Self {
        self.math = math;
        self
    }

    /// Start in the given body-region state (for fragments of a larger document).
    #[must_use]
    pub fn with_region(mut self, region: BodyRegion) -> Self {
        self.region = region;
        self
    }

    /// Add a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Parser options for the configured GFM mode. Math is always on.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_MATH;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Render markdown text with the configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> Result<RenderResult, RenderError> {
        let parser = Parser::new_ext(markdown, self.parser_options());
        self.render(TextMergeStream::new(parser))
    }

    /// Render markdown events.
    pub fn render<'a, I>(&mut self, events: I) -> Result<RenderResult, RenderError>
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event)?;
        }

        Ok(RenderResult {
            html: std::mem::take(&mut self.output),
            headings: std::mem::take(&mut self.headings),
            warnings: self
                .processors
                .iter()
                .flat_map(|p| p.warnings())
                .cloned()
                .collect(),
        })
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag)?,
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::InlineMath(tex) => self.math(&tex, false)?,
            Event::DisplayMath(tex) => self.math(&tex, true)?,
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(_) => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start(heading_level(level)),
            Tag::BlockQuote(Some(kind)) => {
                let kind = AdmonitionKind::from(kind);
                self.admonition_stack.push(Some(kind));
                self.output.push_str(&kind.container_start());
            }
            Tag::BlockQuote(None) => {
                self.admonition_stack.push(None);
                self.output.push_str("<blockquote>");
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) => fence_language(info).map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(n)) => self.output.push_str(&format!(r#"<ol start="{n}">"#)),
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                self.output.push_str(&format!("<{tag}{align}>"));
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let link = format!(r#"<a href="{}">"#, self.escape(&dest_url));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), RenderError> {
        match tag {
            TagEnd::Paragraph => {
                // A paragraph that only held a bare region sentinel is dropped.
                if self.output.ends_with("<p>") {
                    self.output.truncate(self.output.len() - "<p>".len());
                } else {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_) => self.end_heading()?,
            TagEnd::BlockQuote(_) => match self.admonition_stack.pop() {
                Some(Some(_)) => self.output.push_str(CONTAINER_END),
                _ => self.output.push_str("</blockquote>"),
            },
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.table.is_in_head() { "</th>" } else { "</td>" });
                self.table.next_cell();
            }
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    self.image_tag(&src, &alt, &title);
                }
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
        Ok(())
    }

    fn end_heading(&mut self) -> Result<(), RenderError> {
        let Some(heading) = self.heading.complete() else {
            return Ok(());
        };
        let component = Component::new("Heading")
            .prop("title", &heading.title)?
            .prop("local", &heading.local)?
            .prop("headingTag", &format!("h{}", heading.level))?;
        self.headings.push(OutlineEntry {
            offset: self.output.len(),
            node: HeadingNode::new(heading.title, heading.local, heading.level),
        });
        self.output.push_str(&component.self_closing());
        Ok(())
    }

    fn end_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let index = self.code_block_index;
        self.code_block_index += 1;

        let language = lang.as_deref().unwrap_or("");
        let processed = self.processors.iter_mut().find_map(|processor| {
            match processor.process(language, &content, index) {
                ProcessResult::Inline(html) => Some(html),
                ProcessResult::PassThrough => None,
            }
        });

        match processed {
            Some(html) => self.output.push_str(&html),
            None => {
                let class = lang
                    .map(|lang| format!(r#" class="language-{}""#, escape_html(&lang)))
                    .unwrap_or_default();
                let code = self.escape(&content);
                self.output
                    .push_str(&format!("<pre><code{class}>{code}</code></pre>"));
            }
        }
    }

    fn image_tag(&mut self, src: &str, alt: &str, title: &str) {
        let mut tag = format!(
            r#"<img src="{}" alt="{}""#,
            self.escape(src),
            self.escape(alt)
        );
        if !title.is_empty() {
            tag.push_str(&format!(r#" title="{}""#, self.escape(title)));
        }
        tag.push('>');
        self.push_inline(&tag);
    }

    /// Push inline markup; headings keep only their text.
    fn push_inline(&mut self, content: &str) {
        if !self.heading.is_active() {
            self.output.push_str(content);
        }
    }

    /// HTML-escape text, also escaping `{` inside the body region.
    fn escape(&self, text: &str) -> String {
        if self.region.is_active() {
            region::escape_text(text)
        } else {
            escape_html(text)
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
        } else if let Some(is_start) = region::sentinel(text) {
            self.region.mark(is_start);
        } else {
            let escaped = self.escape(text);
            self.output.push_str(&escaped);
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.heading.is_active() {
            self.heading.push_text(code);
        } else {
            let escaped = self.escape(code);
            self.output.push_str(&format!("<code>{escaped}</code>"));
        }
    }

    fn raw_html(&mut self, html: &str) {
        if self.heading.is_active() {
            return;
        }
        if let Some(is_start) = region::sentinel(html) {
            self.region.mark(is_start);
            self.output.push_str(html);
        } else if self.region.is_active() {
            let escaped = region::escape_html_chunk(html, &self.known_tags);
            self.output.push_str(&escaped);
        } else {
            self.output.push_str(html);
        }
    }

    fn math(&mut self, tex: &str, display: bool) -> Result<(), RenderError> {
        if self.heading.is_active() {
            self.heading.push_text(tex);
            return Ok(());
        }
        let html = self
            .math
            .render(tex, display)
            .map_err(|source| RenderError::Math {
                tex: tex.to_owned(),
                source,
            })?;
        self.push_inline(&html);
        Ok(())
    }

    fn soft_break(&mut self) {
        if self.heading.is_active() {
            self.heading.push_text(" ");
        } else {
            self.output.push('\n');
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        if checked {
            self.output.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            self.output.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
