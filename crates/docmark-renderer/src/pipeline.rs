//! Whole-document conversion.
//!
//! A document goes through source clean-up, the tag passes (each one a
//! [`substitute`] over a tag family), Markdown rendering and placeholder
//! restoration. Variant and docstring transforms re-enter the same passes for
//! their nested content through [`Pipeline::render_fragment`].

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::code_split::{CodeSplitProcessor, WRAP_MARKER};
use crate::component::to_attr_json;
use crate::context::RenderContext;
use crate::docstring;
use crate::error::RenderError;
use crate::highlight::{ArboriumHighlighter, Highlighter};
use crate::include::expand_includes;
use crate::math::{MathRenderer, PlainMath};
use crate::outline::{DocumentMetadata, HeadingNode, OutlineBuilder};
use crate::preprocess::{PageInfo, clean_doctest_syntax, rewrite_image_links};
use crate::region::{BodyRegion, KnownTags};
use crate::renderer::{MarkdownRenderer, RenderResult};
use crate::substitute::substitute;
use crate::tags::{TagKind, TagPattern};
use crate::variants::{self, FRAMEWORK_CONTENT, INFERENCE_SNIPPET, TOKENIZERS_LANG_CONTENT, VariantFamily};

/// A converted document.
#[derive(Clone, Debug)]
pub struct Document {
    /// Component markup, starting with the metadata script.
    pub html: String,
    pub metadata: DocumentMetadata,
    /// Soft-degrade notices; the document was still converted.
    pub warnings: Vec<String>,
}

/// Rendered nested content and the headings found in it.
#[derive(Debug, Default)]
pub(crate) struct Fragment {
    pub(crate) html: String,
    pub(crate) headings: Vec<HeadingNode>,
}

/// Document converter.
///
/// Cheap to clone; the collaborators are shared behind `Arc`s and only read.
#[derive(Clone)]
pub struct Pipeline {
    known_tags: Arc<KnownTags>,
    highlighter: Arc<dyn Highlighter>,
    math: Arc<dyn MathRenderer>,
    page: Option<PageInfo>,
    base_dir: PathBuf,
    gfm: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline with standard known tags, arborium highlighting and
    /// client-side math.
    #[must_use]
    pub fn new() -> Self {
        Self {
            known_tags: Arc::new(KnownTags::standard()),
            highlighter: Arc::new(ArboriumHighlighter),
            math: Arc::new(PlainMath),
            page: None,
            base_dir: PathBuf::new(),
            gfm: true,
        }
    }

    #[must_use]
    pub fn with_known_tags(mut self, known_tags: KnownTags) -> Self {
        self.known_tags = Arc::new(known_tags);
        self
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    #[must_use]
    pub fn with_math(mut self, math: Arc<dyn MathRenderer>) -> Self {
        self.math = math;
        self
    }

    /// Publication info; enables `/imgs/` link rewriting.
    #[must_use]
    pub fn with_page(mut self, page: PageInfo) -> Self {
        self.page = Some(page);
        self
    }

    /// Directory `<literalinclude>` paths are resolved against; defaults to
    /// the working directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Convert a whole document.
    ///
    /// Fatal errors (missing docstring fields, math errors, unresolvable
    /// includes) abort the conversion and no output is produced.
    pub async fn render_document(&self, source: &str) -> Result<Document, RenderError> {
        let source = expand_includes(source, &self.base_dir).await?;
        let source = self.clean(&source);
        let ctx = RenderContext::new(source.contains(WRAP_MARKER));

        let text = self
            .apply_tag_passes(&source, &ctx, BodyRegion::default())
            .await?;
        let result = self.render_markdown(&text, &ctx, BodyRegion::default())?;

        let headings = ctx.collect_headings(&result.html, result.headings);
        let metadata = DocumentMetadata::from_outline(OutlineBuilder::build(headings));
        let script = format!(
            r#"<script context="module">export const metadata = {};</script>"#,
            to_attr_json(&metadata)?
        );
        let html = format!("{script}\n{}", ctx.restore(&result.html));

        let mut warnings = ctx.take_warnings();
        warnings.extend(result.warnings);
        tracing::debug!(
            sections = metadata.sections.len(),
            warnings = warnings.len(),
            "Rendered document"
        );

        Ok(Document {
            html,
            metadata,
            warnings,
        })
    }

    fn clean(&self, source: &str) -> String {
        let cleaned = clean_doctest_syntax(source);
        match &self.page {
            Some(page) => rewrite_image_links(&cleaned, page).into_owned(),
            None => cleaned.into_owned(),
        }
    }

    /// Run the tag passes and Markdown rendering over nested content.
    ///
    /// `region` is the body-region state at the start of `text`.
    pub(crate) fn render_fragment<'a>(
        &'a self,
        text: &'a str,
        ctx: &'a RenderContext,
        region: BodyRegion,
    ) -> BoxFuture<'a, Result<Fragment, RenderError>> {
        Box::pin(async move {
            let text = self.apply_tag_passes(text, ctx, region).await?;
            let result = self.render_markdown(&text, ctx, region)?;
            ctx.extend_warnings(result.warnings);
            Ok(Fragment {
                headings: ctx.collect_headings(&result.html, result.headings),
                html: ctx.restore(&result.html),
            })
        })
    }

    /// Replace every recognized tag with a component placeholder.
    async fn apply_tag_passes(
        &self,
        text: &str,
        ctx: &RenderContext,
        region: BodyRegion,
    ) -> Result<String, RenderError> {
        let text = substitute(text, &TagPattern::new(TagKind::Docstring), |m| {
            let region = region.advanced(&text[..m.range.start]);
            async move {
                docstring::transform(self, ctx, m, region)
                    .await
                    .map(|component| ctx.stash(component))
            }
        })
        .await?;

        let text = self.variant_pass(&text, ctx, region, FRAMEWORK_CONTENT).await?;

        let text = substitute(&text, &TagPattern::with_id(TagKind::HfOptions), |m| {
            let region = region.advanced(&text[..m.range.start]);
            async move {
                variants::transform_options(self, ctx, m, region)
                    .await
                    .map(|fragment| ctx.stash_with_headings(fragment.html, fragment.headings))
            }
        })
        .await?;

        let text = self.variant_pass(&text, ctx, region, INFERENCE_SNIPPET).await?;
        self.variant_pass(&text, ctx, region, TOKENIZERS_LANG_CONTENT)
            .await
    }

    async fn variant_pass(
        &self,
        text: &str,
        ctx: &RenderContext,
        region: BodyRegion,
        family: VariantFamily,
    ) -> Result<String, RenderError> {
        substitute(text, &TagPattern::new(family.container), |m| {
            let region = region.advanced(&text[..m.range.start]);
            async move {
                variants::transform_fixed(self, ctx, family, m, region)
                    .await
                    .map(|fragment| ctx.stash_with_headings(fragment.html, fragment.headings))
            }
        })
        .await
    }

    fn render_markdown(
        &self,
        text: &str,
        ctx: &RenderContext,
        region: BodyRegion,
    ) -> Result<RenderResult, RenderError> {
        MarkdownRenderer::new()
            .with_gfm(self.gfm)
            .with_known_tags(Arc::clone(&self.known_tags))
            .with_math(Arc::clone(&self.math))
            .with_region(region)
            .with_processor(CodeSplitProcessor::new(
                Arc::clone(&self.highlighter),
                ctx.wrap_code_blocks(),
            ))
            .render_markdown(text)
    }
}
