//! Documentation markup compiler.
//!
//! Converts Markdown sources enriched with pseudo-XML tags (`<docstring>`,
//! `<frameworkcontent>`, `<hfoptions>` and friends) into component markup
//! for a Svelte documentation frontend.
//!
//! # Architecture
//!
//! A [`Pipeline`] runs a document through:
//! - source clean-up: `<literalinclude>` expansion, doctest flags, `/imgs/`
//!   links
//! - tag passes: each recognized tag is transformed into a component and
//!   replaced by a placeholder; nested bodies re-enter the passes
//! - Markdown rendering with [`MarkdownRenderer`], which emits `Heading`
//!   components, builds the outline, escapes the body region and hands code
//!   blocks to a [`CodeBlockProcessor`]
//! - placeholder restoration and the metadata script
//!
//! Syntax highlighting (arborium by default) and math are pluggable through
//! [`Highlighter`] and [`MathRenderer`].
//!
//! # Example
//!
//! ```
//! use docmark_renderer::Pipeline;
//!
//! let source = "# Quick tour\n\n<frameworkcontent><pt>\nUse **torch**.\n</pt></frameworkcontent>";
//! let doc = futures::executor::block_on(Pipeline::new().render_document(source))?;
//!
//! assert_eq!(doc.metadata.title.as_deref(), Some("Quick tour"));
//! assert!(doc.html.contains("<FrameworkContent pytorch={true}"));
//! # Ok::<(), docmark_renderer::RenderError>(())
//! ```

mod admonition;
mod code_block;
mod code_split;
mod component;
mod context;
mod docstring;
mod dom;
mod error;
mod highlight;
mod include;
mod math;
mod outline;
mod pipeline;
mod preprocess;
mod region;
mod renderer;
mod state;
mod substitute;
mod tags;
mod variants;

pub use admonition::{AdmonitionKind, rewrite_inline};
pub use code_block::{CodeBlockProcessor, ProcessResult};
pub use code_split::{CodeSplitProcessor, SplitSelection, WRAP_MARKER, filter_prompts};
pub use component::to_attr_json;
pub use docstring::{DocstringRecord, ParameterDescription, ParameterGroup, harvest_parameters};
pub use dom::{DomError, HtmlNode, parse_html};
pub use error::RenderError;
pub use highlight::{ArboriumHighlighter, EscapeHighlighter, Highlighter};
pub use math::{MathError, MathRenderer, PlainMath};
pub use outline::{
    DocumentMetadata, HeadingNode, OutlineBuilder, OutlineEntry, slugify, split_explicit_slug,
};
pub use pipeline::{Document, Pipeline};
pub use preprocess::{PageInfo, clean_doctest_syntax, rewrite_image_links};
pub use region::{
    BODY_END_COMMENT, BODY_END_TOKEN, BODY_START_COMMENT, BODY_START_TOKEN, BodyRegion,
    DiscoveryError, KnownTags,
};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::escape_html;
pub use substitute::substitute;
pub use tags::{TagKind, TagMatch, TagPattern};
pub use variants::{
    FRAMEWORK_CONTENT, INFERENCE_SNIPPET, TOKENIZERS_LANG_CONTENT, VariantFamily, VariantRecord,
};
