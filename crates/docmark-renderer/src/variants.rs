//! Multi-variant containers: framework tabs, option groups and language tabs.
//!
//! A container tag holds one sub-tag per variant. Each present variant body
//! is rendered through the fragment pipeline and placed in a named slot of
//! the emitted component; every declared variant also gets a boolean flag.

use futures::future::try_join_all;

use crate::component::{Component, slot};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::outline::HeadingNode;
use crate::pipeline::{Fragment, Pipeline};
use crate::region::BodyRegion;
use crate::tags::{TagKind, TagMatch, TagPattern};

/// A container tag with a fixed, ordered set of variant sub-tags.
#[derive(Clone, Copy, Debug)]
pub struct VariantFamily {
    pub container: TagKind,
    pub component: &'static str,
    /// Sub-tag and variant id, in emission order.
    pub variants: &'static [(TagKind, &'static str)],
}

pub const FRAMEWORK_CONTENT: VariantFamily = VariantFamily {
    container: TagKind::FrameworkContent,
    component: "FrameworkContent",
    variants: &[
        (TagKind::Pt, "pytorch"),
        (TagKind::Tf, "tensorflow"),
        (TagKind::Jax, "jax"),
    ],
};

pub const INFERENCE_SNIPPET: VariantFamily = VariantFamily {
    container: TagKind::InferenceSnippet,
    component: "InferenceSnippet",
    variants: &[
        (TagKind::Python, "python"),
        (TagKind::Js, "js"),
        (TagKind::Curl, "curl"),
    ],
};

pub const TOKENIZERS_LANG_CONTENT: VariantFamily = VariantFamily {
    container: TagKind::TokenizersLangContent,
    component: "TokenizersLanguageContent",
    variants: &[
        (TagKind::Python, "python"),
        (TagKind::Rust, "rust"),
        (TagKind::Node, "node"),
    ],
};

/// One variant of a container, alive for a single transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantRecord {
    pub variant_id: String,
    pub tag: TagKind,
    pub exists: bool,
    pub rendered_body: String,
}

impl VariantRecord {
    fn absent(tag: TagKind, variant_id: &str) -> Self {
        Self {
            variant_id: variant_id.to_owned(),
            tag,
            exists: false,
            rendered_body: String::new(),
        }
    }
}

/// Build the container component from rendered variants.
fn emit(mut component: Component, records: &[VariantRecord]) -> String {
    let slots: String = records
        .iter()
        .filter(|record| record.exists)
        .map(|record| slot(&record.variant_id, &record.rendered_body))
        .collect();
    for record in records {
        component = component.expr(&record.variant_id, if record.exists { "true" } else { "false" });
    }
    component.wrap(&slots)
}

/// Transform one container of a fixed family.
pub(crate) async fn transform_fixed(
    pipeline: &Pipeline,
    ctx: &RenderContext,
    family: VariantFamily,
    container: TagMatch,
    region: BodyRegion,
) -> Result<Fragment, RenderError> {
    let body = container.body.as_str();
    let rendered = try_join_all(family.variants.iter().map(|&(tag, variant_id)| async move {
        let Some(found) = TagPattern::new(tag).find(body) else {
            return Ok((VariantRecord::absent(tag, variant_id), None));
        };
        let region = region.advanced(&body[..found.range.start]);
        let fragment = pipeline.render_fragment(&found.body, ctx, region).await?;
        let record = VariantRecord {
            variant_id: variant_id.to_owned(),
            tag,
            exists: true,
            rendered_body: fragment.html,
        };
        Ok::<_, RenderError>((record, Some((found.range.start, fragment.headings))))
    }))
    .await?;
    let (records, mut nested): (Vec<VariantRecord>, Vec<_>) = rendered.into_iter().unzip();

    // Slots follow the declared order, the outline follows the source.
    nested.sort_by_key(|found| found.as_ref().map(|(start, _)| *start));
    let headings: Vec<HeadingNode> = nested
        .into_iter()
        .flatten()
        .flat_map(|(_, headings)| headings)
        .collect();

    tracing::debug!(
        component = family.component,
        present = records.iter().filter(|r| r.exists).count(),
        "Rendered variants"
    );
    Ok(Fragment {
        html: emit(Component::new(family.component), &records),
        headings,
    })
}

/// Transform an `<hfoptions id="...">` container.
///
/// Options are discovered from `<hfoption id="...">` sub-tags in first-seen
/// order; a repeated id keeps its first body.
pub(crate) async fn transform_options(
    pipeline: &Pipeline,
    ctx: &RenderContext,
    container: TagMatch,
    region: BodyRegion,
) -> Result<Fragment, RenderError> {
    let body = container.body.as_str();
    let mut options: Vec<TagMatch> = Vec::new();
    for option in TagPattern::with_id(TagKind::HfOption).matches(body) {
        if !options.iter().any(|seen| seen.id == option.id) {
            options.push(option);
        }
    }

    let rendered = try_join_all(options.iter().map(|option| async move {
        let region = region.advanced(&body[..option.range.start]);
        let fragment = pipeline.render_fragment(&option.body, ctx, region).await?;
        let record = VariantRecord {
            variant_id: option.id.clone().unwrap_or_default(),
            tag: TagKind::HfOption,
            exists: true,
            rendered_body: fragment.html,
        };
        Ok::<_, RenderError>((record, fragment.headings))
    }))
    .await?;
    let (records, headings): (Vec<VariantRecord>, Vec<Vec<HeadingNode>>) =
        rendered.into_iter().unzip();

    let ids: Vec<&str> = records.iter().map(|r| r.variant_id.as_str()).collect();
    let component = Component::new("HfOptions")
        .attr("id", container.id.as_deref().unwrap_or_default())
        .prop("options", &ids)?;
    let slots: String = records
        .iter()
        .map(|record| slot(&record.variant_id, &record.rendered_body))
        .collect();
    Ok(Fragment {
        html: component.wrap(&slots),
        headings: headings.into_iter().flatten().collect(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn run_fixed(family: VariantFamily, text: &str) -> String {
        let pipeline = Pipeline::new();
        let ctx = RenderContext::default();
        let container = TagPattern::new(family.container).find(text).unwrap();
        let fragment = transform_fixed(&pipeline, &ctx, family, container, BodyRegion::default())
            .await
            .unwrap();
        ctx.restore(&fragment.html)
    }

    #[tokio::test]
    async fn test_framework_content_only_pt() {
        let html = run_fixed(
            FRAMEWORK_CONTENT,
            "<frameworkcontent>\n<pt>\nUse **torch**.\n</pt>\n</frameworkcontent>",
        )
        .await;
        assert_eq!(
            html,
            "<FrameworkContent pytorch={true} tensorflow={false} jax={false}>\n\
             <svelte:fragment slot=\"pytorch\">\n<p>Use <strong>torch</strong>.</p>\n</svelte:fragment>\n\
             </FrameworkContent>"
        );
        assert_eq!(html.matches("<svelte:fragment").count(), 1);
    }

    #[tokio::test]
    async fn test_declared_order_not_source_order() {
        let html = run_fixed(
            INFERENCE_SNIPPET,
            "<inferencesnippet><curl>\nC\n</curl><python>\nP\n</python></inferencesnippet>",
        )
        .await;
        assert!(html.starts_with("<InferenceSnippet python={true} js={false} curl={true}>"));
        let python = html.find(r#"slot="python""#).unwrap();
        let curl = html.find(r#"slot="curl""#).unwrap();
        assert!(python < curl);
    }

    #[tokio::test]
    async fn test_tokenizers_language_content() {
        let html = run_fixed(
            TOKENIZERS_LANG_CONTENT,
            "<tokenizerslangcontent><rust>\nR\n</rust><node>\nN\n</node></tokenizerslangcontent>",
        )
        .await;
        assert!(html.starts_with(
            "<TokenizersLanguageContent python={false} rust={true} node={true}>"
        ));
    }

    #[tokio::test]
    async fn test_headings_follow_source_order() {
        let pipeline = Pipeline::new();
        let ctx = RenderContext::default();
        let text = "<frameworkcontent><tf>\n## Keras\n</tf><pt>\n## Torch\n</pt></frameworkcontent>";
        let container = TagPattern::new(TagKind::FrameworkContent).find(text).unwrap();
        let fragment = transform_fixed(&pipeline, &ctx, FRAMEWORK_CONTENT, container, BodyRegion::default())
            .await
            .unwrap();

        assert_eq!(
            fragment.headings,
            vec![HeadingNode::new("Keras", "keras", 2), HeadingNode::new("Torch", "torch", 2)]
        );
        // Slots still follow the declared order.
        assert!(fragment.html.find(r#"slot="pytorch""#) < fragment.html.find(r#"slot="tensorflow""#));
    }

    #[tokio::test]
    async fn test_nested_variants_are_rendered() {
        let text = "<frameworkcontent><pt>\n<inferencesnippet><js>\nJ\n</js></inferencesnippet>\n</pt></frameworkcontent>";
        let html = run_fixed(FRAMEWORK_CONTENT, text).await;
        assert!(html.contains("<InferenceSnippet python={false} js={true} curl={false}>"));
        assert!(html.contains("<p>J</p>"));
    }

    #[tokio::test]
    async fn test_options_first_seen_order() {
        let pipeline = Pipeline::new();
        let ctx = RenderContext::default();
        let text = concat!(
            "<hfoptions id=\"install\">\n",
            "<hfoption id=\"pip\">\nPIP\n</hfoption>\n",
            "<hfoption id=\"conda\">\nCONDA\n</hfoption>\n",
            "<hfoption id=\"pip\">\nAGAIN\n</hfoption>\n",
            "</hfoptions>"
        );
        let container = TagPattern::with_id(TagKind::HfOptions).find(text).unwrap();
        let html = transform_options(&pipeline, &ctx, container, BodyRegion::default())
            .await
            .unwrap()
            .html;

        assert!(html.starts_with(r#"<HfOptions id="install" options={["pip","conda"]}>"#));
        assert!(html.contains("<p>PIP</p>"));
        assert!(!html.contains("AGAIN"));
    }
}
