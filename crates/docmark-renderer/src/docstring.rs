//! `<docstring>` blocks to `Docstring` components.
//!
//! The body carries a fixed set of sub-tags produced by the API-doc extractor.
//! `name`, `anchor` and `parameters` are mandatory; everything else is
//! optional. Parameter lists are rendered as Markdown and then harvested from
//! the resulting `<ul>` into one record per parameter.

use futures::future::try_join_all;
use serde::Serialize;

use crate::admonition;
use crate::component::Component;
use crate::context::RenderContext;
use crate::dom::{DomError, HtmlNode, parse_html};
use crate::error::RenderError;
use crate::pipeline::Pipeline;
use crate::region::BodyRegion;
use crate::tags::{TagKind, TagMatch, TagPattern};

/// One documented parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterDescription {
    /// `{docstring anchor}.{name}`
    pub anchor: String,
    pub name: String,
    /// Rendered HTML.
    pub description: String,
}

/// A titled group of parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroup {
    pub title: String,
    pub parameters_description: Vec<ParameterDescription>,
}

/// Structured content of one `<docstring>` block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocstringRecord {
    pub name: String,
    pub anchor: String,
    pub parameters_signature: String,
    pub parameters_description: Vec<ParameterDescription>,
    pub parameter_groups: Vec<ParameterGroup>,
    pub return_type: Option<String>,
    pub return_description: Option<String>,
    pub is_yield: bool,
    pub raise_type: Option<String>,
    pub raise_description: Option<String>,
    pub source: Option<String>,
    pub is_get_set_descriptor: bool,
}

impl DocstringRecord {
    /// Render as a `<Docstring ... />` invocation.
    pub fn to_component(&self) -> Result<String, serde_json::Error> {
        let mut component = Component::new("Docstring")
            .prop("name", &self.name)?
            .prop("anchor", &self.anchor)?
            .prop("parameters", &self.parameters_signature)?;
        if !self.parameters_description.is_empty() {
            component = component.prop("parametersDescription", &self.parameters_description)?;
        }
        if !self.parameter_groups.is_empty() {
            component = component.prop("parameterGroups", &self.parameter_groups)?;
        }
        let component = component
            .opt_prop("returnDescription", self.return_description.as_ref())?
            .opt_prop("returnType", self.return_type.as_ref())?
            .flag("isYield", self.is_yield)
            .opt_prop("raiseDescription", self.raise_description.as_ref())?
            .opt_prop("raiseType", self.raise_type.as_ref())?
            .opt_prop("source", self.source.as_ref())?
            .flag("isGetSetDescriptor", self.is_get_set_descriptor);
        Ok(component.self_closing())
    }
}

/// Undo the extractor's escaping of `{` and `<`.
fn decode_body(body: &str) -> String {
    body.replace("&amp;lcub;", "{").replace("&amp;lt;", "<")
}

fn field(body: &str, kind: TagKind) -> Option<String> {
    TagPattern::new(kind).find(body).map(|m| m.body.trim().to_owned())
}

/// Flags are bare opening tags with no body.
fn is_flag_set(body: &str, kind: TagKind) -> bool {
    body.contains(&format!("<{}>", kind.name()))
}

/// Shared state for the fragments of one docstring.
struct Fragments<'a> {
    pipeline: &'a Pipeline,
    ctx: &'a RenderContext,
    region: BodyRegion,
    anchor: &'a str,
}

impl Fragments<'_> {
    async fn render(&self, text: &str) -> Result<String, RenderError> {
        // Docstring headings stay out of the page outline.
        let fragment = self.pipeline.render_fragment(text, self.ctx, self.region).await?;
        Ok(fragment.html.trim().to_owned())
    }

    async fn optional(&self, body: &str, kind: TagKind) -> Result<Option<String>, RenderError> {
        match field(body, kind) {
            Some(text) => self.render(&text).await.map(Some),
            None => Ok(None),
        }
    }

    /// Render a parameter list and harvest its items.
    async fn parameters(&self, text: &str) -> Result<Vec<ParameterDescription>, RenderError> {
        // `}}` would close a template expression downstream.
        let text = text.replace("}}", "}&zwnj;}");
        let html = admonition::rewrite_inline(&self.render(&text).await?);

        match harvest_parameters(&html, self.anchor) {
            Ok(Some(params)) => Ok(params),
            Ok(None) => {
                tracing::debug!(anchor = self.anchor, "Parameter list has no <ul>");
                self.ctx
                    .warn(format!("{}: parameter list has no <ul>", self.anchor));
                Ok(Vec::new())
            }
            Err(err) => {
                tracing::warn!(anchor = self.anchor, error = %err, "Failed to parse parameter list");
                self.ctx
                    .warn(format!("{}: failed to parse parameter list: {err}", self.anchor));
                Ok(Vec::new())
            }
        }
    }

    async fn group(&self, body: &str, index: usize) -> Result<ParameterGroup, RenderError> {
        let title = field(body, TagKind::ParamGroupTitle(index)).unwrap_or_default();
        let parameters_description = match field(body, TagKind::ParamGroupDesc(index)) {
            Some(text) => self.parameters(&text).await?,
            None => Vec::new(),
        };
        Ok(ParameterGroup {
            title,
            parameters_description,
        })
    }
}

/// Parse a `<docstring>` match into a record.
pub(crate) async fn parse(
    pipeline: &Pipeline,
    ctx: &RenderContext,
    docstring: &TagMatch,
    region: BodyRegion,
) -> Result<DocstringRecord, RenderError> {
    let body = decode_body(&docstring.body);

    let anchor = field(&body, TagKind::Anchor);
    let name = field(&body, TagKind::Name);
    let context = anchor
        .clone()
        .or_else(|| name.clone())
        .unwrap_or_else(|| "an unnamed object".to_owned());
    let missing = |field: &'static str| RenderError::MissingField {
        field,
        context: context.clone(),
    };

    let name = name.ok_or_else(|| missing("name"))?.replace("\\_", "_");
    let anchor = anchor.ok_or_else(|| missing("anchor"))?;
    let parameters_signature = field(&body, TagKind::Parameters).ok_or_else(|| missing("parameters"))?;

    let fragments = Fragments {
        pipeline,
        ctx,
        region,
        anchor: &anchor,
    };

    let parameters_description = match field(&body, TagKind::ParamsDesc) {
        Some(text) => fragments.parameters(&text).await?,
        None => Vec::new(),
    };

    let group_count = field(&body, TagKind::ParamGroups)
        .and_then(|count| count.parse::<usize>().ok())
        .unwrap_or(0);
    let parameter_groups =
        try_join_all((1..=group_count).map(|index| fragments.group(&body, index))).await?;

    let is_yield = TagPattern::new(TagKind::YieldDesc).is_present(&body)
        || TagPattern::new(TagKind::YieldType).is_present(&body);
    let (description_tag, type_tag) = if is_yield {
        (TagKind::YieldDesc, TagKind::YieldType)
    } else {
        (TagKind::RetDesc, TagKind::RetType)
    };
    let return_description = fragments.optional(&body, description_tag).await?;
    let return_type = fragments.optional(&body, type_tag).await?;
    let raise_description = fragments.optional(&body, TagKind::Raises).await?;
    let raise_type = fragments.optional(&body, TagKind::RaisedErrors).await?;

    let record = DocstringRecord {
        parameters_description,
        parameter_groups,
        return_type,
        return_description,
        is_yield,
        raise_type,
        raise_description,
        source: field(&body, TagKind::Source),
        is_get_set_descriptor: is_flag_set(&body, TagKind::IsGetSetDescriptor),
        name,
        anchor,
        parameters_signature,
    };
    tracing::debug!(
        anchor = %record.anchor,
        parameters = record.parameters_description.len(),
        groups = record.parameter_groups.len(),
        "Parsed docstring"
    );
    Ok(record)
}

/// Transform a `<docstring>` match into a component invocation.
pub(crate) async fn transform(
    pipeline: &Pipeline,
    ctx: &RenderContext,
    docstring: TagMatch,
    region: BodyRegion,
) -> Result<String, RenderError> {
    let record = parse(pipeline, ctx, &docstring, region).await?;
    Ok(record.to_component()?)
}

/// Harvest parameters from the first `<ul>` of rendered HTML.
///
/// Returns `Ok(None)` when there is no list. Items without a bold lead term
/// are skipped.
pub fn harvest_parameters(
    html: &str,
    anchor: &str,
) -> Result<Option<Vec<ParameterDescription>>, DomError> {
    let root = parse_html(html)?;
    let Some(list) = root.elements_by_tag("ul").into_iter().next() else {
        return Ok(None);
    };
    Ok(Some(
        list.children()
            .iter()
            .filter(|item| item.tag().eq_ignore_ascii_case("li"))
            .filter_map(|item| describe_item(item, anchor))
            .collect(),
    ))
}

fn describe_item(item: &HtmlNode, anchor: &str) -> Option<ParameterDescription> {
    let name = item.elements_by_tag("strong").first()?.inner_text();
    let description = item.content_after_lead_term()?;
    Some(ParameterDescription {
        anchor: format!("{anchor}.{name}"),
        name,
        description,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn parse_text(text: &str) -> Result<DocstringRecord, RenderError> {
        let pipeline = Pipeline::new();
        let ctx = RenderContext::default();
        let docstring = TagPattern::new(TagKind::Docstring).find(text).unwrap();
        parse(&pipeline, &ctx, &docstring, BodyRegion::default()).await
    }

    #[tokio::test]
    async fn test_parameter_anchor_derivation() {
        let record = parse_text(
            "<docstring><name>foo</name><anchor>pkg.foo</anchor><parameters></parameters>\
             <paramsdesc>- **x** (`int`) -- desc</paramsdesc></docstring>",
        )
        .await
        .unwrap();

        assert_eq!(
            record.parameters_description,
            vec![ParameterDescription {
                anchor: "pkg.foo.x".to_owned(),
                name: "x".to_owned(),
                description: "desc".to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_mandatory_fields() {
        let err = parse_text("<docstring><name>foo</name><parameters></parameters></docstring>")
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingField { field: "anchor", .. }));
        assert_eq!(err.to_string(), "<anchor> is missing in <docstring> for foo");

        let err = parse_text("<docstring><name>foo</name><anchor>pkg.foo</anchor></docstring>")
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingField { field: "parameters", .. }));
    }

    #[tokio::test]
    async fn test_optional_fields() {
        let record = parse_text(concat!(
            "<docstring><name>my\\_fn</name><anchor>pkg.my_fn</anchor>",
            "<parameters>[{\"name\": \"x\"}]</parameters>",
            "<yieldesc>The **items**.</yieldesc><yieldtype>`int`</yieldtype>",
            "<raises>If broken.</raises><raisederrors>`ValueError`</raisederrors>",
            "<source>https://example.com/fn.py#L10</source>",
            "</docstring>"
        ))
        .await
        .unwrap();

        assert_eq!(record.name, "my_fn");
        assert_eq!(record.parameters_signature, r#"[{"name": "x"}]"#);
        assert!(record.is_yield);
        assert_eq!(record.return_description.as_deref(), Some("<p>The <strong>items</strong>.</p>"));
        assert_eq!(record.return_type.as_deref(), Some("<p><code>int</code></p>"));
        assert_eq!(record.raise_description.as_deref(), Some("<p>If broken.</p>"));
        assert_eq!(record.raise_type.as_deref(), Some("<p><code>ValueError</code></p>"));
        assert_eq!(record.source.as_deref(), Some("https://example.com/fn.py#L10"));
        assert!(!record.is_get_set_descriptor);
        assert!(record.parameters_description.is_empty());
    }

    #[tokio::test]
    async fn test_getset_descriptor_flag() {
        let record = parse_text(
            "<docstring><name>p</name><anchor>a.p</anchor><parameters></parameters>\
             <isgetsetdescriptor></docstring>",
        )
        .await
        .unwrap();
        assert!(record.is_get_set_descriptor);
    }

    #[tokio::test]
    async fn test_parameter_groups() {
        let record = parse_text(concat!(
            "<docstring><name>f</name><anchor>m.f</anchor><parameters></parameters>",
            "<paramgroups>2</paramgroups>",
            "<paramsdesc1title>Model</paramsdesc1title><paramsdesc1>- **a** -- first</paramsdesc1>",
            "<paramsdesc2title>Data</paramsdesc2title><paramsdesc2>- **b** -- second</paramsdesc2>",
            "</docstring>"
        ))
        .await
        .unwrap();

        assert_eq!(record.parameter_groups.len(), 2);
        assert_eq!(record.parameter_groups[0].title, "Model");
        assert_eq!(record.parameter_groups[0].parameters_description[0].anchor, "m.f.a");
        assert_eq!(record.parameter_groups[1].title, "Data");
        assert_eq!(record.parameter_groups[1].parameters_description[0].description, "second");
    }

    #[tokio::test]
    async fn test_list_without_ul_degrades() {
        let pipeline = Pipeline::new();
        let ctx = RenderContext::default();
        let text = "<docstring><name>f</name><anchor>m.f</anchor><parameters></parameters>\
                    <paramsdesc>Just prose.</paramsdesc></docstring>";
        let docstring = TagPattern::new(TagKind::Docstring).find(text).unwrap();
        let record = parse(&pipeline, &ctx, &docstring, BodyRegion::default())
            .await
            .unwrap();

        assert!(record.parameters_description.is_empty());
        assert_eq!(ctx.take_warnings(), vec!["m.f: parameter list has no <ul>"]);
    }

    #[tokio::test]
    async fn test_escaped_body_is_decoded() {
        let record = parse_text(
            "<docstring><name>f</name><anchor>m.f</anchor><parameters>&amp;lcub;a: &amp;lt;b}</parameters></docstring>",
        )
        .await
        .unwrap();
        assert_eq!(record.parameters_signature, "{a: <b}");
    }

    #[test]
    fn test_harvest_loose_list_with_tip() {
        let html = concat!(
            "<ul><li><p><strong>x</strong> (<code>int</code>) -- The value.</p></li>",
            "<li><p>no lead term</p></li>",
            "<li><strong>y</strong> — other <em>text</em></li></ul>",
            "<ul><li><strong>z</strong></li></ul>"
        );
        let params = harvest_parameters(html, "a").unwrap().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].description, "The value.");
        assert_eq!(params[1].anchor, "a.y");
        assert_eq!(params[1].description, "other <em>text</em>");
    }

    #[test]
    fn test_harvest_without_list() {
        assert_eq!(harvest_parameters("<p>none</p>", "a").unwrap(), None);
    }

    #[tokio::test]
    async fn test_type_annotation_with_parentheses() {
        let record = parse_text(
            "<docstring><name>resize</name><anchor>pkg.resize</anchor><parameters></parameters>\
             <paramsdesc>- **size** (`Tuple(int)`, *optional*, defaults to `(224, 224)`) -- The size.\
             </paramsdesc></docstring>",
        )
        .await
        .unwrap();

        assert_eq!(
            record.parameters_description,
            vec![ParameterDescription {
                anchor: "pkg.resize.size".to_owned(),
                name: "size".to_owned(),
                description: "The size.".to_owned(),
            }]
        );
    }

    #[test]
    fn test_component_output() {
        let record = DocstringRecord {
            name: "f".to_owned(),
            anchor: "m.f".to_owned(),
            parameters_signature: "[]".to_owned(),
            parameters_description: vec![ParameterDescription {
                anchor: "m.f.x".to_owned(),
                name: "x".to_owned(),
                description: "<b>d</b>".to_owned(),
            }],
            return_type: Some("int".to_owned()),
            ..DocstringRecord::default()
        };
        assert_eq!(
            record.to_component().unwrap(),
            concat!(
                r#"<Docstring name={"f"} anchor={"m.f"} parameters={"[]"}"#,
                r#" parametersDescription={[{"anchor":"m.f.x","name":"x","description":"\u003cb\u003ed\u003c/b\u003e"}]}"#,
                r#" returnType={"int"} />"#
            )
        );
    }
}
