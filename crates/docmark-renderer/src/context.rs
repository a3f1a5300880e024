//! Per-document render state shared by the recursive passes.

use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;

use crate::outline::{HeadingNode, OutlineEntry};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--docmark-component-(\d+)-->").expect("invalid placeholder regex")
});

#[derive(Debug)]
struct Stashed {
    component: String,
    /// Headings rendered inside the component, in source order.
    headings: Vec<HeadingNode>,
}

/// State for one document render, threaded through every nested fragment.
///
/// Emitted components are stashed here and replaced by placeholder comments
/// while the surrounding Markdown is rendered, so region escaping and the
/// Markdown parser never see their props.
#[derive(Debug, Default)]
pub(crate) struct RenderContext {
    components: Mutex<Vec<Stashed>>,
    warnings: Mutex<Vec<String>>,
    wrap_code_blocks: bool,
}

impl RenderContext {
    pub(crate) fn new(wrap_code_blocks: bool) -> Self {
        Self {
            wrap_code_blocks,
            ..Self::default()
        }
    }

    pub(crate) fn wrap_code_blocks(&self) -> bool {
        self.wrap_code_blocks
    }

    /// Store `component` and return the placeholder standing in for it.
    pub(crate) fn stash(&self, component: String) -> String {
        self.stash_with_headings(component, Vec::new())
    }

    /// Store `component` along with the headings rendered inside it.
    pub(crate) fn stash_with_headings(&self, component: String, headings: Vec<HeadingNode>) -> String {
        let mut components = self.components.lock().unwrap_or_else(PoisonError::into_inner);
        components.push(Stashed {
            component,
            headings,
        });
        format!("<!--docmark-component-{}-->", components.len() - 1)
    }

    /// Merge `own` headings of `html` with those stashed behind its
    /// placeholders, ordered by position.
    pub(crate) fn collect_headings(&self, html: &str, own: Vec<OutlineEntry>) -> Vec<HeadingNode> {
        let components = self.components.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = own;
        for caps in PLACEHOLDER.captures_iter(html) {
            let Some(stashed) = caps[1].parse::<usize>().ok().and_then(|index| components.get(index))
            else {
                continue;
            };
            let offset = caps.get(0).map_or(0, |m| m.start());
            entries.extend(stashed.headings.iter().map(|node| OutlineEntry {
                offset,
                node: node.clone(),
            }));
        }
        entries.sort_by_key(|entry| entry.offset);
        entries.into_iter().map(|entry| entry.node).collect()
    }

    /// Replace placeholders in `html` with their components.
    pub(crate) fn restore(&self, html: &str) -> String {
        let components = self.components.lock().unwrap_or_else(PoisonError::into_inner);
        PLACEHOLDER
            .replace_all(html, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| components.get(index))
                    .map_or_else(|| caps[0].to_owned(), |stashed| stashed.component.clone())
            })
            .into_owned()
    }

    pub(crate) fn warn(&self, warning: String) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    pub(crate) fn extend_warnings(&self, warnings: Vec<String>) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(warnings);
    }

    pub(crate) fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
