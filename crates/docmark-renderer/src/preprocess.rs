//! Source clean-up applied before the tag passes.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static DOCTEST_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(>>>.*\S)[ \t]+# doctest:[ \t]+\+[A-Z_]+[ \t]*$")
        .expect("invalid doctest flag regex")
});

static IMAGE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(src="|\()/imgs/"#).expect("invalid image link regex"));

/// Where a page is published; used to rewrite repository-relative links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub package_name: String,
    pub version: String,
    pub language: String,
}

impl PageInfo {
    /// Page info for the `main` version in English.
    #[must_use]
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: "main".to_owned(),
            language: "en".to_owned(),
        }
    }
}

/// Remove doctest artifacts.
///
/// `>>> # ===PT-TF-SPLIT===` becomes the bare split marker and trailing
/// `# doctest: +FLAG` comments are dropped from prompt lines.
#[must_use]
pub fn clean_doctest_syntax(text: &str) -> Cow<'_, str> {
    let text = if text.contains(">>> # ===PT-TF-SPLIT===") {
        Cow::Owned(text.replace(">>> # ===PT-TF-SPLIT===", "===PT-TF-SPLIT==="))
    } else {
        Cow::Borrowed(text)
    };
    if !DOCTEST_FLAG.is_match(&text) {
        return text;
    }
    Cow::Owned(DOCTEST_FLAG.replace_all(&text, "${1}").into_owned())
}

/// Point `/imgs/...` links at the published documentation path.
#[must_use]
pub fn rewrite_image_links<'t>(text: &'t str, page: &PageInfo) -> Cow<'t, str> {
    let replacement = format!(
        "${{1}}/docs/{}/{}/{}/imgs/",
        page.package_name, page.version, page.language
    );
    IMAGE_LINK.replace_all(text, replacement.as_str())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_clean_doctest_split_marker() {
        let text = "```py\n>>> a = 1\n>>> # ===PT-TF-SPLIT===\n>>> b = 2\n```";
        assert_eq!(
            clean_doctest_syntax(text),
            "```py\n>>> a = 1\n===PT-TF-SPLIT===\n>>> b = 2\n```"
        );
    }

    #[test]
    fn test_clean_doctest_flags() {
        let text = ">>> print(x)  # doctest: +SKIP\n>>> y  # doctest: +NORMALIZE_WHITESPACE\nout";
        assert_eq!(clean_doctest_syntax(text), ">>> print(x)\n>>> y\nout");
    }

    #[test]
    fn test_clean_doctest_untouched() {
        let text = "# doctest: +SKIP outside prompt";
        assert!(matches!(clean_doctest_syntax(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_image_links() {
        let page = PageInfo::new("transformers");
        let text = r#"![img](/imgs/a.png) <img src="/imgs/b.png"> /imgs/c.png"#;
        assert_eq!(
            rewrite_image_links(text, &page),
            r#"![img](/docs/transformers/main/en/imgs/a.png) <img src="/docs/transformers/main/en/imgs/b.png"> /imgs/c.png"#
        );
    }
}
