//! Asynchronous find-and-replace over tag matches.

use std::future::Future;
use std::ops::Range;

use futures::future::try_join_all;

use crate::tags::{TagMatch, TagPattern};

/// Replace every match of `pattern` in `text` with the output of `transform`.
///
/// All matches are collected first, their transforms resolve concurrently, and
/// the replacements are spliced back in source order regardless of the order
/// in which they complete. Text outside the matches is copied unchanged. The
/// first failing transform fails the whole substitution.
pub async fn substitute<F, Fut, E>(text: &str, pattern: &TagPattern, transform: F) -> Result<String, E>
where
    F: FnMut(TagMatch) -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    let matches = pattern.find_all(text);
    if matches.is_empty() {
        return Ok(text.to_owned());
    }

    tracing::debug!(tag = %pattern.kind().name(), count = matches.len(), "Substituting tags");

    let ranges: Vec<Range<usize>> = matches.iter().map(|m| m.range.clone()).collect();
    let replacements = try_join_all(matches.into_iter().map(transform)).await?;

    Ok(splice(text, &ranges, &replacements))
}

/// Replace `ranges` of `text` (sorted, non-overlapping) with `replacements`.
fn splice(text: &str, ranges: &[Range<usize>], replacements: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, replacement) in ranges.iter().zip(replacements) {
        out.push_str(&text[last..range.start]);
        out.push_str(replacement);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tags::TagKind;

    async fn delayed_upper(m: TagMatch, delay_ms: u64) -> Result<String, String> {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(m.body.to_uppercase())
    }

    #[tokio::test]
    async fn test_no_matches_returns_text() {
        let pattern = TagPattern::new(TagKind::Pt);
        let result = substitute(
            "plain text",
            &pattern,
            |m: TagMatch| async move { Ok::<_, String>(m.body) },
        )
        .await
        .unwrap();
        assert_eq!(result, "plain text");
    }

    #[tokio::test]
    async fn test_splices_in_source_order_under_permuted_delays() {
        let pattern = TagPattern::new(TagKind::Pt);
        let text = "a <pt>one</pt> b <pt>two</pt> c <pt>three</pt> d";
        let expected = "a ONE b TWO c THREE d";

        for delays in [[30, 10, 20], [10, 20, 30], [30, 20, 10], [20, 30, 10]] {
            let mut index = 0;
            let result = substitute(text, &pattern, |m| {
                let delay = delays[index];
                index += 1;
                delayed_upper(m, delay)
            })
            .await
            .unwrap();
            assert_eq!(result, expected, "delays {delays:?}");
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_substitution() {
        let pattern = TagPattern::new(TagKind::Pt);
        let text = "<pt>ok</pt><pt>bad</pt>";
        let result = substitute(text, &pattern, |m| async move {
            if m.body == "bad" {
                Err(format!("cannot transform {}", m.body))
            } else {
                Ok(m.body)
            }
        })
        .await;
        assert_eq!(result, Err("cannot transform bad".to_owned()));
    }

    #[test]
    fn test_splice_keeps_surrounding_text() {
        let out = splice("0123456789", &[1..3, 6..8], &["a".to_owned(), "b".to_owned()]);
        assert_eq!(out, "0a345b89");
    }
}
