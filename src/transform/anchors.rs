//! Anchor link normalization.
//!
//! Once a document is imported, links such as `chapter01.html#heading`
//! point into content that lives inside the book, so only the fragment is
//! kept: `#heading`.

use crate::dom::{parse_html, serialize};

use super::Cleaner;
use super::is_relative_url;

/// Strip the file part of relative `<a href>` links that carry a fragment.
///
/// The source is cleaned first, parsed, every qualifying anchor rewritten
/// to `#fragment`, and the tree serialized back. Carriage return character
/// references (`&#xD;`) left in the output are dropped.
pub fn strip_files_from_anchors(source: &str, cleaner: &dyn Cleaner) -> String {
    let mut dom = parse_html(&cleaner.clean(source));

    let mut rewritten = 0usize;
    for anchor in dom.elements_by_local_name("a") {
        let Some(fragment) = dom.get_attr(anchor, "href").and_then(fragment_target) else {
            continue;
        };
        dom.set_attr(anchor, "href", &fragment);
        rewritten += 1;
    }

    tracing::debug!(rewritten, "Stripped file names from anchor links");

    serialize(&dom).replace("&#xD;", "").replace("&#xd;", "")
}

/// The `#fragment` a relative href should be reduced to, if any.
fn fragment_target(href: &str) -> Option<String> {
    if !is_relative_url(href) {
        return None;
    }
    let fragment = href.split('#').nth(1)?;
    Some(format!("#{fragment}"))
}

#[cfg(test)]
mod tests {
    use super::super::NoopCleaner;
    use super::*;

    #[test]
    fn test_fragment_target() {
        assert_eq!(fragment_target("chapter01.html#sec2").as_deref(), Some("#sec2"));
        assert_eq!(fragment_target("#local").as_deref(), Some("#local"));
        assert_eq!(fragment_target("../text/ch.xhtml#a#b").as_deref(), Some("#a"));
        assert_eq!(fragment_target("chapter01.html"), None);
        assert_eq!(fragment_target("http://example.com/page#frag"), None);
        assert_eq!(fragment_target("mailto:someone@example.com#x"), None);
    }

    #[test]
    fn test_relative_anchor_stripped() {
        let out = strip_files_from_anchors(
            r#"<p><a href="chapter01.html#sec2">Section 2</a></p>"#,
            &NoopCleaner,
        );
        assert!(out.contains(r##"<a href="#sec2">Section 2</a>"##), "{out}");
    }

    #[test]
    fn test_absolute_anchor_kept() {
        let out = strip_files_from_anchors(
            r#"<p><a href="http://example.com/page#frag">Elsewhere</a></p>"#,
            &NoopCleaner,
        );
        assert!(out.contains(r#"<a href="http://example.com/page#frag">"#), "{out}");
    }

    #[test]
    fn test_other_elements_untouched() {
        let out = strip_files_from_anchors(
            r#"<link href="style.css#x" rel="stylesheet"><a name="top">Top</a>"#,
            &NoopCleaner,
        );
        assert!(out.contains(r#"href="style.css#x""#), "{out}");
        assert!(out.contains(r#"<a name="top">Top</a>"#), "{out}");
    }

    #[test]
    fn test_carriage_return_references_removed() {
        let out = strip_files_from_anchors("<style>p{}&#xD;&#xd;</style>", &NoopCleaner);
        assert!(out.contains("<style>p{}</style>"), "{out}");
    }
}
