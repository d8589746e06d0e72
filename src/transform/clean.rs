//! Markup sanitizing.

use crate::dom::{ArenaDom, ArenaNodeData, parse_html, processing_instruction, serialize_node};

/// XML declaration written at the top of cleaned documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#;

/// DOCTYPE written at the top of cleaned documents.
pub const XHTML_DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#;

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Turns arbitrary, possibly malformed, HTML into well-formed markup.
pub trait Cleaner: Send + Sync {
    fn clean(&self, source: &str) -> String;
}

/// Rewrites HTML as well-formed XHTML 1.1.
///
/// Parsing repairs unclosed and misnested tags; the document is then
/// serialized with an XML declaration, the XHTML 1.1 DOCTYPE and the XHTML
/// namespace on the root element. Existing DOCTYPEs and XML declarations are
/// replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct XhtmlCleaner;

impl Cleaner for XhtmlCleaner {
    fn clean(&self, source: &str) -> String {
        let mut dom = parse_html(source);
        if let Some(html) = dom.find_by_tag("html") {
            dom.set_attr(html, "xmlns", XHTML_NAMESPACE);
        }

        let mut out = String::with_capacity(source.len() + 256);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        out.push_str(XHTML_DOCTYPE);
        out.push('\n');
        write_document_body(&dom, &mut out);
        out
    }
}

/// Leaves markup untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

impl Cleaner for NoopCleaner {
    fn clean(&self, source: &str) -> String {
        source.to_string()
    }
}

/// Serialize document-level nodes except the prolog (DOCTYPE and XML declaration).
fn write_document_body(dom: &ArenaDom, out: &mut String) {
    for child in dom.children(dom.document()) {
        let is_prolog = dom.get(child).is_some_and(|n| match &n.data {
            ArenaNodeData::Doctype { .. } => true,
            ArenaNodeData::Comment(text) => processing_instruction(text).is_some(),
            _ => false,
        });
        if !is_prolog {
            out.push_str(&serialize_node(dom, child));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_produces_xhtml() {
        let cleaned = XhtmlCleaner.clean("<title>T</title><p>one<p>two<br>");
        assert!(cleaned.starts_with(XML_DECLARATION));
        assert!(cleaned.contains(XHTML_DOCTYPE));
        assert!(cleaned.contains(r#"<html xmlns="http://www.w3.org/1999/xhtml">"#), "{cleaned}");
        assert!(cleaned.contains("<p>one</p><p>two<br/></p>"), "{cleaned}");
    }

    #[test]
    fn test_clean_replaces_prolog() {
        let source = r#"<?xml version="1.0"?><!DOCTYPE html><html><body><p>x</p></body></html>"#;
        let cleaned = XhtmlCleaner.clean(source);
        assert_eq!(cleaned.matches("<?xml").count(), 1);
        assert_eq!(cleaned.matches("<!DOCTYPE").count(), 1);
    }

    #[test]
    fn test_clean_is_stable() {
        let once = XhtmlCleaner.clean("<p>a &amp; b<img src='i.png'>");
        let twice = XhtmlCleaner.clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_is_stable_with_raw_text() {
        let once = XhtmlCleaner.clean("<body><noscript><p>A &amp; B</p></noscript></body>");
        let twice = XhtmlCleaner.clean(&once);
        let thrice = XhtmlCleaner.clean(&twice);
        assert!(once.contains("<noscript><p>A &amp; B</p></noscript>"), "{once}");
        assert_eq!(once, thrice);
    }

    #[test]
    fn test_clean_declares_svg_namespace() {
        let cleaned = XhtmlCleaner.clean(r#"<p><svg><image xlink:href="a.png"/></svg></p>"#);
        assert!(cleaned.contains(r#"<svg xmlns="http://www.w3.org/2000/svg">"#), "{cleaned}");
        assert!(cleaned.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#), "{cleaned}");
        assert_eq!(XhtmlCleaner.clean(&cleaned), cleaned);
    }

    #[test]
    fn test_noop_cleaner() {
        assert_eq!(NoopCleaner.clean("<p>x"), "<p>x");
    }
}
