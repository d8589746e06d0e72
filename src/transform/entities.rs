//! Custom entity resolution.
//!
//! Documents exported by some editors declare text macros in the DOCTYPE's
//! internal subset:
//!
//! ```text
//! <!DOCTYPE html [
//!   <!ENTITY publisher "Example Press">
//! ]>
//! ```
//!
//! HTML parsers do not understand these, so they are expanded textually
//! before anything else looks at the document.

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<!ENTITY\s+(\w+)\s+"([^"]+)">"#).unwrap());
static ENTITY_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(\w+);").unwrap());
static EMPTY_INTERNAL_SUBSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*\]>").unwrap());

/// Expand `<!ENTITY name "value">` declarations.
///
/// Declarations are removed from the text, then every `&name;` of a
/// declared entity is replaced by its value in a single pass. Values are
/// not re-scanned, so entities never expand recursively. References to
/// undeclared entities are left alone. When a name is declared twice, the
/// later declaration wins.
///
/// The `[ ]>` left behind by an emptied internal subset is removed too.
pub fn resolve_custom_entities(html_source: &str) -> String {
    let mut source = html_source.to_string();
    let mut entities: HashMap<String, String> = HashMap::new();

    let mut cursor = 0;
    while let Some((whole, name, value)) = next_declaration(&source, cursor) {
        entities.insert(name, value);

        cursor = whole.start;
        source.replace_range(whole, "");
    }

    if !entities.is_empty() {
        tracing::debug!(count = entities.len(), "Resolving custom entities");
        source = ENTITY_REFERENCE
            .replace_all(&source, |caps: &Captures| match entities.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned();
    }

    EMPTY_INTERNAL_SUBSET.replace_all(&source, "").into_owned()
}

fn next_declaration(source: &str, from: usize) -> Option<(Range<usize>, String, String)> {
    let caps = ENTITY_DECLARATION.captures_at(source, from)?;
    let whole = caps.get(0)?.range();
    Some((whole, caps[1].to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn prop_text_without_declarations_unchanged(s in "[^\\[<]*") {
            prop_assert_eq!(resolve_custom_entities(&s), s);
        }

        #[test]
        fn prop_declared_entity_expands(
            name in "[a-z][a-z0-9_]{0,7}",
            value in "[A-Za-z ,.]{1,16}",
            body in "[A-Za-z <>/p]{0,32}",
        ) {
            let source = format!("<!DOCTYPE html [<!ENTITY {name} \"{value}\">]>{body}&{name};");
            let expected = format!("<!DOCTYPE html {body}{value}");
            prop_assert_eq!(resolve_custom_entities(&source), expected);
        }
    }

    #[test]
    fn test_declaration_and_marker_removed() {
        let source = r#"<!ENTITY foo "bar">[ ]>Hello &foo;!"#;
        assert_eq!(resolve_custom_entities(source), "Hello bar!");
    }

    #[test]
    fn test_doctype_internal_subset() {
        let source = r#"<!DOCTYPE html [
  <!ENTITY pub "Example Press">
  <!ENTITY year "2009">
]><p>&pub;, &year;</p>"#;
        let resolved = resolve_custom_entities(source);
        assert!(resolved.ends_with("<p>Example Press, 2009</p>"), "{resolved}");
        assert!(!resolved.contains("ENTITY"));
    }

    #[test]
    fn test_no_declarations_unchanged() {
        let source = "<p>Tom &amp; Jerry &copy; 1940</p>";
        assert_eq!(resolve_custom_entities(source), source);
    }

    #[test]
    fn test_stray_marker_removed_without_declarations() {
        assert_eq!(resolve_custom_entities("a[  \n ]>b"), "ab");
    }

    #[test]
    fn test_no_recursive_expansion() {
        let source = r#"<!ENTITY a "&b;"><!ENTITY b "B">[]>&a;|&b;"#;
        assert_eq!(resolve_custom_entities(source), "&b;|B");
    }

    #[test]
    fn test_unknown_entities_untouched() {
        let source = r#"<!ENTITY x "X">[]>&x;&nbsp;&y;"#;
        assert_eq!(resolve_custom_entities(source), "X&nbsp;&y;");
    }

    #[test]
    fn test_later_declaration_wins() {
        let source = r#"<!ENTITY x "1"><!ENTITY x "2">[]>&x;"#;
        assert_eq!(resolve_custom_entities(source), "2");
    }
}
