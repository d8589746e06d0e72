//! Collection of the resources a document references.

use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

use once_cell::sync::Lazy;
use quick_xml::escape::{escape, unescape};
use regex::Regex;

use crate::book::ContentFolder;
use crate::error::{Error, Result};
use crate::util::{MediaFormat, decode_html, detect_media_format, resolve_relative_path};

use super::is_relative_url;
use super::references::update_references;

/// `<img ... src="...">` or `<link ... href="...">`, capturing the reference.
static RESOURCE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:<\s*(?i:img)[^>]*src\s*=\s*|<\s*(?i:link)[^>]*href\s*=\s*)"([^">]+)"[^>]*>"#,
    )
    .unwrap()
});

/// Copy referenced resources into `folder` and point the document at them.
///
/// Every `<img src>` and `<link href>` reference is resolved against
/// `base_dir`. Stylesheets (CSS and XPGT) replace their `<link>` tag with an
/// inline `<style>` block. Anything else is added to the content folder and
/// all references to it are rewritten to `../<assigned name>`.
///
/// References with a URL scheme (`http:`, `data:`, ...) are left alone.
pub fn load_folder_structure(
    mut source: String,
    base_dir: &Path,
    folder: &mut ContentFolder,
) -> Result<String> {
    let mut produced: HashSet<String> = HashSet::new();
    let mut cursor = 0;

    while let Some((whole, reference)) = next_reference(&source, cursor) {
        if produced.contains(&reference) {
            cursor = whole.end;
            continue;
        }
        if !is_relative_url(&reference) {
            tracing::debug!(reference = %reference, "Skipping non-local resource");
            cursor = whole.end;
            continue;
        }

        // Attribute values arrive XML-escaped from serialization
        let unescaped = unescape(&reference).unwrap_or(Cow::Borrowed(reference.as_str()));
        let decoded = percent_encoding::percent_decode_str(&unescaped).decode_utf8_lossy();
        let path = resolve_relative_path(base_dir, &decoded);
        let format = detect_media_format(&path.to_string_lossy(), &[]);

        if format.is_stylesheet() {
            let style = create_style_tag(&path, format)?;
            tracing::debug!(path = %path.display(), "Inlined stylesheet");
            source.replace_range(whole.clone(), &style);
            cursor = whole.start + style.len();
        } else {
            let name = folder
                .add_content_file(&path)
                .map_err(|source| Error::Resource {
                    path: path.clone(),
                    source,
                })?;
            let new_path = escape(format!("../{name}")).into_owned();
            let rewrite = update_references(&mut source, &reference, &new_path)?;
            cursor = rewrite.map_offset(whole.end);
            produced.insert(new_path);
        }
    }

    Ok(source)
}

fn next_reference(source: &str, from: usize) -> Option<(Range<usize>, String)> {
    let caps = RESOURCE_REFERENCE.captures_at(source, from)?;
    let whole = caps.get(0)?.range();
    Some((whole, caps[1].to_string()))
}

/// Build a `<style>` block holding the contents of a stylesheet file.
pub fn create_style_tag(path: &Path, format: MediaFormat) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::Resource {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = decode_html(&bytes);

    let style_type = match format {
        MediaFormat::Xpgt => MediaFormat::Xpgt.mime_type(),
        _ => MediaFormat::Css.mime_type(),
    };

    Ok(format!(
        "<style type=\"{style_type}\">\n{contents}\n</style>\n"
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn fixture_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/cover.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        fs::write(dir.path().join("style.css"), "p { margin: 0 }").unwrap();
        fs::write(dir.path().join("template.xpgt"), "<ade:template/>").unwrap();
        dir
    }

    #[test]
    fn test_css_link_inlined() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source = r#"<head><link rel="stylesheet" href="style.css" type="text/css"/></head>"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(
            out,
            "<head><style type=\"text/css\">\np { margin: 0 }\n</style>\n</head>"
        );
        assert!(folder.is_empty());
    }

    #[test]
    fn test_xpgt_link_inlined() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source = r#"<LINK href="template.xpgt" rel="stylesheet">"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert!(out.starts_with(r#"<style type="application/vnd.adobe-page-template+xml">"#));
        assert!(out.contains("<ade:template/>"));
    }

    #[test]
    fn test_image_registered_and_rewritten() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source =
            r#"<img src="img/cover.jpg" alt="Cover"/><p>x</p><IMG class="thumb" src="img/cover.jpg">"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(folder.len(), 1);
        assert!(folder.get("Images/cover.jpg").is_some());
        assert_eq!(out.matches(r#"src="../Images/cover.jpg""#).count(), 2);
        assert!(!out.contains(r#""img/cover.jpg""#));
    }

    #[test]
    fn test_remote_references_skipped() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source = r#"<img src="http://example.com/a.png"/><img src="data:image/png;base64,AAAA"/>"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(out, source);
        assert!(folder.is_empty());
    }

    #[test]
    fn test_percent_encoded_reference() {
        let dir = fixture_dir();
        fs::write(dir.path().join("img/my cover.png"), [0x89, 0x50, 0x4E, 0x47]).unwrap();
        let mut folder = ContentFolder::new();
        let source = r#"<img src="img/my%20cover.png"/>"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(out, r#"<img src="../Images/my cover.png"/>"#);
    }

    #[test]
    fn test_escaped_reference_unescaped() {
        let dir = fixture_dir();
        fs::write(dir.path().join("img/a&b.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let mut folder = ContentFolder::new();
        let source = r#"<img src="img/a&amp;b.jpg"/><img src="img/a&amp;b.jpg"/>"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(folder.len(), 1);
        assert!(folder.get("Images/a&b.jpg").is_some());
        assert_eq!(out.matches(r#"src="../Images/a&amp;b.jpg""#).count(), 2);
    }

    #[test]
    fn test_missing_resource_is_an_error() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source = r#"<img src="img/missing.png"/>"#;

        let err = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
    }

    #[test]
    fn test_non_reference_tags_ignored() {
        let dir = fixture_dir();
        let mut folder = ContentFolder::new();
        let source = r#"<img alt="no source"/><link rel="x"/><a href="img/cover.jpg">c</a>"#;

        let out = load_folder_structure(source.to_string(), dir.path(), &mut folder).unwrap();

        assert_eq!(out, source);
    }
}
