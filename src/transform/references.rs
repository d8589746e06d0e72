//! Resource reference rewriting.

use regex::Regex;

use crate::error::Result;

/// A single replacement, in coordinates of the text before the rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edit {
    at: usize,
    removed: usize,
    inserted: usize,
}

/// Outcome of [`update_references`].
#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    edits: Vec<Edit>,
}

impl Rewrite {
    /// Number of references that were replaced.
    pub fn count(&self) -> usize {
        self.edits.len()
    }

    /// Translate an offset in the text before the rewrite to the text after it.
    ///
    /// Offsets inside a replaced span map to the end of its replacement.
    pub fn map_offset(&self, offset: usize) -> usize {
        let mut mapped = offset;
        for edit in self.edits.iter().take_while(|e| e.at < offset) {
            if offset >= edit.at + edit.removed {
                mapped = mapped + edit.inserted - edit.removed;
            } else {
                mapped = mapped - (offset - edit.at) + edit.inserted;
            }
        }
        mapped
    }
}

/// Point every reference to `old_path`'s file at `new_path` instead.
///
/// References are matched by file name only, so `images/pic.png` and
/// `../images/pic.png` are both retargeted:
///
/// - fonts (`.ttf`, `.otf`) are matched in CSS `src: url(...)` declarations
/// - everything else is matched as a double-quoted attribute value ending in
///   the file name
///
/// The text is scanned once from start to end and replacements are never
/// re-scanned, so this terminates even when `new_path` contains the file
/// name itself.
pub fn update_references(source: &mut String, old_path: &str, new_path: &str) -> Result<Rewrite> {
    let filename = old_path.rsplit(['/', '\\']).next().unwrap_or(old_path);
    if filename.is_empty() {
        return Ok(Rewrite::default());
    }
    let escaped = regex::escape(filename);

    let spans = if filename.contains(".ttf") || filename.contains(".otf") {
        let font_src = Regex::new(&format!(r"src:\s*\w+\(([^)]*{escaped})\)"))?;
        font_src
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.range())
            .collect::<Vec<_>>()
    } else {
        let tag = Regex::new(&format!(r#"<[^>]*"[^">]*{escaped}"[^>]*>"#))?;
        let quoted = Regex::new(&format!(r#""([^">]*{escaped})""#))?;
        tag.find_iter(source)
            .flat_map(|tag_match| {
                quoted
                    .captures_iter(tag_match.as_str())
                    .filter_map(|caps| caps.get(1))
                    .map(|m| (tag_match.start() + m.start())..(tag_match.start() + m.end()))
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    if spans.is_empty() {
        return Ok(Rewrite::default());
    }

    let mut out = String::with_capacity(source.len() + spans.len() * new_path.len());
    let mut edits = Vec::with_capacity(spans.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&source[last..span.start]);
        out.push_str(new_path);
        edits.push(Edit {
            at: span.start,
            removed: span.len(),
            inserted: new_path.len(),
        });
        last = span.end;
    }
    out.push_str(&source[last..]);
    *source = out;

    tracing::debug!(
        file = filename,
        new_path,
        count = edits.len(),
        "Updated resource references"
    );

    Ok(Rewrite { edits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_occurrences_replaced() {
        let mut source = String::from(
            r#"<img src="images/pic.png"/><p>x</p><img alt="a" src="images/pic.png" /><a href="images/pic.png">big</a>"#,
        );
        let rewrite = update_references(&mut source, "images/pic.png", "../Images/pic001.png").unwrap();
        assert_eq!(rewrite.count(), 3);
        assert_eq!(source.matches("../Images/pic001.png").count(), 3);
        assert!(!source.contains("\"images/pic.png\""));
    }

    #[test]
    fn test_terminates_when_new_path_contains_filename() {
        let mut source = String::from(r#"<img src="pic.png"/><img src="pic.png"/><img src="pic.png"/>"#);
        let rewrite = update_references(&mut source, "pic.png", "../Images/pic.png").unwrap();
        assert_eq!(rewrite.count(), 3);
        assert_eq!(source.matches("\"../Images/pic.png\"").count(), 3);
    }

    #[test]
    fn test_matches_other_directories_with_same_filename() {
        let mut source = String::from(r#"<img src="a/pic.png"/><img src="../b/pic.png"/>"#);
        update_references(&mut source, "a/pic.png", "../Images/pic.png").unwrap();
        assert_eq!(source, r#"<img src="../Images/pic.png"/><img src="../Images/pic.png"/>"#);
    }

    #[test]
    fn test_text_outside_tags_untouched() {
        let mut source = String::from(r#"<p>See "pic.png" for details</p><img src="pic.png">"#);
        update_references(&mut source, "pic.png", "../Images/pic.png").unwrap();
        assert_eq!(
            source,
            r#"<p>See "pic.png" for details</p><img src="../Images/pic.png">"#
        );
    }

    #[test]
    fn test_font_references() {
        let mut source = String::from(
            "@font-face { font-family: Serif; src: url(fonts/Serif.ttf) }\n<p class=\"Serif.ttf\">x</p>",
        );
        let rewrite = update_references(&mut source, "fonts/Serif.ttf", "../Fonts/Serif.ttf").unwrap();
        assert_eq!(rewrite.count(), 1);
        assert!(source.contains("src: url(../Fonts/Serif.ttf)"));
        assert!(source.contains("class=\"Serif.ttf\""));
    }

    #[test]
    fn test_regex_metacharacters_in_filename() {
        let mut source = String::from(r#"<img src="cover(1).jpg"/><img src="coverX1Yjpg"/>"#);
        update_references(&mut source, "cover(1).jpg", "../Images/cover(1).jpg").unwrap();
        assert!(source.contains(r#"src="../Images/cover(1).jpg""#));
        assert!(source.contains(r#"src="coverX1Yjpg""#));
    }

    #[test]
    fn test_no_match_leaves_source() {
        let mut source = String::from(r#"<img src="other.png"/>"#);
        let rewrite = update_references(&mut source, "pic.png", "../Images/pic.png").unwrap();
        assert_eq!(rewrite.count(), 0);
        assert_eq!(source, r#"<img src="other.png"/>"#);
    }

    #[test]
    fn test_map_offset() {
        let mut source = String::from(r#"<img src="p.png"/>|tail"#);
        let end = source.find('|').unwrap();
        let rewrite = update_references(&mut source, "p.png", "../Images/p.png").unwrap();
        assert_eq!(&source[rewrite.map_offset(end)..], "|tail");
        assert_eq!(rewrite.map_offset(0), 0);
    }
}
