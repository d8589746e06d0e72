//! Text and markup transformations applied while importing a document.
//!
//! Each step takes the document source and returns the transformed source;
//! the importers in [`crate::import`] chain them in a fixed order.

mod anchors;
mod clean;
mod entities;
mod folder;
mod references;

pub use anchors::strip_files_from_anchors;
pub use clean::{Cleaner, NoopCleaner, XHTML_DOCTYPE, XML_DECLARATION, XhtmlCleaner};
pub use entities::resolve_custom_entities;
pub use folder::{create_style_tag, load_folder_structure};
pub use references::{Rewrite, update_references};

/// Whether `href` is a relative URL: no scheme and no network location.
///
/// `chapter.html#x`, `../img/a.png`, `#top` and `/abs/path.png` are
/// relative; `http://host/x`, `mailto:a@b` and `//host/x` are not.
pub fn is_relative_url(href: &str) -> bool {
    let href = href.trim();
    if href.starts_with("//") {
        return false;
    }

    let Some(colon) = href.find(':') else {
        return true;
    };
    let scheme = &href[..colon];

    // A colon after a path, query or fragment delimiter is not a scheme separator
    let is_scheme = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    !is_scheme
}
