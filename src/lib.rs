//! # folio
//!
//! Import HTML documents into an ebook editing workspace.
//!
//! ## Features
//!
//! - Detects the document encoding (BOM, `<meta charset>`, XML declaration)
//! - Expands custom `<!ENTITY>` declarations from the DOCTYPE
//! - Reduces `chapter.html#id` anchor links to `#id`
//! - Copies referenced images, fonts and other files into the book's content
//!   folder and rewrites their references
//! - Inlines CSS and XPGT stylesheets as `<style>` blocks
//! - Cleans the result into well-formed XHTML
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{HtmlImporter, Importer};
//!
//! let book = HtmlImporter::new("input/chapter01.html").try_book()?;
//!
//! for (name, resource) in book.mainfolder.iter() {
//!     println!("{name}: {} ({} bytes)", resource.media_type, resource.data.len());
//! }
//! book.mainfolder.write_to("output")?;
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Individual Steps
//!
//! Each import step is available on its own in [`transform`]:
//!
//! ```
//! use folio::transform::resolve_custom_entities;
//!
//! let source = r#"<!ENTITY foo "bar">[ ]>Hello &foo;!"#;
//! assert_eq!(resolve_custom_entities(source), "Hello bar!");
//! ```

pub mod book;
pub mod dom;
pub mod error;
pub mod import;
pub mod transform;
pub mod util;

pub use book::{Book, ContentFolder, Resource};
pub use error::{Error, Result};
pub use import::{HtmlImporter, ImportOptions, Importer, LogNotifier, Notifier, TxtImporter};
pub use transform::{Cleaner, NoopCleaner, XhtmlCleaner};
