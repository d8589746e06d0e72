//! HTML and XHTML import.

use std::path::{Path, PathBuf};

use crate::book::Book;
use crate::error::{Error, Result};
use crate::transform::{
    Cleaner, XhtmlCleaner, load_folder_structure, resolve_custom_entities,
    strip_files_from_anchors,
};
use crate::util::decode_html;

use super::{ImportOptions, Importer, LogNotifier, Notifier, base_directory, is_file_readable, read_source};

/// Imports an HTML document and the resources it references.
///
/// The import runs these steps in order:
/// 1. Read the file, detect its encoding and expand custom `<!ENTITY>` declarations
/// 2. Reduce `file.html#id` anchor links to `#id`
/// 3. Copy referenced images, fonts and other files into the book's content
///    folder, inlining CSS and XPGT stylesheets
/// 4. Clean the result
///
/// # Example
///
/// ```no_run
/// use folio::{HtmlImporter, Importer};
///
/// let book = HtmlImporter::new("chapter.html").try_book()?;
/// println!("{} resources", book.mainfolder.len());
/// # Ok::<(), folio::Error>(())
/// ```
pub struct HtmlImporter {
    path: PathBuf,
    options: ImportOptions,
    cleaner: Box<dyn Cleaner>,
    notifier: Box<dyn Notifier>,
}

impl HtmlImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: ImportOptions::default(),
            cleaner: Box::new(XhtmlCleaner),
            notifier: Box::new(LogNotifier),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cleaner(mut self, cleaner: impl Cleaner + 'static) -> Self {
        self.cleaner = Box::new(cleaner);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Read the source file and expand its custom entities.
    fn load_source(&self) -> Result<String> {
        let source = read_source(&self.path, self.notifier.as_ref(), decode_html)?;
        Ok(resolve_custom_entities(&source))
    }
}

impl Importer for HtmlImporter {
    fn open(path: &Path) -> Self {
        Self::new(path)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn try_book(&self) -> Result<Book> {
        if !is_file_readable(&self.path) {
            return Err(Error::Unreadable(self.path.clone()));
        }

        tracing::debug!(path = %self.path.display(), "Importing HTML");

        let mut source = self.load_source()?;

        if self.options.strip_anchor_files {
            source = strip_files_from_anchors(&source, self.cleaner.as_ref());
        }

        let mut book = Book::new();
        source = load_folder_structure(source, &base_directory(&self.path), &mut book.mainfolder)?;

        book.source = if self.options.clean_output {
            self.cleaner.clean(&source)
        } else {
            source
        };

        tracing::info!(
            path = %self.path.display(),
            resources = book.mainfolder.len(),
            "Imported HTML document"
        );

        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::transform::NoopCleaner;

    #[test]
    fn test_entities_resolved_before_parsing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.html");
        fs::write(
            &file,
            r#"<!DOCTYPE html [<!ENTITY author "Jane Doe">]><html><body><p>By &author;</p></body></html>"#,
        )
        .unwrap();

        let book = HtmlImporter::new(&file).try_book().unwrap();

        assert!(book.source.contains("<p>By Jane Doe</p>"), "{}", book.source);
    }

    #[test]
    fn test_options_skip_steps() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.html");
        fs::write(&file, r#"<p><a href="ch2.html#n1">note</a>"#).unwrap();

        let book = HtmlImporter::new(&file)
            .with_options(
                ImportOptions::new()
                    .with_strip_anchor_files(false)
                    .with_clean_output(false),
            )
            .with_cleaner(NoopCleaner)
            .try_book()
            .unwrap();

        assert_eq!(book.source, r#"<p><a href="ch2.html#n1">note</a>"#);
    }

    #[test]
    fn test_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let importer = HtmlImporter::open(&dir.path().join("nope.html"));

        assert!(matches!(importer.try_book(), Err(Error::Unreadable(_))));
        assert!(importer.book().is_empty());
    }
}
