//! Plain text import.

use std::path::{Path, PathBuf};

use quick_xml::escape::partial_escape;

use crate::book::Book;
use crate::error::{Error, Result};
use crate::transform::{Cleaner, XhtmlCleaner};
use crate::util::decode_text;

use super::{ImportOptions, Importer, LogNotifier, Notifier, is_file_readable, read_source};

/// Imports a plain text file, one paragraph per non-empty line.
pub struct TxtImporter {
    path: PathBuf,
    options: ImportOptions,
    cleaner: Box<dyn Cleaner>,
    notifier: Box<dyn Notifier>,
}

impl TxtImporter {
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
}

impl Importer for TxtImporter {
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

        let text = read_source(&self.path, self.notifier.as_ref(), |bytes| {
            decode_text(bytes, None)
        })?;
        let html = text_to_html(&text);

        let mut book = Book::new();
        book.source = if self.options.clean_output {
            self.cleaner.clean(&html)
        } else {
            html
        };

        tracing::info!(path = %self.path.display(), "Imported text document");

        Ok(book)
    }
}

/// Wrap each non-empty line of `text` in a paragraph.
pub fn text_to_html(text: &str) -> String {
    let mut html = String::from("<html><head><title></title></head><body>\n");
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        html.push_str("<p>");
        html.push_str(&partial_escape(line));
        html.push_str("</p>\n");
    }
    html.push_str("</body></html>");
    html
}
