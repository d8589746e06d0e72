//! Importers that turn files on disk into a [`Book`].
//!
//! The [`Importer`] trait has two entry points:
//! - [`Importer::try_book`] reports failures as [`Error`]s
//! - [`Importer::book`] never fails; a failed import yields an empty book

mod html;
mod txt;

pub use html::HtmlImporter;
pub use txt::TxtImporter;

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use crate::book::Book;
use crate::error::{Error, Result};

/// Common interface of the format importers.
pub trait Importer {
    /// Create an importer for the file at `path`.
    fn open(path: &Path) -> Self
    where
        Self: Sized;

    /// The file being imported.
    fn path(&self) -> &Path;

    /// Import the file.
    fn try_book(&self) -> Result<Book>;

    /// Import the file, returning an empty book on failure.
    fn book(&self) -> Book {
        match self.try_book() {
            Ok(book) => book,
            Err(err) => {
                // Open failures were already reported through the notifier
                if !matches!(err, Error::Open { .. }) {
                    tracing::warn!(path = %self.path().display(), "Import failed: {err}");
                }
                Book::default()
            }
        }
    }
}

/// Settings shared by the importers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Run the cleaner over the final source.
    pub clean_output: bool,
    /// Reduce `file.html#id` anchor links to `#id`.
    pub strip_anchor_files: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            clean_output: true,
            strip_anchor_files: true,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clean_output(mut self, clean_output: bool) -> Self {
        self.clean_output = clean_output;
        self
    }

    pub fn with_strip_anchor_files(mut self, strip_anchor_files: bool) -> Self {
        self.strip_anchor_files = strip_anchor_files;
        self
    }
}

/// Where user-facing warnings go.
pub trait Notifier: Send + Sync {
    /// A file could not be read.
    fn warn(&self, path: &Path, error: &std::io::Error);
}

/// Reports warnings as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, path: &Path, error: &std::io::Error) {
        tracing::warn!(path = %path.display(), "Cannot read file: {error}");
    }
}

/// Whether `path` names a regular file this process can open for reading.
pub fn is_file_readable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file()) && File::open(path).is_ok()
}

/// Read and decode a source file, reporting open failures to `notifier`.
fn read_source(
    path: &Path,
    notifier: &dyn Notifier,
    decode: impl FnOnce(&[u8]) -> Cow<'_, str>,
) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(decode(&bytes).into_owned()),
        Err(source) => {
            notifier.warn(path, &source);
            Err(Error::Open {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Directory relative references in `path` resolve against.
fn base_directory(path: &Path) -> std::path::PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        warnings: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn warn(&self, path: &Path, _error: &std::io::Error) {
            self.warnings
                .lock()
                .unwrap()
                .push(path.display().to_string());
        }
    }

    #[test]
    fn test_is_file_readable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.html");
        std::fs::write(&file, "<p>a</p>").unwrap();

        assert!(is_file_readable(&file));
        assert!(!is_file_readable(dir.path()));
        assert!(!is_file_readable(&dir.path().join("missing.html")));
    }

    #[test]
    fn test_read_source_reports_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.html");
        let notifier = RecordingNotifier::default();

        let err = read_source(&missing, &notifier, |b| String::from_utf8_lossy(b)).unwrap_err();

        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(notifier.warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_options_builder() {
        let options = ImportOptions::new()
            .with_clean_output(false)
            .with_strip_anchor_files(false);
        assert!(!options.clean_output);
        assert!(!options.strip_anchor_files);
        assert_eq!(ImportOptions::default(), ImportOptions::new());
    }

    #[test]
    fn test_base_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("book.html");
        assert_eq!(base_directory(&file), dir.path());
    }
}
