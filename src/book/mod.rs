use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::util::detect_media_format;

/// An imported book.
///
/// Holds the normalized markup of the imported document and the resources
/// it references. An empty book (no source, no resources) is what a failed
/// import produces.
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Normalized XHTML source of the document.
    pub source: String,
    /// Managed folder holding the resources the source references.
    pub mainfolder: ContentFolder,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing was imported into this book.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.mainfolder.is_empty()
    }
}

/// A resource held by the content folder (image, font, stylesheet, etc.)
#[derive(Debug, Clone)]
pub struct Resource {
    pub data: Vec<u8>,
    pub media_type: String,
    /// Filesystem path the resource was copied from.
    pub origin: PathBuf,
}

/// The book's managed storage area for imported resource files.
///
/// Every resource is stored under a unique relative name such as
/// `Images/cover.jpg`. Names are grouped into subfolders by media type.
#[derive(Debug, Clone, Default)]
pub struct ContentFolder {
    resources: BTreeMap<String, Resource>,
    /// Maps source paths to the name they were assigned.
    by_origin: HashMap<PathBuf, String>,
}

impl ContentFolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a file into the folder and return the name it was assigned.
    ///
    /// Adding the same path twice returns the name assigned the first time.
    pub fn add_content_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<String> {
        let path = path.as_ref();
        if let Some(name) = self.by_origin.get(path) {
            return Ok(name.clone());
        }

        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resource".to_string());

        Ok(self.insert(path.to_path_buf(), &filename, data))
    }

    fn insert(&mut self, origin: PathBuf, filename: &str, data: Vec<u8>) -> String {
        let format = detect_media_format(filename, &data);
        let name = self.unique_name(format.folder(), filename);

        tracing::debug!(
            origin = %origin.display(),
            name = %name,
            media_type = format.mime_type(),
            "Added resource to content folder"
        );

        self.by_origin.insert(origin.clone(), name.clone());
        self.resources.insert(
            name.clone(),
            Resource {
                data,
                media_type: format.mime_type().to_string(),
                origin,
            },
        );
        name
    }

    /// Pick `folder/filename`, or `folder/stem_NNN.ext` when that is taken.
    fn unique_name(&self, folder: &str, filename: &str) -> String {
        let candidate = format!("{folder}/{filename}");
        if !self.resources.contains_key(&candidate) {
            return candidate;
        }

        let (stem, ext) = match filename.rfind('.') {
            Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
            _ => (filename, ""),
        };

        (1..)
            .map(|n| format!("{folder}/{stem}_{n:03}{ext}"))
            .find(|name| !self.resources.contains_key(name))
            .unwrap_or(candidate)
    }

    /// Get a resource by its assigned name
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Write every resource below `dir`, creating subfolders as needed.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<()> {
        let dir = dir.as_ref();
        for (name, resource) in &self.resources {
            let target = dir.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &resource.data)?;
        }
        Ok(())
    }
}
