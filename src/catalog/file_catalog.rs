use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::InMemoryCatalog;
use crate::constants::catalog::RECORD_FILE_EXTENSIONS;
use crate::errors::CatalogError;

/// Loads canonical records from a file or a directory tree.
///
/// A file root holds concatenated JSON records (whitespace or newlines between
/// them are optional). A directory root contributes every `.json` / `.jsonl`
/// file below it, read in sorted path order so later files win on duplicate
/// identifiers deterministically.
pub struct FileCatalog {
    root: PathBuf,
    follow_links: bool,
}

impl FileCatalog {
    /// Create a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
        }
    }

    /// Configure symlink traversal for directory roots.
    pub fn with_follow_symlinks(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Shorthand for `FileCatalog::new(root).load()`.
    pub fn open(root: impl Into<PathBuf>) -> Result<InMemoryCatalog, CatalogError> {
        Self::new(root).load()
    }

    /// Read every record under the root into memory.
    pub fn load(&self) -> Result<InMemoryCatalog, CatalogError> {
        if !self.root.exists() {
            return Err(CatalogError::Unavailable(format!(
                "catalog root '{}' does not exist",
                self.root.display()
            )));
        }
        let files = if self.root.is_file() {
            vec![self.root.clone()]
        } else {
            self.record_files()?
        };
        let mut catalog = InMemoryCatalog::new();
        for path in &files {
            let loaded = load_file(path, &mut catalog)?;
            debug!("[reconcile:catalog] loaded {} records from {}", loaded, path.display());
        }
        info!(
            "[reconcile:catalog] catalog ready (records={}, files={}) from {}",
            catalog.len(),
            files.len(),
            self.root.display()
        );
        Ok(catalog)
    }

    fn record_files(&self) -> Result<Vec<PathBuf>, CatalogError> {
        let mut walker = WalkDir::new(&self.root);
        if self.follow_links {
            walker = walker.follow_links(true);
        }
        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| CatalogError::Unavailable(err.to_string()))?;
            if entry.file_type().is_file() && has_record_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

fn has_record_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RECORD_FILE_EXTENSIONS.contains(&ext))
}

fn load_file(path: &Path, catalog: &mut InMemoryCatalog) -> Result<usize, CatalogError> {
    let text = fs::read_to_string(path)?;
    let origin = path.display().to_string();
    let mut loaded = 0;
    for record in serde_json::Deserializer::from_str(&text).into_iter::<Value>() {
        let record = record.map_err(|err| CatalogError::Parse {
            origin: origin.clone(),
            message: err.to_string(),
        })?;
        catalog.insert(record, &origin)?;
        loaded += 1;
    }
    Ok(loaded)
}
