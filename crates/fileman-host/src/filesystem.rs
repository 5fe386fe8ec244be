use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use fileman_platform::filesystem::{DirEntry, FileSystem};

/// `FileSystem` backed by `std::fs`. All paths are taken as given; no
/// normalization or containment checks happen here.
pub struct StdFileSystem;

impl StdFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for StdFileSystem {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path)
            .with_context(|| format!("failed to read directory {}", path.display()))?;

        // Enumeration order is whatever the host yields; callers get it as-is.
        let mut result = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("skipping dir entry: {}", e);
                    continue;
                }
            };

            let is_directory = match entry.file_type() {
                Ok(ft) => ft.is_dir(),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            result.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_directory,
            });
        }

        Ok(result)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read file {}", path.display()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        // Intentionally no parent directory creation: the service checks
        // the base directory exists before calling this.
        fs::write(path, content)
            .with_context(|| format!("failed to write file {}", path.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        // symlink_metadata so a symlink to a directory is unlinked, not
        // traversed.
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to stat {}", path.display()))
            }
        };

        if meta.is_dir() {
            fs::remove_dir_all(path)
                .with_context(|| format!("failed to delete directory {}", path.display()))
        } else {
            fs::remove_file(path)
                .with_context(|| format!("failed to delete file {}", path.display()))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
