use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One child of a listed directory, as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
}

/// Filesystem operations the directory service needs from the host.
///
/// Implementations perform each call synchronously; a call may block on
/// the underlying filesystem (no internal timeout).
pub trait FileSystem: Send + Sync {
    /// Enumerate the immediate children of `path`, in whatever order the
    /// host enumeration yields them.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Read the full content of `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `content` to `path`, replacing any existing file. Does not
    /// create missing parent directories.
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Create the directory at `path`, including missing intermediate
    /// segments. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove `path` — recursively if it is a directory. A missing
    /// target is success.
    fn remove_all(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}
