use std::path::{Path, PathBuf};

use thiserror::Error;

use fileman_platform::filesystem::{DirEntry, FileSystem};

/// Classified operation failure. `Display` yields the caller-facing
/// message; `detail()` yields the underlying system error, when there
/// is one, for the diagnostic field of the reply.
#[derive(Debug, Error)]
pub enum OpError {
    /// A required field was empty or absent.
    #[error("{0}")]
    MissingArgument(&'static str),
    /// The caller's base directory does not exist.
    #[error("Directory {0} does not exist.")]
    NotFound(String),
    /// The underlying filesystem call failed.
    #[error("{message}")]
    Io {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl OpError {
    fn io(message: &'static str) -> impl FnOnce(anyhow::Error) -> OpError {
        move |cause| OpError::Io { message, cause }
    }

    /// Underlying system error, if any, formatted with its context chain.
    pub fn detail(&self) -> Option<String> {
        match self {
            OpError::Io { cause, .. } => Some(format!("{:#}", cause)),
            _ => None,
        }
    }
}

/// Join `base_dir` and a relative component using platform path
/// semantics, so a trailing or absent separator on `base_dir` composes
/// the same way. Pure: no I/O, no `..` normalization, no containment
/// check against `base_dir` — an absolute component overrides it.
pub fn resolve(base_dir: &str, name: &str) -> PathBuf {
    Path::new(base_dir).join(name)
}

/// The directory operation service. Stateless between requests: every
/// call carries its own `base_dir` and is resolved against current
/// filesystem state.
pub struct DirectoryService {
    fs: Box<dyn FileSystem>,
}

impl DirectoryService {
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Enumerate the immediate children of `base_dir`. The existence
    /// probe runs before the read so the error can name the missing
    /// directory rather than surfacing the read's own failure.
    pub fn list(&self, base_dir: &str) -> Result<Vec<DirEntry>, OpError> {
        if base_dir.is_empty() {
            return Err(OpError::MissingArgument("Base directory is required."));
        }
        if !self.fs.exists(Path::new(base_dir)) {
            return Err(OpError::NotFound(base_dir.to_string()));
        }

        self.fs
            .list_dir(Path::new(base_dir))
            .map_err(OpError::io("Error reading directory"))
    }

    /// Write `content` to `base_dir`/`filename`. An existing file at
    /// that path is overwritten without warning; intermediate
    /// directories are never created.
    pub fn create_file(
        &self,
        base_dir: &str,
        filename: &str,
        content: &str,
    ) -> Result<String, OpError> {
        if base_dir.is_empty() || filename.is_empty() {
            return Err(OpError::MissingArgument(
                "Base directory and filename are required.",
            ));
        }
        if !self.fs.exists(Path::new(base_dir)) {
            return Err(OpError::NotFound(base_dir.to_string()));
        }

        let path = resolve(base_dir, filename);
        self.fs
            .write_file(&path, content)
            .map_err(OpError::io("Failed to create file"))?;

        Ok(format!(
            "File '{}' created in '{}' successfully.",
            filename, base_dir
        ))
    }

    /// Create `base_dir`/`foldername`, including any missing
    /// intermediate segments. Creating a folder that already exists is
    /// idempotent success.
    pub fn create_folder(&self, base_dir: &str, foldername: &str) -> Result<String, OpError> {
        if base_dir.is_empty() || foldername.is_empty() {
            return Err(OpError::MissingArgument(
                "Base directory and folder name are required.",
            ));
        }
        if !self.fs.exists(Path::new(base_dir)) {
            return Err(OpError::NotFound(base_dir.to_string()));
        }

        let path = resolve(base_dir, foldername);
        self.fs
            .create_dir_all(&path)
            .map_err(OpError::io("Failed to create folder"))?;

        Ok(format!(
            "Folder '{}' created in '{}' successfully.",
            foldername, base_dir
        ))
    }

    /// Remove `base_dir`/`name` with force semantics: directories go
    /// recursively, a missing target is success. Unlike the other
    /// mutations there is no existence precondition on `base_dir`.
    pub fn delete(&self, base_dir: &str, name: &str) -> Result<String, OpError> {
        if base_dir.is_empty() || name.is_empty() {
            return Err(OpError::MissingArgument(
                "Base directory and name are required.",
            ));
        }

        let path = resolve(base_dir, name);
        self.fs
            .remove_all(&path)
            .map_err(OpError::io("Error deleting item"))?;

        Ok(format!("Item '{}' deleted successfully.", name))
    }

    /// Read `base_dir`/`filename` as text. No eager argument checks and
    /// no not-found classification: an empty or bogus field simply
    /// fails the read, and every failure is reported uniformly.
    pub fn open(&self, base_dir: &str, filename: &str) -> Result<String, OpError> {
        let path = resolve(base_dir, filename);
        self.fs
            .read_to_string(&path)
            .map_err(OpError::io("Failed to read file."))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use fileman_host::filesystem::StdFileSystem;
    use tempfile::TempDir;

    use super::*;

    fn service() -> DirectoryService {
        DirectoryService::new(Box::new(StdFileSystem::new()))
    }

    fn base(dir: &TempDir) -> String {
        dir.path().to_string_lossy().to_string()
    }

    #[test]
    fn resolve_joins_with_platform_semantics() {
        assert_eq!(resolve("/tmp/root", "a.txt"), PathBuf::from("/tmp/root/a.txt"));
        assert_eq!(resolve("/tmp/root/", "a.txt"), PathBuf::from("/tmp/root/a.txt"));
        // No normalization: `..` stays in the resolved path.
        assert_eq!(
            resolve("/tmp/root", "../escape"),
            PathBuf::from("/tmp/root/../escape")
        );
        // An absolute component overrides base_dir entirely.
        assert_eq!(resolve("/tmp/root", "/etc/x"), PathBuf::from("/etc/x"));
    }

    #[test]
    fn list_returns_children_classified() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        let mut entries = service().list(&base(&dir)).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert!(!entries[0].is_directory);
        assert_eq!(entries[1].name, "docs");
        assert!(entries[1].is_directory);
    }

    #[test]
    fn list_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("nested.txt"), "x").unwrap();

        let entries = service().list(&base(&dir)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "docs");
    }

    #[test]
    fn list_missing_base_dir_is_not_found() {
        let err = service().list("/tmp/fileman-test-does-not-exist").unwrap_err();
        assert!(matches!(err, OpError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "Directory /tmp/fileman-test-does-not-exist does not exist."
        );
        assert!(err.detail().is_none());
    }

    #[test]
    fn list_empty_base_dir_is_missing_argument() {
        let err = service().list("").unwrap_err();
        assert!(matches!(err, OpError::MissingArgument(_)));
        assert_eq!(err.to_string(), "Base directory is required.");
    }

    #[test]
    fn create_file_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        let msg = svc.create_file(&base(&dir), "a.txt", "hello").unwrap();
        assert_eq!(
            msg,
            format!("File 'a.txt' created in '{}' successfully.", base(&dir))
        );
        assert_eq!(svc.open(&base(&dir), "a.txt").unwrap(), "hello");
    }

    #[test]
    fn create_file_with_empty_content() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_file(&base(&dir), "empty.txt", "").unwrap();
        assert_eq!(svc.open(&base(&dir), "empty.txt").unwrap(), "");
    }

    #[test]
    fn create_file_overwrites_silently() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_file(&base(&dir), "a.txt", "old").unwrap();
        svc.create_file(&base(&dir), "a.txt", "new").unwrap();
        assert_eq!(svc.open(&base(&dir), "a.txt").unwrap(), "new");
    }

    #[test]
    fn create_file_empty_filename_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        let err = svc.create_file(&base(&dir), "", "data").unwrap_err();
        assert!(matches!(err, OpError::MissingArgument(_)));
        assert_eq!(err.to_string(), "Base directory and filename are required.");
        assert!(svc.list(&base(&dir)).unwrap().is_empty());
    }

    #[test]
    fn create_file_missing_base_dir_is_not_found() {
        let err = service()
            .create_file("/tmp/fileman-test-does-not-exist", "a.txt", "x")
            .unwrap_err();
        assert!(matches!(err, OpError::NotFound(_)));
    }

    #[test]
    fn create_file_does_not_create_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        // base_dir exists but the filename points through a missing
        // subdirectory; the write fails as an I/O error.
        let err = svc
            .create_file(&base(&dir), "missing/a.txt", "x")
            .unwrap_err();
        assert!(matches!(err, OpError::Io { .. }));
        assert_eq!(err.to_string(), "Failed to create file");
        assert!(err.detail().is_some());
    }

    #[test]
    fn create_folder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_folder(&base(&dir), "docs").unwrap();
        svc.create_folder(&base(&dir), "docs").unwrap();

        let entries = svc.list(&base(&dir)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "docs");
        assert!(entries[0].is_directory);
    }

    #[test]
    fn create_folder_creates_intermediate_segments() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_folder(&base(&dir), "a/b/c").unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn create_folder_missing_base_dir_is_not_found() {
        let err = service()
            .create_folder("/tmp/fileman-test-does-not-exist", "docs")
            .unwrap_err();
        assert!(matches!(err, OpError::NotFound(_)));
    }

    #[test]
    fn delete_missing_target_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let msg = service().delete(&base(&dir), "never-existed").unwrap();
        assert_eq!(msg, "Item 'never-existed' deleted successfully.");
    }

    #[test]
    fn delete_skips_base_dir_existence_check() {
        // Unlike List/CreateFile/CreateFolder, Delete does not probe
        // base_dir; a missing base resolves to a missing target, which
        // is success.
        let msg = service()
            .delete("/tmp/fileman-test-does-not-exist", "x")
            .unwrap();
        assert_eq!(msg, "Item 'x' deleted successfully.");
    }

    #[test]
    fn delete_removes_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_folder(&base(&dir), "docs/inner").unwrap();
        svc.create_file(&format!("{}/docs", base(&dir)), "a.txt", "x")
            .unwrap();

        svc.delete(&base(&dir), "docs").unwrap();
        assert!(svc.list(&base(&dir)).unwrap().is_empty());
    }

    #[test]
    fn delete_empty_name_is_missing_argument() {
        let err = service().delete("/tmp", "").unwrap_err();
        assert!(matches!(err, OpError::MissingArgument(_)));
        assert_eq!(err.to_string(), "Base directory and name are required.");
    }

    #[test]
    fn open_failure_is_uniform_io() {
        let svc = service();

        // Missing file, missing base directory, and empty arguments all
        // surface as the same read failure.
        for (base_dir, filename) in [
            ("/tmp", "fileman-test-does-not-exist.txt"),
            ("/tmp/fileman-test-does-not-exist", "a.txt"),
            ("", ""),
        ] {
            let err = svc.open(base_dir, filename).unwrap_err();
            assert!(matches!(err, OpError::Io { .. }));
            assert_eq!(err.to_string(), "Failed to read file.");
        }
    }

    #[test]
    fn open_non_utf8_content_is_uniform_io() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = service().open(&base(&dir), "blob.bin").unwrap_err();
        assert!(matches!(err, OpError::Io { .. }));
        assert_eq!(err.to_string(), "Failed to read file.");
        assert!(err.detail().is_some());
    }

    #[test]
    fn scenario_create_folder_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_folder(&base(&dir), "docs").unwrap();
        let entries = svc.list(&base(&dir)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "docs");
        assert!(entries[0].is_directory);
    }

    #[test]
    fn scenario_create_file_in_subdir_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();

        svc.create_folder(&base(&dir), "docs").unwrap();
        let docs = format!("{}/docs", base(&dir));
        svc.create_file(&docs, "a.txt", "hello").unwrap();
        assert_eq!(svc.open(&docs, "a.txt").unwrap(), "hello");
    }
}
