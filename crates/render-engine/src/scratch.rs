//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use beatcut_common::{BeatcutError, BeatcutResult};
use tempfile::TempDir;
use uuid::Uuid;

/// An exclusive temporary directory owned by one job.
///
/// Call [`ScratchDir::close`] on every exit path so removal failures are
/// reported. Dropping without closing still removes the directory, but
/// silently.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create `beatcut-<job id>-XXXX` under `root`.
    pub fn create(root: &Path, job_id: Uuid) -> BeatcutResult<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("beatcut-{job_id}-"))
            .tempdir_in(root)?;
        tracing::debug!(job_id = %job_id, path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the scratch directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> BeatcutResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            BeatcutError::cleanup(format!(
                "failed to remove scratch directory {}: {e}",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_close() {
        let root = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let scratch = ScratchDir::create(root.path(), id).unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&format!("beatcut-{id}-")));

        std::fs::write(scratch.file("silent.mp4"), b"x").unwrap();
        scratch.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dirs_are_exclusive() {
        let root = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let a = ScratchDir::create(root.path(), id).unwrap();
        let b = ScratchDir::create(root.path(), id).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
