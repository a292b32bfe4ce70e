//! Local directory tree as an object store.
//! - Objects are regular files; directories are plain directories.
//! - Moves are a rename with no overwrite, followed by a best-effort fsync of the
//!   destination directory on Unix.
//! - Directory removal checks emptiness first so a non-empty directory is never
//!   handed to the OS for deletion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::errors::MigrateError;

use super::helpers::io_error_with_help;
use super::{ObjectStore, StorePath};

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn local_path(&self, path: &StorePath) -> PathBuf {
        path.to_fs_path(&self.root)
    }
}

impl ObjectStore for FsObjectStore {
    fn stat_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        let local = self.local_path(path);
        match fs::metadata(&local) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(MigrateError::NotADirectory(path.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(MigrateError::NotFound(path.clone())),
            Err(e) => Err(io_error_with_help("stat directory", &local)(e)),
        }
    }

    fn create_dir_all(&self, path: &StorePath) -> Result<(), MigrateError> {
        let local = self.local_path(path);
        fs::create_dir_all(&local).map_err(io_error_with_help("create directory", &local))?;
        trace!(path = %local.display(), "created directory");
        Ok(())
    }

    fn move_object(&self, from: &StorePath, to: &StorePath) -> Result<(), MigrateError> {
        let src = self.local_path(from);
        let dst = self.local_path(to);

        let src_meta = match fs::symlink_metadata(&src) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MigrateError::NotFound(from.clone()));
            }
            Err(e) => return Err(io_error_with_help("stat source", &src)(e)),
        };
        if src_meta.is_dir() {
            return Err(MigrateError::InvalidPath {
                path: from.to_string(),
                reason: "source is a directory, not an object",
            });
        }
        match fs::symlink_metadata(&dst) {
            Ok(_) => return Err(MigrateError::AlreadyExists(to.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error_with_help("stat destination", &dst)(e)),
        }

        fs::rename(&src, &dst).map_err(io_error_with_help("move object", &src))?;

        // Persist the rename (best-effort); a successful rename is not turned into a failure.
        #[cfg(unix)]
        if let Some(parent) = dst.parent() {
            let _ = fs::File::open(parent).and_then(|d| d.sync_all());
        }
        Ok(())
    }

    fn delete_object(&self, path: &StorePath) -> Result<(), MigrateError> {
        let local = self.local_path(path);
        match fs::remove_file(&local) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(MigrateError::NotFound(path.clone())),
            Err(e) => Err(io_error_with_help("delete object", &local)(e)),
        }
    }

    fn is_empty_dir(&self, path: &StorePath) -> Result<bool, MigrateError> {
        let local = self.local_path(path);
        let mut rd = match fs::read_dir(&local) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MigrateError::NotFound(path.clone()));
            }
            Err(e) => return Err(io_error_with_help("list directory", &local)(e)),
        };
        Ok(rd.next().is_none())
    }

    fn remove_empty_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        if !self.is_empty_dir(path)? {
            return Err(MigrateError::DirectoryNotEmpty(path.clone()));
        }
        let local = self.local_path(path);
        fs::remove_dir(&local).map_err(io_error_with_help("remove directory", &local))
    }

    fn exists(&self, path: &StorePath) -> Result<bool, MigrateError> {
        let local = self.local_path(path);
        match fs::symlink_metadata(&local) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error_with_help("stat", &local)(e)),
        }
    }
}
