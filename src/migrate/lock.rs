//! Single-run lock.
//!
//! A sidecar file `.preview_migrate.lock` at the storage root is held with an
//! exclusive advisory lock for the lifetime of the run. A second invocation
//! against the same root fails fast instead of racing the first one's moves.
//!
//! Notes:
//! - The lock is released when the `RunLock` guard is dropped.
//! - The file is never removed: every process must lock the same inode.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::MigrateError;
use crate::store::io_error_with_help;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

pub const LOCK_FILE_NAME: &str = ".preview_migrate.lock";

/// RAII guard held while a migration run owns the storage root.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Non-blocking acquire. `AlreadyRunning` if another process holds the lock.
    pub fn acquire(storage_root: &Path) -> Result<Self, MigrateError> {
        let path = storage_root.join(LOCK_FILE_NAME);

        let mut opts = OpenOptions::new();
        opts.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        opts.mode(0o600).custom_flags(libc::O_CLOEXEC);

        let file = opts.open(&path).map_err(io_error_with_help("open run lock", &path))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                trace!(path = %path.display(), "run lock acquired");
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                debug!(path = %path.display(), "run lock held by another process");
                Err(MigrateError::AlreadyRunning(path))
            }
            Err(e) => Err(io_error_with_help("lock run lock", &path)(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
