//! Hierarchical object store abstraction.
//!
//! The migration engine only needs a handful of blocking primitives: stat a
//! directory, create directories, move or delete one object, and remove a
//! directory once it is empty. `FsObjectStore` implements them over a local
//! (or mounted) directory tree.

mod fs;
mod helpers;
mod path;

pub use fs::FsObjectStore;
pub(crate) use helpers::io_error_with_help;
pub use path::StorePath;

use crate::errors::MigrateError;

/// Blocking object store primitives used by the migration executor.
///
/// Implementations must report a missing directory from `stat_dir` as
/// `MigrateError::NotFound`; every other error is treated as fatal by callers.
pub trait ObjectStore {
    /// Succeeds if `path` exists and is a directory.
    fn stat_dir(&self, path: &StorePath) -> Result<(), MigrateError>;

    /// Create `path` and any missing ancestors.
    fn create_dir_all(&self, path: &StorePath) -> Result<(), MigrateError>;

    /// Move one object. Never overwrites an existing destination.
    fn move_object(&self, from: &StorePath, to: &StorePath) -> Result<(), MigrateError>;

    /// Delete one object (not a directory).
    fn delete_object(&self, path: &StorePath) -> Result<(), MigrateError>;

    /// True if the directory has no remaining entries.
    fn is_empty_dir(&self, path: &StorePath) -> Result<bool, MigrateError>;

    /// Remove a directory; fails with `DirectoryNotEmpty` if anything remains.
    fn remove_empty_dir(&self, path: &StorePath) -> Result<(), MigrateError>;

    fn exists(&self, path: &StorePath) -> Result<bool, MigrateError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn stat_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        (**self).stat_dir(path)
    }
    fn create_dir_all(&self, path: &StorePath) -> Result<(), MigrateError> {
        (**self).create_dir_all(path)
    }
    fn move_object(&self, from: &StorePath, to: &StorePath) -> Result<(), MigrateError> {
        (**self).move_object(from, to)
    }
    fn delete_object(&self, path: &StorePath) -> Result<(), MigrateError> {
        (**self).delete_object(path)
    }
    fn is_empty_dir(&self, path: &StorePath) -> Result<bool, MigrateError> {
        (**self).is_empty_dir(path)
    }
    fn remove_empty_dir(&self, path: &StorePath) -> Result<(), MigrateError> {
        (**self).remove_empty_dir(path)
    }
    fn exists(&self, path: &StorePath) -> Result<bool, MigrateError> {
        (**self).exists(path)
    }
}
