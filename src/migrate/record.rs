//! Scanned candidates and the batches built from them.

use std::fmt;

use crate::errors::MigrateError;
use crate::store::StorePath;

/// Identifier assigned by the metadata source (inode, database id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One preview object eligible for migration.
///
/// `path` is the stored (new layout) path; the object still physically lives at
/// the legacy location derived from it by `PreviewLayout::legacy_source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRecord {
    pub file_id: FileId,
    pub path: StorePath,
    pub parent_id: FileId,
}

impl PreviewRecord {
    pub fn new(file_id: FileId, path: StorePath, parent_id: FileId) -> Result<Self, MigrateError> {
        if path.is_root() {
            return Err(MigrateError::InvalidPath {
                path: path.to_string(),
                reason: "a preview record must name an object",
            });
        }
        Ok(Self {
            file_id,
            path,
            parent_id,
        })
    }

    /// Directory that will contain this object after migration (the grouping key).
    pub fn destination_parent(&self) -> StorePath {
        self.path.parent().unwrap_or_else(StorePath::root)
    }
}

/// Records sharing one destination parent; migrated and reclaimed as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationBatch {
    pub destination_parent: StorePath,
    pub records: Vec<PreviewRecord>,
}

impl MigrationBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
