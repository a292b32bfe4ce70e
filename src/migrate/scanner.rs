//! Candidate scanners.
//!
//! A scanner enumerates preview objects that still live in the legacy layout.
//! Contract: records sharing a destination parent path are delivered
//! contiguously. The grouper relies on this and does not re-sort; a scanner
//! that orders by a proxy key (e.g. the parent identifier) can silently split
//! or merge groups.

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::errors::MigrateError;
use crate::store::StorePath;

use super::layout::PreviewLayout;
use super::record::{FileId, PreviewRecord};

/// Totals shown to the operator before confirming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of preview objects to migrate.
    pub previews: u64,
    /// Distinct source files the previews derive from (distinct parent ids).
    pub source_files: u64,
    /// Distinct destination parents, i.e. the number of batches.
    pub groups: u64,
}

impl ScanSummary {
    pub fn is_empty(&self) -> bool {
        self.previews == 0
    }
}

pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<PreviewRecord, MigrateError>> + 'a>;

pub trait CandidateScanner {
    fn summary(&self) -> Result<ScanSummary>;

    /// Lazy record stream, contiguous per destination parent path.
    fn scan(&self) -> Result<RecordStream<'_>>;
}

/// Walks the legacy subtree of a filesystem-backed store.
///
/// Each directory lists its files before its subdirectories (both by name), so
/// every file of one directory is emitted before descending any further. One
/// legacy directory maps to exactly one destination parent, so this ordering
/// is already keyed by destination path.
#[derive(Debug, Clone)]
pub struct LegacyTreeScanner {
    root: PathBuf,
    layout: PreviewLayout,
}

impl LegacyTreeScanner {
    pub fn new(root: impl Into<PathBuf>, layout: PreviewLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    fn legacy_dir(&self) -> PathBuf {
        self.layout.legacy_root().to_fs_path(&self.root)
    }

    fn walker(&self) -> walkdir::IntoIter {
        WalkDir::new(self.legacy_dir())
            .min_depth(1)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
    }

    /// Stored path for a legacy file, or `None` (with a warning) when the name
    /// cannot be expressed as a store path. Such files stay where they are.
    fn stored_path(&self, entry: &DirEntry) -> Option<StorePath> {
        let stored = StorePath::from_fs_path(&self.root, entry.path())
            .ok()
            .and_then(|legacy| self.layout.stored_from_legacy(&legacy));
        if stored.is_none() {
            warn!(path = %entry.path().display(), "Skipping legacy preview with an unsupported name");
        }
        stored
    }
}

impl CandidateScanner for LegacyTreeScanner {
    fn summary(&self) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        if !self.legacy_dir().is_dir() {
            return Ok(summary);
        }
        let mut last_parent: Option<PathBuf> = None;
        for entry in self.walker() {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() || self.stored_path(&entry).is_none() {
                continue;
            }
            summary.previews += 1;
            let parent = entry.path().parent().map(|p| p.to_path_buf());
            if parent != last_parent {
                // Contiguous by construction: each new parent is a new group and source file.
                summary.groups += 1;
                summary.source_files += 1;
                last_parent = parent;
            }
        }
        Ok(summary)
    }

    fn scan(&self) -> Result<RecordStream<'_>> {
        if !self.legacy_dir().is_dir() {
            return Ok(Box::new(std::iter::empty()));
        }
        let mut seq: u64 = 0;
        let mut current_parent: Option<(PathBuf, FileId)> = None;
        let iter = self.walker().filter_map(move |entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => return Some(Err(walk_error(e))),
            };
            // Directories and anything else that is not a plain object are never candidates.
            if !entry.file_type().is_file() {
                return None;
            }
            let stored = self.stored_path(&entry)?;
            seq += 1;
            let parent_path = entry.path().parent().map(|p| p.to_path_buf()).unwrap_or_default();
            let parent_id = match &current_parent {
                Some((p, id)) if *p == parent_path => *id,
                _ => match parent_node_id(&parent_path, seq) {
                    Ok(id) => {
                        current_parent = Some((parent_path, id));
                        id
                    }
                    Err(e) => return Some(Err(e)),
                },
            };
            Some(node_id(&entry, seq).and_then(|file_id| PreviewRecord::new(file_id, stored, parent_id)))
        });
        Ok(Box::new(iter))
    }
}

fn walk_error(e: walkdir::Error) -> MigrateError {
    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop while walking the legacy tree"));
    MigrateError::Io {
        op: "walk legacy tree",
        path,
        hint: "",
        source,
    }
}

#[cfg(unix)]
fn node_id(entry: &DirEntry, _seq: u64) -> Result<FileId, MigrateError> {
    use walkdir::DirEntryExt;
    Ok(FileId(entry.ino()))
}

#[cfg(not(unix))]
fn node_id(_entry: &DirEntry, seq: u64) -> Result<FileId, MigrateError> {
    Ok(FileId(seq))
}

#[cfg(unix)]
fn parent_node_id(dir: &std::path::Path, _seq: u64) -> Result<FileId, MigrateError> {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::metadata(dir).map_err(|source| MigrateError::Io {
        op: "stat preview folder",
        path: dir.to_path_buf(),
        hint: "",
        source,
    })?;
    Ok(FileId(meta.ino()))
}

#[cfg(not(unix))]
fn parent_node_id(_dir: &std::path::Path, seq: u64) -> Result<FileId, MigrateError> {
    // Walk-order id: the sequence number of the folder's first file.
    Ok(FileId(seq))
}

/// Scanner over a pre-fetched record list (e.g. an export of the metadata store).
///
/// Records are sorted by destination parent path, then by path, so the sort key
/// is exactly the grouping key.
#[derive(Debug, Clone, Default)]
pub struct RecordListScanner {
    records: Vec<PreviewRecord>,
}

impl RecordListScanner {
    pub fn new(mut records: Vec<PreviewRecord>) -> Self {
        records.sort_by(|a, b| {
            a.destination_parent()
                .cmp(&b.destination_parent())
                .then_with(|| a.path.cmp(&b.path))
        });
        Self { records }
    }
}

impl CandidateScanner for RecordListScanner {
    fn summary(&self) -> Result<ScanSummary> {
        let sources: HashSet<FileId> = self.records.iter().map(|r| r.parent_id).collect();
        let groups: HashSet<StorePath> = self.records.iter().map(|r| r.destination_parent()).collect();
        Ok(ScanSummary {
            previews: self.records.len() as u64,
            source_files: sources.len() as u64,
            groups: groups.len() as u64,
        })
    }

    fn scan(&self) -> Result<RecordStream<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }
}
