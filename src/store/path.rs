//! Store-relative paths.
//!
//! A `StorePath` names an object or directory inside the object store, relative
//! to its root, using `/` separators regardless of platform. The empty path is
//! the store root itself.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::MigrateError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StorePath(String);

impl StorePath {
    /// The store root (no segments).
    pub fn root() -> Self {
        StorePath(String::new())
    }

    /// Parse a `/`-separated relative path. Leading and trailing slashes are
    /// tolerated; empty, `.` and `..` segments and backslashes are rejected.
    pub fn parse(raw: &str) -> Result<Self, MigrateError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        for seg in trimmed.split('/') {
            validate_segment(raw, seg)?;
        }
        Ok(StorePath(trimmed.to_string()))
    }

    /// Append a single segment.
    pub fn join(&self, segment: &str) -> Result<Self, MigrateError> {
        validate_segment(segment, segment)?;
        if self.is_root() {
            Ok(StorePath(segment.to_string()))
        } else {
            Ok(StorePath(format!("{}/{}", self.0, segment)))
        }
    }

    /// Parent directory; `None` only for the root.
    pub fn parent(&self) -> Option<StorePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(StorePath(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segment-wise prefix test; every path starts with the root.
    pub fn starts_with(&self, base: &StorePath) -> bool {
        let mut mine = self.segments();
        base.segments().all(|seg| mine.next() == Some(seg))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a store path from segments that were already validated.
    pub(crate) fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let joined: Vec<&str> = segments.into_iter().collect();
        StorePath(joined.join("/"))
    }

    /// Map onto a local filesystem path below `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut p = root.to_path_buf();
        for seg in self.segments() {
            p.push(seg);
        }
        p
    }

    /// Inverse of `to_fs_path`: express a local path under `root` as a store path.
    pub fn from_fs_path(root: &Path, full: &Path) -> Result<Self, MigrateError> {
        let rel = full.strip_prefix(root).map_err(|_| MigrateError::InvalidPath {
            path: full.display().to_string(),
            reason: "outside the store root",
        })?;
        let mut segs = Vec::new();
        for comp in rel.components() {
            let s = comp.as_os_str().to_str().ok_or_else(|| MigrateError::InvalidPath {
                path: full.display().to_string(),
                reason: "not valid UTF-8",
            })?;
            validate_segment(s, s)?;
            segs.push(s);
        }
        Ok(Self::from_segments(segs))
    }
}

fn validate_segment(raw: &str, seg: &str) -> Result<(), MigrateError> {
    let reason = if seg.is_empty() {
        "empty path segment"
    } else if seg == "." || seg == ".." {
        "relative segments are not allowed"
    } else if seg.contains('\\') || seg.contains('/') {
        "separator inside a segment"
    } else if seg.contains('\0') {
        "NUL byte"
    } else {
        return Ok(());
    };
    Err(MigrateError::InvalidPath {
        path: raw.to_string(),
        reason,
    })
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}
