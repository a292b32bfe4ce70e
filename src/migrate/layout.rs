//! Legacy vs. sharded path mapping.
//!
//! Stored paths already describe the sharded layout (`preview/<shard...>/<name>`).
//! Until migrated, the object lives at the same path with the legacy marker
//! inserted right after the preview root: `preview/<marker>/<shard...>/<name>`.

use crate::errors::MigrateError;
use crate::store::StorePath;

pub const DEFAULT_PREVIEW_ROOT: &str = "preview";
pub const DEFAULT_LEGACY_MARKER: &str = "old-multibucket";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLayout {
    preview_root: String,
    legacy_marker: String,
}

impl Default for PreviewLayout {
    fn default() -> Self {
        Self {
            preview_root: DEFAULT_PREVIEW_ROOT.to_string(),
            legacy_marker: DEFAULT_LEGACY_MARKER.to_string(),
        }
    }
}

impl PreviewLayout {
    pub fn new(preview_root: &str, legacy_marker: &str) -> Result<Self, MigrateError> {
        // Both must be exactly one valid segment.
        let root = StorePath::root().join(preview_root)?;
        root.join(legacy_marker)?;
        if preview_root == legacy_marker {
            return Err(MigrateError::InvalidPath {
                path: legacy_marker.to_string(),
                reason: "legacy marker must differ from the preview root",
            });
        }
        Ok(Self {
            preview_root: preview_root.to_string(),
            legacy_marker: legacy_marker.to_string(),
        })
    }

    pub fn preview_root(&self) -> &str {
        &self.preview_root
    }

    pub fn legacy_marker(&self) -> &str {
        &self.legacy_marker
    }

    /// `<preview_root>/<marker>`: the directory holding everything not yet migrated.
    pub fn legacy_root(&self) -> StorePath {
        StorePath::from_segments([self.preview_root.as_str(), self.legacy_marker.as_str()])
    }

    /// Where the object for `stored` lives before migration.
    pub fn legacy_source(&self, stored: &StorePath) -> Result<StorePath, MigrateError> {
        let mut segs = stored.segments();
        let first = segs.next();
        let rest: Vec<&str> = segs.collect();
        if first != Some(self.preview_root.as_str()) || rest.is_empty() {
            return Err(MigrateError::InvalidPath {
                path: stored.to_string(),
                reason: "stored path is not below the preview root",
            });
        }
        if rest[0] == self.legacy_marker {
            return Err(MigrateError::InvalidPath {
                path: stored.to_string(),
                reason: "stored path already points into the legacy layout",
            });
        }
        Ok(StorePath::from_segments(
            [self.preview_root.as_str(), self.legacy_marker.as_str()]
                .into_iter()
                .chain(rest),
        ))
    }

    /// Inverse of `legacy_source`; `None` if `legacy` is not strictly below the legacy root.
    pub fn stored_from_legacy(&self, legacy: &StorePath) -> Option<StorePath> {
        let segs: Vec<&str> = legacy.segments().collect();
        if segs.len() < 3 || segs[0] != self.preview_root || segs[1] != self.legacy_marker {
            return None;
        }
        let mut out = Vec::with_capacity(segs.len() - 1);
        out.push(segs[0]);
        out.extend_from_slice(&segs[2..]);
        Some(StorePath::from_segments(out))
    }
}
