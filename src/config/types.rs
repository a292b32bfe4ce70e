//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::MigrateError;
use crate::migrate::{MemoryLimit, MigrationMode, PreviewLayout};

use super::{LEGACY_MARKER_DEFAULT, PREVIEW_ROOT_DEFAULT};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Run-level progress (default)
    #[default]
    Normal,
    /// Per-group detail
    Info,
    /// Per-object detail
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one migration run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local (mounted) root of the object store
    pub storage_root: Option<PathBuf>,
    /// First path segment of every preview object
    pub preview_root: String,
    /// Segment marking the not-yet-migrated subtree
    pub legacy_marker: String,
    pub memory_limit: MemoryLimit,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// If true, report actions but do not modify the store
    pub dry_run: bool,
    /// Delete legacy previews instead of moving them
    pub delete_legacy: bool,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    /// Draw a progress bar (only when attached to a terminal)
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: None,
            preview_root: PREVIEW_ROOT_DEFAULT.to_string(),
            legacy_marker: LEGACY_MARKER_DEFAULT.to_string(),
            memory_limit: MemoryLimit::Auto,
            log_level: LogLevel::Normal,
            log_file: None,
            dry_run: false,
            delete_legacy: false,
            assume_yes: false,
            progress: true,
        }
    }
}

impl Config {
    /// Construct a Config for `storage_root`; other fields use defaults.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: Some(storage_root.into()),
            ..Default::default()
        }
    }

    pub fn layout(&self) -> Result<PreviewLayout, MigrateError> {
        PreviewLayout::new(&self.preview_root, &self.legacy_marker)
    }

    pub fn mode(&self) -> MigrationMode {
        if self.delete_legacy {
            MigrationMode::Delete
        } else {
            MigrationMode::Move
        }
    }
}
