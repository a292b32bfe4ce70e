//! Typed error definitions for preview_migrate.
//! Provides a small set of well-known failure modes for better logs and tests.
//!
//! Store and scanner collaborators return these; orchestration code wraps them
//! with `anyhow::Context` and downcasts when it needs the kind.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::StorePath;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Not found in store: {0}")]
    NotFound(StorePath),

    #[error("Expected a directory but found an object: {0}")]
    NotADirectory(StorePath),

    #[error("Destination already exists: {0}")]
    AlreadyExists(StorePath),

    #[error("Refusing to remove non-empty directory: {0}")]
    DirectoryNotEmpty(StorePath),

    #[error("Invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("{op} '{path}': {source}{hint}")]
    Io {
        op: &'static str,
        path: PathBuf,
        hint: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Another migration already holds the lock at {0}")]
    AlreadyRunning(PathBuf),

    #[error("Invalid memory limit '{0}'; use bytes, a K/M/G suffix, or -1 for unlimited")]
    InvalidMemoryLimit(String),
}

impl MigrateError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            MigrateError::NotFound(_) => 10,
            MigrateError::NotADirectory(_) => 11,
            MigrateError::AlreadyExists(_) => 12,
            MigrateError::DirectoryNotEmpty(_) => 13,
            MigrateError::InvalidPath { .. } => 20,
            MigrateError::Io { .. } => 30,
            MigrateError::AlreadyRunning(_) => 40,
            MigrateError::InvalidMemoryLimit(_) => 50,
        }
    }

    /// Short machine-friendly kind, used as the `kind` field in error logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::NotFound(_) => "not_found",
            MigrateError::NotADirectory(_) => "not_a_directory",
            MigrateError::AlreadyExists(_) => "already_exists",
            MigrateError::DirectoryNotEmpty(_) => "directory_not_empty",
            MigrateError::InvalidPath { .. } => "invalid_path",
            MigrateError::Io { .. } => "io",
            MigrateError::AlreadyRunning(_) => "already_running",
            MigrateError::InvalidMemoryLimit(_) => "invalid_memory_limit",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrateError::NotFound(_))
    }
}
