//! Core library for `preview_migrate`.
//!
//! Moves preview objects out of the legacy `preview/<marker>/...` subtree into
//! the sharded `preview/...` layout, one destination folder at a time, so a run
//! can stop at any group boundary and a later run resumes where it left off.
//!
//! Layout:
//! - `store`: object store trait, validated store paths, filesystem backend.
//! - `migrate`: scanner, grouper, resource guard, executor, run controller.
//! - `config`, `cli`, `output`, `platform`, `shutdown`: the surrounding tool.

pub mod cli;
pub mod config;
pub mod errors;
pub mod migrate;
pub mod output;
pub mod platform;
pub mod shutdown;
pub mod store;

pub use config::{
    CONFIG_ENV_VAR, Config, LoadResult, LogLevel, default_config_path, default_log_path,
    load_config_from_xml_path, load_or_init, path_has_symlink_ancestor, validate_and_normalize,
};
pub use errors::MigrateError;
pub use migrate::{
    ExitOutcome, MemoryGuard, MemoryLimit, MigrationMode, MigrationRun, PreviewLayout, RunOutcome,
    RunReport, run_migration,
};
pub use shutdown::{CancelSource, NeverCancel, ShutdownSignal};
pub use store::{FsObjectStore, ObjectStore, StorePath};
