use clap::Parser;
use preview_migrate::cli::Args;
use preview_migrate::config::types::{Config, LogLevel};
use preview_migrate::{MemoryLimit, MigrationMode};
use std::path::PathBuf;

#[test]
fn no_arguments_is_valid() {
    let args = Args::try_parse_from(["preview_migrate"]).unwrap();
    assert!(!args.yes && !args.dry_run && !args.delete && !args.print_config);
    assert_eq!(args.effective_log_level(), None);

    let mut cfg = Config::new("/mnt/bucket");
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.storage_root, Some(PathBuf::from("/mnt/bucket")));
    assert!(cfg.progress);
    assert_eq!(cfg.mode(), MigrationMode::Move);
}

#[test]
fn effective_log_level_precedence() {
    let args = Args::parse_from(["preview_migrate", "--debug"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));

    let args = Args::parse_from(["preview_migrate", "--log-level", "info"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Info));
}

#[test]
fn apply_overrides_sets_flags() {
    let args = Args::parse_from([
        "preview_migrate",
        "--storage-root",
        "/sr",
        "--memory-limit",
        "2G",
        "--log-level",
        "info",
        "--dry-run",
        "--delete",
        "--yes",
    ]);
    let mut cfg = Config::default();
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.storage_root, Some(PathBuf::from("/sr")));
    assert_eq!(cfg.memory_limit, MemoryLimit::Bytes(2 * 1024 * 1024 * 1024));
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert!(cfg.dry_run && cfg.assume_yes);
    assert_eq!(cfg.mode(), MigrationMode::Delete);
}

#[test]
fn file_values_survive_when_flags_absent() {
    let args = Args::parse_from(["preview_migrate"]);
    let mut cfg = Config::new("/from/file");
    cfg.memory_limit = MemoryLimit::Bytes(4096);
    cfg.log_level = LogLevel::Quiet;
    args.apply_overrides(&mut cfg);
    assert_eq!(cfg.storage_root, Some(PathBuf::from("/from/file")));
    assert_eq!(cfg.memory_limit, MemoryLimit::Bytes(4096));
    assert_eq!(cfg.log_level, LogLevel::Quiet);
}
