//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - CLI flags override config values (which are loaded from XML).

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::migrate::MemoryLimit;

/// Migrate preview objects from the legacy layout into the sharded layout.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Resumably migrate preview objects out of the legacy layout"
)]
pub struct Args {
    /// Override the storage root (local mount of the object store).
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub storage_root: Option<PathBuf>,

    /// Memory ceiling: bytes, K/M/G suffix, or -1 for unlimited.
    #[arg(long, value_name = "LIMIT", allow_hyphen_values = true, value_parser = parse_memory_limit)]
    pub memory_limit: Option<MemoryLimit>,

    /// Answer yes to the confirmation prompt (batch mode).
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be done, but do not modify the store.
    #[arg(long)]
    pub dry_run: bool,

    /// Delete legacy previews instead of migrating them; they are regenerated on demand.
    #[arg(long)]
    pub delete: bool,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,
}

fn parse_memory_limit(s: &str) -> Result<MemoryLimit, String> {
    s.parse::<MemoryLimit>().map_err(|e| e.to_string())
}

impl Args {
    /// `--log-level` wins over `--debug`; `None` keeps the configured level.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        self.log_level.or(self.debug.then_some(LogLevel::Debug))
    }

    /// Apply CLI overrides on top of file values (CLI wins).
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = &self.storage_root {
            cfg.storage_root = Some(root.clone());
        }
        if let Some(limit) = self.memory_limit {
            cfg.memory_limit = limit;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        cfg.dry_run |= self.dry_run;
        cfg.delete_legacy |= self.delete;
        cfg.assume_yes |= self.yes;
        if self.no_progress {
            cfg.progress = false;
        }
    }
}

/// Parse CLI args.
pub fn parse() -> Args {
    Args::parse()
}
