//! Unique hidden sibling names for atomic writes and writability checks.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pattern: `.preview_migrate.<tag>.<pid>.<nanos>.<seq>` inside `dir`.
pub fn hidden_temp_name(dir: &Path, tag: &str) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".preview_migrate.{tag}.{pid}.{nanos}.{seq}"))
}

/// Temp sibling of a config file, used before the final rename.
pub fn tmp_config_sibling_name(target: &Path) -> PathBuf {
    hidden_temp_name(target.parent().unwrap_or_else(|| Path::new(".")), "config.tmp")
}
