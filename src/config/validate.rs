//! Config validation logic.
//! Verifies the storage root exists and is a readable, writable directory,
//! canonicalizes it, and checks the layout segments.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::platform::hidden_temp_name;

use super::types::Config;

/// Validate `cfg` and replace `storage_root` with its canonical form.
pub fn validate_and_normalize(cfg: &mut Config) -> Result<()> {
    let Some(root) = cfg.storage_root.clone() else {
        bail!("storage_root is not set; edit the config file or pass --storage-root");
    };

    ensure_dir_exists_and_is_dir(&root)?;
    ensure_readable(&root)?;
    if !cfg.dry_run {
        ensure_writable(&root)?;
    }

    // dunce keeps Windows paths in their familiar (non-UNC) form.
    let canonical = dunce::canonicalize(&root)
        .with_context(|| format!("canonicalize storage_root '{}'", root.display()))?;
    cfg.storage_root = Some(canonical);

    cfg.layout().context("invalid preview_root / legacy_marker")?;

    info!(
        storage_root = %cfg.storage_root.as_deref().unwrap_or(Path::new("")).display(),
        preview_root = %cfg.preview_root,
        legacy_marker = %cfg.legacy_marker,
        memory_limit = %cfg.memory_limit,
        "Config validated"
    );
    Ok(())
}

fn ensure_dir_exists_and_is_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        error!("storage_root does not exist: {}", path.display());
        bail!("storage_root does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("storage_root is not a directory: {}", path.display());
        bail!("storage_root is not a directory: {}", path.display());
    }
    Ok(())
}

fn ensure_readable(path: &Path) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read storage_root '{}'; check permissions", path.display())
    })?;
    debug!("storage_root readable: {}", path.display());
    Ok(())
}

/// Non-destructive write check: create and remove a hidden file.
fn ensure_writable(path: &Path) -> Result<()> {
    let scratch = hidden_temp_name(path, "writecheck");
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)
        .with_context(|| format!("Cannot write to storage_root '{}'; check permissions", path.display()))?;
    let _ = fs::remove_file(&scratch);
    debug!("storage_root writable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn canonicalizes_existing_root() {
        let td = tempdir().unwrap();
        let nested = td.path().join("bucket");
        fs::create_dir(&nested).unwrap();
        let mut cfg = Config::new(td.path().join("bucket").join("..").join("bucket"));
        validate_and_normalize(&mut cfg).unwrap();
        assert_eq!(cfg.storage_root.unwrap(), dunce::canonicalize(&nested).unwrap());
        // scratch file is gone
        assert_eq!(fs::read_dir(&nested).unwrap().count(), 0);
    }

    #[test]
    fn rejects_missing_unset_and_file_roots() {
        let td = tempdir().unwrap();
        let mut unset = Config::default();
        assert!(validate_and_normalize(&mut unset).unwrap_err().to_string().contains("not set"));

        let mut missing = Config::new(td.path().join("nope"));
        assert!(validate_and_normalize(&mut missing).unwrap_err().to_string().contains("does not exist"));

        let file = td.path().join("file");
        fs::write(&file, b"x").unwrap();
        let mut not_dir = Config::new(&file);
        assert!(validate_and_normalize(&mut not_dir).unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn rejects_bad_layout_segments() {
        let td = tempdir().unwrap();
        let mut cfg = Config::new(td.path());
        cfg.legacy_marker = cfg.preview_root.clone();
        assert!(validate_and_normalize(&mut cfg).is_err());
    }
}
