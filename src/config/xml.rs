//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a secure template if the default file is missing.
//!
//! Notes:
//! - This module only reads/writes the config file; directory validation happens elsewhere.
//! - Unknown XML fields are a hard error so misconfigurations surface early.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{LEGACY_MARKER_DEFAULT, PREVIEW_ROOT_DEFAULT};

use crate::migrate::MemoryLimit;
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    storage_root: Option<String>,
    preview_root: Option<String>,
    legacy_marker: Option<String>,
    memory_limit: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
}

/// Outcome of locating the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { config: Config, path: PathBuf },
    /// No file existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config; empty elements keep the defaults.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    cfg.storage_root = non_empty(parsed.storage_root.as_deref()).map(PathBuf::from);
    if let Some(s) = non_empty(parsed.preview_root.as_deref()) {
        cfg.preview_root = s.to_string();
    }
    if let Some(s) = non_empty(parsed.legacy_marker.as_deref()) {
        cfg.legacy_marker = s.to_string();
    }
    if let Some(s) = non_empty(parsed.memory_limit.as_deref()) {
        cfg.memory_limit = s.parse::<MemoryLimit>()?;
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    cfg.log_file = non_empty(parsed.log_file.as_deref()).map(PathBuf::from);

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in config xml '{}'", path.display()))
}

/// Load the active config file, writing a template first if the default file is missing.
///
/// A missing file named by `PREVIEW_MIGRATE_CONFIG` is an error; templates are
/// only ever written at the default location.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path()?;
    if path.exists() {
        let config = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded { config, path });
    }
    if env::var_os(CONFIG_ENV_VAR).is_some_and(|v| !v.is_empty()) {
        bail!(
            "config file '{}' (from {CONFIG_ENV_VAR}) does not exist",
            path.display()
        );
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path))
}

/// Create the template config file and its parent directory.
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/preview_migrate.log".into());

    let content = format!(
        "<!--\n  preview_migrate configuration (XML)\n\n  storage_root   -> local mount point of the object store (required)\n  preview_root   -> first path segment of preview objects (default: {PREVIEW_ROOT_DEFAULT})\n  legacy_marker  -> segment marking the old layout (default: {LEGACY_MARKER_DEFAULT})\n  memory_limit   -> bytes or K/M/G suffix; -1 = unlimited; empty = process limit\n  log_level      -> quiet | normal | info | debug\n  log_file       -> path to log file (optional; stdout still used)\n\n  CLI flags override XML values.\n-->\n<config>\n  <storage_root></storage_root>\n  <preview_root>{PREVIEW_ROOT_DEFAULT}</preview_root>\n  <legacy_marker>{LEGACY_MARKER_DEFAULT}</legacy_marker>\n  <memory_limit></memory_limit>\n  <log_level>normal</log_level>\n  <log_file>{suggested_log}</log_file>\n</config>\n"
    );

    // Atomic, secure write (O_NOFOLLOW + create_new on Unix), then tighten perms.
    write_config_secure_new_0600(path, content.as_bytes())
        .with_context(|| format!("write template config '{}'", path.display()))?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}
