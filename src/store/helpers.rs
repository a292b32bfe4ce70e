//! I/O helper utilities.
//!
//! Converts io::Error into `MigrateError::Io` with the failing operation, the
//! local path, and a short platform-aware hint, usable with `map_err`.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;

use std::io;
use std::path::Path;

use crate::errors::MigrateError;

/// Pick a human-friendly hint for the error by raw OS code, falling back to its kind.
fn hint_for(e: &io::Error) -> &'static str {
    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    return " (permission denied; check ownership and write permissions)";
                }
                libc::EXDEV => return " (cross-filesystem; source and destination must share a bucket mount)",
                libc::EBUSY => return " (resource busy; ensure no other process is writing)",
                libc::ENOTEMPTY | libc::EEXIST => return " (target is not empty or already exists)",
                libc::ENOSPC => return " (insufficient space on device)",
                libc::EROFS => return " (read-only filesystem)",
                libc::ENAMETOOLONG => return " (filename or path too long)",
                libc::EMFILE | libc::ENFILE => return " (file descriptor limit reached)",
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => return " (access denied; check permissions)",
                17 => return " (not same device; cross-filesystem move)",
                32 => return " (sharing violation; file is in use)",
                145 => return " (directory not empty)",
                112 => return " (insufficient disk space)",
                _ => {}
            }
        }
        let _ = code;
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => " (permission denied; check ownership and write permissions)",
        io::ErrorKind::NotFound => " (path not found)",
        io::ErrorKind::AlreadyExists => " (already exists)",
        _ => "",
    }
}

/// Returns a closure suitable for `.map_err(...)` converting io::Error -> MigrateError.
pub(crate) fn io_error_with_help<'a>(
    op: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> MigrateError + 'a {
    move |e: io::Error| MigrateError::Io {
        op,
        path: path.to_path_buf(),
        hint: hint_for(&e),
        source: e,
    }
}
