//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use validate::validate_and_normalize;
pub use xml::{LoadResult, create_template_config, load_config_from_xml_path, load_or_init};

pub use crate::migrate::{DEFAULT_LEGACY_MARKER as LEGACY_MARKER_DEFAULT, DEFAULT_PREVIEW_ROOT as PREVIEW_ROOT_DEFAULT};
