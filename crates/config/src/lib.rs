//! Configuration loading and validation.
//!
//! Config files: `recast.toml`, `recast.yaml`, or `recast.json`
//! Searched in `./` then `~/.config/recast/`.
//!
//! `RECAST_REFRESH_INTERVAL_MS` and `RECAST_LOG_LEVEL` override file values.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{LoggingConfig, RecastConfig, RefreshConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
