use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::RecastConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["recast.toml", "recast.yaml", "recast.yml", "recast.json"];

/// Load config from the given path (any supported format), then apply
/// environment overrides.
pub fn load_config(path: &Path) -> anyhow::Result<RecastConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let mut config = parse_config(&raw, path)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./recast.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/recast/recast.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RecastConfig::default()` if no config file is found or it fails
/// to load.
pub fn discover_and_load() -> RecastConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    let mut config = RecastConfig::default();
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/recast/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "recast").map(|d| d.config_dir().to_path_buf())
}

/// Apply `RECAST_*` environment variables on top of file values.
pub fn apply_env_overrides(config: &mut RecastConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with a custom lookup, so tests need not
/// touch the process environment.
fn apply_env_overrides_with(config: &mut RecastConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup("RECAST_REFRESH_INTERVAL_MS") {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.refresh.interval_ms = ms,
            Err(e) => warn!(value = %raw, error = %e, "ignoring RECAST_REFRESH_INTERVAL_MS"),
        }
    }
    if let Some(level) = lookup("RECAST_LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
        config.logging.level = level.trim().to_string();
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RecastConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
