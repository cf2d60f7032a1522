//! Configuration loading and remote store resolution
//!
//! Resolution order for the remote store location and key:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`RDC_*`, then the legacy `VITE_SUPABASE_*` names)
//! 3. TOML config file
//! 4. Compiled defaults (table name, timeouts, image and logging settings)
//!
//! A missing TOML file is not an error: a warning is logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Directory name under the platform config dir
pub const APP_DIR: &str = "rei-das-clinicas";

/// Remote table holding the clinic listings
pub const DEFAULT_LISTINGS_TABLE: &str = "clinicas";

pub const ENV_STORE_URL: &str = "RDC_STORE_URL";
pub const ENV_STORE_ANON_KEY: &str = "RDC_STORE_ANON_KEY";
pub const LEGACY_ENV_STORE_URL: &str = "VITE_SUPABASE_URL";
pub const LEGACY_ENV_STORE_ANON_KEY: &str = "VITE_SUPABASE_ANON_KEY";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub store: StoreConfig,
    pub images: ImageConfig,
    pub logging: LoggingConfig,
}

/// Remote store section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub url: Option<String>,
    /// Public (anon) API key sent with every request
    pub anon_key: Option<String>,
    pub listings_table: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            listings_table: DEFAULT_LISTINGS_TABLE.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Photo compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Photos wider than this are scaled down proportionally
    pub max_width: u32,
    /// JPEG quality (0.0..=1.0) for photos attached to a new listing
    pub create_quality: f32,
    /// JPEG quality (0.0..=1.0) for photos added while editing
    pub edit_quality: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            create_quality: 0.7,
            edit_quality: 0.6,
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct StoreOverrides {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// Fully resolved remote store settings
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStore {
    pub url: String,
    pub anon_key: String,
    pub listings_table: String,
    pub timeout: Duration,
}

/// Default config file location (`<config_dir>/rei-das-clinicas/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if it exists, otherwise fall back to defaults
///
/// A file that exists but does not parse is still an error.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    debug!(path = %path.display(), "Loading config file");
    load_toml_config(&path)
}

/// Strip surrounding whitespace and one pair of matching surrounding quotes
///
/// Environment files frequently carry values like `"https://x.supabase.co"` or `'key' `.
pub fn clean_env_value(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// First non-empty cleaned value among the given environment variables
pub fn env_value(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| clean_env_value(&v))
        .find(|v| !v.is_empty() && v != "undefined")
}

fn pick(cli: Option<&String>, env_names: &[&str], toml: Option<&String>) -> Option<String> {
    cli.map(|v| clean_env_value(v))
        .filter(|v| !v.is_empty())
        .or_else(|| env_value(env_names))
        .or_else(|| toml.map(|v| clean_env_value(v)).filter(|v| !v.is_empty()))
}

/// Resolve remote store settings from CLI → ENV → TOML → defaults
pub fn resolve_store(cli: &StoreOverrides, toml: &StoreConfig) -> Result<ResolvedStore> {
    let url = pick(
        cli.url.as_ref(),
        &[ENV_STORE_URL, LEGACY_ENV_STORE_URL],
        toml.url.as_ref(),
    )
    .ok_or_else(|| {
        Error::Config(format!(
            "Remote store URL not configured. Use --store-url, {} or [store] url in the config file",
            ENV_STORE_URL
        ))
    })?;

    let anon_key = pick(
        cli.anon_key.as_ref(),
        &[ENV_STORE_ANON_KEY, LEGACY_ENV_STORE_ANON_KEY],
        toml.anon_key.as_ref(),
    )
    .ok_or_else(|| {
        Error::Config(format!(
            "Remote store key not configured. Use --anon-key, {} or [store] anon_key in the config file",
            ENV_STORE_ANON_KEY
        ))
    })?;

    let listings_table = if toml.listings_table.trim().is_empty() {
        DEFAULT_LISTINGS_TABLE.to_string()
    } else {
        toml.listings_table.trim().to_string()
    };

    Ok(ResolvedStore {
        url: url.trim_end_matches('/').to_string(),
        anon_key,
        listings_table,
        timeout: Duration::from_secs(toml.timeout_secs.max(1)),
    })
}

/// Write config atomically (temp file + rename, 0600 on Unix)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    debug!(path = %path.display(), "Config written");
    Ok(())
}
