//! Configuration resolution for Clubhouse.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/clubhouse/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::premium::DEFAULT_EXTENSION_MONTHS;

/// Complete Clubhouse configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub premium: PremiumConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Listener and storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    /// Directory that receives uploaded payment proofs.
    pub blob_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 50061)),
            database_path: None,
            blob_root: None,
        }
    }
}

/// Token lifetimes. The signing secret is never read from a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Premium workflow limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PremiumConfig {
    /// Months added per approved request.
    pub extension_months: u32,
    /// Largest accepted payment proof upload.
    pub max_proof_bytes: usize,
    /// Accepted MIME types for payment proofs.
    pub allowed_content_types: Vec<String>,
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            extension_months: DEFAULT_EXTENSION_MONTHS,
            max_proof_bytes: 5 * 1024 * 1024, // 5 MB
            allowed_content_types: [
                "image/jpeg",
                "image/png",
                "image/webp",
                "application/pdf",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `RUST_LOG` filter.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "clubhouse_server=info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    let mut config = layer_files(global.as_deref().into_iter().chain(explicit))?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config.validate()?;
    Ok(config)
}

/// Fold settings files over the defaults, later files winning key by key.
/// A file only overrides the keys it actually spells out.
fn layer_files<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<Config> {
    let mut merged = serde_json::Value::Object(serde_json::Map::new());
    for path in paths {
        merge_value(&mut merged, load_config_file(path)?);
    }
    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid settings: {e}")))
}

impl Config {
    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.access_ttl_secs <= 0 || self.auth.refresh_ttl_secs <= 0 {
            return Err(Error::Config("token TTLs must be positive".into()));
        }
        if self.premium.extension_months == 0 {
            return Err(Error::Config(
                "premium.extension_months must be at least 1".into(),
            ));
        }
        if self.premium.max_proof_bytes == 0 {
            return Err(Error::Config(
                "premium.max_proof_bytes must be positive".into(),
            ));
        }
        if self.premium.allowed_content_types.is_empty() {
            return Err(Error::Config(
                "premium.allowed_content_types must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("clubhouse").join("settings.json"))
}

fn load_config_file(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {e}", path.display()))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must hold a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Objects merge recursively; any other overlay value replaces the base.
fn merge_value(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = var("CLUBHOUSE_ADDR") {
        config.server.addr = val
            .parse()
            .map_err(|e| Error::Config(format!("CLUBHOUSE_ADDR: {e}")))?;
    }
    if let Some(val) = var("CLUBHOUSE_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("CLUBHOUSE_BLOB_ROOT") {
        config.server.blob_root = Some(PathBuf::from(val));
    }
    if let Some(val) = var("CLUBHOUSE_MAX_PROOF_BYTES") {
        config.premium.max_proof_bytes = val
            .parse()
            .map_err(|e| Error::Config(format!("CLUBHOUSE_MAX_PROOF_BYTES: {e}")))?;
    }
    if let Some(val) = var("CLUBHOUSE_LOG_FILTER") {
        config.logging.filter = val;
    }
    Ok(())
}
