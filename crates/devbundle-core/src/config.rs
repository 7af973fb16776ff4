use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loader configuration loaded from `~/.config/devbundle/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Text passed to the loading indicator while any bundle is downloading.
    pub loading_message: String,
    /// Label attached to every request for transport-side diagnostics.
    pub tracking_name: String,
    /// Whether requests carry cookies/credentials.
    pub with_credentials: bool,
    /// Request timeout in milliseconds (None = transport default).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Dev server base URL, e.g. "http://localhost:8081/". Used by embedders
    /// that don't resolve the server themselves.
    #[serde(default)]
    pub dev_server_url: Option<String>,
    /// Headers added to every bundle request.
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            loading_message: "Downloading...".to_string(),
            tracking_name: "loadBundleFromServer".to_string(),
            with_credentials: true,
            timeout_ms: None,
            dev_server_url: None,
            default_headers: HashMap::new(),
        }
    }
}

impl LoaderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("devbundle")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LoaderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LoaderConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<LoaderConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: LoaderConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
