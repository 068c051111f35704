//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `SPOTSEARCH_*` environment variables (read through dotenvy so a local
//! `.env` works too). CLI flags override on top in `lib.rs`.

use crate::error::{SearchError, SearchResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:9000";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SUGGESTION_COUNT: usize = 6;

/// Style suffix appended to synthesis prompts so generated query images
/// stay comparable with the catalog photography.
const DEFAULT_PROMPT_SUFFIX: &str = "photorealistic landscape photograph of the place, no people";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP bind address for `spotsearch serve`.
    pub bind_addr: SocketAddr,
    /// Catalog snapshot (spots + query image ids).
    pub catalog_path: PathBuf,
    /// Directory holding `text.json` / `image.json` feature tables.
    pub features_dir: PathBuf,
    /// How many query images `/suggest-images` returns.
    pub suggestion_count: usize,
    /// Use the deterministic offline embedders instead of the gateway.
    pub offline: bool,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub prompt_suffix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            catalog_path: PathBuf::from("data/catalog.json"),
            features_dir: PathBuf::from("data/features"),
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
            offline: false,
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
            prompt_suffix: DEFAULT_PROMPT_SUFFIX.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Parses a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> SearchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SearchError::InvalidConfig {
            field: "config_file",
            value: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Full resolution chain: defaults ← optional TOML file ← env vars.
    pub fn resolve(config_path: Option<&Path>) -> SearchResult<Self> {
        let base = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.apply_env())
    }

    /// Applies `SPOTSEARCH_*` overrides on top of `self`. Unparseable
    /// values are ignored rather than fatal.
    pub fn apply_env(mut self) -> Self {
        if let Ok(val) = dotenvy::var("SPOTSEARCH_BIND_ADDR")
            && let Ok(addr) = val.parse()
        {
            self.bind_addr = addr;
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_CATALOG") {
            self.catalog_path = PathBuf::from(val);
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_FEATURES_DIR") {
            self.features_dir = PathBuf::from(val);
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_SUGGESTION_COUNT")
            && let Ok(count) = val.parse()
        {
            self.suggestion_count = count;
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_OFFLINE") {
            self.offline = matches!(val.as_str(), "1" | "true" | "yes");
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_GATEWAY_URL") {
            self.gateway.base_url = val;
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_GATEWAY_TIMEOUT_SECS")
            && let Ok(secs) = val.parse()
        {
            self.gateway.timeout_secs = secs;
        }

        if let Ok(val) = dotenvy::var("SPOTSEARCH_PROMPT_SUFFIX") {
            self.gateway.prompt_suffix = val;
        }

        self
    }
}
