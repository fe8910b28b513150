use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::api::sanitize_base_url;
use crate::moderation::BanMatch;
use crate::pagination::DEFAULT_PAGE_LIMIT;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Sent as the `apikey` header on every request.
    pub api_key: Option<String>,
    pub page_limit: u32,
    /// Delay before scrolling to an anchor so the layout can settle.
    pub settle_delay: Duration,
    pub timeout: Duration,
    pub ban_match: BanMatch,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            page_limit: DEFAULT_PAGE_LIMIT,
            settle_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(15),
            ban_match: BanMatch::Pattern,
        }
    }
}

/// Optional TOML overlay, every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub page_limit: Option<u32>,
    pub settle_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub ban_match: Option<BanMatch>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Defaults, then the TOML file (if it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(path) = path.filter(|p| p.exists()) {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file: FileConfig = toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            config.apply_file(file)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(url) = file.api_url {
            self.api_url = sanitize_base_url(url).context("invalid api_url in config file")?;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key.filter(|key| !key.trim().is_empty());
        }
        if let Some(limit) = file.page_limit {
            self.page_limit = limit.max(1);
        }
        if let Some(ms) = file.settle_delay_ms {
            self.settle_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = file.ban_match {
            self.ban_match = mode;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("THREADLINE_API_URL").filter(|raw| !raw.trim().is_empty()) {
            self.api_url = sanitize_base_url(url).context("invalid THREADLINE_API_URL")?;
        }
        if let Some(key) = lookup("THREADLINE_API_KEY") {
            self.api_key = Some(key).filter(|key| !key.trim().is_empty());
        }
        if let Some(limit) = parse_var::<u32>(&lookup, "THREADLINE_PAGE_LIMIT") {
            self.page_limit = limit.max(1);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "THREADLINE_SETTLE_DELAY_MS") {
            self.settle_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "THREADLINE_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = parse_var::<BanMatch>(&lookup, "THREADLINE_BAN_MATCH") {
            self.ban_match = mode;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".threadline").join("config.toml"))
}
