// src/config/mod.rs
//! Application configuration.
//!
//! Lookup order: `$CATCHUP_CONFIG_PATH`, then `config/catchup.toml`, then
//! `config/catchup.json`, else built-in defaults. Env overrides are applied on
//! top and the result is sanitized.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::reddit::DEFAULT_SUBREDDITS;
use crate::scheduler::DEFAULT_REFRESH_PERIOD;

pub const ENV_CONFIG_PATH: &str = "CATCHUP_CONFIG_PATH";
pub const ENV_BIND: &str = "CATCHUP_BIND";
pub const ENV_STORE_PATH: &str = "CATCHUP_STORE_PATH";
pub const ENV_REFRESH_SECS: &str = "CATCHUP_REFRESH_SECS";

const MIN_REFRESH_SECS: u64 = 10;

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}
fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_PERIOD.as_secs()
}
fn default_store_path() -> String {
    "state/catchup.json".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address of the local JSON API.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    /// Key-value file for favorites and the tags snapshot. Empty = in-memory only.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_true")]
    pub metrics: bool,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub reddit: RedditSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            refresh_interval_secs: default_refresh_secs(),
            store_path: default_store_path(),
            metrics: true,
            fetch: FetchSettings::default(),
            reddit: RedditSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub zenn_base: String,
    pub github_base: String,
    pub reddit_base: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("trend-catchup/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            zenn_base: "https://zenn.dev".to_string(),
            github_base: "https://api.github.com".to_string(),
            reddit_base: "https://www.reddit.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub subreddits: Vec<String>,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            subreddits: DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let toml_p = PathBuf::from("config/catchup.toml");
                let json_p = PathBuf::from("config/catchup.json");
                if toml_p.exists() {
                    Self::load_from(&toml_p)?
                } else if json_p.exists() {
                    Self::load_from(&json_p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(bind) = std::env::var(ENV_BIND) {
            self.bind = bind;
        }
        if let Ok(path) = std::env::var(ENV_STORE_PATH) {
            self.store_path = path;
        }
        if let Ok(secs) = std::env::var(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REFRESH_SECS} must be an integer"))?;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.bind = self.bind.trim().to_string();
        if self.bind.is_empty() {
            self.bind = default_bind();
        }
        self.store_path = self.store_path.trim().to_string();
        if self.refresh_interval_secs < MIN_REFRESH_SECS {
            self.refresh_interval_secs = MIN_REFRESH_SECS;
        }
        if self.fetch.timeout_secs == 0 {
            self.fetch.timeout_secs = FetchSettings::default().timeout_secs;
        }
        if self.fetch.user_agent.trim().is_empty() {
            self.fetch.user_agent = FetchSettings::default().user_agent;
        }
        self.reddit.subreddits = clean_list(std::mem::take(&mut self.reddit.subreddits));
        if self.reddit.subreddits.is_empty() {
            self.reddit = RedditSettings::default();
        }
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<AppConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!(toml_err).context("unsupported config format")),
    }
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .map(|it| it.trim().trim_start_matches("r/").to_string())
        .filter(|it| !it.is_empty() && seen.insert(it.clone()))
        .collect()
}
