use crate::error::{FeedlensError, Result};
use crate::view::SortKey;
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "FEEDLENS_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedlensConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts for transient failures. 0 means a single attempt.
    #[serde(default)]
    pub max_retries: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay before the post-submission insights re-fetch.
    #[serde(default = "default_reconcile_delay_ms")]
    pub reconcile_delay_ms: u64,
    #[serde(default = "default_min_message_chars")]
    pub min_message_chars: usize,
}

impl SyncConfig {
    pub fn reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.reconcile_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconcile_delay_ms: default_reconcile_delay_ms(),
            min_message_chars: default_min_message_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_view_limit")]
    pub default_limit: usize,
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

impl ViewConfig {
    /// The configured default sort key. Falls back to `priority_level` when
    /// the configured name is unknown.
    pub fn sort_key(&self) -> SortKey {
        self.default_sort.parse().unwrap_or_default()
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_limit: default_view_limit(),
            default_sort: default_sort(),
        }
    }
}

// -- Defaults --

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_retry_base_delay_ms() -> u64 {
    250
}
fn default_reconcile_delay_ms() -> u64 {
    2000
}
fn default_min_message_chars() -> usize {
    10
}
fn default_view_limit() -> usize {
    10
}
fn default_sort() -> String {
    SortKey::default().to_string()
}

impl FeedlensConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/feedlens/config.toml (global)
    /// 2. .feedlens/config.toml (project)
    /// 3. .feedlens/config.local.toml (local, gitignored)
    ///
    /// `FEEDLENS_API_URL` wins over every file layer.
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Layer 1: Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        // Layer 2: Project config
        if let Some(dir) = project_dir {
            let project_config = dir.join(".feedlens").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            // Layer 3: Local config (gitignored)
            let local_config = dir.join(".feedlens").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| FeedlensError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| FeedlensError::Config(e.to_string()))?;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                cfg.api.base_url = url.trim().to_string();
            }
        }

        cfg.validate();
        Ok(cfg)
    }

    /// Load with defaults only (no files).
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            sync: SyncConfig::default(),
            view: ViewConfig::default(),
        }
    }

    /// Validate config values, repairing out-of-range values and logging warnings.
    /// Lenient: values are fixed rather than rejected.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        let trimmed = self.api.base_url.trim_end_matches('/');
        if trimmed.len() != self.api.base_url.len() {
            self.api.base_url = trimmed.to_string();
        }
        if self.api.base_url.is_empty() {
            warnings.push(format!(
                "api.base_url is empty, using {}",
                default_base_url()
            ));
            self.api.base_url = default_base_url();
        } else if !self.api.base_url.starts_with("http://")
            && !self.api.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "api.base_url '{}' has no http(s) scheme",
                self.api.base_url
            ));
        }

        // Positive integer checks
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs = 0, setting to 1".to_string());
            self.api.timeout_secs = 1;
        }
        if self.sync.min_message_chars == 0 {
            warnings.push("sync.min_message_chars = 0, setting to 1".to_string());
            self.sync.min_message_chars = 1;
        }
        if self.view.default_limit == 0 {
            warnings.push("view.default_limit = 0, setting to 1".to_string());
            self.view.default_limit = 1;
        }

        if self.view.default_sort.parse::<SortKey>().is_err() {
            warnings.push(format!(
                "unknown view.default_sort '{}', valid: {}",
                self.view.default_sort,
                SortKey::ALL
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            self.view.default_sort = default_sort();
        }

        // Log warnings via tracing (if subscriber is set up)
        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("feedlens").join("config.toml"))
}
