use crate::fetch::ClientConfig;
use crate::retry::RetryPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per segment (including the first).
    /// Omit to retry until the segment succeeds.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let base = if self.base_delay_secs.is_finite() && self.base_delay_secs > 0.0 {
            Duration::from_secs_f64(self.base_delay_secs)
        } else {
            Duration::ZERO
        };
        RetryPolicy {
            max_attempts: self.max_attempts.filter(|&n| n > 0),
            base_delay: base,
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/hlsdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsdlConfig {
    /// Number of concurrent segment workers.
    pub threads: usize,
    /// Try ffmpeg for the merge before falling back to concatenation.
    pub use_external_muxer: bool,
    /// Wall-clock limit per request in seconds.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Fixed user agent; unset rotates through built-in browser strings.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for HlsdlConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            use_external_muxer: true,
            request_timeout_secs: 60,
            connect_timeout_secs: 30,
            user_agent: None,
            retry: None,
        }
    }
}

impl HlsdlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    /// Client settings from config; per-run headers are layered on by the caller.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientConfig::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HlsdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HlsdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HlsdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
