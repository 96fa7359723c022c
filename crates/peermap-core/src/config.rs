//! Configuration system for peermap.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PEERMAP_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/peermap/config.toml
//!   3. ~/.config/peermap/config.toml

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeermapConfig {
    pub chain: ChainConfig,
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Slot length of the monitored chain. The clients page is cached for
    /// exactly one slot.
    pub seconds_per_slot: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Sustained calls per second allowed per caller address.
    pub calls_per_second: f64,
    /// Calls a caller may burst before being throttled.
    pub burst: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON file of client reports loaded at startup. None = start empty.
    pub seed_path: Option<PathBuf>,
}

impl ChainConfig {
    /// How long one built clients page stays fresh.
    pub fn slot_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            seconds_per_slot: 12,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: 9101,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            calls_per_second: 10.0,
            burst: 20.0,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("peermap")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PeermapConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&path, &text)?
        } else {
            PeermapConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config document. `path` is only used for error reporting.
    pub fn from_toml(path: &std::path::Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PEERMAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&PeermapConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.seconds_per_slot == 0 {
            return Err(ConfigError::Invalid(
                "chain.seconds_per_slot must be greater than zero".into(),
            ));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.calls_per_second <= 0.0 || self.rate_limit.burst < 1.0)
        {
            return Err(ConfigError::Invalid(
                "rate_limit needs calls_per_second > 0 and burst >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Apply PEERMAP_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PEERMAP_CHAIN__SECONDS_PER_SLOT") {
            if let Ok(s) = v.parse() {
                self.chain.seconds_per_slot = s;
            }
        }
        if let Ok(v) = std::env::var("PEERMAP_API__BIND") {
            if let Ok(addr) = v.parse() {
                self.api.bind = addr;
            }
        }
        if let Ok(v) = std::env::var("PEERMAP_API__PORT") {
            if let Ok(p) = v.parse() {
                self.api.port = p;
            }
        }
        if let Ok(v) = std::env::var("PEERMAP_RATE_LIMIT__ENABLED") {
            self.rate_limit.enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("PEERMAP_REGISTRY__SEED_PATH") {
            self.registry.seed_path = Some(PathBuf::from(v));
        }
    }
}
