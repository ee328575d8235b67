use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BabbleConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub corpus: CorpusConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub pool_size: usize,
    /// `0` waits for a free connection indefinitely.
    pub acquire_timeout_ms: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub max_corpus_size: usize,
    pub read_cap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Most tenants kept per cache.
    pub max_entries: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_babble_dir()
            .join("data.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            pool_size: 10,
            acquire_timeout_ms: 30_000,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            max_corpus_size: 2000,
            read_cap: 1000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_interval_secs: 60,
            max_entries: 10_000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_length: 50 }
    }
}

/// Returns `~/.babble/`
pub fn default_babble_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".babble")
}

/// Returns the default config file path: `~/.babble/config.toml`
pub fn default_config_path() -> PathBuf {
    default_babble_dir().join("config.toml")
}

impl BabbleConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            BabbleConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides (BABBLE_DB, BABBLE_LOG_LEVEL, BABBLE_MAX_CORPUS).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("BABBLE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("BABBLE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("BABBLE_MAX_CORPUS") {
            self.corpus.max_corpus_size = val
                .parse()
                .with_context(|| format!("BABBLE_MAX_CORPUS is not a number: {val:?}"))?;
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
