//! Application-level configuration loading, including the registered probes and thresholds.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::{
    checks::metrics::{DEFAULT_MEMORY_WARN_PERCENT, DEFAULT_STORAGE_WARN_PERCENT},
    services::health_service::ExecutionMode,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/health.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HEALTH_AGGREGATOR_CONFIG_PATH";
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_STORAGE_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Storage usage percentage at which the storage metric warns.
    pub storage_warn_percent: f64,
    /// Memory usage percentage at which the memory metric warns.
    pub memory_warn_percent: f64,
    /// Upper bound on a single probe call.
    pub probe_timeout: Duration,
    /// Whether probes run one after another or all at once.
    pub execution: ExecutionMode,
    /// Path whose filesystem the storage metric inspects.
    pub storage_path: PathBuf,
    /// Memory ceiling in megabytes; the host's total memory when unset.
    pub memory_limit_mb: Option<u64>,
    /// Probes in registration order.
    pub probes: Vec<ProbeConfig>,
    source: Option<PathBuf>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration from `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(mut config) => {
                    info!(
                        path = %path.display(),
                        probes = config.probes.len(),
                        "loaded health configuration"
                    );
                    config.source = Some(path.to_path_buf());
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document. The result has no source path attached.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        raw.validate()?;
        Ok(raw.into())
    }

    /// Path of the file this configuration was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// Reasons a configuration document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid values: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// One probe entry, tagged by the driver it uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeConfig {
    /// Plain TCP handshake, e.g. against a database port.
    Tcp { name: String, address: String },
    /// RESP `PING` compared with `expected_reply`.
    Redis {
        #[serde(default = "default_redis_name")]
        name: String,
        address: String,
        #[serde(default = "default_ping_reply")]
        expected_reply: String,
    },
    /// GET request requiring a success status.
    Http { name: String, url: String },
    /// MongoDB `ping` command.
    Mongodb {
        #[serde(default = "default_database_name")]
        name: String,
        uri: String,
        #[serde(default)]
        database: Option<String>,
    },
    /// Write/read round-trip through the in-process cache.
    Cache {
        #[serde(default = "default_cache_name")]
        name: String,
    },
}

#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[validate(range(min = 0.0, max = 100.0))]
    storage_warn_percent: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    memory_warn_percent: f64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "probe_timeout_ms")]
    #[validate(custom(function = "validate_timeout"))]
    probe_timeout: Duration,
    execution: ExecutionMode,
    storage_path: PathBuf,
    // 16 TiB; keeps the conversion to bytes far from overflowing.
    #[validate(range(min = 1, max = 16_777_216))]
    memory_limit_mb: Option<u64>,
    probes: Vec<ProbeConfig>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            storage_warn_percent: DEFAULT_STORAGE_WARN_PERCENT,
            memory_warn_percent: DEFAULT_MEMORY_WARN_PERCENT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            execution: ExecutionMode::default(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            memory_limit_mb: None,
            probes: Vec::new(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            storage_warn_percent: value.storage_warn_percent,
            memory_warn_percent: value.memory_warn_percent,
            probe_timeout: value.probe_timeout,
            execution: value.execution,
            storage_path: value.storage_path,
            memory_limit_mb: value.memory_limit_mb,
            probes: value.probes,
            source: None,
        }
    }
}

fn validate_timeout(value: &Duration) -> Result<(), ValidationError> {
    if value.is_zero() {
        let mut err = ValidationError::new("probe_timeout_ms");
        err.message = Some("probe timeout must be at least 1ms".into());
        return Err(err);
    }
    Ok(())
}

fn default_redis_name() -> String {
    "Redis".into()
}

fn default_ping_reply() -> String {
    "PONG".into()
}

fn default_database_name() -> String {
    "Database".into()
}

fn default_cache_name() -> String {
    "Cache".into()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
