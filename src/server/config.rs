use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::analytics::ScoringProfile;

/// Environment variables are read with this prefix, e.g. `PULSE_TELEMETRY_URL`.
pub const ENV_PREFIX: &str = "PULSE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub telemetry_url: String,
    pub push_interval_ms: u64,
    pub node_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub net_rate_lookback_secs: u64,
    pub net_rate_page_size: u32,
    pub scoring_profile: ScoringProfile,
    pub push_channel_capacity: usize,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    pub telemetry_url: Option<String>,
    pub push_interval_ms: Option<u64>,
    pub node_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub net_rate_lookback_secs: Option<u64>,
    pub net_rate_page_size: Option<u32>,
    pub scoring_profile: Option<String>,
    pub push_channel_capacity: Option<usize>,
    pub log_dir: Option<String>,
}

fn default_telemetry_url() -> String {
    "http://127.0.0.1:50051".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_PUSH_INTERVAL_MS: u64 = 2000;
const DEFAULT_NODE_TIMEOUT_MS: u64 = 1500;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_NET_RATE_LOOKBACK_SECS: u64 = 300;
const DEFAULT_NET_RATE_PAGE_SIZE: u32 = 500;
const DEFAULT_PUSH_CHANNEL_CAPACITY: usize = 100;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            telemetry_url: default_telemetry_url(),
            push_interval_ms: DEFAULT_PUSH_INTERVAL_MS,
            node_timeout_ms: DEFAULT_NODE_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            net_rate_lookback_secs: DEFAULT_NET_RATE_LOOKBACK_SECS,
            net_rate_page_size: DEFAULT_NET_RATE_PAGE_SIZE,
            scoring_profile: ScoringProfile::default(),
            push_channel_capacity: DEFAULT_PUSH_CHANNEL_CAPACITY,
            log_dir: default_log_dir(),
        }
    }
}

impl ServerConfig {
    /// Defaults, overridden by the TOML file (if given and present), overridden by `PULSE_*` env vars.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) if Path::new(path_str).exists() => Self::read_file(path_str)?,
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::prefixed(ENV_PREFIX).from_env()?;

        // 3. Merge: environment overrides file
        Self::from_layers(file_config, env_config)
    }

    pub fn read_file(path_str: &str) -> Result<PartialServerConfig, ConfigError> {
        let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
            path: path_str.to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_str.to_string(),
            source,
        })
    }

    pub fn from_layers(file: PartialServerConfig, env: PartialServerConfig) -> Result<Self, ConfigError> {
        let scoring_profile = match env.scoring_profile.or(file.scoring_profile) {
            Some(name) => name
                .parse::<ScoringProfile>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            None => ScoringProfile::default(),
        };

        let config = ServerConfig {
            telemetry_url: env.telemetry_url.or(file.telemetry_url)
                .unwrap_or_else(default_telemetry_url),
            push_interval_ms: env.push_interval_ms.or(file.push_interval_ms)
                .unwrap_or(DEFAULT_PUSH_INTERVAL_MS),
            node_timeout_ms: env.node_timeout_ms.or(file.node_timeout_ms)
                .unwrap_or(DEFAULT_NODE_TIMEOUT_MS),
            request_timeout_ms: env.request_timeout_ms.or(file.request_timeout_ms)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            net_rate_lookback_secs: env.net_rate_lookback_secs.or(file.net_rate_lookback_secs)
                .unwrap_or(DEFAULT_NET_RATE_LOOKBACK_SECS),
            net_rate_page_size: env.net_rate_page_size.or(file.net_rate_page_size)
                .unwrap_or(DEFAULT_NET_RATE_PAGE_SIZE),
            scoring_profile,
            push_channel_capacity: env.push_channel_capacity.or(file.push_channel_capacity)
                .unwrap_or(DEFAULT_PUSH_CHANNEL_CAPACITY),
            log_dir: env.log_dir.or(file.log_dir)
                .unwrap_or_else(default_log_dir),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("push_interval_ms", self.push_interval_ms),
            ("node_timeout_ms", self.node_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("net_rate_lookback_secs", self.net_rate_lookback_secs),
            ("net_rate_page_size", u64::from(self.net_rate_page_size)),
            ("push_channel_capacity", self.push_channel_capacity as u64),
        ];
        if let Some((key, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be greater than zero")));
        }
        if self.telemetry_url.trim().is_empty() {
            return Err(ConfigError::Invalid("telemetry_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }

    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.node_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn net_rate_lookback(&self) -> Duration {
        Duration::from_secs(self.net_rate_lookback_secs)
    }
}
