//! Configuration loading and typed config structures for the Commitboard
//! indexer.
//!
//! The canonical configuration lives in `commitboard-config.yaml` at the
//! project root. Every field has a default, so an empty or missing file
//! yields a working configuration pointed at the Base mainnet deployment.
//! A handful of deployment-specific values can be overridden from the
//! environment.

use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is unusable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level indexer configuration.
///
/// Mirrors the structure of `commitboard-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitboardConfig {
    /// Chain endpoint and contract deployment.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Refresh cadence and view sizes.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Time zone used for streak days and the daily puzzle.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Observer API server settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Daily puzzle rotation. Empty disables the puzzle.
    #[serde(default)]
    pub puzzles: Vec<PuzzleConfig>,
}

impl CommitboardConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override deployment values from environment variables.
    ///
    /// - `COMMITBOARD_RPC_URL` -- `chain.rpc_url`
    /// - `COMMITBOARD_CONTRACT` -- `chain.contract_address`
    /// - `COMMITBOARD_PORT` -- `observer.port`
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("COMMITBOARD_RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Ok(raw) = std::env::var("COMMITBOARD_CONTRACT") {
            self.chain.contract_address =
                raw.parse().map_err(|e| ConfigError::Invalid {
                    field: "chain.contract_address",
                    reason: format!("{e}"),
                })?;
        }
        if let Ok(raw) = std::env::var("COMMITBOARD_PORT") {
            self.observer.port = raw.parse().map_err(|e| ConfigError::Invalid {
                field: "observer.port",
                reason: format!("{e}"),
            })?;
        }
        Ok(())
    }

    /// Reject values that would stall or break the indexer.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.log_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chain.log_chunk_size",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "polling.interval_ms",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.calendar.utc_offset_minutes.unsigned_abs() >= MINUTES_PER_DAY {
            return Err(ConfigError::Invalid {
                field: "calendar.utc_offset_minutes",
                reason: format!(
                    "{} is outside (-1440, 1440)",
                    self.calendar.utc_offset_minutes
                ),
            });
        }
        Ok(())
    }
}

const MINUTES_PER_DAY: u32 = 1_440;

/// Chain endpoint and contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Address of the commitment contract.
    #[serde(default = "default_contract_address")]
    pub contract_address: Address,

    /// Expected chain id (8453 is Base mainnet).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// First block to scan for events. When unset, the collector finds
    /// the block where the contract code first appears.
    #[serde(default)]
    pub deployment_block: Option<u64>,

    /// Maximum block span per `eth_getLogs` request.
    #[serde(default = "default_log_chunk_size")]
    pub log_chunk_size: u64,

    /// Delay between receipt polls while a transaction confirms.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Give up waiting for a receipt after this long.
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

impl ChainConfig {
    /// Receipt poll interval as a [`Duration`].
    pub const fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Receipt timeout as a [`Duration`].
    pub const fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: default_contract_address(),
            chain_id: default_chain_id(),
            deployment_block: None,
            log_chunk_size: default_log_chunk_size(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
        }
    }
}

/// Refresh cadence and view sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    /// Milliseconds between full history refreshes.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Number of leaderboard rows to publish.
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,
}

impl PollingConfig {
    /// Poll interval as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            leaderboard_limit: default_leaderboard_limit(),
        }
    }
}

/// Calendar zone for day boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CalendarConfig {
    /// Offset from UTC in minutes (e.g. `-300` for UTC-5).
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Observer API server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Bind host.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,

    /// How long a finished transaction status stays visible.
    #[serde(default = "default_status_ttl_ms")]
    pub status_ttl_ms: u64,
}

impl ObserverConfig {
    /// Status display window as a [`Duration`].
    pub const fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
            status_ttl_ms: default_status_ttl_ms(),
        }
    }
}

/// One entry in the daily puzzle rotation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PuzzleConfig {
    /// The riddle.
    pub question: String,
    /// Expected answer, compared case-insensitively.
    pub answer: String,
    /// Hint shown on request.
    #[serde(default)]
    pub hint: String,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_rpc_url() -> String {
    "https://mainnet.base.org".to_owned()
}

fn default_contract_address() -> Address {
    alloy_primitives::address!("3bA728E41d754200c1717c652Fd3dF6e433e80E4")
}

const fn default_chain_id() -> u64 {
    8453
}

const fn default_log_chunk_size() -> u64 {
    10_000
}

const fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

const fn default_receipt_timeout_ms() -> u64 {
    120_000
}

const fn default_poll_interval_ms() -> u64 {
    15_000
}

const fn default_leaderboard_limit() -> usize {
    5
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_status_ttl_ms() -> u64 {
    3_000
}
