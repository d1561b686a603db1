//! Tunables for locking, heartbeats and local fallback ids.
//!
//! ```ignore
//! let config = SyncConfig::from_json(r#"{ "lock_ttl_ms": 60000 }"#)?;
//! assert_eq!(config.heartbeat_interval(), Duration::from_secs(20));
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default lock lease: 15 minutes.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(15 * 60);

/// Default namespace for client-issued document ids.
pub const DEFAULT_LOCAL_PREFIX: &str = "local_";

/// Configuration shared by the lock manager, heartbeat and local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Lock time-to-live in milliseconds.
    pub lock_ttl_ms: u64,
    /// Heartbeat interval in milliseconds. `None` means `TTL / 3`.
    pub heartbeat_interval_ms: Option<u64>,
    /// Prefix that marks a document id as local.
    pub local_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lock_ttl_ms: DEFAULT_LOCK_TTL.as_millis() as u64,
            heartbeat_interval_ms: None,
            local_prefix: DEFAULT_LOCAL_PREFIX.to_string(),
        }
    }
}

/// Configuration rejected by [`SyncConfig::validate`] or failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    ZeroTtl,
    /// Explicit zero interval, or a TTL under 3 ms with the derived interval.
    ZeroHeartbeat,
    HeartbeatNotBelowTtl { heartbeat_ms: u64, ttl_ms: u64 },
    EmptyLocalPrefix,
    /// Prefix made only of `[0-9a-z]` could collide with server-issued ids.
    AmbiguousLocalPrefix(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "invalid config: {}", msg),
            ConfigError::ZeroTtl => write!(f, "lock ttl must be greater than zero"),
            ConfigError::ZeroHeartbeat => write!(f, "heartbeat interval must be greater than zero"),
            ConfigError::HeartbeatNotBelowTtl {
                heartbeat_ms,
                ttl_ms,
            } => write!(
                f,
                "heartbeat interval ({}ms) must be shorter than the lock ttl ({}ms)",
                heartbeat_ms, ttl_ms
            ),
            ConfigError::EmptyLocalPrefix => write!(f, "local id prefix must not be empty"),
            ConfigError::AmbiguousLocalPrefix(prefix) => write!(
                f,
                "local id prefix {:?} needs a character outside [0-9a-z]",
                prefix
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON config document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn with_local_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.local_prefix = prefix.into();
        self
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_millis(self.lock_ttl_ms)
    }

    /// The heartbeat period; always strictly shorter than the TTL once validated.
    pub fn heartbeat_interval(&self) -> Duration {
        match self.heartbeat_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.lock_ttl() / 3,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_ttl_ms == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        let heartbeat_ms = self.heartbeat_interval().as_millis() as u64;
        if heartbeat_ms == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        if heartbeat_ms >= self.lock_ttl_ms {
            return Err(ConfigError::HeartbeatNotBelowTtl {
                heartbeat_ms,
                ttl_ms: self.lock_ttl_ms,
            });
        }
        if self.local_prefix.is_empty() {
            return Err(ConfigError::EmptyLocalPrefix);
        }
        if self
            .local_prefix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        {
            return Err(ConfigError::AmbiguousLocalPrefix(self.local_prefix.clone()));
        }
        Ok(())
    }
}
