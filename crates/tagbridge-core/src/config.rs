//! Configuration structures consumed by the bridge.
//!
//! Loading and merging configuration files is the host application's job;
//! this module only defines the shape the bridge expects and a light
//! [`BridgeConfig::validate`] pass for invariants the rest of the code
//! relies on.
//!
//! # Examples
//!
//! ```
//! use tagbridge_core::{BridgeConfig, MiddlewareKind};
//!
//! let json = r#"{
//!     "middleware_instances": [
//!         { "id": "desk", "type": "feig", "url": "http://10.0.0.5:7070" },
//!         { "id": "sim", "type": "mock" }
//!     ]
//! }"#;
//!
//! let config: BridgeConfig = serde_json::from_str(json).unwrap();
//! config.validate().unwrap();
//! assert_eq!(config.middleware_instances[0].kind(), MiddlewareKind::Feig);
//! assert_eq!(config.settling_delay_ms, 200);
//! ```

use crate::constants::{
    DEFAULT_DISCOVERY_TIMEOUT_MS, DEFAULT_MOCK_MAX_ITEMS, DEFAULT_MOCK_TICK_MS,
    DEFAULT_MONITOR_POLL_MS, DEFAULT_SETTLING_DELAY_MS,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Kind of reader-control service behind a middleware instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MiddlewareKind {
    /// In-process hardware simulator.
    Mock,

    /// Feig reader middleware reachable over HTTP.
    Feig,

    /// Anything else; carries the configured name for diagnostics.
    Unsupported(String),
}

impl MiddlewareKind {
    /// Parse a configured type name (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mock" => Self::Mock,
            "feig" => Self::Feig,
            _ => Self::Unsupported(name.to_string()),
        }
    }
}

impl fmt::Display for MiddlewareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Feig => write!(f, "feig"),
            Self::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// One deployed middleware instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareInstanceConfig {
    /// Unique identifier used as key in discovery results.
    pub id: String,

    /// Raw middleware type name (`mock`, `feig`, ...).
    #[serde(rename = "type")]
    pub kind_name: String,

    /// Base URL of the middleware's HTTP API; required for `feig`.
    #[serde(default)]
    pub url: Option<String>,
}

impl MiddlewareInstanceConfig {
    /// Create a configuration entry.
    pub fn new(id: impl Into<String>, kind_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind_name: kind_name.into(),
            url: None,
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Parsed middleware kind.
    pub fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::from_name(&self.kind_name)
    }
}

/// Whether the simulator changes its contents on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockMode {
    /// Random arrivals, departures, and movement while monitored.
    #[default]
    Auto,

    /// Contents only change through explicit harness calls.
    Manual,
}

impl fmt::Display for MockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Initial simulation mode.
    pub mode: MockMode,

    /// Maximum number of tags present at once.
    pub max_items: usize,

    /// Interval between automatic simulation steps.
    pub tick_interval_ms: u64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            mode: MockMode::Auto,
            max_items: DEFAULT_MOCK_MAX_ITEMS,
            tick_interval_ms: DEFAULT_MOCK_TICK_MS,
        }
    }
}

impl MockSettings {
    /// Tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn default_settling_delay_ms() -> u64 {
    DEFAULT_SETTLING_DELAY_MS
}

fn default_discovery_timeout_ms() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT_MS
}

fn default_monitor_poll_ms() -> u64 {
    DEFAULT_MONITOR_POLL_MS
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Log level name; see [`LogLevel`](crate::LogLevel).
    #[serde(default)]
    pub log_level: Option<String>,

    /// Middleware instances, in resolution priority order.
    #[serde(default)]
    pub middleware_instances: Vec<MiddlewareInstanceConfig>,

    /// Pause inserted before hardware calls.
    #[serde(default = "default_settling_delay_ms")]
    pub settling_delay_ms: u64,

    /// Per-instance discovery timeout.
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Inventory poll interval for HTTP middleware monitoring.
    #[serde(default = "default_monitor_poll_ms")]
    pub monitor_poll_ms: u64,

    /// Simulator settings, used by every `mock` instance.
    #[serde(default)]
    pub mock: MockSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            middleware_instances: vec![MiddlewareInstanceConfig::new("mock", "mock")],
            settling_delay_ms: DEFAULT_SETTLING_DELAY_MS,
            discovery_timeout_ms: DEFAULT_DISCOVERY_TIMEOUT_MS,
            monitor_poll_ms: DEFAULT_MONITOR_POLL_MS,
            mock: MockSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Settling delay as a [`Duration`].
    pub fn settling_delay(&self) -> Duration {
        Duration::from_millis(self.settling_delay_ms)
    }

    /// Discovery timeout as a [`Duration`].
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// Monitoring poll interval as a [`Duration`].
    pub fn monitor_poll(&self) -> Duration {
        Duration::from_millis(self.monitor_poll_ms)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Two middleware instances share an id
    /// - A `feig` instance has no URL
    /// - The simulator capacity is zero
    /// - The simulator tick or the monitoring poll interval is zero
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for instance in &self.middleware_instances {
            if !seen.insert(instance.id.as_str()) {
                return Err(Error::DuplicateMiddleware(instance.id.clone()));
            }

            if instance.kind() == MiddlewareKind::Feig
                && instance.url.as_deref().is_none_or(|url| url.trim().is_empty())
            {
                return Err(Error::MissingConfig(format!(
                    "middleware_instances[{}].url",
                    instance.id
                )));
            }
        }

        if self.mock.max_items == 0 {
            return Err(Error::Config("mock.max_items must be at least 1".to_string()));
        }

        if self.mock.tick_interval_ms == 0 {
            return Err(Error::Config(
                "mock.tick_interval_ms must be at least 1".to_string(),
            ));
        }

        if self.monitor_poll_ms == 0 {
            return Err(Error::Config("monitor_poll_ms must be at least 1".to_string()));
        }

        Ok(())
    }
}
