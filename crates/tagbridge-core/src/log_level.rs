//! Log level names accepted in the bridge configuration.
//!
//! The configuration uses the names operators already know from the
//! middleware (`silent` through `trace`). They are translated to `tracing`
//! filter directives by [`LogLevel::as_directive`].

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbosity of the bridge logs, ordered from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    ///
    /// `tracing` has no fatal level, so it collapses into `error`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Silent => "off",
            Self::Fatal | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Pick the first valid level among the candidates, else `fallback`.
    ///
    /// Candidates are checked in order; unknown names are skipped rather
    /// than rejected so a typo in one source does not silence the others.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::LogLevel;
    ///
    /// let level = LogLevel::resolve([None, Some("verbose"), Some("debug")], LogLevel::Info);
    /// assert_eq!(level, LogLevel::Debug);
    ///
    /// let level = LogLevel::resolve([None, None], LogLevel::Info);
    /// assert_eq!(level, LogLevel::Info);
    /// ```
    pub fn resolve<'a>(
        candidates: impl IntoIterator<Item = Option<&'a str>>,
        fallback: LogLevel,
    ) -> LogLevel {
        candidates
            .into_iter()
            .flatten()
            .find_map(|name| name.parse().ok())
            .unwrap_or(fallback)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Silent => "silent",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(Error::InvalidLogLevel(other.to_string())),
        }
    }
}
