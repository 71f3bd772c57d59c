//! Shared configuration, constants, and error types for the tagbridge crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod log_level;

pub use config::{BridgeConfig, MiddlewareInstanceConfig, MiddlewareKind, MockMode, MockSettings};
pub use error::{Error, Result};
pub use log_level::LogLevel;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
