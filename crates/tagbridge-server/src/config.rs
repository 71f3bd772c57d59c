//! Configuration file loading.

use anyhow::Context;
use std::path::Path;
use tagbridge_core::BridgeConfig;

/// Load and validate the bridge configuration.
///
/// Without a path, the built-in default (a single simulated middleware) is
/// used.
pub fn load(path: Option<&Path>) -> anyhow::Result<BridgeConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => BridgeConfig::default(),
    };

    config.validate()?;
    Ok(config)
}

/// Parse a JSON configuration document.
pub fn parse(raw: &str) -> anyhow::Result<BridgeConfig> {
    Ok(serde_json::from_str(raw)?)
}
