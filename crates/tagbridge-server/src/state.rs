//! Shared application state.

use tagbridge_core::BridgeConfig;
use tagbridge_hardware::{MockConfig, MockReader};
use tagbridge_ils::IlsBridge;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub bridge: IlsBridge,
}

impl AppState {
    pub fn new(bridge: IlsBridge) -> Self {
        Self { bridge }
    }

    /// Spawn the simulator and wire the bridge from `config`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mock = MockReader::with_config(MockConfig::from_settings(&config.mock));
        Self::new(IlsBridge::from_config(config, mock))
    }
}
