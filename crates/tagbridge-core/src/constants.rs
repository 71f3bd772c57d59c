//! Timing and capacity constants shared by the bridge crates.
//!
//! The values model the behaviour of the library's RFID middleware and pads:
//! readers refresh their field on their own cycle, so the bridge inserts a
//! settling delay before touching the hardware, and the simulator mimics the
//! latency of each real operation so code written against it keeps working
//! when swapped for a physical reader.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use tagbridge_core::constants::*;
//!
//! let settle = Duration::from_millis(DEFAULT_SETTLING_DELAY_MS);
//! assert_eq!(settle, Duration::from_millis(200));
//! assert!(MOCK_LATENCY_KILL_MS > MOCK_LATENCY_READ_MS);
//! ```

// ============================================================================
// Bridge Timing
// ============================================================================

/// Default settling delay before hardware calls, in milliseconds.
///
/// The ILS tends to fire `itemUpdate` immediately after `getItems`; without
/// this pause the second request races ahead of the reader's own refresh.
pub const DEFAULT_SETTLING_DELAY_MS: u64 = 200;

/// Default timeout for a single middleware discovery request, in milliseconds.
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 5000;

/// Default poll interval used to emulate live monitoring on HTTP middleware.
pub const DEFAULT_MONITOR_POLL_MS: u64 = 1000;

// ============================================================================
// Simulator
// ============================================================================

/// Interval between automatic simulation steps, in milliseconds.
pub const DEFAULT_MOCK_TICK_MS: u64 = 3000;

/// Maximum number of tags the simulator keeps on the pad at once.
pub const DEFAULT_MOCK_MAX_ITEMS: usize = 5;

/// Probability threshold for the "add" branch of a simulation step.
pub const MOCK_ADD_THRESHOLD: f64 = 0.45;

/// Cumulative probability threshold for the "update" branch.
///
/// Rolls between [`MOCK_ADD_THRESHOLD`] and this value move a tag; the
/// remainder removes one.
pub const MOCK_UPDATE_THRESHOLD: f64 = 0.8;

/// Probability that an add step brings more than one item.
pub const MOCK_MULTI_ADD_PROBABILITY: f64 = 0.25;

// ============================================================================
// Simulated Hardware Latency (milliseconds)
// ============================================================================

/// Latency of `is_connected` and `status`.
pub const MOCK_LATENCY_STATUS_MS: u64 = 50;

/// Latency of `inventory` and `read`.
pub const MOCK_LATENCY_READ_MS: u64 = 100;

/// Latency of `secure`, `unsecure` and `analyze`.
pub const MOCK_LATENCY_SECURITY_MS: u64 = 150;

/// Latency of `edit`.
pub const MOCK_LATENCY_EDIT_MS: u64 = 200;

/// Latency of `kill`, `initialize` and `clear`.
pub const MOCK_LATENCY_KILL_MS: u64 = 300;

// ============================================================================
// Signal Strength (dBm)
// ============================================================================

/// Lower bound for RSSI drift during simulated movement.
pub const RSSI_DRIFT_MIN: i32 = -75;

/// Upper bound for RSSI drift during simulated movement.
pub const RSSI_DRIFT_MAX: i32 = -30;

/// Lower bound accepted for manually supplied RSSI values.
pub const RSSI_MANUAL_MIN: i32 = -80;

/// Upper bound accepted for manually supplied RSSI values.
pub const RSSI_MANUAL_MAX: i32 = -25;

/// RSSI used when a manual value is missing.
pub const RSSI_FALLBACK: i32 = -55;

// ============================================================================
// Tag Defaults
// ============================================================================

/// Tag format used by `initialize` when none is given.
pub const DEFAULT_TAG_FORMAT: &str = "DE290";

/// Protocol control word written by `initialize` and `clear`.
pub const DEFAULT_PROTOCOL_CONTROL: &str = "3000";

/// Total length of an EPC minted by `initialize` (prefix included).
pub const INITIALIZED_EPC_LENGTH: usize = 24;

/// Material type reported to the ILS when the tag does not carry one.
pub const DEFAULT_MATERIAL_TYPE: &str = "BOOK";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_thresholds_are_ordered() {
        assert!(MOCK_ADD_THRESHOLD < MOCK_UPDATE_THRESHOLD);
        assert!(MOCK_UPDATE_THRESHOLD < 1.0);
    }

    #[test]
    fn test_latency_ordering() {
        assert!(MOCK_LATENCY_STATUS_MS < MOCK_LATENCY_READ_MS);
        assert!(MOCK_LATENCY_READ_MS < MOCK_LATENCY_SECURITY_MS);
        assert!(MOCK_LATENCY_SECURITY_MS < MOCK_LATENCY_EDIT_MS);
        assert!(MOCK_LATENCY_EDIT_MS < MOCK_LATENCY_KILL_MS);
    }

    #[test]
    fn test_rssi_ranges() {
        assert!(RSSI_MANUAL_MIN < RSSI_DRIFT_MIN);
        assert!(RSSI_DRIFT_MAX < RSSI_MANUAL_MAX);
        assert!((RSSI_MANUAL_MIN..=RSSI_MANUAL_MAX).contains(&RSSI_FALLBACK));
    }
}
