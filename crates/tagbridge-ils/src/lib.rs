//! Bridge between an integrated library system (ILS) and RFID readers.
//!
//! The ILS speaks a small XML dialect over HTTP and declares the state a tag
//! should be in. This crate parses that dialect ([`parser`]), builds its
//! response envelopes ([`builder`]), turns desired state into hardware calls
//! ([`reconcile`]), and ties the pieces to reader resolution ([`bridge`]).
//!
//! # Example
//!
//! ```no_run
//! use tagbridge_core::BridgeConfig;
//! use tagbridge_hardware::MockReader;
//! use tagbridge_ils::IlsBridge;
//!
//! # async fn example() {
//! let bridge = IlsBridge::from_config(&BridgeConfig::default(), MockReader::new());
//!
//! let response = bridge
//!     .item_update(
//!         "<rfid><reader_ip>192.168.1.100</reader_ip>\
//!          <item><barcode>RFID002</barcode><is_secure>true</is_secure></item></rfid>",
//!     )
//!     .await;
//! println!("{} {}", response.status, response.body);
//! # }
//! ```

pub mod bridge;
pub mod builder;
pub mod error;
pub mod parser;
pub mod reconcile;
pub mod types;

pub use bridge::{BridgeResponse, IlsBridge};
pub use error::{ProtocolError, Result};
pub use reconcile::{Reconciler, Reconciliation, ReconciliationOutcome};
pub use types::{DesiredItemState, IlsItem, IlsTag, ItemUpdateRequest, SecurityRequest};
