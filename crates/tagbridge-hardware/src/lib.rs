//! Reader abstraction layer for the tagbridge RFID bridge.
//!
//! This crate puts heterogeneous RFID reader hardware behind one capability
//! contract, the [`RfidReader`] trait, and provides everything needed to
//! reach a reader by its network address:
//!
//! - [`mock`]: an in-process simulator that behaves like a reader pad with
//!   library items coming and going
//! - [`feig`]: a client for readers managed by a Feig middleware over HTTP
//! - [`discovery`]: concurrent, failure-tolerant reader discovery across
//!   middleware instances
//! - [`resolve`]: mapping an address to a concrete reader
//!
//! # Design Philosophy
//!
//! - **Async-first**: all operations are native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: [`AnyReader`] replaces trait objects, since async
//!   traits are not object-safe.
//! - **Negatives are values**: a missing tag or an unknown reader is `None`
//!   or `success: false`, never an error. [`HardwareError`] is kept for
//!   failures to reach the hardware.
//! - **Events over channels**: monitoring hands out a [`Subscription`]
//!   instead of invoking callbacks, so subscribers never run inside reader
//!   state updates.
//!
//! # Quick Start
//!
//! ```no_run
//! use tagbridge_core::BridgeConfig;
//! use tagbridge_hardware::{MockReader, ReaderResolver, RfidReader};
//!
//! #[tokio::main]
//! async fn main() -> tagbridge_hardware::Result<()> {
//!     let config = BridgeConfig::default();
//!     let resolver = ReaderResolver::from_config(&config, MockReader::new());
//!
//!     if let Some(resolved) = resolver.resolve("192.168.1.100").await {
//!         for tag in resolved.reader.inventory().await? {
//!             println!("{} rssi={:?}", tag.id, tag.rssi);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod discovery;
pub mod error;
pub mod feig;
pub mod mock;
pub mod resolve;
pub mod subscription;
pub mod traits;
pub mod types;

pub use devices::AnyReader;
pub use discovery::Discovery;
pub use error::{HardwareError, Result};
pub use feig::FeigReader;
pub use mock::{ManualItemOptions, MockConfig, MockReader};
pub use resolve::{ReaderResolver, ResolvedReader, normalize_address};
pub use subscription::Subscription;
pub use traits::RfidReader;
pub use types::{
    AnalyzeOutcome, AntennaRssi, ClearOutcome, EditOutcome, InitializeOutcome, ReaderDescriptor,
    ReaderEvent, ReaderEventKind, ReaderStatus, SecurityAssessment, SecurityOutcome, TagAnalysis,
    TagReading,
};
