//! Reader trait definition.
//!
//! [`RfidReader`] is the contract every reader-control backend implements,
//! whether it is the in-process simulator or an HTTP middleware driving a
//! physical pad. Code above this layer (the ILS bridge, the HTTP server)
//! only ever talks to readers through this trait.
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT).

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::subscription::Subscription;
use crate::types::{
    AnalyzeOutcome, ClearOutcome, EditOutcome, InitializeOutcome, ReaderStatus, SecurityOutcome,
    TagReading,
};

/// Capability interface of one RFID reader.
///
/// Operations addressed by EPC that find no such tag are *not* errors: they
/// return `None`, `false`, or an outcome with `success: false`. `Err` is
/// reserved for failures to reach the reader.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters, or the
/// [`AnyReader`](crate::devices::AnyReader) enum when the backend is only
/// known at runtime:
///
/// ```no_run
/// use tagbridge_hardware::{AnyReader, MockReader, RfidReader};
///
/// # async fn example() -> tagbridge_hardware::Result<()> {
/// let reader = AnyReader::Mock(MockReader::new());
/// let tags = reader.inventory().await?;
/// println!("{} tag(s) on the pad", tags.len());
/// # Ok(())
/// # }
/// ```
///
/// # Examples
///
/// ```no_run
/// use tagbridge_hardware::{RfidReader, Result};
///
/// async fn secure_all<R: RfidReader>(reader: &R) -> Result<usize> {
///     let mut secured = 0;
///     for tag in reader.inventory().await? {
///         if tag.secured != Some(true) && reader.secure(&tag.id).await?.success {
///             secured += 1;
///         }
///     }
///     Ok(secured)
/// }
/// ```
pub trait RfidReader: Send + Sync {
    /// Snapshot of every tag currently in the field.
    async fn inventory(&self) -> Result<Vec<TagReading>>;

    /// Begin delivering change events.
    ///
    /// The returned subscription first receives one `added` event per tag
    /// already present, then live changes. Dropping it unsubscribes.
    async fn start_monitoring(&self) -> Result<Subscription>;

    /// Stop monitoring and detach every subscriber.
    async fn stop_monitoring(&self) -> Result<()>;

    /// Rewrite the media identifier of the tag with the given EPC.
    async fn edit(&self, epc: &str, media_id: &str) -> Result<EditOutcome>;

    /// Set the EAS bit.
    async fn secure(&self, epc: &str) -> Result<SecurityOutcome>;

    /// Clear the EAS bit.
    async fn unsecure(&self, epc: &str) -> Result<SecurityOutcome>;

    /// Read a single tag, or `None` if it is not in the field.
    async fn read(&self, epc: &str) -> Result<Option<TagReading>>;

    /// Permanently disable a tag. Returns `false` if it was not present.
    async fn kill(&self, epc: &str) -> Result<bool>;

    /// Write a brand new tag for `media_id`.
    async fn initialize(
        &self,
        media_id: &str,
        format: Option<&str>,
        secured: Option<bool>,
    ) -> Result<InitializeOutcome>;

    /// Reset a tag to an unprogrammed state with a new EPC.
    async fn clear(&self, epc: &str) -> Result<ClearOutcome>;

    /// Produce a diagnostic memory and security report.
    async fn analyze(&self, epc: &str) -> Result<AnalyzeOutcome>;

    /// Whether the reader is reachable.
    async fn is_connected(&self) -> Result<bool>;

    /// Liveness and diagnostics snapshot.
    async fn status(&self) -> Result<ReaderStatus>;
}
