//! Desired-state reconciliation.
//!
//! The ILS declares what a tag should look like; the reader only offers
//! imperative operations. [`Reconciler`] compares the two and issues the
//! minimal ordered sequence of calls: media edit first, then the security
//! bit. A settling delay precedes every hardware round trip, because the
//! pads lag behind back-to-back requests from the ILS.
//!
//! Nothing is retried and nothing is rolled back. If the edit succeeds but
//! the security change fails, the tag is left edited and the outcome is a
//! failure.

use crate::types::DesiredItemState;
use std::time::Duration;
use tagbridge_core::constants::DEFAULT_SETTLING_DELAY_MS;
use tagbridge_hardware::{Result, RfidReader, TagReading};
use tracing::{debug, info, warn};

/// What a completed reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    /// Conjunction of every attempted step; `true` when nothing was needed.
    pub success: bool,

    /// EPC of the tag after reconciliation. An edit may change it.
    pub epc: String,

    /// Whether an edit was issued.
    pub media_edited: bool,

    /// Whether a secure or unsecure was issued.
    pub security_changed: bool,
}

impl ReconciliationOutcome {
    fn unchanged(epc: String) -> Self {
        Self {
            success: true,
            epc,
            media_edited: false,
            security_changed: false,
        }
    }

    /// Whether the reader was left untouched.
    pub fn is_noop(&self) -> bool {
        !self.media_edited && !self.security_changed
    }
}

/// Result of reconciling one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No tag on the reader carries the requested barcode.
    ItemNotFound,

    /// The tag was found and the needed steps were attempted.
    Completed(ReconciliationOutcome),
}

/// Drives a reader towards a desired item state.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    settling_delay: Duration,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SETTLING_DELAY_MS))
    }
}

impl Reconciler {
    /// Create a reconciler that waits `settling_delay` before each hardware call.
    pub fn new(settling_delay: Duration) -> Self {
        Self { settling_delay }
    }

    /// Delay inserted before each hardware round trip.
    pub fn settling_delay(&self) -> Duration {
        self.settling_delay
    }

    /// Bring the tag identified by `desired.barcode` to the desired media id
    /// and, when `desired.secure` is set, the desired security state.
    ///
    /// The desired media id is the barcode itself.
    ///
    /// # Errors
    ///
    /// Returns an error only when the reader cannot be reached. Tags that
    /// are missing or operations that report failure are values.
    pub async fn reconcile<R: RfidReader>(
        &self,
        reader: &R,
        desired: &DesiredItemState,
    ) -> Result<Reconciliation> {
        self.run(reader, &desired.barcode, desired.secure, true).await
    }

    /// Bring the tag identified by `barcode` to the given security state,
    /// leaving its media id alone.
    ///
    /// # Errors
    ///
    /// Returns an error only when the reader cannot be reached.
    pub async fn reconcile_security<R: RfidReader>(
        &self,
        reader: &R,
        barcode: &str,
        secure: bool,
    ) -> Result<Reconciliation> {
        self.run(reader, barcode, Some(secure), false).await
    }

    async fn run<R: RfidReader>(
        &self,
        reader: &R,
        barcode: &str,
        secure: Option<bool>,
        write_media: bool,
    ) -> Result<Reconciliation> {
        self.settle().await;
        let tags = reader.inventory().await?;

        let Some(tag) = find_tag(&tags, barcode) else {
            debug!(barcode, "No tag on the reader matches the barcode");
            return Ok(Reconciliation::ItemNotFound);
        };

        let media_matches = !write_media || media_matches(tag, barcode);
        let secure_matches = secure_matches(tag, secure);

        if media_matches && secure_matches {
            debug!(epc = %tag.id, barcode, "Tag already in desired state");
            return Ok(Reconciliation::Completed(ReconciliationOutcome::unchanged(
                tag.id.clone(),
            )));
        }

        let mut outcome = ReconciliationOutcome::unchanged(tag.id.clone());

        if !media_matches {
            self.settle().await;
            let edit = reader.edit(&outcome.epc, barcode).await?;
            outcome.media_edited = true;

            if edit.success {
                outcome.epc = edit.target_epc(&outcome.epc);
                info!(epc = %outcome.epc, barcode, "Media id written");
            } else {
                warn!(
                    epc = %outcome.epc,
                    barcode,
                    "Edit failed: {}",
                    edit.message.as_deref().unwrap_or("no reason given")
                );
                outcome.success = false;
                return Ok(Reconciliation::Completed(outcome));
            }
        }

        if let Some(desired) = secure
            && !secure_matches
        {
            self.settle().await;
            let result = if desired {
                reader.secure(&outcome.epc).await?
            } else {
                reader.unsecure(&outcome.epc).await?
            };
            outcome.security_changed = true;

            if result.success {
                info!(epc = %outcome.epc, secure = desired, "Security bit written");
            } else {
                warn!(
                    epc = %outcome.epc,
                    secure = desired,
                    "Security change failed: {}",
                    result.message.as_deref().unwrap_or("no reason given")
                );
                outcome.success = false;
            }
        }

        Ok(Reconciliation::Completed(outcome))
    }

    async fn settle(&self) {
        if !self.settling_delay.is_zero() {
            tokio::time::sleep(self.settling_delay).await;
        }
    }
}

fn find_tag<'a>(tags: &'a [TagReading], barcode: &str) -> Option<&'a TagReading> {
    tags.iter().find(|tag| tag.matches_barcode(barcode))
}

fn media_matches(tag: &TagReading, barcode: &str) -> bool {
    tag.media_id
        .as_deref()
        .is_some_and(|media_id| media_id.trim() == barcode.trim())
}

// A tag that does not report its security bit is never considered matching.
fn secure_matches(tag: &TagReading, desired: Option<bool>) -> bool {
    match desired {
        None => true,
        Some(desired) => tag.secured == Some(desired),
    }
}
