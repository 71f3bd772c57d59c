//! Enum wrapper for reader dispatch.
//!
//! Native `async fn` in traits is not object-safe, so a reader chosen at
//! runtime (by middleware type) cannot be a `Box<dyn RfidReader>`.
//! [`AnyReader`] gives the same polymorphism through a closed enum.
//!
//! # Examples
//!
//! ```
//! use tagbridge_hardware::devices::AnyReader;
//! use tagbridge_hardware::FeigReader;
//!
//! let reader = FeigReader::new(reqwest::Client::new(), "http://10.0.0.5:7070", "Desk").unwrap();
//! let any_reader = AnyReader::Feig(reader);
//! assert_eq!(any_reader.kind(), "feig");
//! ```

use crate::feig::FeigReader;
use crate::mock::MockReader;
use crate::subscription::Subscription;
use crate::traits::RfidReader;
use crate::types::{
    AnalyzeOutcome, ClearOutcome, EditOutcome, InitializeOutcome, ReaderStatus, SecurityOutcome,
    TagReading,
};
use crate::Result;

/// Any supported reader backend.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyReader {
    /// Shared in-process simulator.
    Mock(MockReader),

    /// Physical reader behind a Feig middleware.
    Feig(FeigReader),
}

impl AnyReader {
    /// Middleware type name of the backend.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            Self::Feig(_) => "feig",
        }
    }
}

impl From<MockReader> for AnyReader {
    fn from(reader: MockReader) -> Self {
        Self::Mock(reader)
    }
}

impl From<FeigReader> for AnyReader {
    fn from(reader: FeigReader) -> Self {
        Self::Feig(reader)
    }
}

impl RfidReader for AnyReader {
    async fn inventory(&self) -> Result<Vec<TagReading>> {
        match self {
            Self::Mock(reader) => reader.inventory().await,
            Self::Feig(reader) => reader.inventory().await,
        }
    }

    async fn start_monitoring(&self) -> Result<Subscription> {
        match self {
            Self::Mock(reader) => reader.start_monitoring().await,
            Self::Feig(reader) => reader.start_monitoring().await,
        }
    }

    async fn stop_monitoring(&self) -> Result<()> {
        match self {
            Self::Mock(reader) => reader.stop_monitoring().await,
            Self::Feig(reader) => reader.stop_monitoring().await,
        }
    }

    async fn edit(&self, epc: &str, media_id: &str) -> Result<EditOutcome> {
        match self {
            Self::Mock(reader) => reader.edit(epc, media_id).await,
            Self::Feig(reader) => reader.edit(epc, media_id).await,
        }
    }

    async fn secure(&self, epc: &str) -> Result<SecurityOutcome> {
        match self {
            Self::Mock(reader) => reader.secure(epc).await,
            Self::Feig(reader) => reader.secure(epc).await,
        }
    }

    async fn unsecure(&self, epc: &str) -> Result<SecurityOutcome> {
        match self {
            Self::Mock(reader) => reader.unsecure(epc).await,
            Self::Feig(reader) => reader.unsecure(epc).await,
        }
    }

    async fn read(&self, epc: &str) -> Result<Option<TagReading>> {
        match self {
            Self::Mock(reader) => reader.read(epc).await,
            Self::Feig(reader) => reader.read(epc).await,
        }
    }

    async fn kill(&self, epc: &str) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.kill(epc).await,
            Self::Feig(reader) => reader.kill(epc).await,
        }
    }

    async fn initialize(
        &self,
        media_id: &str,
        format: Option<&str>,
        secured: Option<bool>,
    ) -> Result<InitializeOutcome> {
        match self {
            Self::Mock(reader) => reader.initialize(media_id, format, secured).await,
            Self::Feig(reader) => reader.initialize(media_id, format, secured).await,
        }
    }

    async fn clear(&self, epc: &str) -> Result<ClearOutcome> {
        match self {
            Self::Mock(reader) => reader.clear(epc).await,
            Self::Feig(reader) => reader.clear(epc).await,
        }
    }

    async fn analyze(&self, epc: &str) -> Result<AnalyzeOutcome> {
        match self {
            Self::Mock(reader) => reader.analyze(epc).await,
            Self::Feig(reader) => reader.analyze(epc).await,
        }
    }

    async fn is_connected(&self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.is_connected().await,
            Self::Feig(reader) => reader.is_connected().await,
        }
    }

    async fn status(&self) -> Result<ReaderStatus> {
        match self {
            Self::Mock(reader) => reader.status().await,
            Self::Feig(reader) => reader.status().await,
        }
    }
}
