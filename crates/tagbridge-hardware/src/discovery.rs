//! Reader discovery across middleware instances.
//!
//! Each configured middleware is asked for the readers it exposes. The
//! aggregate query runs every instance concurrently and never fails: an
//! instance that errors or times out contributes an empty list.

use crate::error::{HardwareError, Result};
use crate::feig::FeigReader;
use crate::mock::MockReader;
use crate::types::ReaderDescriptor;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;
use tagbridge_core::constants::DEFAULT_DISCOVERY_TIMEOUT_MS;
use tagbridge_core::{MiddlewareInstanceConfig, MiddlewareKind};
use tracing::{debug, warn};
use url::Url;

/// Middleware discovery client.
#[derive(Debug, Clone)]
pub struct Discovery {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new(
            reqwest::Client::new(),
            Duration::from_millis(DEFAULT_DISCOVERY_TIMEOUT_MS),
        )
    }
}

impl Discovery {
    /// Create a discovery client with a per-instance timeout.
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// HTTP client shared with the readers built from discovery results.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Discover the readers of one instance, surfacing failures.
    ///
    /// Unknown middleware types yield an empty list and a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if a `feig` instance has no valid URL, cannot be
    /// reached within the timeout, or answers with an unusable payload.
    pub async fn try_discover(
        &self,
        instance: &MiddlewareInstanceConfig,
    ) -> Result<Vec<ReaderDescriptor>> {
        match instance.kind() {
            MiddlewareKind::Mock => Ok(MockReader::list_readers()),
            MiddlewareKind::Feig => {
                let raw = instance.url.as_deref().ok_or_else(|| {
                    HardwareError::configuration(format!(
                        "middleware {} has no url",
                        instance.id
                    ))
                })?;
                let base_url = Url::parse(raw).map_err(|e| {
                    HardwareError::configuration(format!("invalid url {raw}: {e}"))
                })?;

                tokio::time::timeout(self.timeout, FeigReader::list_readers(&self.http, &base_url))
                    .await
                    .map_err(|_| {
                        HardwareError::timeout(
                            u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        )
                    })?
            }
            MiddlewareKind::Unsupported(kind) => {
                warn!(
                    middleware_id = %instance.id,
                    "Unsupported middleware type {kind}, skipping discovery"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Discover the readers of one instance; failures yield an empty list.
    pub async fn discover_readers(
        &self,
        instance: &MiddlewareInstanceConfig,
    ) -> Vec<ReaderDescriptor> {
        match self.try_discover(instance).await {
            Ok(readers) => {
                debug!(
                    middleware_id = %instance.id,
                    "Discovered {} reader(s)",
                    readers.len()
                );
                readers
            }
            Err(e) => {
                warn!(middleware_id = %instance.id, "Reader discovery failed: {e}");
                Vec::new()
            }
        }
    }

    /// Discover every instance concurrently.
    ///
    /// The result holds an entry for every instance id, empty for instances
    /// that failed.
    pub async fn discover_across_middlewares(
        &self,
        instances: &[MiddlewareInstanceConfig],
    ) -> BTreeMap<String, Vec<ReaderDescriptor>> {
        let results = join_all(
            instances
                .iter()
                .map(|instance| async move { (instance.id.clone(), self.discover_readers(instance).await) }),
        )
        .await;

        results.into_iter().collect()
    }
}
