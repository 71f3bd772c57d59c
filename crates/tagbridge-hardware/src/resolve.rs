//! Reader resolution by network address.
//!
//! Callers identify a reader by the address they know it under (an IP, a
//! `host:port`, or a URL). The resolver normalises that address to a bare
//! host, walks the configured middleware instances in order, and returns
//! the first reader whose discovered address normalises to the same host.

use crate::devices::AnyReader;
use crate::discovery::Discovery;
use crate::feig::FeigReader;
use crate::mock::MockReader;
use crate::types::ReaderDescriptor;
use std::time::Duration;
use tagbridge_core::{BridgeConfig, MiddlewareInstanceConfig, MiddlewareKind};
use tracing::{debug, info, warn};
use url::Url;

/// Reduce an address to its bare host.
///
/// Strips surrounding whitespace, any scheme, port, path, and credentials.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::resolve::normalize_address;
///
/// assert_eq!(normalize_address("http://10.0.0.5:7070/api"), "10.0.0.5");
/// assert_eq!(normalize_address("10.0.0.5:10001"), "10.0.0.5");
/// assert_eq!(normalize_address(" 10.0.0.5 "), "10.0.0.5");
/// ```
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();

    if address.to_ascii_lowercase().starts_with("http")
        && let Ok(url) = Url::parse(address)
        && let Some(host) = url.host_str()
    {
        return host.to_string();
    }

    let host = address.split('/').next().unwrap_or_default();
    host.split(':').next().unwrap_or_default().to_string()
}

/// A reader matched to an address.
#[derive(Debug, Clone)]
pub struct ResolvedReader {
    /// Reader implementation bound to the matched middleware.
    pub reader: AnyReader,

    /// Discovered metadata of the matched reader.
    pub descriptor: ReaderDescriptor,

    /// Id of the middleware instance that exposes the reader.
    pub middleware_id: String,
}

/// Maps addresses to reader implementations.
#[derive(Debug, Clone)]
pub struct ReaderResolver {
    instances: Vec<MiddlewareInstanceConfig>,
    discovery: Discovery,
    mock: MockReader,
    poll_interval: Duration,
}

impl ReaderResolver {
    /// Create a resolver over `instances`, in priority order.
    ///
    /// Every `mock` instance resolves to the shared `mock` simulator.
    pub fn new(
        instances: Vec<MiddlewareInstanceConfig>,
        discovery: Discovery,
        mock: MockReader,
        poll_interval: Duration,
    ) -> Self {
        Self {
            instances,
            discovery,
            mock,
            poll_interval,
        }
    }

    /// Build a resolver from the bridge configuration.
    pub fn from_config(config: &BridgeConfig, mock: MockReader) -> Self {
        Self::new(
            config.middleware_instances.clone(),
            Discovery::new(reqwest::Client::new(), config.discovery_timeout()),
            mock,
            config.monitor_poll(),
        )
    }

    /// Configured middleware instances.
    pub fn instances(&self) -> &[MiddlewareInstanceConfig] {
        &self.instances
    }

    /// Discovery client used for resolution.
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Shared simulator handed out for `mock` instances.
    pub fn mock(&self) -> &MockReader {
        &self.mock
    }

    /// Find the reader reachable under `address`.
    ///
    /// Returns `None` when no configured middleware exposes a matching
    /// reader. When several do, the first in configuration order wins.
    pub async fn resolve(&self, address: &str) -> Option<ResolvedReader> {
        let target = normalize_address(address);
        if target.is_empty() {
            return None;
        }

        for instance in &self.instances {
            let readers = match self.discovery.try_discover(instance).await {
                Ok(readers) => readers,
                Err(e) => {
                    warn!(middleware_id = %instance.id, "Skipping middleware during resolution: {e}");
                    continue;
                }
            };

            let Some(descriptor) = readers
                .into_iter()
                .find(|reader| normalize_address(&reader.address) == target)
            else {
                continue;
            };

            match self.build_reader(instance, &descriptor) {
                Some(reader) => {
                    info!(
                        reader_ip = %target,
                        middleware_id = %instance.id,
                        reader_name = %descriptor.name,
                        "Resolved reader"
                    );
                    return Some(ResolvedReader {
                        reader,
                        descriptor,
                        middleware_id: instance.id.clone(),
                    });
                }
                None => continue,
            }
        }

        debug!(reader_ip = %target, "No middleware exposes this reader");
        None
    }

    fn build_reader(
        &self,
        instance: &MiddlewareInstanceConfig,
        descriptor: &ReaderDescriptor,
    ) -> Option<AnyReader> {
        match instance.kind() {
            MiddlewareKind::Mock => Some(AnyReader::Mock(self.mock.clone())),
            MiddlewareKind::Feig => {
                let url = instance.url.as_deref()?;
                match FeigReader::new(self.discovery.http().clone(), url, descriptor.name.clone()) {
                    Ok(reader) => Some(AnyReader::Feig(reader.with_poll_interval(self.poll_interval))),
                    Err(e) => {
                        warn!(middleware_id = %instance.id, "Cannot build reader client: {e}");
                        None
                    }
                }
            }
            MiddlewareKind::Unsupported(_) => None,
        }
    }
}
