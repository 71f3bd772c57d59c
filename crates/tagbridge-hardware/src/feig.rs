//! Client for the Feig reader middleware.
//!
//! The middleware exposes each physical reader under its name and speaks
//! JSON over HTTP:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | discovery | `GET /readers` |
//! | inventory / read | `GET /inventory/{reader}` |
//! | edit | `POST /edit/{reader}` `{ epc, mediaId }` |
//! | secure / unsecure | `POST /secure/{reader}`, `POST /unsecure/{reader}` `{ epc }` |
//! | kill | `POST /kill/{reader}` `{ epc }` |
//! | initialize | `POST /initialize/{reader}` `{ mediaId, format?, secured? }` |
//! | clear | `POST /clear/{reader}` `{ epc }` |
//! | analyze | `GET /analyze/{reader}?epc=` |
//!
//! The middleware has no push channel, so monitoring polls the inventory and
//! turns snapshot differences into events.

use crate::error::{HardwareError, Result};
use crate::subscription::{Subscription, diff_snapshots};
use crate::traits::RfidReader;
use crate::types::{
    AnalyzeOutcome, ClearOutcome, EditOutcome, InitializeOutcome, ReaderDescriptor, ReaderEvent,
    ReaderStatus, SecurityOutcome, TagReading,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tagbridge_core::constants::DEFAULT_MONITOR_POLL_MS;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Shortest inventory poll accepted by the timer.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Deserialize)]
#[serde(untagged)]
enum InventoryPayload {
    List(Vec<TagReading>),
    Wrapped { items: Vec<TagReading> },
}

impl InventoryPayload {
    fn into_items(self) -> Vec<TagReading> {
        match self {
            Self::List(items) | Self::Wrapped { items } => items,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReadersPayload {
    List(Vec<ReaderDescriptor>),
    Wrapped { readers: Vec<ReaderDescriptor> },
}

#[derive(Deserialize)]
struct KillResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Serialize)]
struct EpcRequest<'a> {
    epc: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditRequest<'a> {
    epc: &'a str,
    media_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeRequest<'a> {
    media_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secured: Option<bool>,
}

#[derive(Debug)]
struct FeigInner {
    http: reqwest::Client,
    base_url: Url,
    reader_name: String,
    poll_interval: Duration,
    /// Parent of every running monitor task; replaced on `stop_monitoring`.
    monitors: Mutex<CancellationToken>,
}

/// One physical reader behind a Feig middleware.
///
/// Cloning is cheap and clones share monitor tasks.
///
/// # Examples
///
/// ```no_run
/// use tagbridge_hardware::{FeigReader, RfidReader};
///
/// # async fn example() -> tagbridge_hardware::Result<()> {
/// let reader = FeigReader::new(reqwest::Client::new(), "http://10.0.0.5:7070", "Desk")?;
/// for tag in reader.inventory().await? {
///     println!("{} secured={:?}", tag.id, tag.secured);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeigReader {
    inner: Arc<FeigInner>,
}

impl FeigReader {
    /// Bind a client to `reader_name` on the middleware at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::ConfigurationError`] if `base_url` is not a
    /// valid base URL.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        reader_name: impl Into<String>,
    ) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        Ok(Self {
            inner: Arc::new(FeigInner {
                http,
                base_url,
                reader_name: reader_name.into(),
                poll_interval: Duration::from_millis(DEFAULT_MONITOR_POLL_MS),
                monitors: Mutex::new(CancellationToken::new()),
            }),
        })
    }

    /// Set the inventory poll interval used by monitoring.
    ///
    /// Must be called before the reader is cloned or monitored.
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        let inner = FeigInner {
            http: self.inner.http.clone(),
            base_url: self.inner.base_url.clone(),
            reader_name: self.inner.reader_name.clone(),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            monitors: Mutex::new(CancellationToken::new()),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Name of the reader on the middleware.
    pub fn reader_name(&self) -> &str {
        &self.inner.reader_name
    }

    /// Query the middleware's discovery endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the middleware is unreachable, answers with a
    /// non-success status, or sends an undecodable payload.
    pub async fn list_readers(
        http: &reqwest::Client,
        base_url: &Url,
    ) -> Result<Vec<ReaderDescriptor>> {
        let url = endpoint(base_url, &["readers"])?;
        debug!("GET {url}");

        let response = http.get(url).send().await?;
        let payload: ReadersPayload = decode_success(response).await?;

        Ok(match payload {
            ReadersPayload::List(readers) | ReadersPayload::Wrapped { readers } => readers,
        })
    }

    fn reader_endpoint(&self, operation: &str) -> Result<Url> {
        endpoint(
            &self.inner.base_url,
            &[operation, self.inner.reader_name.as_str()],
        )
    }

    async fn post<B, T>(&self, operation: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.reader_endpoint(operation)?;
        debug!("POST {url}");

        let response = self.inner.http.post(url).json(body).send().await?;
        decode_outcome(response).await
    }

    async fn descriptor(&self) -> Result<Option<ReaderDescriptor>> {
        let readers = Self::list_readers(&self.inner.http, &self.inner.base_url).await?;
        Ok(readers
            .into_iter()
            .find(|reader| reader.name == self.inner.reader_name))
    }

    async fn poll(self, events: mpsc::UnboundedSender<ReaderEvent>, token: CancellationToken) {
        let mut previous: HashMap<String, TagReading> = HashMap::new();
        let mut interval = tokio::time::interval(self.inner.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Monitoring {} every {:?}", self.inner.reader_name, self.inner.poll_interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let current = match self.inventory().await {
                Ok(current) => current,
                Err(e) => {
                    warn!("Inventory poll on {} failed: {}", self.inner.reader_name, e);
                    continue;
                }
            };

            for event in diff_snapshots(&previous, &current) {
                if events.send(event).is_err() {
                    debug!("Monitor for {} has no receiver left", self.inner.reader_name);
                    return;
                }
            }

            previous = current
                .into_iter()
                .map(|tag| (tag.id.clone(), tag))
                .collect();
        }

        debug!("Monitoring {} stopped", self.inner.reader_name);
    }
}

impl RfidReader for FeigReader {
    async fn inventory(&self) -> Result<Vec<TagReading>> {
        let url = self.reader_endpoint("inventory")?;
        debug!("GET {url}");

        let response = self.inner.http.get(url).send().await?;
        let payload: InventoryPayload = decode_success(response).await?;
        Ok(payload.into_items())
    }

    async fn start_monitoring(&self) -> Result<Subscription> {
        let token = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .child_token();
        let (events, receiver) = mpsc::unbounded_channel();

        tokio::spawn(self.clone().poll(events, token.clone()));

        Ok(Subscription::new(receiver, move || token.cancel()))
    }

    async fn stop_monitoring(&self) -> Result<()> {
        let mut monitors = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        monitors.cancel();
        *monitors = CancellationToken::new();
        Ok(())
    }

    async fn edit(&self, epc: &str, media_id: &str) -> Result<EditOutcome> {
        self.post("edit", &EditRequest { epc, media_id }).await
    }

    async fn secure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.post("secure", &EpcRequest { epc }).await
    }

    async fn unsecure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.post("unsecure", &EpcRequest { epc }).await
    }

    async fn read(&self, epc: &str) -> Result<Option<TagReading>> {
        Ok(self
            .inventory()
            .await?
            .into_iter()
            .find(|tag| tag.id == epc))
    }

    async fn kill(&self, epc: &str) -> Result<bool> {
        let response: KillResponse = self.post("kill", &EpcRequest { epc }).await?;
        Ok(response.success)
    }

    async fn initialize(
        &self,
        media_id: &str,
        format: Option<&str>,
        secured: Option<bool>,
    ) -> Result<InitializeOutcome> {
        let body = InitializeRequest {
            media_id,
            format,
            secured,
        };
        self.post("initialize", &body).await
    }

    async fn clear(&self, epc: &str) -> Result<ClearOutcome> {
        self.post("clear", &EpcRequest { epc }).await
    }

    async fn analyze(&self, epc: &str) -> Result<AnalyzeOutcome> {
        let url = self.reader_endpoint("analyze")?;
        debug!("GET {url} epc={epc}");

        let response = self
            .inner
            .http
            .get(url)
            .query(&[("epc", epc)])
            .send()
            .await?;
        decode_outcome(response).await
    }

    async fn is_connected(&self) -> Result<bool> {
        match self.status().await {
            Ok(status) => Ok(status.connected),
            Err(e) => {
                debug!("Reader {} unreachable: {}", self.inner.reader_name, e);
                Ok(false)
            }
        }
    }

    async fn status(&self) -> Result<ReaderStatus> {
        Ok(match self.descriptor().await? {
            Some(descriptor) => descriptor.to_status(),
            None => ReaderStatus {
                connected: false,
                connection_status: Some("not found".to_string()),
                ..ReaderStatus::default()
            },
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| HardwareError::configuration(format!("invalid middleware URL {raw}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(HardwareError::configuration(format!(
            "middleware URL {raw} cannot be a base"
        )));
    }

    Ok(url)
}

/// Append path segments to the base URL, percent-encoding each.
pub(crate) fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| HardwareError::configuration(format!("{base_url} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn decode_success<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(HardwareError::http_status(status.as_u16(), body));
    }

    serde_json::from_str(&body).map_err(|e| HardwareError::invalid_data(e.to_string()))
}

/// Decode an operation outcome.
///
/// The middleware reports negative results (tag absent, write failed) with a
/// non-success status *and* an outcome body; those bodies are returned as
/// values. Only bodies that cannot be decoded become errors.
async fn decode_outcome<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str(&body) {
        Ok(outcome) => Ok(outcome),
        Err(_) if !status.is_success() => Err(HardwareError::http_status(status.as_u16(), body)),
        Err(e) => Err(HardwareError::invalid_data(e.to_string())),
    }
}
