//! Simulated RFID reader for development and testing.
//!
//! [`MockReader`] is a cheap, cloneable handle to a simulator task that owns
//! the pad contents. Every clone talks to the same simulated reader, which
//! is how the resolver hands out one shared simulator to every request that
//! targets a mock middleware.
//!
//! In auto mode the simulator moves items on and off the pad at random while
//! someone is monitoring; in manual mode only the harness methods
//! ([`MockReader::add_item_from_pool`], [`MockReader::remove_item`], ...)
//! change it.
//!
//! # Examples
//!
//! ```
//! use tagbridge_core::MockMode;
//! use tagbridge_hardware::mock::{ManualItemOptions, MockConfig, MockReader};
//! use tagbridge_hardware::RfidReader;
//!
//! #[tokio::main]
//! async fn main() -> tagbridge_hardware::Result<()> {
//!     let reader = MockReader::with_config(MockConfig {
//!         mode: MockMode::Manual,
//!         simulate_latency: false,
//!         ..MockConfig::default()
//!     });
//!
//!     reader
//!         .add_item_from_pool("RFID002", ManualItemOptions::default())
//!         .await?;
//!
//!     let outcome = reader.secure("RFID002").await?;
//!     assert!(outcome.success);
//!     assert_eq!(reader.read("RFID002").await?.unwrap().secured, Some(true));
//!
//!     Ok(())
//! }
//! ```

mod pool;
mod simulator;

use crate::error::{HardwareError, Result};
use crate::subscription::Subscription;
use crate::traits::RfidReader;
use crate::types::{
    AnalyzeOutcome, ClearOutcome, EditOutcome, InitializeOutcome, ReaderDescriptor, ReaderStatus,
    SecurityOutcome, TagReading,
};
use simulator::{Command, Simulator};
use std::time::Duration;
use tagbridge_core::constants::{
    DEFAULT_MOCK_MAX_ITEMS, DEFAULT_MOCK_TICK_MS, MOCK_LATENCY_EDIT_MS, MOCK_LATENCY_KILL_MS,
    MOCK_LATENCY_READ_MS, MOCK_LATENCY_SECURITY_MS, MOCK_LATENCY_STATUS_MS,
};
use tagbridge_core::{MockMode, MockSettings};
use tokio::sync::{mpsc, oneshot};

const DEVICE_NAME: &str = "Mock RFID Reader";
const DEVICE_MODEL: &str = "Mock RFID Reader v1.0";

/// Simulator construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MockConfig {
    /// Initial mode.
    pub mode: MockMode,

    /// Maximum number of tags present at once.
    pub max_items: usize,

    /// Interval between automatic steps.
    pub tick_interval: Duration,

    /// Sleep before each operation to mimic hardware latency.
    pub simulate_latency: bool,

    /// Seed for the simulator's random source; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Auto,
            max_items: DEFAULT_MOCK_MAX_ITEMS,
            tick_interval: Duration::from_millis(DEFAULT_MOCK_TICK_MS),
            simulate_latency: true,
            seed: None,
        }
    }
}

impl MockConfig {
    /// Build from the bridge configuration's simulator section.
    pub fn from_settings(settings: &MockSettings) -> Self {
        Self {
            mode: settings.mode,
            max_items: settings.max_items,
            tick_interval: settings.tick_interval(),
            ..Self::default()
        }
    }
}

/// Overrides for tags inserted through the harness methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualItemOptions {
    /// Signal strength; clamped to the manual range.
    pub rssi: Option<i32>,
    pub secured: Option<bool>,
    pub data: Option<String>,
    pub media_id: Option<String>,
    pub tag_type: Option<String>,
}

impl ManualItemOptions {
    /// Set the signal strength.
    pub fn with_rssi(mut self, rssi: i32) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Set the security bit.
    pub fn with_secured(mut self, secured: bool) -> Self {
        self.secured = Some(secured);
        self
    }

    /// Set the media identifier.
    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }

    fn apply(self, mut reading: TagReading) -> TagReading {
        reading.rssi = Some(simulator::clamp_manual_rssi(self.rssi.or(reading.rssi)));
        if let Some(secured) = self.secured {
            reading.secured = Some(secured);
        }
        if let Some(data) = self.data {
            reading.data = Some(data);
        }
        if let Some(media_id) = self.media_id {
            reading.media_id = Some(media_id);
        }
        if let Some(tag_type) = self.tag_type {
            reading.tag_type = Some(tag_type);
        }
        reading.timestamp = chrono::Utc::now();
        reading
    }
}

/// Handle to a simulated RFID reader.
///
/// Construction spawns the simulator task, so it must happen inside a tokio
/// runtime. The task ends when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct MockReader {
    commands: mpsc::UnboundedSender<Command>,
    simulate_latency: bool,
}

impl MockReader {
    /// Create a simulator with default settings.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a simulator with explicit settings.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_config(config: MockConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let simulator = Simulator::new(config.mode, config.max_items, config.tick_interval, rng);
        tokio::spawn(simulator.run(receiver));

        Self {
            commands,
            simulate_latency: config.simulate_latency,
        }
    }

    /// Readers the simulated middleware reports during discovery.
    pub fn list_readers() -> Vec<ReaderDescriptor> {
        vec![
            ReaderDescriptor::new("MockReader1", "192.168.1.100", 10001, "LRU1002")
                .with_antennas(vec![1, 2, 3, 4], "0x0F"),
            ReaderDescriptor::new("MockReader2", "192.168.1.101", 10002, "LRU3000")
                .with_antennas(vec![1, 2], "0x03"),
        ]
    }

    /// Current simulation mode.
    pub async fn mode(&self) -> Result<MockMode> {
        self.request(Command::Mode).await
    }

    /// Switch mode; returns the mode now in effect.
    ///
    /// Manual mode stops the background tick. Auto mode restarts it when
    /// subscribers exist, priming the pad if it is empty.
    pub async fn set_mode(&self, mode: MockMode) -> Result<MockMode> {
        self.request(|reply| Command::SetMode { mode, reply }).await
    }

    /// Copy of the tags on the pad, without simulated latency.
    pub async fn current_items(&self) -> Result<Vec<TagReading>> {
        self.request(Command::Snapshot).await
    }

    /// Pool items not currently on the pad.
    pub async fn addable_items(&self) -> Result<Vec<TagReading>> {
        self.request(Command::Addable).await
    }

    /// Place a pool item on the pad.
    ///
    /// Returns the existing tag unchanged if the item is already present,
    /// and `None` for unknown ids or when the pad is full.
    pub async fn add_item_from_pool(
        &self,
        id: &str,
        options: ManualItemOptions,
    ) -> Result<Option<TagReading>> {
        let id = id.to_string();
        self.request(|reply| Command::AddFromPool { id, options, reply })
            .await
    }

    /// Place an arbitrary tag on the pad, replacing any tag with the same id.
    ///
    /// Returns `None` when the pad is full and nothing is being replaced.
    pub async fn add_custom_item(
        &self,
        id: &str,
        label: Option<&str>,
        options: ManualItemOptions,
    ) -> Result<Option<TagReading>> {
        let id = id.to_string();
        let label = label.map(str::to_string);
        self.request(|reply| Command::AddCustom {
            id,
            label,
            options,
            reply,
        })
        .await
    }

    /// Move a tag; `rssi` is clamped to the manual range.
    pub async fn update_item_rssi(&self, id: &str, rssi: i32) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| Command::UpdateRssi { id, rssi, reply })
            .await
    }

    /// Take a tag off the pad.
    pub async fn remove_item(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| Command::Remove { id, reply }).await
    }

    /// Number of registered monitoring subscribers.
    pub async fn subscriber_count(&self) -> Result<usize> {
        self.request(Command::SubscriberCount).await
    }

    /// Whether the periodic simulation tick is running.
    pub async fn is_simulating(&self) -> Result<bool> {
        self.request(Command::IsSimulating).await
    }

    async fn latency(&self, millis: u64) {
        if self.simulate_latency {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| HardwareError::disconnected(DEVICE_NAME))?;
        response
            .await
            .map_err(|_| HardwareError::disconnected(DEVICE_NAME))
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RfidReader for MockReader {
    async fn inventory(&self) -> Result<Vec<TagReading>> {
        self.latency(MOCK_LATENCY_READ_MS).await;
        self.request(Command::Inventory).await
    }

    async fn start_monitoring(&self) -> Result<Subscription> {
        let (id, events) = self.request(Command::Subscribe).await?;
        let commands = self.commands.clone();

        Ok(Subscription::new(events, move || {
            let _ = commands.send(Command::Unsubscribe { id });
        }))
    }

    async fn stop_monitoring(&self) -> Result<()> {
        self.request(Command::StopMonitoring).await
    }

    async fn edit(&self, epc: &str, media_id: &str) -> Result<EditOutcome> {
        self.latency(MOCK_LATENCY_EDIT_MS).await;
        let epc = epc.to_string();
        let media_id = media_id.to_string();
        self.request(|reply| Command::Edit {
            epc,
            media_id,
            reply,
        })
        .await
    }

    async fn secure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.latency(MOCK_LATENCY_SECURITY_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::SetSecured {
            epc,
            secured: true,
            reply,
        })
        .await
    }

    async fn unsecure(&self, epc: &str) -> Result<SecurityOutcome> {
        self.latency(MOCK_LATENCY_SECURITY_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::SetSecured {
            epc,
            secured: false,
            reply,
        })
        .await
    }

    async fn read(&self, epc: &str) -> Result<Option<TagReading>> {
        self.latency(MOCK_LATENCY_READ_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::Read { epc, reply }).await
    }

    async fn kill(&self, epc: &str) -> Result<bool> {
        self.latency(MOCK_LATENCY_KILL_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::Kill { epc, reply }).await
    }

    async fn initialize(
        &self,
        media_id: &str,
        format: Option<&str>,
        secured: Option<bool>,
    ) -> Result<InitializeOutcome> {
        self.latency(MOCK_LATENCY_KILL_MS).await;
        let media_id = media_id.to_string();
        let format = format.map(str::to_string);
        self.request(|reply| Command::Initialize {
            media_id,
            format,
            secured,
            reply,
        })
        .await
    }

    async fn clear(&self, epc: &str) -> Result<ClearOutcome> {
        self.latency(MOCK_LATENCY_KILL_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::Clear { epc, reply }).await
    }

    async fn analyze(&self, epc: &str) -> Result<AnalyzeOutcome> {
        self.latency(MOCK_LATENCY_SECURITY_MS).await;
        let epc = epc.to_string();
        self.request(|reply| Command::Analyze { epc, reply }).await
    }

    async fn is_connected(&self) -> Result<bool> {
        self.latency(MOCK_LATENCY_STATUS_MS).await;
        Ok(!self.commands.is_closed())
    }

    async fn status(&self) -> Result<ReaderStatus> {
        self.latency(MOCK_LATENCY_STATUS_MS).await;
        Ok(ReaderStatus {
            connected: !self.commands.is_closed(),
            mode: Some("mock".to_string()),
            model: Some(DEVICE_MODEL.to_string()),
            antennas: vec![1, 2, 3, 4],
            antenna_mask: Some("0x0F".to_string()),
            notification_active: Some(false),
            notification_port: None,
            connection_status: Some("connected".to_string()),
            power: Some(30),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = MockSettings {
            mode: MockMode::Manual,
            max_items: 2,
            tick_interval_ms: 500,
        };
        let config = MockConfig::from_settings(&settings);

        assert_eq!(config.mode, MockMode::Manual);
        assert_eq!(config.max_items, 2);
        assert_eq!(config.tick_interval, Duration::from_millis(500));
        assert!(config.simulate_latency);
    }

    #[test]
    fn test_list_readers() {
        let readers = MockReader::list_readers();
        assert_eq!(readers.len(), 2);
        assert_eq!(readers[0].name, "MockReader1");
        assert_eq!(readers[0].antenna_mask, "0x0F");
        assert_eq!(readers[1].address, "192.168.1.101");
        assert_eq!(readers[1].antennas, vec![1, 2]);
    }

    #[test]
    fn test_manual_options_apply() {
        let reading = ManualItemOptions::default()
            .with_rssi(-5)
            .with_secured(true)
            .with_media_id("31234")
            .apply(TagReading::new("X").with_rssi(-60));

        assert_eq!(reading.rssi, Some(-25));
        assert_eq!(reading.secured, Some(true));
        assert_eq!(reading.media_id.as_deref(), Some("31234"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_mock_model() {
        let reader = MockReader::new();
        let status = reader.status().await.unwrap();

        assert!(status.connected);
        assert_eq!(status.model.as_deref(), Some(DEVICE_MODEL));
        assert_eq!(status.power, Some(30));
        assert!(reader.is_connected().await.unwrap());
    }
}
