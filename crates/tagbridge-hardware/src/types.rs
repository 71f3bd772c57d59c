//! Data model shared by every reader implementation.
//!
//! The wire names follow the middleware's JSON (camelCase), so the same
//! types decode HTTP payloads from a physical reader and describe the
//! simulator's state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal strength seen by one antenna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaRssi {
    /// Antenna index (1-based).
    pub antenna_number: u8,

    /// Signal strength in dBm.
    pub rssi: i32,
}

/// One tag as observed by a reader.
///
/// Readings are snapshots: every inventory, read, or event produces fresh
/// values. The `id` (EPC or UID) is unique among the tags currently present
/// on one reader, but it is not a stable identity; `edit` and `clear` can
/// change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReading {
    /// EPC/UID of the tag.
    pub id: String,

    /// Free-form payload stored on the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Signal strength in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,

    /// When the reader last observed the tag.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// EAS alarm bit; `None` when the reader does not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secured: Option<bool>,

    /// Tag data format (e.g. `DE290`, `DE6`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,

    /// Library media identifier (barcode) encoded on the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,

    /// Protocol control word.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<String>,

    /// Per-antenna signal samples.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antenna_rssi: Vec<AntennaRssi>,
}

impl TagReading {
    /// Create a reading with only an identifier, stamped with the current time.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
            rssi: None,
            timestamp: Utc::now(),
            secured: None,
            tag_type: None,
            media_id: None,
            pc: None,
            antenna_rssi: Vec::new(),
        }
    }

    /// Set the payload.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

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

    /// Set the tag type.
    pub fn with_tag_type(mut self, tag_type: impl Into<String>) -> Self {
        self.tag_type = Some(tag_type.into());
        self
    }

    /// Set the media identifier.
    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }

    /// Set the protocol control word.
    pub fn with_pc(mut self, pc: impl Into<String>) -> Self {
        self.pc = Some(pc.into());
        self
    }

    /// Whether this reading represents the given barcode.
    ///
    /// A tag matches when either its EPC or its media identifier equals the
    /// trimmed barcode.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_hardware::TagReading;
    ///
    /// let tag = TagReading::new("E0001").with_media_id("31234");
    /// assert!(tag.matches_barcode(" 31234 "));
    /// assert!(tag.matches_barcode("E0001"));
    /// assert!(!tag.matches_barcode("99999"));
    /// ```
    pub fn matches_barcode(&self, barcode: &str) -> bool {
        let barcode = barcode.trim();
        self.id == barcode || self.media_id.as_deref() == Some(barcode)
    }

    /// Whether two readings differ in anything but their timestamp.
    pub(crate) fn differs_from(&self, other: &TagReading) -> bool {
        self.id != other.id
            || self.data != other.data
            || self.rssi != other.rssi
            || self.secured != other.secured
            || self.tag_type != other.tag_type
            || self.media_id != other.media_id
            || self.pc != other.pc
            || self.antenna_rssi != other.antenna_rssi
    }
}

/// Kind of change a reader reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderEventKind {
    /// Tag entered the field, or is replayed to a new subscriber.
    Added,

    /// Tag left the field or lost its identity.
    Removed,

    /// Tag is still present but some attribute changed.
    Updated,
}

impl fmt::Display for ReaderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Change notification emitted to monitoring subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderEvent {
    #[serde(rename = "type")]
    pub kind: ReaderEventKind,
    pub item: TagReading,
}

impl ReaderEvent {
    pub fn added(item: TagReading) -> Self {
        Self {
            kind: ReaderEventKind::Added,
            item,
        }
    }

    pub fn removed(item: TagReading) -> Self {
        Self {
            kind: ReaderEventKind::Removed,
            item,
        }
    }

    pub fn updated(item: TagReading) -> Self {
        Self {
            kind: ReaderEventKind::Updated,
            item,
        }
    }
}

/// Reader metadata reported by a middleware's discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderDescriptor {
    /// Reader name used in middleware URLs.
    pub name: String,

    /// Network address of the reader (IP, hostname, or URL).
    pub address: String,

    /// Reader port.
    pub port: u16,

    /// Reader mode or model (e.g. `LRU1002`).
    pub mode: String,

    /// Antenna indices available on the reader.
    #[serde(default)]
    pub antennas: Vec<u8>,

    /// Antenna bitmask as a hex string.
    #[serde(default)]
    pub antenna_mask: String,

    /// Whether the middleware currently holds a connection to the reader.
    #[serde(default)]
    pub is_connected: bool,

    /// Human-readable connection status.
    #[serde(default)]
    pub connection_status: String,

    /// Whether notification mode is active.
    #[serde(default)]
    pub notification_active: bool,

    /// Notification listener port, if active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_port: Option<u16>,
}

impl ReaderDescriptor {
    /// Create a descriptor for a connected reader.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            mode: mode.into(),
            antennas: Vec::new(),
            antenna_mask: String::new(),
            is_connected: true,
            connection_status: "connected".to_string(),
            notification_active: false,
            notification_port: None,
        }
    }

    /// Set the antenna layout.
    pub fn with_antennas(mut self, antennas: Vec<u8>, mask: impl Into<String>) -> Self {
        self.antennas = antennas;
        self.antenna_mask = mask.into();
        self
    }

    /// Status snapshot derived from this descriptor.
    pub fn to_status(&self) -> ReaderStatus {
        ReaderStatus {
            connected: self.is_connected,
            mode: Some(self.mode.clone()),
            model: None,
            antennas: self.antennas.clone(),
            antenna_mask: Some(self.antenna_mask.clone()),
            notification_active: Some(self.notification_active),
            notification_port: self.notification_port,
            connection_status: Some(self.connection_status.clone()),
            power: None,
        }
    }
}

/// Reader liveness and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderStatus {
    pub connected: bool,
    pub mode: Option<String>,
    pub model: Option<String>,
    pub antennas: Vec<u8>,
    pub antenna_mask: Option<String>,
    pub notification_active: Option<bool>,
    pub notification_port: Option<u16>,
    pub connection_status: Option<String>,
    pub power: Option<u8>,
}

/// Result of rewriting a tag's media identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditOutcome {
    pub success: bool,
    pub media_id: Option<String>,
    pub old_epc: Option<String>,
    /// EPC after the edit; may differ from `old_epc`.
    pub new_epc: Option<String>,
    pub tag_type: Option<String>,
    pub message: Option<String>,
}

impl EditOutcome {
    /// EPC that now addresses the tag, falling back to `previous`.
    pub fn target_epc(&self, previous: &str) -> String {
        self.new_epc
            .as_deref()
            .filter(|epc| !epc.is_empty())
            .unwrap_or(previous)
            .to_string()
    }
}

/// Result of toggling the EAS bit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityOutcome {
    pub success: bool,
    pub epc: Option<String>,
    pub tag_type: Option<String>,
    pub message: Option<String>,
    pub secured: Option<bool>,
}

/// Result of writing a brand new tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeOutcome {
    pub success: bool,
    pub epc: Option<String>,
    pub format: Option<String>,
    pub tag_type: Option<String>,
    pub pc: Option<String>,
    pub media_id: Option<String>,
    pub secured: Option<bool>,
    pub message: Option<String>,
}

/// Result of resetting a tag to its factory identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClearOutcome {
    pub success: bool,
    pub new_epc: Option<String>,
    pub old_epc: Option<String>,
    pub new_pc: Option<String>,
    pub tid: Option<String>,
    pub message: Option<String>,
}

/// EPC memory bank inspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EpcBankAnalysis {
    pub read_success: bool,
    pub pc_value: Option<String>,
    pub epc_length_in_words: Option<u32>,
    pub epc_length_in_bytes: Option<u32>,
    pub actual: Option<String>,
    pub theoretical: Option<String>,
    pub matches: Option<bool>,
}

/// TID memory bank inspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TidBankAnalysis {
    pub read_success: bool,
    pub length_bytes: Option<u32>,
    pub tid_hex: Option<String>,
}

/// Reserved (password) memory bank inspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservedBankAnalysis {
    pub readable_without_auth: Option<bool>,
    pub readable_with_auth: Option<bool>,
    pub theoretical: Option<String>,
    pub actual: Option<String>,
    pub matches: Option<bool>,
    pub passwords_are_zero: Option<bool>,
    pub password_protection_configured: Option<bool>,
    pub password_protection_required: Option<bool>,
    pub password_correct: Option<bool>,
    pub password_mismatch: Option<bool>,
    pub password_protected: Option<bool>,
    pub passwords_match: Option<bool>,
}

/// Lock state of the memory banks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockStatusAnalysis {
    pub reserved_bank: Option<String>,
    pub reserved_bank_status: Option<String>,
}

/// Aggregated security verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityAssessment {
    pub properly_secured: Option<bool>,
    pub password_correct: Option<bool>,
    pub issues: Vec<String>,
    pub password_protection_configured: Option<bool>,
    pub password_protection_required: Option<bool>,
}

/// Memory and security report for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagAnalysis {
    pub tag_type: Option<String>,
    pub media_id: Option<String>,
    pub epc_bank: Option<EpcBankAnalysis>,
    pub tid_bank: Option<TidBankAnalysis>,
    pub reserved_bank: Option<ReservedBankAnalysis>,
    pub lock_status: Option<LockStatusAnalysis>,
    pub security_assessment: Option<SecurityAssessment>,
}

/// Result of a diagnostic tag analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOutcome {
    pub success: bool,
    pub epc: Option<String>,
    pub analysis: Option<TagAnalysis>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl AnalyzeOutcome {
    /// Whether the report says the tag is properly secured.
    pub fn properly_secured(&self) -> bool {
        self.analysis
            .as_ref()
            .and_then(|analysis| analysis.security_assessment.as_ref())
            .and_then(|assessment| assessment.properly_secured)
            .unwrap_or(false)
    }
}
