//! Wire protocol: inbound and outbound frame unions.
//!
//! Every frame is a JSON text message with a mandatory `"type"` field.
//! The inbound set is closed: anything that fails to parse into
//! [`ClientFrame`] is dropped by the router. Reader-specific payload fields
//! the gateway does not interpret are carried through flattened maps so
//! relayed frames keep their original content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a tag's name record attached at enrichment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameState {
    /// No record existed before this read; an empty one was created.
    New,
    /// A record (possibly with an empty name) already existed.
    Existing,
}

/// One scanned tag entry inside a read result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagReading {
    /// Tag identifier (EPC).
    pub id: String,
    /// Signal strength as reported by the reader, relayed verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<serde_json::Number>,
    /// Number of times the tag was seen within the read window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Display name attached at enrichment time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name-record classification attached at enrichment time.
    #[serde(rename = "nameState", default, skip_serializing_if = "Option::is_none")]
    pub name_state: Option<NameState>,
    /// Reader-specific fields passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Inventory read result produced by the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadResult {
    /// Total number of tags reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Milliseconds the read window took.
    #[serde(rename = "readMs", default, skip_serializing_if = "Option::is_none")]
    pub read_ms: Option<u64>,
    /// Scanned tags.
    #[serde(default)]
    pub tags: Vec<TagReading>,
    /// Reader summary fields (per-antenna power, temperatures, ...) passed
    /// through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Frames accepted from connected peers.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// The reader device announcing itself; claims the device slot.
    DeviceAnnounce,
    /// Viewer asking the device to run an inventory read.
    ReadRequest {
        /// Advisory correlation tag, forwarded to the device untouched.
        /// Results are still broadcast to every viewer.
        #[serde(default)]
        seq: Option<u64>,
    },
    /// Viewer pushing reader settings (per-antenna power, repeat, window,
    /// enable flags). Forwarded opaquely; values are never validated here.
    Config {
        /// The settings payload, untouched.
        #[serde(flatten)]
        settings: serde_json::Map<String, Value>,
    },
    /// Firmware version query.
    GetFw,
    /// Reader temperature query.
    GetTemp,
    /// Antenna return-loss query.
    GetReturnLoss,
    /// Viewer assigning a display name to a tag. An empty name clears the
    /// record.
    TagNameSet {
        /// Tag identifier.
        id: String,
        /// New display name; empty deletes the record.
        #[serde(default)]
        name: String,
    },
    /// Device inventory result; enriched with stored names, then broadcast.
    ReadResult(ReadResult),
    /// Device firmware info; broadcast unmodified.
    FwResult {
        /// Firmware payload, untouched.
        #[serde(flatten)]
        payload: serde_json::Map<String, Value>,
    },
    /// Device temperature info; broadcast unmodified.
    TempResult {
        /// Temperature payload, untouched.
        #[serde(flatten)]
        payload: serde_json::Map<String, Value>,
    },
    /// Device antenna return-loss table; broadcast unmodified.
    ReturnLossResult {
        /// Per-antenna entries (`ant`, `returnLoss`, `raw`), untouched.
        #[serde(flatten)]
        payload: serde_json::Map<String, Value>,
    },
}

/// Device presence indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// A device connection holds the slot.
    Online,
    /// The slot is empty.
    Offline,
}

/// Frames originated by the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Device presence notification; also acknowledges a promotion.
    DeviceStatus {
        /// Current device presence.
        status: DeviceStatus,
    },
    /// A tag's display name changed.
    TagNameUpdated {
        /// Tag identifier.
        id: String,
        /// Canonical stored name; empty when the record was cleared.
        name: String,
    },
    /// Command failure reply, delivered to the requesting viewer only.
    Error {
        /// Human-readable reason.
        message: String,
    },
    /// Inventory read forwarded to the device.
    ReadRequest {
        /// Advisory correlation tag from the requesting viewer.
        #[serde(skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
    /// Enriched inventory result relayed to viewers.
    ReadResult(ReadResult),
    /// The gateway is shutting down.
    Shutdown,
}

impl ServerFrame {
    /// Serializes the frame to its JSON wire form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
