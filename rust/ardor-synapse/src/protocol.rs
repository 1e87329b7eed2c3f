//! The cross-frame wire protocol.
//!
//! Outbound, the bridge sends [`Envelope`]s:
//!
//! ```json
//! { "type": "ARDOR_BRIDGE", "event": "RESIZE", "data": { "height": 812 } }
//! ```
//!
//! Inbound, the host frame sends commands:
//!
//! ```json
//! { "type": "ARDOR_BRIDGE_CONTROL", "action": "TOGGLE_INSPECTOR", "data": { "enabled": true } }
//! ```
//!
//! Older hosts put the `action` (and its payload fields) directly on the
//! message without the control envelope; [`decode_legacy`] accepts that
//! shape. Anything else is ignored.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{snapshot::ElementSnapshot, telemetry::ConsoleLevel, tree::SerializedNode};

/// Type marker on every outbound message.
pub const BRIDGE_MARKER: &str = "ARDOR_BRIDGE";

/// Type marker on inbound command envelopes.
pub const CONTROL_MARKER: &str = "ARDOR_BRIDGE_CONTROL";

/// An outbound message as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Always [`BRIDGE_MARKER`]
    #[serde(rename = "type")]
    pub marker: &'static str,
    /// The event and its payload
    #[serde(flatten)]
    pub event: Event,
}

impl From<Event> for Envelope {
    fn from(event: Event) -> Self {
        Self {
            marker: BRIDGE_MARKER,
            event,
        }
    }
}

/// Everything the bridge can tell its host frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// The bridge is present; sent on load, periodically and on `PING`
    BridgeReady(Handshake),
    /// The document height changed (or is being re-announced)
    Resize {
        /// Document height in CSS pixels
        height: f64,
    },
    /// A fresh snapshot of the body
    DomTreeUpdate(Option<SerializedNode>),
    /// An element was clicked in the inspector or highlighted by the host
    ElementSelected(ElementSnapshot),
    /// A console call or uncaught error
    ConsoleLog(ConsoleEntry),
    /// A completed or failed `fetch`
    NetworkLog(NetworkEntry),
}

impl Event {
    /// The event's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::BridgeReady(_) => "BRIDGE_READY",
            Event::Resize { .. } => "RESIZE",
            Event::DomTreeUpdate(_) => "DOM_TREE_UPDATE",
            Event::ElementSelected(_) => "ELEMENT_SELECTED",
            Event::ConsoleLog(_) => "CONSOLE_LOG",
            Event::NetworkLog(_) => "NETWORK_LOG",
        }
    }
}

/// Payload of `BRIDGE_READY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Protocol version
    pub version: String,
    /// Supported feature names
    pub features: Vec<String>,
}

/// Payload of `CONSOLE_LOG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// Console method the entry came from
    pub level: ConsoleLevel,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Each argument rendered as display text
    pub args: Vec<String>,
}

/// Payload of `NETWORK_LOG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEntry {
    /// Always `"fetch"`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Requested URL
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Response status, or failure
    pub status: NetworkStatus,
    /// Elapsed milliseconds
    pub duration: u64,
    /// Failure message, only present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of an observed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// A response arrived with this status code
    Code(u16),
    /// The request rejected
    Failed,
}

impl Serialize for NetworkStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NetworkStatus::Code(code) => serializer.serialize_u16(*code),
            NetworkStatus::Failed => serializer.serialize_str("failed"),
        }
    }
}

/// Everything a host frame can ask the bridge to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Turn the inspector on or off
    ToggleInspector {
        /// Desired state
        enabled: bool,
    },
    /// Highlight an element and re-send its snapshot
    HighlightNode {
        /// Target identifier
        id: String,
    },
    /// Set an inline style on an element
    UpdateStyle {
        /// Target identifier
        id: String,
        /// camelCase style property
        property: String,
        /// New value
        value: String,
    },
    /// Re-send the handshake
    Ping,
}

#[derive(Deserialize)]
struct TogglePayload {
    #[serde(default)]
    enabled: Option<Value>,
}

#[derive(Deserialize)]
struct HighlightPayload {
    id: String,
}

#[derive(Deserialize)]
struct StylePayload {
    id: String,
    property: String,
    value: Value,
}

impl Command {
    /// Build a command from its wire name and payload object. Unknown names
    /// and payloads missing required fields yield `None`.
    pub fn from_parts(action: &str, payload: &Value) -> Option<Self> {
        match action {
            "TOGGLE_INSPECTOR" => {
                let payload: TogglePayload = serde_json::from_value(payload.clone()).ok()?;
                Some(Command::ToggleInspector {
                    enabled: payload.enabled.as_ref().is_some_and(is_truthy),
                })
            }
            "HIGHLIGHT_NODE" => {
                let payload: HighlightPayload = serde_json::from_value(payload.clone()).ok()?;
                Some(Command::HighlightNode { id: payload.id })
            }
            "UPDATE_STYLE" => {
                let payload: StylePayload = serde_json::from_value(payload.clone()).ok()?;
                Some(Command::UpdateStyle {
                    id: payload.id,
                    property: payload.property,
                    value: match payload.value {
                        Value::String(value) => value,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    },
                })
            }
            "PING" => Some(Command::Ping),
            _ => None,
        }
    }
}

/// Decode an inbound message, trying the control envelope first and the
/// legacy shape second.
pub fn decode_command(message: &Value) -> Option<Command> {
    let object = message.as_object()?;

    if object.get("type").and_then(Value::as_str) == Some(CONTROL_MARKER) {
        let action = object.get("action").and_then(Value::as_str)?;
        let payload = object.get("data").cloned().unwrap_or(Value::Null);
        return Command::from_parts(action, &payload_or_empty(payload));
    }

    decode_legacy(object)
}

/// The compatibility shim for hosts that predate the control envelope.
///
/// Such a message carries a truthy `action` directly. The command name is
/// `action` when it is a string, otherwise the message's `type` or `event`.
/// Payload fields come from `data` when it is an object, otherwise from the
/// message itself.
pub fn decode_legacy(message: &Map<String, Value>) -> Option<Command> {
    let action = message.get("action").filter(|action| is_truthy(action))?;

    let name = match action {
        Value::String(name) => name.as_str(),
        _ => ["type", "event"]
            .iter()
            .find_map(|key| message.get(*key).and_then(Value::as_str))?,
    };

    let payload = match message.get("data") {
        Some(data @ Value::Object(_)) => data.clone(),
        _ => Value::Object(message.clone()),
    };

    Command::from_parts(name, &payload)
}

fn payload_or_empty(payload: Value) -> Value {
    match payload {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// JavaScript truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
