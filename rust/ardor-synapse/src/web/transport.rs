use wasm_bindgen::JsValue;
use web_sys::Window;

use crate::{Envelope, SynapseError, Transport};

/// [`Transport`] posting to the parent window.
///
/// Each envelope is encoded with `serde_json` and parsed back into a plain
/// JS object, so the host receives structured data rather than a string.
pub struct ParentTransport {
    window: Window,
    target_origin: String,
}

impl ParentTransport {
    /// Post from `window` to its parent, restricted to `target_origin`.
    pub fn new(window: Window, target_origin: impl Into<String>) -> Self {
        Self {
            window,
            target_origin: target_origin.into(),
        }
    }

    fn encode(envelope: &Envelope) -> Result<JsValue, SynapseError> {
        let json = serde_json::to_string(envelope)?;
        js_sys::JSON::parse(&json).map_err(|error| SynapseError::Encode(format!("{error:?}")))
    }

    fn try_post(&self, envelope: &Envelope) -> Result<(), SynapseError> {
        let message = Self::encode(envelope)?;
        let parent = self
            .window
            .parent()
            .map_err(|error| SynapseError::Host(format!("{error:?}")))?
            .ok_or_else(|| SynapseError::Host("No parent window".into()))?;
        parent
            .post_message(&message, &self.target_origin)
            .map_err(|error| SynapseError::Host(format!("{error:?}")))
    }
}

impl Transport for ParentTransport {
    fn post(&self, envelope: &Envelope) {
        if let Err(error) = self.try_post(envelope) {
            tracing::warn!(%error, event = envelope.event.name(), "Dropped outbound message");
        }
    }
}
