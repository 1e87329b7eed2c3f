//! Bridge configuration.
//!
//! [`BridgeConfig`] deserialises from the camelCase object a host page may
//! pass to `init`. Every field has a default, so `{}` (or no object at all)
//! yields the stock bridge.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SynapseError;

/// Protocol version announced in the handshake.
pub const BRIDGE_VERSION: &str = "2.3.0";

/// Attribute holding the generated element identifier.
pub const ID_ATTRIBUTE: &str = "data-ardor-id";

/// DOM id of the highlight overlay element.
pub const OVERLAY_ID: &str = "ardor-overlay";

/// Attribute naming the source file an element was rendered from.
pub const SOURCE_FILE_ATTRIBUTE: &str = "data-source-file";

/// Attribute naming the source line an element was rendered from.
pub const SOURCE_LINE_ATTRIBUTE: &str = "data-source-line";

/// Feature names announced in the handshake.
pub const FEATURES: [&str; 6] = [
    "AUTO_HEIGHT",
    "DOM_TREE",
    "INSPECTOR",
    "STYLE_EDITING",
    "CONSOLE",
    "NETWORK",
];

/// Runtime configuration of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Version string sent in `BRIDGE_READY`
    pub version: String,
    /// Feature list sent in `BRIDGE_READY`
    pub features: Vec<String>,
    /// Attribute used to store element identifiers
    pub id_attribute: String,
    /// DOM id given to the overlay element
    pub overlay_id: String,
    /// Period of the handshake re-announcement
    pub handshake_interval_ms: u64,
    /// Period of the height re-announcement
    pub height_interval_ms: u64,
    /// Trailing-edge debounce applied to mutation-driven pushes; zero
    /// pushes on every observed mutation
    pub mutation_debounce_ms: u64,
    /// Target origin passed to `postMessage`
    pub target_origin: String,
    /// Origins whose commands are accepted; empty accepts any sender
    pub allowed_origins: Vec<String>,
    /// Forward `console.*` calls
    pub capture_console: bool,
    /// Forward uncaught errors and unhandled rejections
    pub capture_errors: bool,
    /// Forward `fetch` calls
    pub capture_network: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: BRIDGE_VERSION.to_string(),
            features: FEATURES.iter().map(|feature| feature.to_string()).collect(),
            id_attribute: ID_ATTRIBUTE.to_string(),
            overlay_id: OVERLAY_ID.to_string(),
            handshake_interval_ms: 3000,
            height_interval_ms: 1000,
            mutation_debounce_ms: 0,
            target_origin: "*".to_string(),
            allowed_origins: Vec::new(),
            capture_console: true,
            capture_errors: true,
            capture_network: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, SynapseError> {
        serde_json::from_str(json).map_err(|error| SynapseError::InvalidConfig(format!("{error}")))
    }

    /// Period of the handshake re-announcement.
    pub fn handshake_interval(&self) -> Duration {
        Duration::from_millis(self.handshake_interval_ms)
    }

    /// Period of the height re-announcement.
    pub fn height_interval(&self) -> Duration {
        Duration::from_millis(self.height_interval_ms)
    }

    /// Debounce window for mutation-driven pushes.
    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    /// Whether a command sent from `origin` should be honoured.
    pub fn accepts_origin(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty()
            || self
                .allowed_origins
                .iter()
                .any(|allowed| allowed == "*" || allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_fills_missing_fields_with_defaults() -> anyhow::Result<()> {
        let config = BridgeConfig::from_json(r#"{ "heightIntervalMs": 250 }"#)?;

        assert_eq!(config.height_interval(), Duration::from_millis(250));
        assert_eq!(config.handshake_interval(), Duration::from_millis(3000));
        assert_eq!(config.id_attribute, "data-ardor-id");
        assert_eq!(config.target_origin, "*");
        assert_eq!(config.features.len(), 6);
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_json() {
        let result = BridgeConfig::from_json("{ nope");
        assert!(matches!(result, Err(SynapseError::InvalidConfig(_))));
    }

    #[test]
    fn it_accepts_any_origin_when_unrestricted() {
        let config = BridgeConfig::default();
        assert!(config.accepts_origin("https://anywhere.example"));
    }

    #[test]
    fn it_only_accepts_listed_origins_when_restricted() {
        let config = BridgeConfig {
            allowed_origins: vec!["https://studio.example".into()],
            ..Default::default()
        };

        assert!(config.accepts_origin("https://studio.example"));
        assert!(!config.accepts_origin("https://evil.example"));
    }
}
