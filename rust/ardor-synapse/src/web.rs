//! Browser bindings.
//!
//! Binds the bridge's seams to the real page ([`WebDom`],
//! [`ParentTransport`], the console and fetch patches) and exports the
//! entry points called from JS:
//!
//! ```js
//! import load, { init, destroy, toggleInspector } from "./ardor_synapse.js";
//!
//! await load();
//! init({ allowedOrigins: ["https://studio.example"] });
//! toggleInspector(true);
//! ```

mod capture;
mod dom;
mod install;
mod listener;
mod transport;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::{BridgeConfig, SynapseError};

pub use capture::{ConsolePatch, FetchPatch, OriginalConsole, WindowFetch};
pub use dom::{INSPECTOR_CHANGE_EVENT, WebDom};
pub use install::{Installation, SharedBridge, WINDOW_API};
pub use listener::{Handler, Listener, Timer};
pub use transport::ParentTransport;

thread_local! {
    static INSTALLATION: RefCell<Option<Installation>> = const { RefCell::new(None) };
}

fn parse_config(config: &JsValue) -> Result<BridgeConfig, SynapseError> {
    if config.is_undefined() || config.is_null() {
        return Ok(BridgeConfig::default());
    }
    let json = js_sys::JSON::stringify(config)
        .ok()
        .and_then(|json| json.as_string())
        .ok_or_else(|| SynapseError::InvalidConfig("Configuration is not an object".into()))?;
    BridgeConfig::from_json(&json)
}

fn installed_bridge() -> Option<SharedBridge> {
    INSTALLATION.with(|slot| {
        slot.try_borrow()
            .ok()
            .and_then(|installation| installation.as_ref().map(Installation::bridge))
    })
}

/// Install the bridge into the current window. Calling it again while
/// installed does nothing.
#[wasm_bindgen]
pub fn init(config: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    if is_initialized() {
        tracing::debug!("Bridge already installed");
        return Ok(());
    }

    let config = parse_config(&config).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
    let installation = Installation::install(window, config)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;

    INSTALLATION.with(|slot| *slot.borrow_mut() = Some(installation));
    Ok(())
}

/// Remove the bridge and everything it attached to the page.
#[wasm_bindgen]
pub fn destroy() {
    let installation = INSTALLATION.with(|slot| slot.borrow_mut().take());
    drop(installation);
}

/// Whether the bridge is installed.
#[wasm_bindgen(js_name = isInitialized)]
pub fn is_initialized() -> bool {
    installed_bridge().is_some()
}

/// Turn the inspector on or off.
#[wasm_bindgen(js_name = toggleInspector)]
pub fn toggle_inspector(enabled: bool) {
    if let Some(bridge) = installed_bridge() {
        bridge.with(|bridge| bridge.set_inspector(enabled));
    }
}

#[cfg(feature = "autostart")]
#[wasm_bindgen(start)]
fn start() -> Result<(), JsValue> {
    init(JsValue::UNDEFINED)
}
