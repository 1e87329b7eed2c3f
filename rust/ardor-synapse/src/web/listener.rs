use std::rc::Rc;

use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{EventTarget, Window};

use crate::SynapseError;

/// A shared DOM event callback.
pub type Handler = Rc<Closure<dyn FnMut(web_sys::Event)>>;

/// Wrap `callback` as a [`Handler`].
pub fn handler(callback: impl FnMut(web_sys::Event) + 'static) -> Handler {
    Rc::new(Closure::new(callback))
}

/// An attached event listener. Dropping it detaches it.
pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Handler,
    capture: bool,
}

impl Listener {
    /// Attach `callback` to `target` for `kind` events.
    pub fn attach(
        target: &EventTarget,
        kind: &'static str,
        callback: Handler,
        capture: bool,
    ) -> Result<Self, SynapseError> {
        target
            .add_event_listener_with_callback_and_bool(
                kind,
                as_function(&callback),
                capture,
            )
            .map_err(|error| SynapseError::Host(format!("addEventListener({kind}): {error:?}")))?;

        Ok(Self {
            target: target.clone(),
            kind,
            callback,
            capture,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            as_function(&self.callback),
            self.capture,
        );
    }
}

/// A running `setInterval` or `setTimeout`. Dropping it clears it.
pub struct Timer {
    window: Window,
    handle: i32,
    repeating: bool,
    _callback: Closure<dyn FnMut()>,
}

impl Timer {
    /// Call `callback` every `period_ms` milliseconds.
    pub fn interval(
        window: &Window,
        period_ms: u64,
        callback: impl FnMut() + 'static,
    ) -> Result<Self, SynapseError> {
        let callback = Closure::<dyn FnMut()>::new(callback);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                clamp_ms(period_ms),
            )
            .map_err(|error| SynapseError::Host(format!("setInterval: {error:?}")))?;

        Ok(Self {
            window: window.clone(),
            handle,
            repeating: true,
            _callback: callback,
        })
    }

    /// Call `callback` once after `delay_ms` milliseconds.
    pub fn timeout(
        window: &Window,
        delay_ms: u64,
        callback: impl FnMut() + 'static,
    ) -> Result<Self, SynapseError> {
        let callback = Closure::<dyn FnMut()>::new(callback);
        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                clamp_ms(delay_ms),
            )
            .map_err(|error| SynapseError::Host(format!("setTimeout: {error:?}")))?;

        Ok(Self {
            window: window.clone(),
            handle,
            repeating: false,
            _callback: callback,
        })
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.repeating {
            self.window.clear_interval_with_handle(self.handle);
        } else {
            self.window.clear_timeout_with_handle(self.handle);
        }
    }
}

fn as_function(callback: &Handler) -> &js_sys::Function {
    let closure: &Closure<dyn FnMut(web_sys::Event)> = callback;
    closure.as_ref().unchecked_ref()
}

fn clamp_ms(ms: u64) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}
