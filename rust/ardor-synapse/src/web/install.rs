use std::{cell::RefCell, rc::Rc};

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{
    Element, ErrorEvent, KeyboardEvent, MessageEvent, MouseEvent, MutationObserver,
    MutationObserverInit, PromiseRejectionEvent, ResizeObserver, Window,
};

use crate::{
    Bridge, BridgeConfig, Channel, Clock, SynapseError, SystemClock,
    inspector::{PointerButton, PointerOutcome},
    scheduler::MutationAction,
    telemetry::ScriptError,
};

use super::{
    capture::{ConsolePatch, FetchPatch, display},
    dom::WebDom,
    listener::{Listener, Timer, handler},
    transport::ParentTransport,
};

/// Property on `window` holding the same-window API.
pub const WINDOW_API: &str = "__ARDOR__";

/// The bridge shared between every installed callback.
#[derive(Clone)]
pub struct SharedBridge(Rc<RefCell<Bridge<WebDom>>>);

impl SharedBridge {
    /// Run `f` against the bridge, unless it is already in use further up
    /// the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bridge<WebDom>) -> R) -> Option<R> {
        match self.0.try_borrow_mut() {
            Ok(mut bridge) => Some(f(&mut bridge)),
            Err(_) => {
                tracing::debug!("Skipping re-entrant bridge callback");
                None
            }
        }
    }
}

fn apply(event: &web_sys::Event, outcome: PointerOutcome) {
    if outcome.prevent_default {
        event.prevent_default();
    }
    if outcome.stop_propagation {
        event.stop_propagation();
    }
}

fn event_target(event: &web_sys::Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn message_json(data: &JsValue) -> Option<serde_json::Value> {
    let json = js_sys::JSON::stringify(data).ok()?.as_string()?;
    serde_json::from_str(&json).ok()
}

fn host_error(context: &str, error: JsValue) -> SynapseError {
    SynapseError::Host(format!("{context}: {}", display(&error)))
}

struct Observers {
    resize: ResizeObserver,
    mutation: MutationObserver,
    _on_resize: Closure<dyn FnMut()>,
    _on_mutation: Closure<dyn FnMut()>,
}

impl Drop for Observers {
    fn drop(&mut self) {
        self.resize.disconnect();
        self.mutation.disconnect();
    }
}

struct WindowApi {
    window: Window,
    _toggle: Closure<dyn FnMut(JsValue)>,
}

impl Drop for WindowApi {
    fn drop(&mut self) {
        let _ = Reflect::delete_property(&self.window, &WINDOW_API.into());
    }
}

/// Everything the bridge attached to the page. Dropping it detaches it all
/// again.
pub struct Installation {
    bridge: SharedBridge,
    dom: WebDom,
    _api: WindowApi,
    _observers: Observers,
    _timers: Vec<Timer>,
    _flush: Rc<RefCell<Option<Timer>>>,
    _listeners: Vec<Listener>,
    _console: Option<ConsolePatch>,
    _fetch: Option<FetchPatch>,
}

impl Installation {
    /// Install the bridge into `window`.
    pub fn install(window: Window, config: BridgeConfig) -> Result<Self, SynapseError> {
        let dom = WebDom::new(window.clone())
            .ok_or_else(|| SynapseError::Host("Window has no document".into()))?;
        let document = dom.document().clone();
        let body = document
            .body()
            .ok_or_else(|| SynapseError::Host("Document has no body".into()))?;

        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let channel = Channel::new(ParentTransport::new(
            window.clone(),
            config.target_origin.clone(),
        ));

        let console = if config.capture_console {
            Some(ConsolePatch::install(channel.clone(), clock.clone())?)
        } else {
            None
        };
        let fetch = if config.capture_network {
            match FetchPatch::install(channel.clone(), clock.clone()) {
                Ok(patch) => Some(patch),
                Err(error) => {
                    tracing::warn!(%error, "Network capture unavailable");
                    None
                }
            }
        } else {
            None
        };

        let bridge = SharedBridge(Rc::new(RefCell::new(Bridge::new(
            dom.clone(),
            channel,
            clock,
            config.clone(),
        ))));
        let (handshake_interval, height_interval) = bridge
            .with(|bridge| {
                (
                    bridge.scheduler().handshake_interval(),
                    bridge.scheduler().height_interval(),
                )
            })
            .ok_or_else(|| SynapseError::Host("Bridge unavailable".into()))?;

        dom.set_pointer_handlers(
            {
                let bridge = bridge.clone();
                handler(move |event| {
                    let Some(target) = event_target(&event) else {
                        return;
                    };
                    if let Some(outcome) = bridge.with(|bridge| bridge.on_pointer_move(&target)) {
                        apply(&event, outcome);
                    }
                })
            },
            {
                let bridge = bridge.clone();
                handler(move |event| {
                    let Some(target) = event_target(&event) else {
                        return;
                    };
                    let button = event
                        .dyn_ref::<MouseEvent>()
                        .map(|mouse| PointerButton::from_dom(mouse.button()))
                        .unwrap_or(PointerButton::Primary);
                    if let Some(outcome) = bridge.with(|bridge| bridge.on_click(&target, button)) {
                        apply(&event, outcome);
                    }
                })
            },
        );

        let mut listeners = Vec::new();

        if config.capture_errors {
            let errors = bridge
                .with(|bridge| bridge.error_capture())
                .ok_or_else(|| SynapseError::Host("Bridge unavailable".into()))?;
            let on_error = errors.clone();
            listeners.push(Listener::attach(
                &window,
                "error",
                handler(move |event| {
                    let Some(event) = event.dyn_ref::<ErrorEvent>() else {
                        return;
                    };
                    on_error.report_error(&ScriptError {
                        message: event.message(),
                        filename: Some(event.filename()),
                        line: Some(event.lineno()),
                    });
                }),
                false,
            )?);
            listeners.push(Listener::attach(
                &window,
                "unhandledrejection",
                handler(move |event| {
                    let Some(event) = event.dyn_ref::<PromiseRejectionEvent>() else {
                        return;
                    };
                    errors.report_rejection(&display(&event.reason()));
                }),
                false,
            )?);
        }

        listeners.push(Listener::attach(
            &document,
            "keydown",
            {
                let bridge = bridge.clone();
                handler(move |event| {
                    if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
                        bridge.with(|bridge| bridge.on_key_down(&key));
                    }
                })
            },
            false,
        )?);

        listeners.push(Listener::attach(
            &window,
            "message",
            {
                let bridge = bridge.clone();
                handler(move |event| {
                    let Some(event) = event.dyn_ref::<MessageEvent>() else {
                        return;
                    };
                    let origin = event.origin();
                    if !config.accepts_origin(&origin) {
                        tracing::warn!(%origin, "Ignoring message from disallowed origin");
                        return;
                    }
                    if let Some(message) = message_json(&event.data()) {
                        bridge.with(|bridge| bridge.handle_message(&message));
                    }
                })
            },
            false,
        )?);

        let flush: Rc<RefCell<Option<Timer>>> = Rc::default();
        let observers = {
            let on_resize = Closure::<dyn FnMut()>::new({
                let bridge = bridge.clone();
                move || {
                    bridge.with(|bridge| bridge.on_resize());
                }
            });
            let on_mutation = Closure::<dyn FnMut()>::new({
                let bridge = bridge.clone();
                let window = window.clone();
                let flush = flush.clone();
                move || {
                    let Some(MutationAction::ScheduleFlush(delay)) =
                        bridge.with(|bridge| bridge.on_mutation())
                    else {
                        return;
                    };
                    let bridge = bridge.clone();
                    match Timer::timeout(&window, delay.as_millis() as u64, move || {
                        bridge.with(|bridge| bridge.flush_mutations());
                    }) {
                        Ok(timer) => *flush.borrow_mut() = Some(timer),
                        Err(error) => tracing::warn!(%error, "Failed to schedule mutation flush"),
                    }
                }
            });

            let resize = ResizeObserver::new(on_resize.as_ref().unchecked_ref())
                .map_err(|error| host_error("ResizeObserver", error))?;
            resize.observe(&body);

            let mutation = MutationObserver::new(on_mutation.as_ref().unchecked_ref())
                .map_err(|error| host_error("MutationObserver", error))?;
            let options = MutationObserverInit::new();
            options.set_child_list(true);
            options.set_subtree(true);
            options.set_attributes(true);
            mutation
                .observe_with_options(&body, &options)
                .map_err(|error| host_error("MutationObserver", error))?;

            Observers {
                resize,
                mutation,
                _on_resize: on_resize,
                _on_mutation: on_mutation,
            }
        };

        let timers = vec![
            Timer::interval(&window, handshake_interval.as_millis() as u64, {
                let bridge = bridge.clone();
                move || {
                    bridge.with(|bridge| bridge.on_handshake_tick());
                }
            })?,
            Timer::interval(&window, height_interval.as_millis() as u64, {
                let bridge = bridge.clone();
                move || {
                    bridge.with(|bridge| bridge.on_height_tick());
                }
            })?,
        ];

        let api = {
            let toggle = Closure::<dyn FnMut(JsValue)>::new({
                let bridge = bridge.clone();
                move |enabled: JsValue| {
                    bridge.with(|bridge| bridge.set_inspector(enabled.is_truthy()));
                }
            });
            let api = js_sys::Object::new();
            Reflect::set(&api, &"toggleInspector".into(), toggle.as_ref())
                .and_then(|_| Reflect::set(&window, &WINDOW_API.into(), &api))
                .map_err(|error| host_error(WINDOW_API, error))?;
            WindowApi {
                window: window.clone(),
                _toggle: toggle,
            }
        };

        let loaded = Reflect::get(&document, &"readyState".into())
            .ok()
            .and_then(|state| state.as_string())
            .is_some_and(|state| state == "complete");
        if loaded {
            bridge.with(|bridge| bridge.on_load());
        } else {
            listeners.push(Listener::attach(
                &window,
                "load",
                {
                    let bridge = bridge.clone();
                    handler(move |_| {
                        bridge.with(|bridge| bridge.on_load());
                    })
                },
                false,
            )?);
        }

        tracing::debug!("Bridge installed");

        Ok(Self {
            bridge,
            dom,
            _api: api,
            _observers: observers,
            _timers: timers,
            _flush: flush,
            _listeners: listeners,
            _console: console,
            _fetch: fetch,
        })
    }

    /// The installed bridge.
    pub fn bridge(&self) -> SharedBridge {
        self.bridge.clone()
    }
}

impl Drop for Installation {
    fn drop(&mut self) {
        self.bridge.with(|bridge| bridge.destroy());
        self.dom.clear_pointer_handlers();
    }
}
