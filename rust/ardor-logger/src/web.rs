//! Browser integration: console output and interception, page lifecycle
//! hooks and the background flush loop.
//!
//! Once [`PageHooks`] are installed every `console.log`, `debug`, `info`,
//! `warn` and `error` call on the page, including those made by third-party
//! code, goes through the [`Logger`]: it is filtered, formatted, written
//! through the console method it replaced and buffered for delivery.

use std::{cell::Cell, rc::Rc};

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue, closure::Closure, prelude::wasm_bindgen};
use web_sys::{ErrorEvent, EventTarget, PromiseRejectionEvent, VisibilityState};

use crate::{
    LocalSink, LogLevel, Logger, LoggerError,
    message::{LogArg, assemble},
};

/// Console methods taken over by [`ConsolePatch`], and the level each logs at.
const CONSOLE_METHODS: [(&str, LogLevel); 5] = [
    ("log", LogLevel::Info),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("error", LogLevel::Error),
];

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = String, catch)]
    fn js_string(value: &JsValue) -> Result<String, JsValue>;
}

fn display(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| js_string(value).ok())
        .unwrap_or_default()
}

/// `name: message` for JS errors, `String(value)` for anything else.
fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return format!(
            "{}: {}",
            String::from(error.name()),
            String::from(error.message())
        );
    }
    display(value)
}

/// One console argument: strings verbatim, errors as `name: message`,
/// anything else as JSON.
fn console_arg(value: &JsValue) -> LogArg {
    if let Some(text) = value.as_string() {
        return LogArg::Text(text);
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return LogArg::Error {
            name: error.name().into(),
            message: error.message().into(),
        };
    }
    let json = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|json| json.as_string());
    LogArg::Text(json.unwrap_or_else(|| display(value)))
}

fn global_console() -> Result<JsValue, LoggerError> {
    Reflect::get(&js_sys::global(), &"console".into())
        .ok()
        .filter(|console| console.is_object())
        .ok_or_else(|| LoggerError::Transport("No console available".into()))
}

fn console_method(console: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(console, &name.into())
        .ok()
        .and_then(|method| method.dyn_into::<Function>().ok())
}

/// [`LocalSink`] writing to the console methods that were in place when it
/// was created. Create it before installing a [`ConsolePatch`] so that
/// lines are written through the original console.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    console: JsValue,
    methods: Vec<(LogLevel, Function)>,
}

impl ConsoleSink {
    /// Capture the current console.
    pub fn new() -> Self {
        let console = global_console().unwrap_or(JsValue::UNDEFINED);
        let methods = [
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ]
        .into_iter()
        .filter_map(|(name, level)| console_method(&console, name).map(|method| (level, method)))
        .collect();
        Self { console, methods }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSink for ConsoleSink {
    fn write(&self, level: LogLevel, line: &str) {
        if let Some((_, method)) = self.methods.iter().find(|(known, _)| *known == level) {
            let _ = method.call1(&self.console, &JsValue::from_str(line));
        }
    }
}

/// A JS function that collects its arguments into an array and hands them
/// to `forward`.
fn forwarder(forward: &JsValue) -> Result<JsValue, LoggerError> {
    let factory = Function::new_with_args(
        "forward",
        "return function () { return forward(Array.prototype.slice.call(arguments)); };",
    );
    factory
        .call1(&JsValue::UNDEFINED, forward)
        .map_err(|error| LoggerError::Transport(display(&error)))
}

/// The page's console methods routed through a [`Logger`]. Dropping it puts
/// the originals back.
///
/// A console call made while the logger is itself writing (a sink that ends
/// up on the patched console) goes straight to the original method.
pub struct ConsolePatch {
    console: JsValue,
    originals: Vec<(&'static str, Function)>,
    _forwarders: Vec<Closure<dyn FnMut(Array)>>,
}

impl ConsolePatch {
    /// Route the global console through `logger`.
    pub fn install(logger: Rc<Logger>) -> Result<Self, LoggerError> {
        let console = global_console()?;
        let busy = Rc::new(Cell::new(false));

        let mut originals = Vec::with_capacity(CONSOLE_METHODS.len());
        let mut forwarders = Vec::with_capacity(CONSOLE_METHODS.len());
        for (name, level) in CONSOLE_METHODS {
            let Some(original) = console_method(&console, name) else {
                continue;
            };
            let forward = Closure::<dyn FnMut(Array)>::new({
                let logger = logger.clone();
                let busy = busy.clone();
                let console = console.clone();
                let original = original.clone();
                move |args: Array| {
                    if busy.replace(true) {
                        let _ = original.apply(&console, &args);
                        return;
                    }
                    let args: Vec<LogArg> = args.iter().map(|arg| console_arg(&arg)).collect();
                    logger.log(level, &assemble(&args), &[]);
                    busy.set(false);
                }
            });
            let patched = forwarder(forward.as_ref())?;
            Reflect::set(&console, &name.into(), &patched)
                .map_err(|error| LoggerError::Transport(display(&error)))?;
            originals.push((name, original));
            forwarders.push(forward);
        }

        Ok(Self {
            console,
            originals,
            _forwarders: forwarders,
        })
    }
}

impl Drop for ConsolePatch {
    fn drop(&mut self) {
        for (name, original) in &self.originals {
            let _ = Reflect::set(&self.console, &(*name).into(), original);
        }
    }
}

struct Hook {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Hook {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        callback: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, LoggerError> {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(callback);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|error| LoggerError::Transport(format!("{error:?}")))?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Hook {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// The logger wired into the page: console calls are intercepted, uncaught
/// errors and unhandled rejections are logged, buffered lines are beaconed
/// when the page is hidden or unloaded, and the flush loop runs in the
/// background.
///
/// Dropping it restores the console, detaches the hooks and stops the loop.
pub struct PageHooks {
    logger: Rc<Logger>,
    _console: ConsolePatch,
    _hooks: Vec<Hook>,
}

impl PageHooks {
    /// Attach `logger` to the current page.
    pub fn install(logger: Rc<Logger>) -> Result<Self, LoggerError> {
        let window =
            web_sys::window().ok_or_else(|| LoggerError::Transport("No window available".into()))?;
        let document = window
            .document()
            .ok_or_else(|| LoggerError::Transport("No document available".into()))?;

        let console = ConsolePatch::install(logger.clone())?;
        let mut hooks = Vec::new();

        hooks.push(Hook::attach(&window, "error", {
            let logger = logger.clone();
            move |event| {
                let Some(event) = event.dyn_ref::<ErrorEvent>() else {
                    return;
                };
                let error = event.error();
                let description = if error.is_object() {
                    describe(&error)
                } else {
                    event.message()
                };
                let source = event.filename();
                let location = if source.is_empty() {
                    String::new()
                } else {
                    format!(" at {source}:{}:{}", event.lineno(), event.colno())
                };
                logger.error(&format!("Uncaught error: {description}{location}"));
            }
        })?);

        hooks.push(Hook::attach(&window, "unhandledrejection", {
            let logger = logger.clone();
            move |event| {
                if let Some(event) = event.dyn_ref::<PromiseRejectionEvent>() {
                    logger.error(&format!(
                        "Unhandled promise rejection: {}",
                        describe(&event.reason())
                    ));
                }
            }
        })?);

        hooks.push(Hook::attach(&window, "beforeunload", {
            let logger = logger.clone();
            move |_| {
                if let Err(error) = logger.flush_sync() {
                    tracing::debug!(%error, "Beacon flush failed");
                }
            }
        })?);

        hooks.push(Hook::attach(&document, "visibilitychange", {
            let logger = logger.clone();
            let document = document.clone();
            move |_| {
                if document.visibility_state() == VisibilityState::Hidden {
                    if let Err(error) = logger.flush_sync() {
                        tracing::debug!(%error, "Beacon flush failed");
                    }
                }
            }
        })?);

        let background = logger.clone();
        wasm_bindgen_futures::spawn_local(async move { background.run().await });

        Ok(Self {
            logger,
            _console: console,
            _hooks: hooks,
        })
    }
}

impl Drop for PageHooks {
    fn drop(&mut self) {
        self.logger.shutdown();
    }
}
