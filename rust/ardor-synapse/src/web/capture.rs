//! Swapping the capture decorators in for the page's globals.
//!
//! `console.*` and `window.fetch` are replaced by small JS forwarders that
//! pass their arguments into Rust; the originals are kept and put back when
//! the patch is dropped.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue, closure::Closure, prelude::wasm_bindgen};
use wasm_bindgen_futures::{JsFuture, future_to_promise};

use crate::{
    Channel, Clock, SynapseError,
    telemetry::{
        CapturedConsole, ConsoleLevel, ConsoleSink, Fetch, FetchFailure, FetchRequest,
        FetchResponse, Loggable, ObservedFetch,
    },
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = String, catch)]
    fn js_string(value: &JsValue) -> Result<String, JsValue>;
}

/// `String(value)`, as JS would render it.
pub fn display(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| js_string(value).ok())
        .unwrap_or_default()
}

impl Loggable for JsValue {
    fn render(&self) -> Option<String> {
        if self.is_object() {
            js_sys::JSON::stringify(self)
                .ok()
                .and_then(|json| json.as_string())
        } else {
            Some(display(self))
        }
    }
}

fn host_error(context: &str, error: JsValue) -> SynapseError {
    SynapseError::Host(format!("{context}: {}", display(&error)))
}

/// A JS function that collects its arguments into an array, hands them to
/// `forward` and returns whatever `forward` returns.
fn forwarder(forward: &JsValue) -> Result<JsValue, SynapseError> {
    let factory = Function::new_with_args(
        "forward",
        "return function () { return forward(Array.prototype.slice.call(arguments)); };",
    );
    factory
        .call1(&JsValue::UNDEFINED, forward)
        .map_err(|error| host_error("forwarder", error))
}

/// The console methods as they were before patching.
pub struct OriginalConsole {
    console: JsValue,
    methods: Vec<(ConsoleLevel, Function)>,
}

impl ConsoleSink for OriginalConsole {
    type Arg = JsValue;

    fn write(&self, level: ConsoleLevel, args: &[JsValue]) {
        let Some((_, method)) = self.methods.iter().find(|(known, _)| *known == level) else {
            return;
        };
        let args: Array = args.iter().collect();
        let _ = method.apply(&self.console, &args);
    }
}

/// `console.log`, `warn`, `error` and `info` forwarded as `CONSOLE_LOG`.
pub struct ConsolePatch {
    console: JsValue,
    originals: Vec<(ConsoleLevel, Function)>,
    _forwarders: Vec<Closure<dyn FnMut(Array)>>,
}

impl ConsolePatch {
    /// Patch the global console.
    pub fn install(channel: Channel, clock: Rc<dyn Clock>) -> Result<Self, SynapseError> {
        let console = Reflect::get(&js_sys::global(), &"console".into())
            .map_err(|error| host_error("console", error))?;

        let originals: Vec<(ConsoleLevel, Function)> = ConsoleLevel::ALL
            .into_iter()
            .filter_map(|level| {
                Reflect::get(&console, &level.method().into())
                    .ok()
                    .and_then(|method| method.dyn_into::<Function>().ok())
                    .map(|method| (level, method))
            })
            .collect();

        let sink = Rc::new(CapturedConsole::new(
            OriginalConsole {
                console: console.clone(),
                methods: originals.clone(),
            },
            channel,
            clock,
        ));

        let mut forwarders = Vec::with_capacity(originals.len());
        for (level, _) in &originals {
            let level = *level;
            let sink = sink.clone();
            let forward = Closure::<dyn FnMut(Array)>::new(move |args: Array| {
                let args: Vec<JsValue> = args.iter().collect();
                sink.write(level, &args);
            });
            let patched = forwarder(forward.as_ref())?;
            Reflect::set(&console, &level.method().into(), &patched)
                .map_err(|error| host_error("console", error))?;
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
        for (level, original) in &self.originals {
            let _ = Reflect::set(&self.console, &level.method().into(), original);
        }
    }
}

/// The arguments of one `fetch(...)` call.
pub struct FetchCall {
    args: Array,
}

impl FetchRequest for FetchCall {
    fn url(&self) -> String {
        let resource = self.args.get(0);
        resource
            .as_string()
            .or_else(|| {
                Reflect::get(&resource, &"url".into())
                    .ok()
                    .and_then(|url| url.as_string())
            })
            .unwrap_or_else(|| display(&resource))
    }

    fn method(&self) -> Option<String> {
        let init = self.args.get(1);
        if !init.is_object() {
            return None;
        }
        Reflect::get(&init, &"method".into())
            .ok()
            .and_then(|method| method.as_string())
            .filter(|method| !method.is_empty())
    }
}

/// The `Response` a fetch resolved with.
pub struct FetchReply(JsValue);

impl FetchResponse for FetchReply {
    fn status(&self) -> u16 {
        Reflect::get(&self.0, &"status".into())
            .ok()
            .and_then(|status| status.as_f64())
            .unwrap_or_default() as u16
    }
}

/// The reason a fetch rejected with.
pub struct FetchRejection(JsValue);

impl FetchFailure for FetchRejection {
    fn message(&self) -> String {
        Reflect::get(&self.0, &"message".into())
            .ok()
            .and_then(|message| message.as_string())
            .unwrap_or_else(|| display(&self.0))
    }
}

/// The page's `fetch` as it was before patching.
pub struct WindowFetch {
    global: JsValue,
    original: Function,
}

#[async_trait(?Send)]
impl Fetch for WindowFetch {
    type Request = FetchCall;
    type Response = FetchReply;
    type Error = FetchRejection;

    async fn fetch(&self, request: FetchCall) -> Result<FetchReply, FetchRejection> {
        let pending = self
            .original
            .apply(&self.global, &request.args)
            .map_err(FetchRejection)?
            .dyn_into::<Promise>()
            .map_err(FetchRejection)?;
        JsFuture::from(pending)
            .await
            .map(FetchReply)
            .map_err(FetchRejection)
    }
}

/// `window.fetch` forwarded as `NETWORK_LOG`.
pub struct FetchPatch {
    global: JsValue,
    original: Function,
    _forwarder: Closure<dyn FnMut(Array) -> Promise>,
}

impl FetchPatch {
    /// Patch the global `fetch`.
    pub fn install(channel: Channel, clock: Rc<dyn Clock>) -> Result<Self, SynapseError> {
        let global = JsValue::from(js_sys::global());
        let original = Reflect::get(&global, &"fetch".into())
            .ok()
            .and_then(|fetch| fetch.dyn_into::<Function>().ok())
            .ok_or_else(|| SynapseError::Host("fetch is not available".into()))?;

        let observed = Rc::new(ObservedFetch::new(
            WindowFetch {
                global: global.clone(),
                original: original.clone(),
            },
            channel,
            clock,
        ));

        let forward = Closure::<dyn FnMut(Array) -> Promise>::new(move |args: Array| {
            let observed = observed.clone();
            future_to_promise(async move {
                observed
                    .fetch(FetchCall { args })
                    .await
                    .map(|reply| reply.0)
                    .map_err(|rejection| rejection.0)
            })
        });
        let patched = forwarder(forward.as_ref())?;
        Reflect::set(&global, &"fetch".into(), &patched)
            .map_err(|error| host_error("fetch", error))?;

        Ok(Self {
            global,
            original,
            _forwarder: forward,
        })
    }
}

impl Drop for FetchPatch {
    fn drop(&mut self) {
        let _ = Reflect::set(&self.global, &"fetch".into(), &self.original);
    }
}
