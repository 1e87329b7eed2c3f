#![cfg(all(target_arch = "wasm32", target_os = "unknown"))]

use std::rc::Rc;

use anyhow::Result;
use ardor_logger::{
    LogLevel, Logger, LoggerConfig,
    helpers::{FixedClock, ScriptedTransport},
    web::{ConsolePatch, ConsoleSink, PageHooks},
};
use chrono::{DateTime, Utc};
use js_sys::{Array, Function, Object, Reflect};
use pretty_assertions::assert_eq;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

const LINES: &str = "__ardorLines";

fn remote_config() -> LoggerConfig {
    LoggerConfig {
        remote_enabled: true,
        min_remote_level: LogLevel::Info,
        api_key: "k-123".into(),
        service_id: "svc".into(),
        ..LoggerConfig::default()
    }
}

fn fixed_clock() -> Result<FixedClock> {
    let at: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")?.into();
    Ok(FixedClock(at))
}

fn console() -> JsValue {
    Reflect::get(&js_sys::global(), &"console".into()).expect("console exists")
}

fn method(name: &str) -> Function {
    Reflect::get(&console(), &name.into())
        .expect("console method exists")
        .dyn_into()
        .expect("console method is a function")
}

/// Replace `console.<name>` with a function appending `name|line` to a
/// global array. Returns what it replaced and the replacement.
fn record(name: &str) -> (JsValue, Function) {
    let original = Reflect::get(&console(), &name.into()).expect("console method exists");
    let recorder = Function::new_with_args(
        "line",
        &format!("globalThis.{LINES}.push('{name}|' + line);"),
    );
    Reflect::set(&console(), &name.into(), &recorder).expect("console method replaced");
    (original, recorder)
}

fn recorded() -> Vec<String> {
    Reflect::get(&js_sys::global(), &LINES.into())
        .ok()
        .and_then(|lines| lines.dyn_into::<Array>().ok())
        .map(|lines| lines.iter().filter_map(|line| line.as_string()).collect())
        .unwrap_or_default()
}

#[wasm_bindgen_test]
fn it_routes_console_calls_through_the_logger() -> Result<()> {
    Reflect::set(&js_sys::global(), &LINES.into(), &Array::new()).expect("lines reset");
    let saved: Vec<(&str, JsValue, Function)> = ["info", "warn", "debug"]
        .into_iter()
        .map(|name| {
            let (original, recorder) = record(name);
            (name, original, recorder)
        })
        .collect();

    let logger = Rc::new(
        Logger::new(remote_config())
            .with_transport(ScriptedTransport::default())
            .with_sink(ConsoleSink::new())
            .with_clock(fixed_clock()?),
    );
    let patch = ConsolePatch::install(logger.clone()).expect("console patched");
    let state = js_sys::JSON::parse(r#"{ "b": 1, "a": [2] }"#).expect("state parses");

    method("log")
        .call2(&console(), &"state".into(), &state)
        .expect("console.log runs");
    method("warn")
        .call2(
            &console(),
            &"disk".into(),
            &js_sys::Error::new("full").into(),
        )
        .expect("console.warn runs");
    method("debug")
        .call1(&console(), &"hidden".into())
        .expect("console.debug runs");

    drop(patch);
    let restored = saved
        .iter()
        .all(|(name, _, recorder)| Object::is(&method(name), recorder));
    let lines = recorded();
    for (name, original, _) in saved {
        Reflect::set(&console(), &name.into(), &original).expect("console method restored");
    }

    assert!(restored);
    assert_eq!(
        lines,
        vec![
            r#"info|INFO: 2024-05-01T12:30:00.000Z - state {"b":1,"a":[2]}"#.to_string(),
            "warn|WARNING: 2024-05-01T12:30:00.000Z - disk Error: full".to_string(),
        ]
    );
    assert_eq!(logger.buffer_size(), 2);
    Ok(())
}

#[wasm_bindgen_test]
fn it_beacons_buffered_lines_when_the_page_unloads() -> Result<()> {
    let window = web_sys::window().expect("tests run in a window");
    let original_log = Reflect::get(&console(), &"log".into()).expect("console.log exists");
    let transport = ScriptedTransport::default();
    let logger = Rc::new(
        Logger::new(remote_config())
            .with_transport(transport.clone())
            .with_clock(fixed_clock()?),
    );

    let hooks = PageHooks::install(logger.clone()).expect("hooks installed");
    assert!(!Object::is(
        &Reflect::get(&console(), &"log".into()).expect("console.log exists"),
        &original_log
    ));
    logger.error("leaving");
    let unload = web_sys::Event::new("beforeunload").expect("event created");
    window.dispatch_event(&unload).expect("event dispatched");
    drop(hooks);

    let beacons = transport.beacons();
    assert_eq!(beacons.len(), 1);
    assert_eq!(
        beacons[0].0,
        "/_debug/api/v1/services/svc/logs/submit?api_key=k-123"
    );
    assert!(beacons[0].1.contains("leaving"));
    assert_eq!(logger.buffer_size(), 0);
    assert!(Object::is(
        &Reflect::get(&console(), &"log".into()).expect("console.log exists"),
        &original_log
    ));
    Ok(())
}
