use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Channel, Clock, Event, protocol::ConsoleEntry};

/// Stand-in for an argument that could not be serialised.
pub const UNSERIALIZABLE_PLACEHOLDER: &str = "[Circular]";

/// The console methods that are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// `console.log`
    Log,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
    /// `console.info`
    Info,
}

impl ConsoleLevel {
    /// Every captured level.
    pub const ALL: [ConsoleLevel; 4] = [
        ConsoleLevel::Log,
        ConsoleLevel::Warn,
        ConsoleLevel::Error,
        ConsoleLevel::Info,
    ];

    /// The name of the console method.
    pub fn method(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Info => "info",
        }
    }
}

/// A value that can be passed to a console method.
pub trait Loggable {
    /// Display text for the value: structured values as JSON, everything
    /// else in its default string form. `None` when a structured value
    /// cannot be serialised.
    fn render(&self) -> Option<String>;
}

impl Loggable for Value {
    fn render(&self) -> Option<String> {
        Some(match self {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

impl Loggable for str {
    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Loggable for String {
    fn render(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Display text for a console argument, falling back to
/// [`UNSERIALIZABLE_PLACEHOLDER`].
pub fn display_arg<A: Loggable + ?Sized>(arg: &A) -> String {
    arg.render()
        .unwrap_or_else(|| UNSERIALIZABLE_PLACEHOLDER.to_string())
}

/// Somewhere console output goes.
pub trait ConsoleSink {
    /// The argument type the sink accepts
    type Arg: Loggable;

    /// Write one console call.
    fn write(&self, level: ConsoleLevel, args: &[Self::Arg]);
}

/// A [`ConsoleSink`] that still writes to the wrapped sink and additionally
/// forwards every call as a `CONSOLE_LOG` event.
pub struct CapturedConsole<S> {
    inner: S,
    channel: Channel,
    clock: Rc<dyn Clock>,
}

impl<S: ConsoleSink> CapturedConsole<S> {
    /// Wrap `inner`.
    pub fn new(inner: S, channel: Channel, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner,
            channel,
            clock,
        }
    }

    /// The wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ConsoleSink> ConsoleSink for CapturedConsole<S> {
    type Arg = S::Arg;

    fn write(&self, level: ConsoleLevel, args: &[Self::Arg]) {
        self.inner.write(level, args);
        self.channel.send(Event::ConsoleLog(ConsoleEntry {
            level,
            timestamp: self.clock.now_ms(),
            args: args.iter().map(display_arg).collect(),
        }));
    }
}
