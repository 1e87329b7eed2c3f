use std::rc::Rc;

use crate::{Channel, Clock, Event, protocol::ConsoleEntry};

use super::ConsoleLevel;

/// An uncaught script error, as reported by the window `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptError {
    /// The error description
    pub message: String,
    /// Script the error was thrown from, when known
    pub filename: Option<String>,
    /// Line the error was thrown from, when known
    pub line: Option<u32>,
}

/// Turns uncaught errors and unhandled rejections into `CONSOLE_LOG`
/// events at error level.
#[derive(Clone)]
pub struct ErrorCapture {
    channel: Channel,
    clock: Rc<dyn Clock>,
}

impl ErrorCapture {
    /// Forward reports over `channel`.
    pub fn new(channel: Channel, clock: Rc<dyn Clock>) -> Self {
        Self { channel, clock }
    }

    /// Report an uncaught error.
    pub fn report_error(&self, error: &ScriptError) {
        let mut args = vec![format!("Uncaught: {}", error.message)];
        if let Some(filename) = error.filename.as_deref().filter(|name| !name.is_empty()) {
            args.push(format!("@ {filename}:{}", error.line.unwrap_or(0)));
        }
        self.emit(args);
    }

    /// Report a promise rejection nobody handled.
    pub fn report_rejection(&self, reason: &str) {
        self.emit(vec![format!("Unhandled Rejection: {reason}")]);
    }

    fn emit(&self, args: Vec<String>) {
        self.channel.send(Event::ConsoleLog(ConsoleEntry {
            level: ConsoleLevel::Error,
            timestamp: self.clock.now_ms(),
            args,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{ManualClock, RecordingTransport};

    fn capture() -> (ErrorCapture, RecordingTransport) {
        let transport = RecordingTransport::default();
        let capture = ErrorCapture::new(
            Channel::new(transport.clone()),
            Rc::new(ManualClock::at(99)),
        );
        (capture, transport)
    }

    #[test]
    fn it_reports_errors_with_their_location() {
        let (capture, transport) = capture();

        capture.report_error(&ScriptError {
            message: "x is not defined".into(),
            filename: Some("https://app.example/main.js".into()),
            line: Some(12),
        });

        assert_eq!(
            transport.events(),
            vec![Event::ConsoleLog(ConsoleEntry {
                level: ConsoleLevel::Error,
                timestamp: 99,
                args: vec![
                    "Uncaught: x is not defined".into(),
                    "@ https://app.example/main.js:12".into(),
                ],
            })]
        );
    }

    #[test]
    fn it_leaves_out_an_unknown_location() {
        let (capture, transport) = capture();

        capture.report_error(&ScriptError {
            message: "Script error.".into(),
            ..Default::default()
        });

        let events = transport.events();
        let [Event::ConsoleLog(entry)] = events.as_slice() else {
            panic!("expected exactly one console event");
        };
        assert_eq!(entry.args, vec!["Uncaught: Script error.".to_string()]);
    }

    #[test]
    fn it_reports_unhandled_rejections() {
        let (capture, transport) = capture();

        capture.report_rejection("Error: timeout");

        let events = transport.events();
        let [Event::ConsoleLog(entry)] = events.as_slice() else {
            panic!("expected exactly one console event");
        };
        assert_eq!(entry.level, ConsoleLevel::Error);
        assert_eq!(entry.args, vec!["Unhandled Rejection: Error: timeout".to_string()]);
    }
}
