use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::LogLevel;

/// One extra argument of a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    /// Written verbatim
    Text(String),
    /// Written as `name: message`
    Error {
        /// The error's type name
        name: String,
        /// The error's description
        message: String,
    },
    /// Written as JSON
    Value(Value),
}

impl LogArg {
    /// An [`LogArg::Error`] from any Rust error, named after its type.
    pub fn error<E: std::error::Error>(error: &E) -> Self {
        let name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
            .to_string();
        LogArg::Error {
            name,
            message: error.to_string(),
        }
    }

    fn render(&self) -> String {
        match self {
            LogArg::Text(text) => text.clone(),
            LogArg::Error { name, message } => format!("{name}: {message}"),
            LogArg::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for LogArg {
    fn from(text: &str) -> Self {
        LogArg::Text(text.to_string())
    }
}

impl From<String> for LogArg {
    fn from(text: String) -> Self {
        LogArg::Text(text)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        LogArg::Value(value)
    }
}

/// Join arguments with single spaces.
pub fn assemble(args: &[LogArg]) -> String {
    args.iter()
        .map(LogArg::render)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `message`, followed by the assembled `args` when there are any.
pub fn full_message(message: &str, args: &[LogArg]) -> String {
    if args.is_empty() {
        message.to_string()
    } else {
        format!("{message} {}", assemble(args))
    }
}

/// A local output line: `LEVEL: <ISO-8601 time> - message`.
pub fn format_line(level: LogLevel, at: DateTime<Utc>, message: &str) -> String {
    format!(
        "{}: {} - {message}",
        level.display_name(),
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_renders_each_kind_of_argument() {
        let args = vec![
            LogArg::from("saved"),
            LogArg::from(json!({ "id": 7, "tags": ["a"] })),
            LogArg::Error {
                name: "TypeError".into(),
                message: "x is undefined".into(),
            },
        ];

        assert_eq!(
            assemble(&args),
            r#"saved {"id":7,"tags":["a"]} TypeError: x is undefined"#
        );
    }

    #[test]
    fn it_names_rust_errors_after_their_type() {
        let Err(error) = "x".parse::<u8>() else {
            panic!("parsing should fail");
        };

        let LogArg::Error { name, .. } = LogArg::error(&error) else {
            panic!("expected an error argument");
        };
        assert_eq!(name, "ParseIntError");
    }

    #[test]
    fn it_only_appends_arguments_when_present() {
        assert_eq!(full_message("ready", &[]), "ready");
        assert_eq!(full_message("ready", &["in".into(), "3ms".into()]), "ready in 3ms");
    }

    #[test]
    fn it_formats_lines_with_level_and_iso_time() -> anyhow::Result<()> {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:30:00.250Z")?.with_timezone(&Utc);

        assert_eq!(
            format_line(LogLevel::Warn, at, "disk almost full"),
            "WARNING: 2024-05-01T12:30:00.250Z - disk almost full"
        );
        Ok(())
    }
}
