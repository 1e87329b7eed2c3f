#![warn(missing_docs)]

//! Leveled logging with batched delivery to the Ardor logs API.
//!
//! Every line is filtered by level, formatted as
//! `LEVEL: <ISO-8601 time> - message` and written to a [`LocalSink`].
//! Lines at or above the remote level are also buffered and periodically
//! submitted in batches, retrying with exponential backoff when the API
//! rate limits or cannot be reached.
//!
//! ```no_run
//! # async fn example() -> Result<(), ardor_logger::LoggerError> {
//! use ardor_logger::{Logger, LoggerConfig};
//!
//! let logger = Logger::new(LoggerConfig::from_env());
//! logger.info("Preview booted");
//! logger.error("Render failed");
//! logger.flush().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod level;
pub use level::*;

pub mod config;
pub use config::LoggerConfig;

pub mod message;
pub use message::LogArg;

pub mod buffer;
pub use buffer::{LogBuffer, LogEntry};

pub mod transport;
pub use transport::{HttpTransport, LogTransport};

mod runtime;
pub use runtime::*;

mod sink;
pub use sink::*;

mod logger;
pub use logger::*;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod web;
