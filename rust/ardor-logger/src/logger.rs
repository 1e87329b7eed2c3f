//! The logger itself.
//!
//! ```text
//! info!/warn!/... ──▸ filter (min_level) ──▸ LocalSink
//!                        │
//!                        └─▸ filter (min_remote_level) ──▸ LogBuffer
//!                                                            │
//!                         flush loop / flush() ◂─────────────┘
//!                                │
//!                                ▼
//!                        LogTransport::submit ── 204 ──▸ done
//!                                │ 429 / unreachable
//!                                ▼
//!                   Delay(base * 2^n), up to max_retries
//!                                │ still failing
//!                                ▼
//!                       batch requeued in front
//! ```

use std::cell::{Cell, RefCell};

use crate::{
    Clock, Delay, HttpTransport, LocalSink, LogLevel, LoggerConfig, LoggerError, SystemClock,
    TimerDelay, TracingSink,
    buffer::{LogBatch, LogBuffer, LogEntry},
    message::{LogArg, format_line, full_message},
    transport::LogTransport,
};

/// Resets the in-progress flag even if a flush is abandoned midway.
struct FlushGuard<'a>(&'a Cell<bool>);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Leveled logger with batched remote delivery.
pub struct Logger {
    config: RefCell<LoggerConfig>,
    buffer: RefCell<LogBuffer>,
    flushing: Cell<bool>,
    stopped: Cell<bool>,
    transport: Box<dyn LogTransport>,
    delay: Box<dyn Delay>,
    sink: Box<dyn LocalSink>,
    clock: Box<dyn Clock>,
}

impl Logger {
    /// A logger delivering over HTTP and writing locally through `tracing`.
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            buffer: RefCell::new(LogBuffer::new(config.max_buffer_size)),
            config: RefCell::new(config),
            flushing: Cell::new(false),
            stopped: Cell::new(false),
            transport: Box::new(HttpTransport::default()),
            delay: Box::new(TimerDelay),
            sink: Box::new(TracingSink),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the transport.
    pub fn with_transport(mut self, transport: impl LogTransport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// Replace the retry and flush-loop delay.
    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// Replace the local output.
    pub fn with_sink(mut self, sink: impl LocalSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> LoggerConfig {
        self.config.borrow().clone()
    }

    /// Log at [`LogLevel::Debug`].
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, &[]);
    }

    /// Log at [`LogLevel::Info`].
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, &[]);
    }

    /// Log at [`LogLevel::Warn`].
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, &[]);
    }

    /// Log at [`LogLevel::Error`].
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, &[]);
    }

    /// Log `message` followed by `args` at `level`.
    pub fn log(&self, level: LogLevel, message: &str, args: &[LogArg]) {
        if !self.should_log(level) {
            return;
        }
        let message = full_message(message, args);
        let now = self.clock.now();
        self.sink.write(level, &format_line(level, now, &message));

        if self.should_log_remote(level) {
            self.buffer.borrow_mut().push(LogEntry {
                message,
                log_level: level.api_level(),
                timestamp: now.timestamp(),
            });
        }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        let config = self.config.borrow();
        config.enabled && level >= config.min_level
    }

    fn should_log_remote(&self, level: LogLevel) -> bool {
        let config = self.config.borrow();
        config.remote_enabled && level >= config.min_remote_level
    }

    /// Set the lowest level written locally.
    pub fn set_level(&self, level: LogLevel) {
        self.config.borrow_mut().min_level = level;
    }

    /// Set the lowest level buffered for delivery.
    pub fn set_remote_level(&self, level: LogLevel) {
        self.config.borrow_mut().min_remote_level = level;
    }

    /// Switch all output on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.config.borrow_mut().enabled = enabled;
    }

    /// Switch remote delivery on or off. While off, nothing is buffered and
    /// the flush loop idles.
    pub fn set_remote_enabled(&self, enabled: bool) {
        self.config.borrow_mut().remote_enabled = enabled;
        tracing::debug!(enabled, "Remote log delivery toggled");
    }

    /// Number of entries awaiting delivery.
    pub fn buffer_size(&self) -> usize {
        self.buffer.borrow().len()
    }

    /// Deliver everything buffered.
    ///
    /// Does nothing when the buffer is empty or another flush is under way.
    /// A batch that cannot be delivered is put back in front of anything
    /// buffered in the meantime.
    pub async fn flush(&self) -> Result<(), LoggerError> {
        if self.buffer.borrow().is_empty() {
            return Ok(());
        }
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            return Ok(());
        };

        let batch = self.buffer.borrow_mut().drain();
        let result = self.send(&batch).await;

        if let Err(error) = &result {
            self.buffer.borrow_mut().requeue(batch);
            tracing::warn!(%error, "Failed to send logs to backend, will retry later");
        }
        result
    }

    async fn send(&self, batch: &[LogEntry]) -> Result<(), LoggerError> {
        let config = self.config();
        if batch.is_empty() || !config.has_credentials() {
            return Ok(());
        }

        let endpoint = config.endpoint();
        let body = serde_json::to_string(&LogBatch { logs: batch })?;
        let mut attempt = 0;

        loop {
            let error = match self
                .transport
                .submit(&endpoint, &config.api_key, body.clone())
                .await
            {
                Ok(204) => return Ok(()),
                Ok(429) => LoggerError::RateLimited,
                Ok(status) => return Err(LoggerError::Rejected(status)),
                Err(error) => error,
            };

            if attempt >= config.max_retries {
                return Err(error);
            }
            tracing::debug!(%error, attempt, "Retrying log delivery");
            self.delay.sleep(config.retry_delay(attempt)).await;
            attempt += 1;
        }
    }

    /// Hand everything buffered to the transport's beacon, without waiting.
    /// Meant for when the page is being hidden or unloaded.
    pub fn flush_sync(&self) -> Result<(), LoggerError> {
        let config = self.config();
        if self.buffer.borrow().is_empty() || !config.has_credentials() {
            return Ok(());
        }

        let batch = self.buffer.borrow_mut().drain();
        let body = serde_json::to_string(&LogBatch { logs: &batch })?;
        self.transport.beacon(&config.beacon_endpoint(), body)
    }

    /// Flush every `flush_interval` while remote delivery is on, until
    /// [`Logger::shutdown`] is called.
    pub async fn run(&self) {
        while !self.stopped.get() {
            let interval = self.config.borrow().flush_interval;
            self.delay.sleep(interval).await;

            if self.stopped.get() {
                break;
            }
            if self.config.borrow().remote_enabled {
                let _ = self.flush().await;
            }
        }
    }

    /// Make [`Logger::run`] return after its current wait.
    pub fn shutdown(&self) {
        self.stopped.set(true);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("buffer_size", &self.buffer_size())
            .finish_non_exhaustive()
    }
}
