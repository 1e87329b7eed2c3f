use crate::LogLevel;

/// Where formatted lines are written locally.
pub trait LocalSink {
    /// Write one formatted line.
    fn write(&self, level: LogLevel, line: &str);
}

/// [`LocalSink`] emitting `tracing` events at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LocalSink for TracingSink {
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{line}"),
            LogLevel::Info => tracing::info!("{line}"),
            LogLevel::Warn => tracing::warn!("{line}"),
            LogLevel::Error => tracing::error!("{line}"),
        }
    }
}
