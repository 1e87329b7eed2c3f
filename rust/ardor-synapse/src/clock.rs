//! Wall-clock access for telemetry timestamps and durations.

use web_time::SystemTime;

/// A source of millisecond timestamps since the Unix epoch.
pub trait Clock {
    /// The current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the system time.
///
/// Uses `web-time`, so it reads `Date.now()` on `wasm32-unknown-unknown` and
/// `std::time::SystemTime` everywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}
