//! Time-related capabilities the logger depends on.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use web_time::SystemTime;

/// Something that can wait.
#[async_trait(?Send)]
pub trait Delay {
    /// Resolve after `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Delay`] backed by the platform timer: Tokio natively, `setTimeout`
/// in the browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerDelay;

#[async_trait(?Send)]
impl Delay for TimerDelay {
    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    async fn sleep(&self, duration: Duration) {
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let timer = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(timer).await;
    }
}

/// A source of the current time.
pub trait Clock {
    /// Now, in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time through `web-time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default();
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}
