//! Console, error and network capture.
//!
//! Each capture is a decorator around an injected capability rather than a
//! patched global: [`CapturedConsole`] wraps a [`ConsoleSink`],
//! [`ObservedFetch`] wraps a [`Fetch`], and [`ErrorCapture`] turns error
//! reports into events. The `web` module is the only place that swaps these
//! in for `console.*`, `window.fetch` and the window error events.
//!
//! Events are forwarded the moment they happen; nothing is buffered here.

mod console;
pub use console::*;

mod errors;
pub use errors::*;

mod network;
pub use network::*;
