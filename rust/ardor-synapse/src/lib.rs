#![warn(missing_docs)]

//! In-page inspector bridge for documents embedded in a host frame.
//!
//! `ardor-synapse` runs inside an iframe and lets the hosting parent window
//! inspect, highlight and edit the embedded page's DOM. It also forwards
//! console, uncaught error and network telemetry out of the frame.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── embedded document ───────────────────────────┐
//! │                                                                          │
//! │  observers / timers ──▸ Bridge ──▸ tree / height ──▸ Channel ──msg──▸ parent
//! │                           ▲  │                          ▲                │
//! │  pointer / keyboard ──────┘  └──▸ Overlay               │                │
//! │                                                         │                │
//! │  console.* / fetch / errors ──▸ telemetry decorators ───┘                │
//! │                                                                          │
//! │  parent ──msg──▸ decode_command ──▸ Bridge::handle_command               │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All page access goes through the [`Dom`] trait and all outbound messages
//! through a [`Transport`], so the whole controller runs natively against
//! the emulated document that the `helpers` feature provides. The `web`
//! module (only on `wasm32-unknown-unknown`) binds those seams to the real
//! browser and exports the JS entry points.
//!
//! # Modules
//!
//! - **[`identity`]**: stable `el-<n>` identifiers stored on elements.
//! - **[`tree`]**: serialisation of the live DOM into [`SerializedNode`]s.
//! - **[`overlay`]**: the single highlight box.
//! - **[`telemetry`]**: console, error and fetch capture.
//! - **[`inspector`]**: the enabled/disabled interaction state machine.
//! - **[`protocol`]** and **[`channel`]**: the wire format and its transport.
//! - **[`scheduler`]**: periodic and mutation-driven announcements.
//! - **[`bridge`]**: the controller tying all of the above together.

mod error;
pub use error::*;

mod clock;
pub use clock::*;

pub mod config;
pub use config::BridgeConfig;

pub mod dom;
pub use dom::{Dom, HeightSources, Rect, ScrollOffset};

pub mod identity;
pub mod tree;
pub use tree::SerializedNode;

pub mod overlay;
pub mod snapshot;

pub mod protocol;
pub use protocol::{Command, Envelope, Event};

pub mod channel;
pub use channel::{Channel, Transport};

pub mod telemetry;
pub mod inspector;
pub mod scheduler;

pub mod bridge;
pub use bridge::Bridge;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod web;
