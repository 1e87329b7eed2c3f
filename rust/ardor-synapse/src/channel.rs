//! Outbound delivery to the host frame.
//!
//! The bridge hands [`Event`]s to a [`Channel`], which wraps them in the
//! bridge [`Envelope`] and passes them to a [`Transport`]. Delivery is
//! fire-and-forget: there are no acknowledgements, retries or timeouts.

use std::rc::Rc;

use crate::{Envelope, Event};

/// Delivers envelopes to the host frame.
pub trait Transport {
    /// Send one envelope. Implementations log and drop anything they cannot
    /// deliver.
    fn post(&self, envelope: &Envelope);
}

/// Cheaply clonable handle used by every part of the bridge that emits
/// events.
#[derive(Clone)]
pub struct Channel {
    transport: Rc<dyn Transport>,
}

impl Channel {
    /// A channel delivering through `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Rc::new(transport),
        }
    }

    /// Emit one event.
    pub fn send(&self, event: Event) {
        tracing::trace!(event = event.name(), "Posting bridge event");
        self.transport.post(&Envelope::from(event));
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}
