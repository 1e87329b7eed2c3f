//! Test helpers: an emulated document, a transport that records what it is
//! given and a clock that only moves when told to.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use crate::{Clock, Envelope, Event, Transport};

pub use crate::dom::{MemoryDom, NodeId};

/// A [`Transport`] that keeps every envelope it is asked to post.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    posted: Rc<RefCell<Vec<Envelope>>>,
}

impl RecordingTransport {
    /// Every event posted so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.posted
            .borrow()
            .iter()
            .map(|envelope| envelope.event.clone())
            .collect()
    }

    /// Every event posted so far, removing them from the record.
    pub fn take(&self) -> Vec<Event> {
        self.posted
            .borrow_mut()
            .drain(..)
            .map(|envelope| envelope.event)
            .collect()
    }

    /// The wire names of every event posted so far.
    pub fn names(&self) -> Vec<&'static str> {
        self.posted
            .borrow()
            .iter()
            .map(|envelope| envelope.event.name())
            .collect()
    }

    /// Forget everything posted so far.
    pub fn clear(&self) {
        self.posted.borrow_mut().clear();
    }
}

impl Transport for RecordingTransport {
    fn post(&self, envelope: &Envelope) {
        self.posted.borrow_mut().push(envelope.clone());
    }
}

/// A [`Clock`] that stands still until advanced.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// A clock reading `now_ms`.
    pub fn at(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
