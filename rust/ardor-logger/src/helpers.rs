//! Test doubles for the logger's capabilities. Clones share state, so a
//! copy can be kept for assertions after the original is handed to a
//! [`Logger`](crate::Logger).

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Clock, Delay, LocalSink, LogLevel, LoggerError, transport::LogTransport};

/// One recorded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Target URL
    pub endpoint: String,
    /// Key sent along
    pub api_key: String,
    /// Encoded batch
    pub body: String,
}

/// [`LogTransport`] answering from a script and recording every call.
///
/// Submissions answer with the scripted outcomes in order, then with 204.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    outcomes: Rc<RefCell<VecDeque<Result<u16, LoggerError>>>>,
    submissions: Rc<RefCell<Vec<Submission>>>,
    beacons: Rc<RefCell<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    /// A transport answering with `outcomes` first.
    pub fn answering(outcomes: impl IntoIterator<Item = Result<u16, LoggerError>>) -> Self {
        Self {
            outcomes: Rc::new(RefCell::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Every submission so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.borrow().clone()
    }

    /// Every beacon so far, as `(url, body)`.
    pub fn beacons(&self) -> Vec<(String, String)> {
        self.beacons.borrow().clone()
    }
}

#[async_trait(?Send)]
impl LogTransport for ScriptedTransport {
    async fn submit(
        &self,
        endpoint: &str,
        api_key: &str,
        body: String,
    ) -> Result<u16, LoggerError> {
        self.submissions.borrow_mut().push(Submission {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            body,
        });
        self.outcomes.borrow_mut().pop_front().unwrap_or(Ok(204))
    }

    fn beacon(&self, url: &str, body: String) -> Result<(), LoggerError> {
        self.beacons.borrow_mut().push((url.to_string(), body));
        Ok(())
    }
}

/// [`Delay`] that returns at once and records what it was asked to wait.
#[derive(Debug, Clone, Default)]
pub struct InstantDelay {
    waits: Rc<RefCell<Vec<Duration>>>,
}

impl InstantDelay {
    /// Every requested wait so far.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Delay for InstantDelay {
    async fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

/// [`Clock`] fixed at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// [`LocalSink`] keeping every line.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<(LogLevel, String)>>>,
}

impl MemorySink {
    /// Every line written so far.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.borrow().clone()
    }
}

impl LocalSink for MemorySink {
    fn write(&self, level: LogLevel, line: &str) {
        self.lines.borrow_mut().push((level, line.to_string()));
    }
}
