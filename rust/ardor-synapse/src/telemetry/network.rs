use std::rc::Rc;

use async_trait::async_trait;

use crate::{
    Channel, Clock, Event,
    protocol::{NetworkEntry, NetworkStatus},
};

/// What the observer needs to know about an outgoing request.
pub trait FetchRequest {
    /// The target URL
    fn url(&self) -> String;
    /// The HTTP method, when one was given explicitly
    fn method(&self) -> Option<String>;
}

/// What the observer needs to know about a response.
pub trait FetchResponse {
    /// HTTP status code
    fn status(&self) -> u16;
}

/// What the observer needs to know about a failed request.
pub trait FetchFailure {
    /// Human-readable failure description
    fn message(&self) -> String;
}

/// The network-fetch capability.
#[async_trait(?Send)]
pub trait Fetch {
    /// Request description
    type Request: FetchRequest;
    /// Successful result
    type Response: FetchResponse;
    /// Failure result
    type Error: FetchFailure;

    /// Perform the request.
    async fn fetch(&self, request: Self::Request) -> Result<Self::Response, Self::Error>;
}

/// A [`Fetch`] that reports every request it proxies as a `NETWORK_LOG`
/// event.
///
/// The wrapped capability's results are passed back untouched: a failure
/// is reported and then returned to the caller as is.
pub struct ObservedFetch<F> {
    inner: F,
    channel: Channel,
    clock: Rc<dyn Clock>,
}

impl<F: Fetch> ObservedFetch<F> {
    /// Wrap `inner`.
    pub fn new(inner: F, channel: Channel, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner,
            channel,
            clock,
        }
    }
}

#[async_trait(?Send)]
impl<F: Fetch> Fetch for ObservedFetch<F> {
    type Request = F::Request;
    type Response = F::Response;
    type Error = F::Error;

    async fn fetch(&self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        let started = self.clock.now_ms();
        let url = request.url();
        let method = request.method().unwrap_or_else(|| "GET".to_string());

        let result = self.inner.fetch(request).await;
        let duration = self.clock.now_ms().saturating_sub(started);

        let (status, error) = match &result {
            Ok(response) => (NetworkStatus::Code(response.status()), None),
            Err(failure) => (NetworkStatus::Failed, Some(failure.message())),
        };
        self.channel.send(Event::NetworkLog(NetworkEntry {
            kind: "fetch",
            url,
            method,
            status,
            duration,
            error,
        }));

        result
    }
}
