//! Delivery of encoded batches to the logs API.

use async_trait::async_trait;

use crate::LoggerError;

/// Header carrying the logs API key.
pub const API_KEY_HEADER: &str = "X-Logs-API-Key";

/// Something that can submit encoded batches.
#[async_trait(?Send)]
pub trait LogTransport {
    /// POST `body` to `endpoint`, returning the response status.
    async fn submit(&self, endpoint: &str, api_key: &str, body: String)
    -> Result<u16, LoggerError>;

    /// Hand `body` off for delivery to `url` without waiting for the
    /// outcome. Used when the page is going away.
    fn beacon(&self, url: &str, body: String) -> Result<(), LoggerError>;
}

/// [`LogTransport`] over `reqwest`.
///
/// On `wasm32-unknown-unknown` submissions use the browser's `fetch` and
/// beacons use `navigator.sendBeacon`; elsewhere beacons are spawned onto
/// the current Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// A transport using `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl LogTransport for HttpTransport {
    async fn submit(
        &self,
        endpoint: &str,
        api_key: &str,
        body: String,
    ) -> Result<u16, LoggerError> {
        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .send()
            .await
            .map_err(|error| LoggerError::Transport(format!("{error}")))?;
        Ok(response.status().as_u16())
    }

    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    fn beacon(&self, url: &str, body: String) -> Result<(), LoggerError> {
        let window = web_sys::window()
            .ok_or_else(|| LoggerError::Transport("No window available".into()))?;
        let options = web_sys::BlobPropertyBag::new();
        options.set_type("application/json");
        let parts = js_sys::Array::of1(&body.into());
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)
            .map_err(|error| LoggerError::Transport(format!("{error:?}")))?;
        window
            .navigator()
            .send_beacon_with_opt_blob(url, Some(&blob))
            .map_err(|error| LoggerError::Transport(format!("{error:?}")))
            .and_then(|queued| {
                queued
                    .then_some(())
                    .ok_or_else(|| LoggerError::Transport("Beacon was not queued".into()))
            })
    }

    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    fn beacon(&self, url: &str, body: String) -> Result<(), LoggerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|error| LoggerError::Transport(format!("{error}")))?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        runtime.spawn(async move {
            if let Err(error) = request.send().await {
                tracing::debug!(%error, "Beacon delivery failed");
            }
        });
        Ok(())
    }
}
