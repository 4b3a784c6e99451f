//! HTTP client with timeout and retry
//!
//! [`RetryingClient`] is a pure retry/backoff wrapper around one request:
//! - every attempt is bounded by the policy timeout
//! - timeouts and connection failures are retried, with `base × 2^(k-1)`
//!   between attempt k and k+1
//! - any HTTP response, whatever its status, is handed back unchanged
//! - the last attempt's error is propagated once the budget is spent
//!
//! It knows nothing about pages or categories.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;

use crate::downloader::config::RetryPolicy;
use crate::events::{noop_sink, FetchEvent, SharedEventSink};
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{
    FetcherError, FetcherResult, PortalRequest, PortalResponse, RequestBody, Transport,
};

/// [`Transport`] backed by a `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    /// Wrap an existing client
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Transport over the process-wide client
    pub fn shared() -> Self {
        Self::new(global_http_client())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &PortalRequest) -> FetcherResult<PortalResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());

        // form() sets the content type, so it goes before the custom headers
        if let RequestBody::Form(fields) = &request.body {
            builder = builder.form(fields);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(network_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network_error)?;

        Ok(PortalResponse {
            status,
            content_type,
            body,
        })
    }
}

fn network_error(error: reqwest::Error) -> FetcherError {
    FetcherError::NetworkError(error.to_string())
}

/// Sends requests through a [`Transport`] under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    events: SharedEventSink,
}

impl RetryingClient {
    /// Create a client; events are discarded until [`Self::with_events`]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            events: noop_sink(),
        }
    }

    /// Emit retry events into `events`
    pub fn with_events(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// The retry policy in force
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying transient failures
    ///
    /// # Errors
    /// The last attempt's error once the attempt budget is exhausted, or the
    /// first non-transient error.
    pub async fn send(&self, request: &PortalRequest) -> FetcherResult<PortalResponse> {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(
                self.policy.timeout,
                self.transport.execute(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetcherError::Timeout(self.policy.timeout)),
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if attempt >= max_attempts || !error.is_transient() {
                self.events.emit(FetchEvent::RequestFailed {
                    url: request.url.clone(),
                    attempts: attempt,
                    error: error.to_string(),
                });
                return Err(error);
            }

            let delay = self.policy.backoff_delay(attempt);
            self.events.emit(FetchEvent::RetryScheduled {
                url: request.url.clone(),
                attempt,
                max_attempts,
                delay,
                error: error.to_string(),
            });
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
