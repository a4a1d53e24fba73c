use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    BackoffScheduler, ConfigError, Failure, Outcome, RequestSpec, Response, RetryConfig,
    RetryError, RetryingInvoker,
};

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone)]
/// HTTP client that retries transient failures transparently.
///
/// Non-2xx responses become [`Failure::Status`] and `reqwest` errors become
/// [`Failure::Transport`]; the retry decision is left to [`RetryingInvoker`].
pub struct RetryingClient {
    http: reqwest::Client,
    invoker: RetryingInvoker,
    timeout_ms: u64,
}

impl fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingClient")
            .field("config", self.invoker.config())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl RetryingClient {
    /// Creates a client with the given retry configuration.
    pub fn new(config: RetryConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_invoker(RetryingInvoker::new(config)?))
    }

    /// Wraps an already configured invoker.
    pub fn from_invoker(invoker: RetryingInvoker) -> Self {
        Self {
            http: reqwest::Client::new(),
            invoker,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads the `RETRY_*` variables documented on [`RetryConfig::from_env`]
    /// plus `HTTP_TIMEOUT_MS` for the per-attempt timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut client = Self::new(RetryConfig::from_env()?)?;
        if let Ok(value) = std::env::var("HTTP_TIMEOUT_MS") {
            if !value.trim().is_empty() {
                client.timeout_ms = value.trim().parse().map_err(|_| ConfigError::Env {
                    var: "HTTP_TIMEOUT_MS",
                    value,
                })?;
            }
        }
        Ok(client)
    }

    /// Sets the timeout applied to each attempt separately.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Uses a preconfigured `reqwest::Client` (proxies, TLS roots, pools).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<BackoffScheduler>) -> Self {
        self.invoker = self.invoker.with_scheduler(scheduler);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.invoker = self.invoker.with_cancellation(cancel);
        self
    }

    pub fn invoker(&self) -> &RetryingInvoker {
        &self.invoker
    }

    /// Sends `request`, retrying per the client's [`RetryConfig`].
    ///
    /// A request that cannot be built (bad URL or header) fails immediately
    /// with [`Failure::Transport`] and is never retried.
    pub async fn send(
        &self,
        request: &RequestSpec,
    ) -> Result<Response, RetryError<reqwest::Error>> {
        self.request_builder(request)
            .build()
            .map_err(|err| RetryError::Failed(Failure::Transport(err)))?;

        self.invoker
            .execute(request, |request| Self::dispatch(self.request_builder(request)))
            .await
    }

    fn request_builder(&self, request: &RequestSpec) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .timeout(Duration::from_millis(self.timeout_ms));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder
    }

    async fn dispatch(builder: reqwest::RequestBuilder) -> Outcome<Response, reqwest::Error> {
        let response = builder.send().await.map_err(Failure::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(Failure::Transport)?;

        if status.is_success() {
            Ok(Response {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(Failure::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
