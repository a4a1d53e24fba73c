use std::future::Future;
use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{policy, BackoffScheduler, ConfigError, Outcome, RetryConfig, RetryError};

/// Runs a call, retrying transient failures with jittered exponential backoff.
///
/// Holds only immutable configuration and shared collaborators; every
/// [`execute`](Self::execute) owns its own attempt state, so one invoker
/// can drive any number of concurrent requests.
#[derive(Clone, Debug)]
pub struct RetryingInvoker {
    config: Arc<RetryConfig>,
    scheduler: Arc<BackoffScheduler>,
    cancel: CancellationToken,
}

impl RetryingInvoker {
    /// Validates `config` and creates an invoker with an entropy-seeded scheduler.
    pub fn new(config: RetryConfig) -> Result<Self, ConfigError> {
        Self::from_shared(Arc::new(config))
    }

    /// Same as [`RetryingInvoker::new`] for a config shared with other invokers.
    pub fn from_shared(config: Arc<RetryConfig>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: Arc::new(BackoffScheduler::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the backoff scheduler, e.g. with a seeded one in tests.
    pub fn with_scheduler(mut self, scheduler: Arc<BackoffScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Ties the invoker to an external cancellation token.
    ///
    /// Once the token is cancelled, every pending and future `execute` on
    /// this invoker returns [`RetryError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Issues `call(request)` until it succeeds or retrying stops.
    ///
    /// The same `request` is replayed on every attempt; it must be safe to
    /// repeat. Attempts run strictly one after another. The caller sees
    /// either the success value or exactly one terminal error:
    /// - [`RetryError::Failed`] with the last failure, verbatim, when it is
    ///   not retryable, when `max_attempts` retries were spent, or when the
    ///   next backoff would overrun `deadline_ms`
    /// - [`RetryError::Cancelled`] when the cancellation token fires; the
    ///   in-flight call or pending backoff is dropped and nothing else is issued
    pub async fn execute<Req, T, E, F, Fut>(
        &self,
        request: &Req,
        mut call: F,
    ) -> Result<T, RetryError<E>>
    where
        Req: ?Sized,
        F: FnMut(&Req) -> Fut,
        Fut: Future<Output = Outcome<T, E>>,
    {
        let deadline = self.config.deadline().map(|budget| Instant::now() + budget);
        let mut attempt = 0u32;
        let mut issued = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(issued));
            }

            issued += 1;
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(issued)),
                outcome = call(request) => outcome,
            };

            let failure = match outcome {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    if attempt > 0 {
                        tracing::debug!(attempts = issued, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !policy::should_retry(&failure, attempt, &self.config) {
                #[cfg(feature = "tracing")]
                if policy::is_retryable(&failure, &self.config) {
                    tracing::warn!(
                        attempts = issued,
                        status = ?failure.status_code(),
                        "retries exhausted"
                    );
                } else {
                    tracing::debug!(
                        attempts = issued,
                        status = ?failure.status_code(),
                        "failure is not retryable"
                    );
                }
                return Err(RetryError::Failed(failure));
            }

            let delay = self.scheduler.compute_delay(attempt, &self.config);
            if let Some(deadline) = deadline {
                if Instant::now() + delay > deadline {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        attempts = issued,
                        delay_ms = delay.as_millis() as u64,
                        "retry deadline reached"
                    );
                    return Err(RetryError::Failed(failure));
                }
            }
            attempt += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(
                retry = attempt,
                max_attempts = self.config.max_attempts,
                status = ?failure.status_code(),
                "retrying request after {} ms",
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(issued)),
                _ = sleep(delay) => {}
            }
        }
    }

    fn cancelled<E>(&self, attempts: u32) -> RetryError<E> {
        #[cfg(feature = "tracing")]
        tracing::debug!(attempts, "retry sequence cancelled");
        RetryError::Cancelled { attempts }
    }
}
