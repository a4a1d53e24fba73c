//! `resilient-http` retries transient failures of outbound calls with
//! exponential backoff and full jitter.
//!
//! The pieces compose as a pipeline around any async call:
//! - [`policy::should_retry`] decides whether a failure deserves another attempt
//! - [`BackoffScheduler::compute_delay`] picks a randomized wait
//! - [`RetryingInvoker::execute`] runs the attempt loop
//! - [`RetryingClient::send`] applies all of it to HTTP requests via `reqwest`
//!
//! ```no_run
//! use resilient_http::{RequestSpec, RetryConfig, RetryingClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RetryConfig::default()
//!     .with_max_attempts(3)
//!     .with_base_delay_ms(200)
//!     .with_max_delay_ms(5_000)
//!     .with_retryable_status_codes([429]);
//! let client = RetryingClient::new(config)?;
//!
//! let response = client.send(&RequestSpec::get("https://api.example.com/orders")).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client;
mod error;
mod invoker;
mod options;
pub mod policy;
mod types;

pub use backoff::{BackoffScheduler, BACKOFF_CEILING_MS};
pub use client::{RetryingClient, DEFAULT_TIMEOUT_MS};
pub use error::{ConfigError, Failure, Outcome, RetryError};
pub use invoker::RetryingInvoker;
pub use options::{Jitter, RetryConfig};
pub use types::{RequestSpec, Response};

pub use tokio_util::sync::CancellationToken;

pub type Result<T, E = RetryError<reqwest::Error>> = std::result::Result<T, E>;
