/// Failed outcome of a single attempt.
///
/// The invoker hands the terminal failure back to the caller unchanged, so
/// "upstream answered 503" and "upstream never answered" stay distinguishable.
#[derive(Debug, thiserror::Error)]
pub enum Failure<E> {
    /// Upstream answered with a non-success status code.
    #[error("http error {status}: {body}")]
    Status { status: u16, body: String },
    /// No response was received (connect failure, reset, timeout).
    #[error("transport error: {0}")]
    Transport(E),
}

impl<E> Failure<E> {
    /// Shorthand for a status failure with an empty body.
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            body: String::new(),
        }
    }

    /// Status code of the response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result of one attempt: the success value or the attempt's failure.
pub type Outcome<T, E> = std::result::Result<T, Failure<E>>;

/// Terminal error returned by [`crate::RetryingInvoker::execute`].
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Last observed failure, verbatim. Returned for non-retryable
    /// failures, after exhausting retries, and when the deadline passes.
    #[error("{0}")]
    Failed(Failure<E>),
    /// The caller cancelled the operation.
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    /// Terminal failure, or `None` when the operation was cancelled.
    pub fn failure(&self) -> Option<&Failure<E>> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn into_failure(self) -> Option<Failure<E>> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Cancelled { .. } => None,
        }
    }

    /// Status code of the terminal failure, if upstream answered.
    pub fn status(&self) -> Option<u16> {
        self.failure().and_then(Failure::status_code)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl<E> From<Failure<E>> for RetryError<E> {
    fn from(failure: Failure<E>) -> Self {
        Self::Failed(failure)
    }
}

/// Invalid retry configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_delay_ms ({max_delay_ms}) is lower than base_delay_ms ({base_delay_ms})")]
    MaxBelowBase {
        base_delay_ms: u64,
        max_delay_ms: u64,
    },
    #[error("retryable status code {0} is outside 100..=599")]
    InvalidStatusCode(u16),
    #[error("deadline_ms must be greater than zero")]
    ZeroDeadline,
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },
    /// JSON configuration could not be parsed.
    #[error("invalid retry config JSON: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::{Failure, RetryError};

    #[test]
    fn terminal_failure_displays_upstream_detail() {
        let err: RetryError<std::io::Error> = Failure::Status {
            status: 503,
            body: "unavailable".to_owned(),
        }
        .into();
        assert_eq!(err.to_string(), "http error 503: unavailable");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn cancelled_has_no_failure() {
        let err: RetryError<std::io::Error> = RetryError::Cancelled { attempts: 2 };
        assert!(err.is_cancelled());
        assert!(err.failure().is_none());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn transport_failure_has_no_status() {
        let failure: Failure<std::io::Error> = Failure::Transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(failure.is_transport());
        assert_eq!(failure.status_code(), None);
    }
}
