//! Retry eligibility.
//!
//! Pure decision logic: no I/O, no randomness, same answer for the same input.

use crate::{Failure, RetryConfig};

/// Returns `true` when another attempt should follow `failure`.
///
/// `attempt` is the number of retries already issued (0 after the initial
/// try fails). Both conditions must hold:
/// - retries remain: `attempt < config.max_attempts`
/// - the failure is eligible: a 5xx status, a status listed in
///   [`RetryConfig::retryable_status_codes`], or a transport failure
pub fn should_retry<E>(failure: &Failure<E>, attempt: u32, config: &RetryConfig) -> bool {
    attempt < config.max_attempts && is_retryable(failure, config)
}

/// Eligibility of a failure regardless of the remaining budget.
pub fn is_retryable<E>(failure: &Failure<E>, config: &RetryConfig) -> bool {
    match failure {
        Failure::Status { status, .. } => is_retryable_status(*status, config),
        // No response arrived, so the request may never have reached upstream.
        Failure::Transport(_) => true,
    }
}

/// Server errors are always eligible; anything else only when listed.
pub fn is_retryable_status(status: u16, config: &RetryConfig) -> bool {
    status >= 500 || config.retryable_status_codes.contains(&status)
}
