//! Exponential backoff with jitter.
//!
//! The window doubles with every retry and is sampled uniformly, so callers
//! that failed together do not come back together.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

use crate::{Jitter, RetryConfig};

/// Largest window used when the config sets no `max_delay_ms` (one day).
pub const BACKOFF_CEILING_MS: u64 = 24 * 60 * 60 * 1000;

/// Computes randomized waits between attempts.
///
/// The random source sits behind a mutex, so one scheduler can serve any
/// number of concurrent invocations.
pub struct BackoffScheduler {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl fmt::Debug for BackoffScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffScheduler")
            .field("rng", &"<rng>")
            .finish()
    }
}

impl Default for BackoffScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffScheduler {
    /// Creates a scheduler seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a scheduler with a fixed seed; the delay sequence is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates a scheduler drawing from a caller-supplied random source.
    pub fn with_rng<R>(rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Upper bound of the sampling window in milliseconds:
    /// `min(max_delay, base_delay * 2^attempt)`.
    ///
    /// Saturates instead of overflowing for large `attempt`.
    pub fn window_ms(attempt: u32, config: &RetryConfig) -> u64 {
        let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let exponential = config.base_delay_ms.saturating_mul(multiplier);
        exponential.min(config.max_delay_ms.unwrap_or(BACKOFF_CEILING_MS))
    }

    pub fn window(attempt: u32, config: &RetryConfig) -> Duration {
        Duration::from_millis(Self::window_ms(attempt, config))
    }

    /// Wait before the retry that follows `attempt` earlier retries.
    ///
    /// `attempt` is 0 for the first retry, whose window equals `base_delay`.
    pub fn compute_delay(&self, attempt: u32, config: &RetryConfig) -> Duration {
        let cap = Self::window_ms(attempt, config);
        let delay_ms = match config.jitter {
            Jitter::Full => self.sample(cap),
            Jitter::Equal => {
                let floor = cap / 2;
                floor + self.sample(cap - floor)
            }
        };
        Duration::from_millis(delay_ms)
    }

    /// Uniform sample from `[0, upper]`.
    fn sample(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        // A panic elsewhere while holding the lock leaves the rng usable.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..=upper)
    }
}
