use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How the backoff window is sampled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Uniform over the whole window `[0, cap]`.
    #[default]
    Full,
    /// Half the window fixed, half random: `[cap / 2, cap]`.
    Equal,
}

/// Configures retry eligibility and backoff timing.
///
/// Shared read-only by every invocation that uses it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_attempts: u32,
    /// Status codes eligible for retry in addition to 5xx.
    pub retryable_status_codes: BTreeSet<u16>,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub base_delay_ms: u64,
    /// Upper clamp on a single backoff in milliseconds.
    pub max_delay_ms: Option<u64>,
    /// Overall budget for the whole retry sequence in milliseconds.
    pub deadline_ms: Option<u64>,
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            retryable_status_codes: BTreeSet::new(),
            base_delay_ms: 100,
            max_delay_ms: None,
            deadline_ms: None,
            jitter: Jitter::Full,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = Some(max_delay_ms);
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Adds status codes that should be retried besides the 5xx class,
    /// e.g. `429 Too Many Requests`.
    pub fn with_retryable_status_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        self.retryable_status_codes.extend(codes);
        self
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_ms.map(Duration::from_millis)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Checks that the values are consistent with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max_delay_ms) = self.max_delay_ms {
            if max_delay_ms < self.base_delay_ms {
                return Err(ConfigError::MaxBelowBase {
                    base_delay_ms: self.base_delay_ms,
                    max_delay_ms,
                });
            }
        }
        if let Some(code) = self
            .retryable_status_codes
            .iter()
            .copied()
            .find(|code| !(100..=599).contains(code))
        {
            return Err(ConfigError::InvalidStatusCode(code));
        }
        if self.deadline_ms == Some(0) {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    ///
    /// Missing fields keep their defaults; unknown fields are rejected.
    ///
    /// ```
    /// use resilient_http::RetryConfig;
    ///
    /// let config = RetryConfig::from_json(r#"{"max_attempts": 3, "max_delay_ms": 5000}"#).unwrap();
    /// assert_eq!(config.max_attempts, 3);
    /// assert_eq!(config.base_delay_ms, 100);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from environment variables on top of the defaults.
    ///
    /// Reads:
    /// - `RETRY_MAX_ATTEMPTS`
    /// - `RETRY_BASE_DELAY_MS`
    /// - `RETRY_MAX_DELAY_MS`
    /// - `RETRY_DEADLINE_MS`
    /// - `RETRY_STATUS_CODES`: comma separated, e.g. `408,429`
    /// - `RETRY_JITTER`: `full` or `equal`
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let read = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read("RETRY_MAX_ATTEMPTS") {
            config.max_attempts = parse_env("RETRY_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read("RETRY_BASE_DELAY_MS") {
            config.base_delay_ms = parse_env("RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read("RETRY_MAX_DELAY_MS") {
            config.max_delay_ms = Some(parse_env("RETRY_MAX_DELAY_MS", &value)?);
        }
        if let Some(value) = read("RETRY_DEADLINE_MS") {
            config.deadline_ms = Some(parse_env("RETRY_DEADLINE_MS", &value)?);
        }
        if let Some(value) = read("RETRY_STATUS_CODES") {
            for code in value.split(',').map(str::trim).filter(|code| !code.is_empty()) {
                config
                    .retryable_status_codes
                    .insert(parse_env("RETRY_STATUS_CODES", code)?);
            }
        }
        if let Some(value) = read("RETRY_JITTER") {
            config.jitter = match value.to_ascii_lowercase().as_str() {
                "full" => Jitter::Full,
                "equal" => Jitter::Equal,
                _ => {
                    return Err(ConfigError::Env {
                        var: "RETRY_JITTER",
                        value,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_owned(),
    })
}
