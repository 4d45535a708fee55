//! HTTP client settings and the task polling policy.
//!
//! The connector never retries on its own; the only loop in the library is the task
//! poller, whose cadence and budget are configured here.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Polling settings

/// Default delay between task polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default overall budget for waiting on a task, in seconds
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 3600;

/// Polling policy for [`Task::wait`](crate::task::Task).
///
/// The poller stops with [`Error::Timeout`](crate::Error::Timeout) once either the
/// attempt budget or the deadline is exhausted, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay between consecutive fetches
    pub interval: Duration,

    /// Maximum number of fetches (unbounded when `None`)
    pub max_attempts: Option<u32>,

    /// Maximum total time spent waiting (unbounded when `None`)
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Create a polling policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: None,
            timeout: Some(Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS)),
        }
    }

    /// Poll back-to-back without sleeping.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            interval: Duration::from_millis(0),
            max_attempts: None,
            timeout: None,
        }
    }

    /// Set the delay between polls.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of polls.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the overall wait deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove every budget; the poller then waits until the task ends.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self.timeout = None;
        self
    }

    /// Returns true once `attempts` fetches have used up the attempt budget.
    #[must_use]
    pub const fn attempts_exhausted(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts >= max,
            None => false,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures timeouts and connection pooling for the connector's HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Log raw response bodies at trace level
    pub log_bodies: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            log_bodies: false,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable body logging.
    #[must_use]
    pub const fn with_body_logging(mut self, enabled: bool) -> Self {
        self.log_bodies = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
