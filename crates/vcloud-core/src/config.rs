//! Configuration structures for the connector.
//!
//! This module provides the typed, validated configuration a [`Connector`](crate::Connector)
//! is built from. Loading it from files or the command line is left to the caller.

use crate::client::{PollPolicy, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_SECS};
use crate::types::DEFAULT_API_VERSION;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Configuration for a connector instance.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ConnectorConfig {
    /// API endpoint; a bare host such as `vcd.example.com` implies `https://`
    #[validate(length(min = 1))]
    pub endpoint: String,

    /// Login name, usually `user@org`
    #[validate(length(min = 1))]
    pub username: String,

    /// Login password
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<std::path::PathBuf>,

    /// API version requested in the `Accept` header
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log raw response bodies at trace level
    #[serde(default)]
    pub debug: bool,

    /// Task polling configuration
    #[validate(nested)]
    #[serde(default)]
    pub poll: PollConfig,
}

const fn default_tls_verify() -> bool {
    true
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl ConnectorConfig {
    /// Create a new configuration with required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed or validation fails.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            debug: false,
            poll: PollConfig::default(),
        };

        config.check()?;
        Ok(config)
    }

    /// Validate field constraints and the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;
        self.endpoint_url().map(|_| ())
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: std::path::PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set the requested API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Enable or disable body logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set task polling configuration.
    #[must_use]
    pub const fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the endpoint, defaulting to `https` and normalizing to the site root.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed.
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        let raw = self.endpoint.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let mut url = Url::parse(&with_scheme)
            .map_err(|e| Error::Config(format!("Invalid endpoint `{raw}`: {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::Config(format!("Endpoint `{raw}` has no host")));
        }
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tls_verify", &self.tls_verify)
            .field("tls_ca_cert", &self.tls_ca_cert)
            .field("api_version", &self.api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("debug", &self.debug)
            .field("poll", &self.poll)
            .finish()
    }
}

/// Serializable form of the task polling policy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between polls in milliseconds
    #[validate(range(max = 600_000))]
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of polls
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Overall wait budget in seconds
    #[validate(range(min = 1))]
    #[serde(default = "default_poll_timeout_secs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

#[allow(clippy::unnecessary_wraps)]
const fn default_poll_timeout_secs() -> Option<u64> {
    Some(DEFAULT_POLL_TIMEOUT_SECS)
}

impl PollConfig {
    /// Convert into the runtime polling policy.
    #[must_use]
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: None,
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}
