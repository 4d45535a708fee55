//! Error types for vCloud operations.
//!
//! This module provides the discriminated error taxonomy every fallible operation
//! returns, together with the decoder that turns a server error envelope into an
//! [`Error::Api`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::decode_xml;

/// Main error type for vCloud operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network or TLS failure before a response was obtained
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out, or a task did not finish within its polling budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Credentials were rejected by the session endpoint
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The API answered an authenticated call with a non-success status
    #[error("{message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Server major error code (usually mirrors the HTTP status)
        major_code: String,
        /// Server minor error code (e.g. `RESOURCE_NOT_FOUND`)
        minor_code: String,
        /// Human-readable server message
        message: String,
    },

    /// A response body did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),

    /// A request payload could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// A task reached the `error` status
    #[error("{message}")]
    TaskFailed {
        /// Major error code embedded in the task
        major_code: String,
        /// Minor error code embedded in the task
        minor_code: String,
        /// Message embedded in the task
        message: String,
    },

    /// A link or query lookup by name found no match
    #[error("Not found: {0}")]
    NotFound(String),

    /// A caller-supplied cancellation token fired
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An href could not be normalized against the endpoint
    #[error("Invalid href: {0}")]
    InvalidHref(String),

    /// An entity id is not a well-formed vCloud URN
    #[error("Invalid URN: {0}")]
    InvalidUrn(String),
}

/// Specialized result type for vCloud operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::TaskFailed { .. } => "TASK_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Cancelled(_) => "CANCELLED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidHref(_) => "INVALID_HREF",
            Self::InvalidUrn(_) => "INVALID_URN",
        }
    }

    /// Returns true if the failure happened before the server produced an answer,
    /// so issuing the same call again may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Returns the HTTP status for errors reported by the API.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error envelope returned by the API on failure.
///
/// ```xml
/// <Error majorErrorCode="404" minorErrorCode="RESOURCE_NOT_FOUND" message="..."/>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorRecord {
    /// Major error code
    #[serde(rename = "@majorErrorCode", default)]
    pub major_error_code: String,
    /// Minor error code
    #[serde(rename = "@minorErrorCode", default)]
    pub minor_error_code: String,
    /// Human-readable message
    #[serde(rename = "@message")]
    pub message: String,
}

impl ApiErrorRecord {
    /// Convert the record into an [`Error::Api`] for the given status.
    #[must_use]
    pub fn into_api_error(self, status: u16) -> Error {
        Error::Api {
            status,
            major_code: self.major_error_code,
            minor_code: self.minor_error_code,
            message: self.message,
        }
    }

    /// Convert the record into an [`Error::TaskFailed`].
    #[must_use]
    pub fn into_task_error(self) -> Error {
        Error::TaskFailed {
            major_code: self.major_error_code,
            minor_code: self.minor_error_code,
            message: self.message,
        }
    }
}

/// Decode a non-success response body into an [`Error::Api`].
///
/// A body that is not a well-formed error envelope yields [`Error::Decode`] so callers
/// can tell a server-reported failure from one we could not interpret.
#[must_use]
pub fn decode_api_error(status: u16, body: &[u8]) -> Error {
    match decode_xml::<ApiErrorRecord>(body) {
        Ok(record) => record.into_api_error(status),
        Err(err) => Error::Decode(format!(
            "undecodable error body for status {status}: {err}"
        )),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidHref(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}
