#![allow(clippy::multiple_crate_versions)]
//! Error types for the hydrowatch sampling engine
//!
//! The taxonomy has three families, each with a distinct propagation policy:
//!
//! - [`FetchError`]: one sensor could not be read this cycle. Never fatal; the
//!   sensor simply contributes no value.
//! - [`ConfigError`]: the process was started with an unusable configuration.
//!   Fatal at startup only.
//! - [`HydroError::Consistency`]: the buffer lock could not be acquired in time.
//!   Transient; the next cycle retries.
//!
//! [`HydroError`] is the root type that every crate in the workspace returns.
//!
//! # Examples
//!
//! ```
//! use hydrowatch_error::{FetchError, HydroError, Result};
//!
//! fn read_pin() -> Result<f64> {
//!     Err(FetchError::http_status(503).into())
//! }
//!
//! let err = read_pin().unwrap_err();
//! assert!(err.is_recoverable());
//! ```

use std::time::Duration;

/// Failure to obtain one sensor value from the telemetry endpoint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {after:?}")]
    Timeout {
        /// The timeout that expired
        after: Duration,
    },

    /// Connection, TLS or protocol failure before a status was received.
    #[error("transport failure: {reason}")]
    Transport {
        /// Description from the HTTP client
        reason: String,
    },

    /// The endpoint answered with a non-success status code.
    #[error("endpoint returned HTTP {code}")]
    HttpStatus {
        /// The status code received
        code: u16,
    },

    /// The body was not a bare decimal number.
    #[error("response body is not numeric: {body:?}")]
    Parse {
        /// The trimmed body, truncated for logging
        body: String,
    },

    /// The value parsed but lies outside the accepted range.
    #[error("value {value} outside accepted range [{min}, {max}]")]
    InvalidRange {
        /// The rejected value
        value: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },
}

impl FetchError {
    /// Longest body excerpt kept in a [`FetchError::Parse`].
    pub const MAX_BODY_EXCERPT: usize = 64;

    /// Create a transport error with the given reason
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create an HTTP status error
    #[must_use]
    pub const fn http_status(code: u16) -> Self {
        Self::HttpStatus { code }
    }

    /// Create a timeout error
    #[must_use]
    pub const fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Create a parse error, keeping at most [`Self::MAX_BODY_EXCERPT`] characters of the body
    pub fn parse(body: &str) -> Self {
        Self::Parse {
            body: body.chars().take(Self::MAX_BODY_EXCERPT).collect(),
        }
    }

    /// Create a range error
    #[must_use]
    pub const fn invalid_range(value: f64, min: f64, max: f64) -> Self {
        Self::InvalidRange { value, min, max }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Parse and range failures describe the data itself and are never retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport { .. } | Self::HttpStatus { .. }
        )
    }
}

/// Unusable startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required setting was not supplied
    #[error("missing required setting `{name}`")]
    Missing {
        /// Setting name (argument or environment variable)
        name: String,
    },

    /// A setting was supplied but could not be used
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue {
        /// Setting name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The authentication token is empty or unusable
    #[error("invalid auth token: {reason}")]
    InvalidToken {
        /// Why the token was rejected
        reason: String,
    },

    /// The endpoint base URL is malformed
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },
}

impl ConfigError {
    /// Create a missing-setting error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing { name: name.into() }
    }

    /// Create an invalid-value error
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-token error
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }
}

/// Root error type for all hydrowatch operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum HydroError {
    /// A sensor fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Startup configuration was rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The consistency boundary could not be acquired
    ///
    /// Raised when the buffer lock is not obtained before its deadline.
    /// Always transient.
    #[error("consistency boundary unavailable: {context}")]
    Consistency {
        /// Which operation was waiting for the lock
        context: String,
    },

    /// Per-sensor work panicked
    ///
    /// The panic is caught at the task boundary so the rest of the cycle
    /// proceeds.
    #[error("sensor task panicked: {context}")]
    TaskPanic {
        /// Panic payload, when it was a string
        context: String,
    },

    /// Per-sensor work was cancelled before finishing
    #[error("sensor task cancelled: {context}")]
    Cancelled {
        /// What was cancelled
        context: String,
    },

    /// The broadcaster was closed and accepts no more events or subscribers
    #[error("broadcaster is closed")]
    Closed,

    /// Invalid state encountered
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state
        message: String,
    },
}

impl HydroError {
    /// Create a consistency error with the given context
    pub fn consistency(context: impl Into<String>) -> Self {
        Self::Consistency {
            context: context.into(),
        }
    }

    /// Create a task panic error with the given context
    pub fn task_panic(context: impl Into<String>) -> Self {
        Self::TaskPanic {
            context: context.into(),
        }
    }

    /// Create a cancellation error with the given context
    pub fn cancelled(context: impl Into<String>) -> Self {
        Self::Cancelled {
            context: context.into(),
        }
    }

    /// Create an invalid state error with the given message
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors are worth retrying on the next cycle.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_transient(),
            Self::Consistency { .. } | Self::Cancelled { .. } => true,
            _ => false,
        }
    }

    /// Check if this error indicates a permanent failure
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Closed | Self::InvalidState { .. }
        )
    }

    /// Check if this error must abort process startup
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Specialized Result type for hydrowatch operations
pub type Result<T> = std::result::Result<T, HydroError>;

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Add context to a consistency or state error
    ///
    /// # Errors
    /// Returns `Err(HydroError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(HydroError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

fn attach(err: HydroError, context: String) -> HydroError {
    match err {
        HydroError::Consistency { context: inner } => HydroError::Consistency {
            context: format!("{context}: {inner}"),
        },
        HydroError::InvalidState { message } => HydroError::InvalidState {
            message: format!("{context}: {message}"),
        },
        other => other,
    }
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<HydroError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach(e.into(), context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach(e.into(), f()))
    }
}
