//! Error types for the graphite-render crate.

use thiserror::Error;

/// Errors that can occur while building a client or fetching metrics.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The client configuration is invalid.
    #[error("invalid render endpoint {url:?}: {source}")]
    Configuration {
        /// The render endpoint as given by the caller.
        url: String,
        /// What is wrong with it.
        #[source]
        source: ConfigError,
    },

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The caller cancelled the fetch.
    #[error("fetch cancelled")]
    Cancelled,

    /// The transport timeout elapsed before the fetch completed.
    #[error("fetch timed out")]
    TimedOut,

    /// The render endpoint answered with a non-2xx status.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// Leading bytes of the response body, for diagnostics.
        body: String,
    },

    /// The response body is not a valid render document.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl RenderError {
    /// Returns true if the fetch was cancelled or ran out of time.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::TimedOut)
    }

    /// Returns the HTTP status carried by an [`RenderError::UnexpectedStatus`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn configuration(url: impl Into<String>, source: ConfigError) -> Self {
        Self::Configuration {
            url: url.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut
        } else {
            Self::Transport(err)
        }
    }
}

/// Reasons a client configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The endpoint is not a parseable URL.
    #[error("malformed url: {0}")]
    MalformedUrl(#[from] url::ParseError),

    /// The endpoint uses a scheme other than http or https.
    #[error("unsupported scheme {scheme:?}")]
    UnsupportedScheme {
        /// The scheme found in the URL.
        scheme: String,
    },

    /// The endpoint cannot carry a query string.
    #[error("url cannot be used as a base")]
    CannotBeABase,

    /// The timeout is zero seconds.
    #[error("timeout must be at least one second")]
    ZeroTimeout,

    /// The default HTTP client could not be built.
    #[error("http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors raised while decoding a render response body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not JSON or does not have the render document shape.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// A data point is not a `[value, timestamp]` pair.
    #[error("malformed data point in {target:?} at index {index}: {reason}")]
    MalformedDataPoint {
        /// Target of the series holding the point.
        target: String,
        /// Position of the point within the series.
        index: usize,
        /// Why the point was rejected.
        reason: String,
    },

    /// The timestamp of a data point is not integer epoch seconds.
    #[error("malformed timestamp in {target:?} at index {index}: {reason}")]
    MalformedTimestamp {
        /// Target of the series holding the point.
        target: String,
        /// Position of the point within the series.
        index: usize,
        /// Why the timestamp was rejected.
        reason: String,
    },
}

impl DecodeError {
    /// Attaches the series target and point index to a data point error.
    #[must_use]
    pub(crate) fn at(self, series: &str, position: usize) -> Self {
        match self {
            Self::MalformedDataPoint { reason, .. } => Self::MalformedDataPoint {
                target: series.to_string(),
                index: position,
                reason,
            },
            Self::MalformedTimestamp { reason, .. } => Self::MalformedTimestamp {
                target: series.to_string(),
                index: position,
                reason,
            },
            other @ Self::Json(_) => other,
        }
    }
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
