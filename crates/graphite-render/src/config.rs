//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, RenderError, Result};

/// Timeout applied by the default HTTP client, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Render endpoint of a local graphite-web install.
pub const DEFAULT_RENDER_URL: &str = "http://localhost/render";

/// Configuration for a [`crate::RenderClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Render endpoint, e.g. `http://graphite.local/render`.
    pub render_url: String,
    /// Timeout for a whole request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Creates a configuration for the given endpoint with the default timeout.
    #[must_use]
    pub fn new(render_url: impl Into<String>) -> Self {
        Self {
            render_url: render_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the configuration and returns the parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Configuration` if the endpoint is not a usable
    /// http(s) URL or the timeout is zero.
    pub fn validate(&self) -> Result<Url> {
        if self.timeout_secs == 0 {
            return Err(RenderError::configuration(
                &self.render_url,
                ConfigError::ZeroTimeout,
            ));
        }
        parse_render_url(&self.render_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_URL)
    }
}

/// Parses a render endpoint.
///
/// The URL must be absolute, use `http` or `https`, and be able to carry a
/// query string.
pub(crate) fn parse_render_url(render_uri: &str) -> Result<Url> {
    let url = Url::parse(render_uri)
        .map_err(|e| RenderError::configuration(render_uri, ConfigError::MalformedUrl(e)))?;

    if url.cannot_be_a_base() {
        return Err(RenderError::configuration(
            render_uri,
            ConfigError::CannotBeABase,
        ));
    }

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(RenderError::configuration(
            render_uri,
            ConfigError::UnsupportedScheme {
                scheme: scheme.to_string(),
            },
        )),
    }
}
