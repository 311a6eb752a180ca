//! Render API client.
//!
//! A [`RenderClient`] owns an HTTP transport and the base render URL. Each
//! [`RenderClient::fetch`] derives its own URL from the base, so a single
//! client can be cloned and shared across tasks.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, DEFAULT_TIMEOUT_SECS, parse_render_url};
use crate::error::{ConfigError, RenderError, Result};
use crate::request::MetricRequest;
use crate::types::Metrics;

/// `User-Agent` sent with every request.
pub const CLIENT_USER_AGENT: &str = concat!("graphite-render/", env!("CARGO_PKG_VERSION"));

/// How much of an error response body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

/// The HTTP transport a client sends requests through.
#[derive(Debug, Clone, Default)]
pub enum Transport {
    /// Build a client with a 5 second request timeout.
    #[default]
    Default,
    /// Use the given client as-is, including its timeout settings.
    Custom(reqwest::Client),
}

impl Transport {
    fn build(self, timeout: Duration) -> std::result::Result<reqwest::Client, ConfigError> {
        match self {
            Self::Default => reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(ConfigError::HttpClient),
            Self::Custom(client) => Ok(client),
        }
    }
}

impl From<reqwest::Client> for Transport {
    fn from(client: reqwest::Client) -> Self {
        Self::Custom(client)
    }
}

/// Client for a Graphite render endpoint.
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    render_url: Url,
}

impl RenderClient {
    /// Creates a client for the given render endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Configuration` if `render_uri` is not an absolute
    /// http(s) URL, or if the default transport cannot be built.
    pub fn new(transport: Transport, render_uri: &str) -> Result<Self> {
        let render_url = parse_render_url(render_uri)?;
        let http = transport
            .build(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .map_err(|e| RenderError::configuration(render_uri, e))?;

        debug!(url = %render_url, "render client created");
        Ok(Self { http, render_url })
    }

    /// Creates a client with a default transport using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Configuration` if the configuration is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let render_url = config.validate()?;
        let http = Transport::Default
            .build(config.timeout())
            .map_err(|e| RenderError::configuration(&config.render_url, e))?;

        debug!(
            url = %render_url,
            timeout_secs = config.timeout_secs,
            "render client created from config"
        );
        Ok(Self { http, render_url })
    }

    /// Returns the base render URL.
    #[must_use]
    pub const fn render_url(&self) -> &Url {
        &self.render_url
    }

    /// Builds the URL fetched for `request`: the base URL with its query
    /// replaced by the encoded request.
    #[must_use]
    pub fn request_url(&self, request: &MetricRequest) -> Url {
        let mut url = self.render_url.clone();
        url.set_query(Some(&request.encode()));
        url
    }

    /// Fetches the series selected by `request`.
    ///
    /// Returns as soon as `cancel` fires, dropping any in-flight request.
    /// A `204 No Content` answer yields an empty collection.
    ///
    /// # Errors
    ///
    /// - `RenderError::Cancelled` if `cancel` fires before the fetch completes
    /// - `RenderError::TimedOut` if the transport timeout elapses
    /// - `RenderError::Transport` on any other network failure
    /// - `RenderError::UnexpectedStatus` for a status outside 200-299
    /// - `RenderError::Decode` if the body is not a valid render document
    pub async fn fetch(&self, cancel: &CancellationToken, request: &MetricRequest) -> Result<Metrics> {
        if cancel.is_cancelled() {
            debug!("fetch cancelled before start");
            return Err(RenderError::Cancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("fetch cancelled in flight");
                Err(RenderError::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }

    /// Fetches a single target over the server's default time window.
    ///
    /// # Errors
    ///
    /// See [`RenderClient::fetch`].
    pub async fn fetch_target(
        &self,
        cancel: &CancellationToken,
        target: impl Into<String>,
    ) -> Result<Metrics> {
        let request = MetricRequest::new().target(target);
        self.fetch(cancel, &request).await
    }

    async fn execute(&self, request: &MetricRequest) -> Result<Metrics> {
        let url = self.request_url(request);
        debug!(url = %url, "fetching render data");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_prefix(response, ERROR_BODY_LIMIT).await;
            debug!(status = status.as_u16(), body = %body, "render endpoint returned an error");
            return Err(RenderError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            debug!("render endpoint returned no content");
            return Ok(Metrics::new());
        }

        let body = response.bytes().await?;
        let metrics = Metrics::from_json(&body)?;
        debug!(series = metrics.len(), bytes = body.len(), "fetched render data");
        Ok(metrics)
    }
}

/// Reads at most `limit` bytes of the body; read failures end the prefix early.
async fn read_prefix(mut response: reqwest::Response, limit: usize) -> String {
    let mut buf = Vec::with_capacity(limit);
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
