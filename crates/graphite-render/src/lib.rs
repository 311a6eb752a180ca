//! Client for the Graphite render API.
#![forbid(unsafe_code)]
//!
//! `graphite-render` retrieves time series from any Graphite-compatible
//! `/render` endpoint. It encodes a [`MetricRequest`] into render query
//! parameters, performs the HTTP GET, and decodes the JSON answer into typed
//! [`Metrics`].
//!
//! # Features
//!
//! - **Deterministic encoding**: `format`, `from`, `until`, then one `target` per expression
//! - **Typed decoding**: `[value, epoch]` pairs become [`DataPoint`]s with UTC timestamps
//! - **Cancellation**: every fetch is bound to a `CancellationToken`
//! - **Distinct errors**: configuration, transport, cancellation, status and decode failures
//!
//! # Example
//!
//! ```no_run
//! use graphite_render::{Aggregation, MetricRequest, RenderClient, Transport};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> graphite_render::Result<()> {
//! let client = RenderClient::new(Transport::Default, "http://graphite.local/render")?;
//!
//! let request = MetricRequest::new()
//!     .from("-1h")
//!     .target("servers.web1.cpu.user")
//!     .target("servers.web2.cpu.user");
//!
//! let metrics = client.fetch(&CancellationToken::new(), &request).await?;
//! for metric in &metrics {
//!     println!("{}: {:?}", metric.target, metric.aggregate(Aggregation::Avg));
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/graphite-render/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod request;
pub mod types;

// Re-export main types at crate root
pub use client::{CLIENT_USER_AGENT, RenderClient, Transport};
pub use config::{ClientConfig, DEFAULT_RENDER_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ConfigError, DecodeError, RenderError, Result};
pub use request::MetricRequest;
pub use types::{Aggregation, DataPoint, Metric, Metrics};
