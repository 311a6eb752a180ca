//! Fetch command implementation.

use std::io::Write;

use graphite_render::{Aggregation, MetricRequest, RenderClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CliError;
use crate::output::{AggregateReport, OutputFormat};

/// Handler for a single render fetch.
pub struct FetchCommand<'a> {
    client: &'a RenderClient,
}

impl<'a> FetchCommand<'a> {
    /// Creates a new fetch command handler.
    #[must_use]
    pub const fn new(client: &'a RenderClient) -> Self {
        Self { client }
    }

    /// Fetches `request` and writes the series, or one aggregated value per
    /// series when `aggregation` is set.
    ///
    /// # Errors
    ///
    /// Returns error if the fetch or the output fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        cancel: &CancellationToken,
        request: &MetricRequest,
        aggregation: Option<Aggregation>,
    ) -> Result<(), CliError> {
        debug!(url = %self.client.request_url(request), "fetching");
        let metrics = self.client.fetch(cancel, request).await?;
        info!(series = metrics.len(), "fetch complete");

        match aggregation {
            Some(aggregation) => format.write(out, &AggregateReport::new(&metrics, aggregation)),
            None => format.write(out, &metrics),
        }
    }
}
