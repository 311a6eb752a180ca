//! Output formatting for fetched series.
//!
//! Supports table (human-readable) and JSON output formats. JSON output of
//! raw series uses the render wire shape.

use std::io::Write;

use graphite_render::{Aggregation, Metrics};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for Metrics {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No series returned.")?;
            return Ok(());
        }

        for (i, metric) in self.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            writeln!(writer, "{} ({} points)", metric.target, metric.datapoints.len())?;
            for point in &metric.datapoints {
                match point.value {
                    Some(value) => writeln!(writer, "  {}  {value}", point.timestamp)?,
                    None => writeln!(writer, "  {}  -", point.timestamp)?,
                }
            }
        }
        Ok(())
    }
}

/// One aggregated value per series.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    /// The aggregation applied.
    pub aggregation: Aggregation,
    /// Per-series results, in server order.
    pub series: Vec<AggregateRow>,
}

/// Aggregated value of a single series.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    /// Series target.
    pub target: String,
    /// Aggregated value; `None` when the series has no values.
    pub value: Option<f64>,
}

impl AggregateReport {
    /// Aggregates every series of `metrics`.
    #[must_use]
    pub fn new(metrics: &Metrics, aggregation: Aggregation) -> Self {
        let series = metrics
            .iter()
            .map(|m| AggregateRow {
                target: m.target.clone(),
                value: m.aggregate(aggregation),
            })
            .collect();
        Self {
            aggregation,
            series,
        }
    }
}

impl TableDisplay for AggregateReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.series.is_empty() {
            writeln!(writer, "No series returned.")?;
            return Ok(());
        }

        let width = self.series.iter().map(|r| r.target.len()).max().unwrap_or(6).max(6);
        writeln!(writer, "{:<width$}  {:?}", "TARGET", self.aggregation)?;
        for row in &self.series {
            match row.value {
                Some(value) => writeln!(writer, "{:<width$}  {value}", row.target)?,
                None => writeln!(writer, "{:<width$}  -", row.target)?,
            }
        }
        Ok(())
    }
}
