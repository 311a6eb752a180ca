//! Command-line argument parsing with clap.

use clap::{Parser, ValueEnum};
use graphite_render::{Aggregation, ClientConfig, DEFAULT_TIMEOUT_SECS, MetricRequest};

/// Fetch series from a Graphite render endpoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "graphite-fetch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Render endpoint URL.
    #[arg(short, long, env = "GRAPHITE_RENDER_URL")]
    pub url: String,

    /// Lower time bound (e.g. `-1h`, `20210101`).
    #[arg(long)]
    pub from: Option<String>,

    /// Upper time bound.
    #[arg(long)]
    pub until: Option<String>,

    /// Target expression. Repeat for several targets.
    #[arg(short, long = "target", required = true)]
    pub targets: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Reduce each series to a single value.
    #[arg(short, long, value_enum)]
    pub aggregate: Option<AggregateArg>,
}

impl Cli {
    /// Client configuration derived from the arguments.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.url).with_timeout_secs(self.timeout_secs)
    }

    /// Render request derived from the arguments.
    #[must_use]
    pub fn request(&self) -> MetricRequest {
        MetricRequest::new()
            .from(self.from.clone().unwrap_or_default())
            .until(self.until.clone().unwrap_or_default())
            .targets(self.targets.iter().cloned())
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    Table,
    /// JSON output for scripting.
    Json,
}

/// Aggregation selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AggregateArg {
    /// Sum of values.
    Sum,
    /// Mean of values.
    Avg,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Most recent value.
    Last,
    /// Number of values.
    Count,
}

impl From<AggregateArg> for Aggregation {
    fn from(arg: AggregateArg) -> Self {
        match arg {
            AggregateArg::Sum => Self::Sum,
            AggregateArg::Avg => Self::Avg,
            AggregateArg::Min => Self::Min,
            AggregateArg::Max => Self::Max,
            AggregateArg::Last => Self::Last,
            AggregateArg::Count => Self::Count,
        }
    }
}
