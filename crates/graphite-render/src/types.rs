//! Core types for decoded render responses.
//!
//! - [`DataPoint`]: one sample, possibly without a value
//! - [`Metric`]: a named series of data points
//! - [`Metrics`]: every series returned by one fetch
//! - [`Aggregation`]: reductions over the values of a series

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single sample of a series.
///
/// Graphite reports `null` for intervals with no data; those points keep
/// their timestamp and carry `None`. On the wire a point is the pair
/// `[value, epoch_seconds]`, see [`crate::decode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// The measured value, if the interval had one.
    pub value: Option<f64>,
    /// Start of the interval, at whole-second resolution.
    pub timestamp: DateTime<Utc>,
}

impl DataPoint {
    /// Creates a data point with a value.
    #[must_use]
    pub const fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            timestamp,
        }
    }

    /// Creates a data point for an interval without data.
    #[must_use]
    pub const fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            value: None,
            timestamp,
        }
    }

    /// Returns true if the point carries a value.
    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// A series returned by the render endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// The series name, or the expression that produced it.
    pub target: String,
    /// Samples ordered by time as returned by the server.
    pub datapoints: Vec<DataPoint>,
}

impl Metric {
    /// Creates an empty series.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            datapoints: Vec::new(),
        }
    }

    /// Adds a data point and returns self for chaining.
    #[must_use]
    pub fn point(mut self, point: DataPoint) -> Self {
        self.datapoints.push(point);
        self
    }

    /// Returns true if the series has no data points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }

    /// Returns the non-null values in time order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.datapoints.iter().filter_map(|p| p.value).collect()
    }

    /// Returns the most recent non-null value.
    #[must_use]
    pub fn last_value(&self) -> Option<f64> {
        self.datapoints.iter().rev().find_map(|p| p.value)
    }

    /// Reduces the non-null values of the series.
    ///
    /// Returns `None` when the series holds no values.
    #[must_use]
    pub fn aggregate(&self, aggregation: Aggregation) -> Option<f64> {
        aggregation.apply(&self.values())
    }

    /// Timestamp of the first data point.
    #[must_use]
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.datapoints.first().map(|p| p.timestamp)
    }

    /// Timestamp of the last data point.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.datapoints.last().map(|p| p.timestamp)
    }
}

/// Every series returned by one fetch, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(Vec<Metric>);

impl Metrics {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the first series with the given target.
    #[must_use]
    pub fn find(&self, target: &str) -> Option<&Metric> {
        self.0.iter().find(|m| m.target == target)
    }
}

impl Deref for Metrics {
    type Target = [Metric];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Metric>> for Metrics {
    fn from(metrics: Vec<Metric>) -> Self {
        Self(metrics)
    }
}

impl FromIterator<Metric> for Metrics {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Metrics {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Metrics {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Aggregation functions over the values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Sum of all values.
    Sum,
    /// Average (mean) of all values.
    Avg,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Last (most recent) value.
    Last,
    /// Count of values.
    Count,
}

impl Aggregation {
    /// Applies this aggregation to a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        match self {
            Self::Sum => Some(values.iter().sum()),
            Self::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Min => values.iter().copied().reduce(f64::min),
            Self::Max => values.iter().copied().reduce(f64::max),
            Self::Last => values.last().copied(),
            Self::Count => Some(values.len() as f64),
        }
    }
}
