//! Wire format of render responses.
//!
//! The render endpoint answers `format=json` queries with
//!
//! ```text
//! [{"target": "a.b.c", "datapoints": [[1.5, 1609459200], [null, 1609459260]]}]
//! ```
//!
//! A data point is a positional `[value, epoch_seconds]` pair rather than an
//! object, so it is decoded by hand: [`DataPoint::from_wire`] checks the pair
//! and [`Metrics::from_json`] walks a whole body, reporting which series and
//! which point failed.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::DecodeError;
use crate::types::{DataPoint, Metric, Metrics};

/// Series as it appears on the wire, before data points are checked.
#[derive(Debug, Deserialize)]
struct WireMetric {
    target: String,
    datapoints: Vec<Vec<Value>>,
}

impl TryFrom<WireMetric> for Metric {
    type Error = DecodeError;

    fn try_from(wire: WireMetric) -> Result<Self, Self::Error> {
        let datapoints = wire
            .datapoints
            .iter()
            .enumerate()
            .map(|(index, pair)| DataPoint::from_wire(pair).map_err(|e| e.at(&wire.target, index)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target: wire.target,
            datapoints,
        })
    }
}

impl DataPoint {
    /// Decodes a `[value, epoch_seconds]` pair.
    ///
    /// The value may be a number or `null`. The timestamp must be an integer
    /// number of seconds since the Unix epoch and is read as UTC.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MalformedDataPoint` if the pair does not have
    /// exactly two elements or the value is neither a number nor `null`, and
    /// `DecodeError::MalformedTimestamp` if the timestamp is not an integer
    /// within the representable range.
    pub fn from_wire(pair: &[Value]) -> Result<Self, DecodeError> {
        let [value, timestamp] = pair else {
            return Err(malformed_point(format!(
                "expected 2 elements, got {}",
                pair.len()
            )));
        };

        Ok(Self {
            value: decode_value(value)?,
            timestamp: decode_timestamp(timestamp)?,
        })
    }
}

impl Metrics {
    /// Decodes a render response body.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Json` if the body is not a JSON array of
    /// `{target, datapoints}` objects, or the data point error of the first
    /// malformed point, tagged with its series and index.
    pub fn from_json(body: &[u8]) -> Result<Self, DecodeError> {
        let wire: Vec<WireMetric> = serde_json::from_slice(body)?;
        let metrics = wire
            .into_iter()
            .map(Metric::try_from)
            .collect::<Result<Self, _>>()?;

        trace!(series = metrics.len(), "decoded render response");
        Ok(metrics)
    }
}

fn decode_value(value: &Value) -> Result<Option<f64>, DecodeError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed_point(format!("value {n} is not representable as f64"))),
        other => Err(malformed_point(format!(
            "value must be a number or null, got {}",
            kind(other)
        ))),
    }
}

fn decode_timestamp(value: &Value) -> Result<DateTime<Utc>, DecodeError> {
    let Value::Number(n) = value else {
        return Err(malformed_timestamp(format!(
            "expected integer epoch seconds, got {}",
            kind(value)
        )));
    };

    let secs = n
        .as_i64()
        .ok_or_else(|| malformed_timestamp(format!("{n} is not an integer number of seconds")))?;

    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| malformed_timestamp(format!("{secs} is out of range")))
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Location is filled in by `DecodeError::at` once the series is known.
fn malformed_point(reason: String) -> DecodeError {
    DecodeError::MalformedDataPoint {
        target: String::new(),
        index: 0,
        reason,
    }
}

fn malformed_timestamp(reason: String) -> DecodeError {
    DecodeError::MalformedTimestamp {
        target: String::new(),
        index: 0,
        reason,
    }
}

impl Serialize for DataPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.value)?;
        pair.serialize_element(&self.timestamp.timestamp())?;
        pair.end()
    }
}

impl<'de> Deserialize<'de> for DataPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pair = Vec::<Value>::deserialize(deserializer)?;
        Self::from_wire(&pair).map_err(de::Error::custom)
    }
}
