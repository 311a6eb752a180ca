//! Render request description and its query-string encoding.
//!
//! See <https://graphite.readthedocs.io/en/latest/render_api.html> for the
//! meaning of `from`, `until` and `target`.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Output format requested from the render endpoint. Only JSON is decoded.
const FORMAT: &str = "json";

/// A render query: an optional time window and the target expressions to evaluate.
///
/// Empty `from`/`until` are left out of the query so the server applies its
/// defaults (`-24h` and `now`). Blank targets are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRequest {
    /// Lower time bound, relative (`-5min`) or absolute (`20210101`).
    #[serde(default)]
    pub from: String,
    /// Upper time bound.
    #[serde(default)]
    pub until: String,
    /// Target expressions, in the order they are sent.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl MetricRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lower time bound.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Sets the upper time bound.
    #[must_use]
    pub fn until(mut self, until: impl Into<String>) -> Self {
        self.until = until.into();
        self
    }

    /// Appends a target expression.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Appends several target expressions.
    #[must_use]
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    /// Encodes the request as a URL query string.
    ///
    /// Parameters always come out as `format`, `from`, `until`, then one
    /// `target` per non-blank target in request order.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("format", FORMAT);

        if !self.from.is_empty() {
            query.append_pair("from", &self.from);
        }
        if !self.until.is_empty() {
            query.append_pair("until", &self.until);
        }
        for target in self.targets.iter().filter(|t| !t.is_empty()) {
            query.append_pair("target", target);
        }

        query.finish()
    }
}

impl fmt::Display for MetricRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
