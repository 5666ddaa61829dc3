//! Observation - a single poll's normalized snapshot.

use std::collections::BTreeMap;

/// One sampled value.
///
/// A sample is either a number or explicitly unavailable, never both. A field
/// that is absent from an [`Observation`] reads back as [`Sample::Unavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sample {
    /// An instantaneous floating-point reading.
    Gauge(f64),

    /// A monotonically increasing integer counter.
    Counter(u64),

    /// No value for this poll.
    #[default]
    Unavailable,
}

impl Sample {
    /// Returns true unless the sample is [`Sample::Unavailable`].
    pub fn is_available(&self) -> bool {
        !matches!(self, Sample::Unavailable)
    }

    /// Numeric value of the sample, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Sample::Gauge(v) => Some(v),
            Sample::Counter(v) => Some(v as f64),
            Sample::Unavailable => None,
        }
    }
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Gauge(v)
    }
}

impl From<u64> for Sample {
    fn from(v: u64) -> Self {
        Sample::Counter(v)
    }
}

impl<T: Into<Sample>> From<Option<T>> for Sample {
    fn from(v: Option<T>) -> Self {
        v.map_or(Sample::Unavailable, Into::into)
    }
}

/// A point-in-time snapshot of everything one poll could collect.
///
/// Observations are built fresh on every invocation and discarded once the
/// report is printed. A failed fetch is represented by
/// [`Observation::unavailable`], which has no timestamp and no fields, so
/// every lookup yields [`Sample::Unavailable`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Unix timestamp in milliseconds when the poll succeeded.
    ///
    /// `None` when the fetch failed.
    pub timestamp_ms: Option<u64>,

    /// Samples keyed by field name.
    pub fields: BTreeMap<String, Sample>,
}

impl Observation {
    /// Create an empty observation stamped with the current time.
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create an empty observation with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            fields: BTreeMap::new(),
        }
    }

    /// The observation of a poll whose fetch or parse failed entirely.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Create a builder for constructing observations.
    pub fn builder() -> ObservationBuilder {
        ObservationBuilder::new()
    }

    /// True if the fetch behind this observation failed.
    pub fn is_unavailable(&self) -> bool {
        self.timestamp_ms.is_none()
    }

    /// Record a sample, replacing any previous value for the field.
    pub fn insert(&mut self, field: impl Into<String>, sample: impl Into<Sample>) {
        self.fields.insert(field.into(), sample.into());
    }

    /// Look up a field. Absent fields are unavailable.
    pub fn get(&self, field: &str) -> Sample {
        self.fields.get(field).copied().unwrap_or(Sample::Unavailable)
    }

    /// Number of recorded fields, including explicitly unavailable ones.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field has been recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields holding an actual value.
    pub fn available_count(&self) -> usize {
        self.fields.values().filter(|s| s.is_available()).count()
    }
}

/// Builder for constructing `Observation` instances.
#[derive(Debug, Default)]
pub struct ObservationBuilder {
    timestamp_ms: Option<u64>,
    fields: BTreeMap<String, Sample>,
}

impl ObservationBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Record a gauge reading.
    pub fn gauge(self, field: impl Into<String>, value: f64) -> Self {
        self.sample(field, Sample::Gauge(value))
    }

    /// Record a counter reading.
    pub fn counter(self, field: impl Into<String>, value: u64) -> Self {
        self.sample(field, Sample::Counter(value))
    }

    /// Record a field as explicitly unavailable.
    pub fn unavailable(self, field: impl Into<String>) -> Self {
        self.sample(field, Sample::Unavailable)
    }

    /// Record any sample.
    pub fn sample(mut self, field: impl Into<String>, sample: impl Into<Sample>) -> Self {
        self.fields.insert(field.into(), sample.into());
        self
    }

    /// Build the observation, stamping it with the current time if no
    /// timestamp was set.
    pub fn build(self) -> Observation {
        Observation {
            timestamp_ms: Some(self.timestamp_ms.unwrap_or_else(current_timestamp_ms)),
            fields: self.fields,
        }
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
