//! Declarative metric schema: graphs, metrics and their presentation.

use std::collections::BTreeSet;
use std::fmt;

use crate::Quantity;

/// How the host daemon stores a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// Instantaneous value.
    #[default]
    Gauge,
    /// Monotonically increasing counter; the daemon derives a per-second rate.
    DeriveRate,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricKind::Gauge => "GAUGE",
            MetricKind::DeriveRate => "DERIVE",
        })
    }
}

/// Drawing style of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Draw {
    #[default]
    Line1,
    Line2,
    Area,
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Draw::Line1 => "LINE1",
            Draw::Line2 => "LINE2",
            Draw::Area => "AREA",
        })
    }
}

/// An alert range in the daemon's `min:max` syntax.
///
/// A sample outside the range trips the alert. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Threshold {
    /// Alert when the value drops below `min`.
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Alert when the value rises above `max`.
    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Alert outside `min..=max`.
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = self.min {
            write!(f, "{min}")?;
        }
        f.write_str(":")?;
        if let Some(max) = self.max {
            write!(f, "{max}")?;
        }
        Ok(())
    }
}

/// Where a metric's alert thresholds come from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alert {
    /// Wind-chill caution/danger levels of the active unit table.
    WindChill,
    /// Heat-index tiers of the active unit table.
    HeatIndex,
}

/// Linear storage scale for a derived rate.
///
/// The daemon only stores integers for counter kinds, so a fractional
/// cumulative source is multiplied by `multiplier` and rounded before it is
/// emitted. At read time the daemon applies the inverse through a `cdef`,
/// dividing by `multiplier` and converting the per-second rate into a rate
/// per `seconds_per_unit` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scale {
    pub multiplier: f64,
    pub seconds_per_unit: u32,
}

impl Scale {
    /// Hundredths of a unit, rescaled to units per hour.
    pub const HUNDREDTHS_PER_HOUR: Scale = Scale {
        multiplier: 100.0,
        seconds_per_unit: 3600,
    };

    /// Storage side: the integer actually emitted for a source value.
    pub fn store(&self, value: f64) -> i64 {
        (value * self.multiplier).round() as i64
    }

    /// Read side: what the daemon's `cdef` recovers from a stored value.
    pub fn rescale(&self, stored: i64) -> f64 {
        stored as f64 / self.multiplier * f64::from(self.seconds_per_unit)
    }

    /// Combined read-side factor, `1 / multiplier * seconds_per_unit`.
    pub fn rescale_factor(&self) -> f64 {
        f64::from(self.seconds_per_unit) / self.multiplier
    }

    /// Postfix `cdef` expression for `key`.
    pub fn cdef(&self, key: &str) -> String {
        format!(
            "{key},{},/,{},*",
            self.multiplier, self.seconds_per_unit
        )
    }
}

/// A display unit: either tied to the unit system or fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    Quantity(Quantity),
    Fixed(String),
}

impl From<Quantity> for Unit {
    fn from(q: Quantity) -> Self {
        Unit::Quantity(q)
    }
}

impl From<&str> for Unit {
    fn from(s: &str) -> Self {
        Unit::Fixed(s.to_string())
    }
}

/// One series within a graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSpec {
    /// Series key, unique within its graph.
    pub key: String,

    /// Observation field the value is read from. Usually equal to `key`.
    pub source: String,

    pub label: String,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub unit: Option<Unit>,

    pub kind: MetricKind,

    pub draw: Draw,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub min: Option<f64>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max: Option<f64>,

    /// Only emitted when alerting is enabled.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub alert: Option<Alert>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub scale: Option<Scale>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub info: Option<String>,
}

impl MetricSpec {
    /// A gauge reading the field of the same name, labelled with its key.
    pub fn gauge(key: impl Into<String>) -> Self {
        Self::with_kind(key.into(), MetricKind::Gauge)
    }

    /// A derived rate reading the field of the same name.
    pub fn derive(key: impl Into<String>) -> Self {
        Self::with_kind(key.into(), MetricKind::DeriveRate)
    }

    fn with_kind(key: String, kind: MetricKind) -> Self {
        Self {
            source: key.clone(),
            label: key.clone(),
            key,
            unit: None,
            kind,
            draw: Draw::default(),
            min: None,
            max: None,
            alert: None,
            scale: None,
            info: None,
        }
    }

    /// Read the value from a differently named observation field.
    pub fn source(mut self, field: impl Into<String>) -> Self {
        self.source = field.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<Unit>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn draw(mut self, draw: Draw) -> Self {
        self.draw = draw;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// Multigraph identifier: `<plugin>` for the root graph, `<plugin>.<sub>`
/// for subgraphs.
///
/// The daemon keys historical data by this identifier, so it must stay the
/// same from poll to poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphId {
    pub plugin: String,
    pub sub: Option<String>,
}

impl GraphId {
    /// The plugin's root graph.
    pub fn root(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            sub: None,
        }
    }

    /// A subgraph nested under the plugin namespace.
    pub fn sub(plugin: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            sub: Some(sub.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.sub.is_none()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub {
            Some(sub) => write!(f, "{}.{}", self.plugin, sub),
            None => f.write_str(&self.plugin),
        }
    }
}

/// A named collection of metrics sharing one panel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSpec {
    pub id: GraphId,
    pub title: String,
    pub category: String,
    /// Vertical-axis label; the resolved `vlabel_unit` is appended in
    /// parentheses.
    pub vlabel: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vlabel_unit: Option<Unit>,
    /// rrdtool-style axis arguments.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub args: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub info: Option<String>,
    /// Series in declared order.
    pub metrics: Vec<MetricSpec>,
}

impl GraphSpec {
    /// Create a builder for a graph.
    pub fn builder(id: GraphId) -> GraphSpecBuilder {
        GraphSpecBuilder::new(id)
    }

    /// Series keys in declared order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.key.as_str())
    }

    /// Look up a series by key.
    pub fn metric(&self, key: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.key == key)
    }

    /// True if no key repeats within the graph.
    pub fn has_unique_keys(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.keys().all(|k| seen.insert(k))
    }
}

/// Builder for `GraphSpec`.
#[derive(Debug)]
pub struct GraphSpecBuilder {
    id: GraphId,
    title: String,
    category: String,
    vlabel: String,
    vlabel_unit: Option<Unit>,
    args: Option<String>,
    info: Option<String>,
    metrics: Vec<MetricSpec>,
}

impl GraphSpecBuilder {
    /// Create a new builder.
    pub fn new(id: GraphId) -> Self {
        Self {
            title: id.to_string(),
            id,
            category: "other".to_string(),
            vlabel: String::new(),
            vlabel_unit: None,
            args: None,
            info: None,
            metrics: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn vlabel(mut self, vlabel: impl Into<String>) -> Self {
        self.vlabel = vlabel.into();
        self
    }

    /// Append a resolved unit to the vertical-axis label.
    pub fn vlabel_unit(mut self, unit: impl Into<Unit>) -> Self {
        self.vlabel_unit = Some(unit.into());
        self
    }

    pub fn args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into());
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Add a gauge configured through a closure.
    pub fn gauge<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(MetricSpec) -> MetricSpec,
    {
        self.metric(f(MetricSpec::gauge(key)))
    }

    /// Add a derived rate configured through a closure.
    pub fn derive<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(MetricSpec) -> MetricSpec,
    {
        self.metric(f(MetricSpec::derive(key)))
    }

    /// Add a pre-built metric.
    pub fn metric(mut self, metric: MetricSpec) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Build the graph.
    pub fn build(self) -> GraphSpec {
        GraphSpec {
            id: self.id,
            title: self.title,
            category: self.category,
            vlabel: self.vlabel,
            vlabel_unit: self.vlabel_unit,
            args: self.args,
            info: self.info,
            metrics: self.metrics,
        }
    }
}
