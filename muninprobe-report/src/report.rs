//! Structured report: graph blocks of directives, serialized in one place.

use std::fmt;

use muninprobe_types::GraphId;

/// One output line below a `multigraph` header.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// A graph-level attribute such as `graph_title`.
    Graph {
        attribute: &'static str,
        value: String,
    },
    /// A per-series attribute such as `temp.label`.
    Metric {
        key: String,
        attribute: &'static str,
        value: String,
    },
}

impl Directive {
    /// Series key of a metric directive.
    pub fn key(&self) -> Option<&str> {
        match self {
            Directive::Graph { .. } => None,
            Directive::Metric { key, .. } => Some(key.as_str()),
        }
    }

    pub fn attribute(&self) -> &'static str {
        match self {
            Directive::Graph { attribute, .. } | Directive::Metric { attribute, .. } => *attribute,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Directive::Graph { value, .. } | Directive::Metric { value, .. } => value.as_str(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Graph { attribute, value } => write!(f, "{attribute} {value}"),
            Directive::Metric {
                key,
                attribute,
                value,
            } => write!(f, "{key}.{attribute} {value}"),
        }
    }
}

/// Everything emitted under one `multigraph` header.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphBlock {
    pub id: GraphId,
    pub directives: Vec<Directive>,
}

impl GraphBlock {
    pub fn new(id: GraphId) -> Self {
        Self {
            id,
            directives: Vec::new(),
        }
    }

    /// Append a graph-level attribute.
    pub fn graph_attr(mut self, attribute: &'static str, value: impl Into<String>) -> Self {
        self.directives.push(Directive::Graph {
            attribute,
            value: value.into(),
        });
        self
    }

    /// Append a per-series attribute.
    pub fn metric_attr(
        mut self,
        key: impl Into<String>,
        attribute: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.directives.push(Directive::Metric {
            key: key.into(),
            attribute,
            value: value.into(),
        });
        self
    }

    /// Keys carrying `attribute`, in emission order.
    pub fn keys_with(&self, attribute: &str) -> Vec<&str> {
        self.directives
            .iter()
            .filter(|d| d.attribute() == attribute)
            .filter_map(Directive::key)
            .collect()
    }

    /// Value of one per-series attribute.
    pub fn metric_value(&self, key: &str, attribute: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|d| d.key() == Some(key) && d.attribute() == attribute)
            .map(Directive::value)
    }

    /// Value of one graph-level attribute.
    pub fn graph_value(&self, attribute: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|d| d.key().is_none() && d.attribute() == attribute)
            .map(Directive::value)
    }
}

/// A complete report for one invocation.
///
/// `Display` writes each block as a `multigraph <id>` header followed by its
/// directives, with a blank line between blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub blocks: Vec<GraphBlock>,
}

impl Report {
    pub fn builder() -> ReportBuilder {
        ReportBuilder::default()
    }

    /// Block for a graph id such as `wunderground.humidity`.
    pub fn block(&self, id: &str) -> Option<&GraphBlock> {
        self.blocks.iter().find(|b| b.id.to_string() == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "multigraph {}", block.id)?;
            for directive in &block.directives {
                writeln!(f, "{directive}")?;
            }
        }
        Ok(())
    }
}

/// Builder for `Report`.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    blocks: Vec<GraphBlock>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graph block configured through a closure.
    pub fn graph<F>(mut self, id: GraphId, f: F) -> Self
    where
        F: FnOnce(GraphBlock) -> GraphBlock,
    {
        self.blocks.push(f(GraphBlock::new(id)));
        self
    }

    /// Add a pre-built block.
    pub fn block(mut self, block: GraphBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn build(self) -> Report {
        Report {
            blocks: self.blocks,
        }
    }
}
