//! What the plugin was invoked as.
//!
//! Plugins are usually installed as symlinks whose name carries both the
//! plugin family and, optionally, the target: `wunderground_KCASANFR123`
//! polls that station, `arris_10.0.0.1` polls a modem at that address.

use std::path::Path;

use muninprobe_report::PluginVariant;

/// The parsed program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Basename of the program.
    pub name: String,
    /// Variant named by the program, if any.
    pub variant: Option<PluginVariant>,
    /// Text after the first `_`, when the prefix names a variant.
    pub suffix: Option<String>,
}

impl Invocation {
    /// Parse `argv[0]`.
    pub fn from_program(program: &str) -> Self {
        let name = Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(program)
            .to_string();

        let (prefix, suffix) = match name.split_once('_') {
            Some((prefix, suffix)) => (prefix, Some(suffix)),
            None => (name.as_str(), None),
        };

        let variant = prefix.parse::<PluginVariant>().ok();
        let suffix = variant
            .and(suffix)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            name,
            variant,
            suffix,
        }
    }

    /// Parse the current process's program name.
    pub fn current() -> Self {
        let program = std::env::args().next().unwrap_or_default();
        Self::from_program(&program)
    }
}

/// Where the target identifier came from.
///
/// Resolved once at startup; the rest of the pipeline only sees the
/// concrete identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    /// Set in configuration.
    Explicit(String),
    /// Taken from the program name.
    InvocationSuffix(String),
}

impl IdentifierSource {
    /// Pick an identifier. An invocation suffix overrides configuration.
    pub fn resolve(configured: Option<&str>, suffix: Option<&str>) -> Option<Self> {
        let non_empty = |s: &&str| !s.trim().is_empty();
        match (configured.filter(non_empty), suffix.filter(non_empty)) {
            (_, Some(suffix)) => Some(IdentifierSource::InvocationSuffix(suffix.to_string())),
            (Some(id), None) => Some(IdentifierSource::Explicit(id.trim().to_string())),
            (None, None) => None,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            IdentifierSource::Explicit(id) | IdentifierSource::InvocationSuffix(id) => id,
        }
    }
}
