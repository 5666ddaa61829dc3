//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. an optional TOML file (`--config` or `PROBE_CONFIG`)
//! 2. `PROBE_*` environment variables, e.g. `PROBE_API_KEY`, `PROBE_UNITS`
//! 3. the host daemon's `MUNIN_*` variables (`MUNIN_CAP_DIRTYCONFIG`,
//!    `MUNIN_DEBUG`)
//!
//! Everything is read once into [`ProbeConfig`] and then resolved into an
//! immutable [`Settings`] that the pipeline is built from.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{warn, Level};

use muninprobe_report::{PluginVariant, RenderOptions};
use muninprobe_types::UnitTable;

use crate::duration::{format_duration, parse_duration};
use crate::invocation::{IdentifierSource, Invocation};

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw configuration as read from all sources.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// `weather` or `modem`, used when the program name names neither.
    pub variant: Option<String>,
    pub api_key: Option<String>,
    pub station_id: Option<String>,
    /// Modem management address.
    pub address: Option<String>,
    pub units: Option<String>,
    /// Weather API endpoint, or the full modem status page URL.
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    /// Alerting thresholds on or off; unparsable values keep them on.
    pub alerts: Option<String>,
    pub host_name: Option<String>,
    pub log_level: Option<String>,
    /// `MUNIN_CAP_DIRTYCONFIG`
    pub cap_dirtyconfig: Option<String>,
    /// `MUNIN_DEBUG`
    pub debug: Option<String>,
}

impl ProbeConfig {
    /// Load from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, None)
    }

    /// Load from an optional file and either the process environment or,
    /// when `env` is given, that variable map instead.
    pub fn from_sources(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PROBE")
                    .ignore_empty(true)
                    .source(env.clone()),
            )
            .add_source(Environment::with_prefix("MUNIN").ignore_empty(true).source(env))
            .build()
            .context("reading configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Log level: `log_level` if it names one, else debug under
    /// `MUNIN_DEBUG`, else warn.
    pub fn log_level(&self) -> Level {
        let debug = self.debug.as_deref().and_then(parse_flag).unwrap_or(false);
        self.log_level
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(if debug { Level::DEBUG } else { Level::WARN })
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub variant: PluginVariant,
    /// Station identifier (weather) or device address (modem).
    pub identifier: Option<IdentifierSource>,
    pub api_key: Option<String>,
    pub units: UnitTable,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub render: RenderOptions,
    /// The daemon accepts values in the same run as `config`.
    pub dirty_config: bool,
}

impl Settings {
    /// Resolve raw configuration against the invocation.
    ///
    /// Only a missing plugin variant is fatal here. Bad unit systems,
    /// timeouts and on/off flags fall back to defaults with a warning.
    pub fn resolve(
        raw: ProbeConfig,
        invocation: &Invocation,
        variant_override: Option<PluginVariant>,
    ) -> Result<Self> {
        let configured_variant = match raw.variant.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.parse::<PluginVariant>()?),
            _ => None,
        };
        let Some(variant) = variant_override
            .or(invocation.variant)
            .or(configured_variant)
        else {
            bail!(
                "cannot tell which plugin '{}' is; install it as wunderground_<STATION> or arris, \
                 or set PROBE_VARIANT",
                invocation.name
            );
        };

        // a suffix only identifies a target of the variant it was named after
        let suffix = invocation
            .suffix
            .as_deref()
            .filter(|_| invocation.variant == Some(variant));
        let configured_id = match variant {
            PluginVariant::Weather => raw.station_id.as_deref(),
            PluginVariant::Modem => raw.address.as_deref(),
        };
        let identifier = IdentifierSource::resolve(configured_id, suffix);

        let units = match raw.units.as_deref() {
            Some(name) => muninprobe_types::resolve(name).unwrap_or_else(|e| {
                warn!("{e}; using imperial units");
                UnitTable::default()
            }),
            None => UnitTable::default(),
        };

        let timeout = match raw.timeout.as_deref() {
            Some(t) => parse_duration(t).unwrap_or_else(|e| {
                warn!("{e:#}; using {}", format_duration(DEFAULT_TIMEOUT));
                DEFAULT_TIMEOUT
            }),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            variant,
            identifier,
            api_key: non_empty(raw.api_key),
            units,
            base_url: non_empty(raw.base_url),
            timeout,
            render: RenderOptions {
                alerting: flag("PROBE_ALERTS", raw.alerts.as_deref(), true),
                host_name: non_empty(raw.host_name),
            },
            dirty_config: flag("MUNIN_CAP_DIRTYCONFIG", raw.cap_dirtyconfig.as_deref(), false),
        })
    }

    /// The resolved identifier, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_ref().map(IdentifierSource::identifier)
    }
}

/// `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`, any case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn flag(name: &str, value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        None | Some("") => default,
        Some(v) => parse_flag(v).unwrap_or_else(|| {
            warn!("{name}={v} is not on or off; using {default}");
            default
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
