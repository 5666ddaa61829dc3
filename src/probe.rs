//! Probe abstraction over the source adapters.
//!
//! A [`Probe`] is one configured source. The pipeline only talks to this
//! trait, so the adapters compiled into the build can vary without the
//! rendering side noticing.

use std::fmt::{self, Debug};

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use muninprobe_adapters::AdapterError;
use muninprobe_report::PluginVariant;
use muninprobe_types::Observation;

use crate::config::Settings;

/// Answer to an `autoconf` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Autoconf {
    Yes,
    No(String),
}

impl fmt::Display for Autoconf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Autoconf::Yes => f.write_str("yes"),
            Autoconf::No(reason) => write!(f, "no ({reason})"),
        }
    }
}

/// One configured telemetry source.
///
/// # Example
///
/// ```no_run
/// use muninprobe::config::{ProbeConfig, Settings};
/// use muninprobe::invocation::Invocation;
/// use muninprobe::probe::{self, Probe};
///
/// # tokio_test::block_on(async {
/// let raw = ProbeConfig::load(None).unwrap();
/// let settings = Settings::resolve(raw, &Invocation::from_program("arris"), None).unwrap();
/// let probe = probe::build(&settings).unwrap();
/// let observation = probe::collect_or_unavailable(probe.as_ref()).await;
/// println!("{} from {}", observation.len(), probe.description());
/// # });
/// ```
#[async_trait]
pub trait Probe: Send + Sync + Debug {
    fn variant(&self) -> PluginVariant;

    /// Human-readable description of the target, for logs.
    fn description(&self) -> String;

    /// Poll the source once.
    async fn collect(&self) -> Result<Observation, AdapterError>;

    /// Check whether the plugin can run on this host.
    async fn autoconf(&self) -> Autoconf {
        Autoconf::No("autoconf is only supported by the modem plugin".to_string())
    }
}

/// Poll `probe`, degrading any failure to an all-unavailable observation.
pub async fn collect_or_unavailable(probe: &dyn Probe) -> Observation {
    match probe.collect().await {
        Ok(observation) => observation,
        Err(e) => {
            let kind = if e.is_parse() { "parse" } else { "fetch" };
            warn!(
                plugin = probe.variant().plugin_id(),
                source = %probe.description(),
                kind,
                "poll failed, reporting unavailable: {e}"
            );
            Observation::unavailable()
        }
    }
}

/// Build the probe for the resolved variant.
///
/// The weather probe needs an API key and a station; their absence is an
/// error. A variant whose adapter is not compiled in yields a probe that
/// always fails, so reports keep their shape.
pub fn build(settings: &Settings) -> Result<Box<dyn Probe>> {
    match settings.variant {
        PluginVariant::Weather => build_weather(settings),
        PluginVariant::Modem => build_modem(settings),
    }
}

#[cfg(feature = "weather")]
fn build_weather(settings: &Settings) -> Result<Box<dyn Probe>> {
    use muninprobe_adapters::weather::WeatherAdapter;

    let Some(api_key) = settings.api_key.as_deref() else {
        anyhow::bail!("no API key configured (set PROBE_API_KEY)");
    };
    let Some(station) = settings.identifier() else {
        anyhow::bail!("no station configured (set PROBE_STATION_ID or install as wunderground_<STATION>)");
    };

    let mut builder = WeatherAdapter::builder()
        .api_key(api_key)
        .station_id(station)
        .units(settings.units.system)
        .timeout(settings.timeout);
    if let Some(endpoint) = &settings.base_url {
        builder = builder.endpoint(endpoint.as_str());
    }

    Ok(Box::new(WeatherProbe {
        adapter: builder.build()?,
    }))
}

#[cfg(not(feature = "weather"))]
fn build_weather(_settings: &Settings) -> Result<Box<dyn Probe>> {
    Ok(Box::new(UnsupportedProbe {
        variant: PluginVariant::Weather,
        reason: "built without weather support",
    }))
}

#[cfg(feature = "modem")]
fn build_modem(settings: &Settings) -> Result<Box<dyn Probe>> {
    use muninprobe_adapters::modem::ModemAdapter;

    let mut builder = ModemAdapter::builder().timeout(settings.timeout);
    if let Some(address) = settings.identifier() {
        builder = builder.address(address);
    }
    if let Some(url) = &settings.base_url {
        builder = builder.url(url.as_str());
    }

    Ok(Box::new(ModemProbe {
        adapter: builder.build()?,
    }))
}

#[cfg(not(feature = "modem"))]
fn build_modem(_settings: &Settings) -> Result<Box<dyn Probe>> {
    Ok(Box::new(UnsupportedProbe {
        variant: PluginVariant::Modem,
        reason: "built without modem support",
    }))
}

/// Personal weather station probe.
#[cfg(feature = "weather")]
#[derive(Debug)]
pub struct WeatherProbe {
    adapter: muninprobe_adapters::weather::WeatherAdapter,
}

#[cfg(feature = "weather")]
#[async_trait]
impl Probe for WeatherProbe {
    fn variant(&self) -> PluginVariant {
        PluginVariant::Weather
    }

    fn description(&self) -> String {
        format!("station {}", self.adapter.station_id())
    }

    async fn collect(&self) -> Result<Observation, AdapterError> {
        self.adapter.collect().await
    }
}

/// Cable modem probe.
#[cfg(feature = "modem")]
#[derive(Debug)]
pub struct ModemProbe {
    adapter: muninprobe_adapters::modem::ModemAdapter,
}

#[cfg(feature = "modem")]
#[async_trait]
impl Probe for ModemProbe {
    fn variant(&self) -> PluginVariant {
        PluginVariant::Modem
    }

    fn description(&self) -> String {
        format!("modem {}", self.adapter.url())
    }

    async fn collect(&self) -> Result<Observation, AdapterError> {
        self.adapter.collect().await
    }

    async fn autoconf(&self) -> Autoconf {
        match self.adapter.probe().await {
            Ok(()) => Autoconf::Yes,
            Err(AdapterError::Status(code)) => {
                Autoconf::No(format!("unexpected HTTP status {code}"))
            }
            Err(e) => Autoconf::No(format!("device unreachable: {e}")),
        }
    }
}

/// Stand-in for a source whose adapter is not compiled in.
#[derive(Debug)]
pub struct UnsupportedProbe {
    variant: PluginVariant,
    reason: &'static str,
}

#[async_trait]
impl Probe for UnsupportedProbe {
    fn variant(&self) -> PluginVariant {
        self.variant
    }

    fn description(&self) -> String {
        format!("{} ({})", self.variant, self.reason)
    }

    async fn collect(&self) -> Result<Observation, AdapterError> {
        Err(AdapterError::Unsupported(self.reason.to_string()))
    }

    async fn autoconf(&self) -> Autoconf {
        Autoconf::No(self.reason.to_string())
    }
}
