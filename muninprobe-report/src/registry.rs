//! Fixed graph declarations per plugin variant.
//!
//! Graph identifiers and metric keys are keyed on by the daemon's history,
//! so anything declared here must stay stable across releases.

use std::fmt;
use std::str::FromStr;

use muninprobe_types::layout::{modem, weather};
use muninprobe_types::{
    channel_key, Alert, Draw, GraphId, GraphSpec, Quantity, Scale,
};

/// The plugin families this crate knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginVariant {
    /// Personal weather station.
    Weather,
    /// Cable modem channel statistics.
    Modem,
}

impl PluginVariant {
    pub const ALL: [PluginVariant; 2] = [PluginVariant::Weather, PluginVariant::Modem];

    /// Multigraph namespace of the variant.
    pub const fn plugin_id(&self) -> &'static str {
        match self {
            PluginVariant::Weather => "wunderground",
            PluginVariant::Modem => "arris",
        }
    }

    /// Whether the variant answers `autoconf` with a real probe.
    pub const fn supports_autoconf(&self) -> bool {
        matches!(self, PluginVariant::Modem)
    }
}

impl fmt::Display for PluginVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginVariant::Weather => f.write_str("weather"),
            PluginVariant::Modem => f.write_str("modem"),
        }
    }
}

impl FromStr for PluginVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weather" | "wunderground" => Ok(PluginVariant::Weather),
            "modem" | "arris" => Ok(PluginVariant::Modem),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// A plugin variant name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown plugin variant '{}' (expected weather or modem)", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Ordered graph declarations for a variant. The root graph comes first.
pub fn graphs_for(variant: PluginVariant) -> Vec<GraphSpec> {
    match variant {
        PluginVariant::Weather => weather_graphs(),
        PluginVariant::Modem => modem_graphs(),
    }
}

fn weather_graphs() -> Vec<GraphSpec> {
    let id = PluginVariant::Weather.plugin_id();
    let category = "weather";

    vec![
        GraphSpec::builder(GraphId::root(id))
            .title("Temperature")
            .category(category)
            .vlabel("Temperature")
            .vlabel_unit(Quantity::Temperature)
            .gauge(weather::TEMP, |m| m.label("Temperature").draw(Draw::Line2))
            .gauge(weather::DEW_POINT, |m| m.label("Dew point"))
            .gauge(weather::HEAT_INDEX, |m| {
                m.label("Heat index")
                    .alert(Alert::HeatIndex)
                    .info("Apparent temperature from heat and humidity")
            })
            .gauge(weather::WIND_CHILL, |m| {
                m.label("Wind chill")
                    .alert(Alert::WindChill)
                    .info("Apparent temperature from cold and wind")
            })
            .build(),
        GraphSpec::builder(GraphId::sub(id, "humidity"))
            .title("Relative humidity")
            .category(category)
            .vlabel("%")
            .args("--lower-limit 0 --upper-limit 100 --rigid")
            .gauge(weather::HUMIDITY, |m| m.label("Humidity").min(0.0).max(100.0))
            .build(),
        GraphSpec::builder(GraphId::sub(id, "wind"))
            .title("Wind speed")
            .category(category)
            .vlabel("Speed")
            .vlabel_unit(Quantity::Speed)
            .args("--lower-limit 0")
            .gauge(weather::WIND_SPEED, |m| m.label("Speed").min(0.0))
            .gauge(weather::WIND_GUST, |m| m.label("Gust").min(0.0))
            .build(),
        GraphSpec::builder(GraphId::sub(id, "winddir"))
            .title("Wind direction")
            .category(category)
            .vlabel("Degrees")
            .args("--lower-limit 0 --upper-limit 360 --rigid")
            .gauge(weather::WIND_DIR, |m| m.label("Direction").min(0.0).max(360.0))
            .build(),
        GraphSpec::builder(GraphId::sub(id, "pressure"))
            .title("Barometric pressure")
            .category(category)
            .vlabel("Pressure")
            .vlabel_unit(Quantity::Pressure)
            .args("--alt-autoscale")
            .gauge(weather::PRESSURE, |m| m.label("Pressure"))
            .build(),
        GraphSpec::builder(GraphId::sub(id, "precipitation"))
            .title("Precipitation")
            .category(category)
            .vlabel("Precipitation")
            .vlabel_unit(Quantity::Precipitation)
            .args("--lower-limit 0")
            .gauge(weather::PRECIP_RATE, |m| {
                m.label("Rate").unit(Quantity::PrecipitationRate).min(0.0)
            })
            .gauge(weather::PRECIP_TOTAL, |m| {
                m.label("Today")
                    .unit(Quantity::Precipitation)
                    .draw(Draw::Area)
                    .min(0.0)
            })
            .derive("precipAvg", |m| {
                m.source(weather::PRECIP_TOTAL)
                    .label("Average rate")
                    .unit(Quantity::PrecipitationRate)
                    .scale(Scale::HUNDREDTHS_PER_HOUR)
                    .min(0.0)
                    .info("Rate derived from the daily total; unknown across the daily reset")
            })
            .build(),
        GraphSpec::builder(GraphId::sub(id, "solar"))
            .title("Solar radiation and UV")
            .category(category)
            .vlabel("W/m² / index")
            .args("--lower-limit 0")
            .gauge(weather::SOLAR_RADIATION, |m| {
                m.label("Solar radiation").unit("W/m²").min(0.0)
            })
            .gauge(weather::UV, |m| m.label("UV index").min(0.0))
            .build(),
        GraphSpec::builder(GraphId::sub(id, "elevation"))
            .title("Station elevation")
            .category(category)
            .vlabel("Elevation")
            .vlabel_unit(Quantity::Distance)
            .info("Elevation reported by the station; flat unless the station moves")
            .gauge(weather::ELEVATION, |m| m.label("Elevation"))
            .build(),
    ]
}

const ERROR_ARGS: &str = "--base 1000 --logarithmic";

fn modem_graphs() -> Vec<GraphSpec> {
    let id = PluginVariant::Modem.plugin_id();
    let category = "network";
    let down = |index| channel_key(modem::DOWNSTREAM_PREFIX, index);
    let up = |index| channel_key(modem::UPSTREAM_PREFIX, index);

    let mut graphs = vec![GraphSpec::builder(GraphId::root(id))
        .title("Modem codeword errors")
        .category(category)
        .vlabel("Errors / ${graph_period}")
        .args(ERROR_ARGS)
        .info("Summed over all downstream channels")
        .derive("corr", |m| {
            m.source(modem::total_field(modem::CORRECTED))
                .label("Corrected")
                .min(0.0)
        })
        .derive("uncr", |m| {
            m.source(modem::total_field(modem::UNCORRECTED))
                .label("Uncorrectable")
                .min(0.0)
        })
        .build()];

    let mut power = GraphSpec::builder(GraphId::sub(id, "power"))
        .title("Modem channel power")
        .category(category)
        .vlabel("dBmV");
    for index in 1..=modem::DOWNSTREAM_CHANNELS {
        power = power.gauge(down(index), |m| {
            m.source(modem::field(modem::DOWNSTREAM_PREFIX, index, modem::POWER))
                .label(format!("Downstream {index:02}"))
        });
    }
    for index in 1..=modem::UPSTREAM_CHANNELS {
        power = power.gauge(up(index), |m| {
            m.source(modem::field(modem::UPSTREAM_PREFIX, index, modem::POWER))
                .label(format!("Upstream {index:02}"))
        });
    }
    graphs.push(power.build());

    let mut snr = GraphSpec::builder(GraphId::sub(id, "snr"))
        .title("Modem downstream SNR")
        .category(category)
        .vlabel("dB");
    for index in 1..=modem::DOWNSTREAM_CHANNELS {
        snr = snr.gauge(down(index), |m| {
            m.source(modem::field(modem::DOWNSTREAM_PREFIX, index, modem::SNR))
                .label(format!("Downstream {index:02}"))
        });
    }
    graphs.push(snr.build());

    for index in 1..=modem::DOWNSTREAM_CHANNELS {
        let field = |attr| modem::field(modem::DOWNSTREAM_PREFIX, index, attr);
        graphs.push(
            GraphSpec::builder(GraphId::sub(id, down(index)))
                .title(format!("Downstream channel {index:02} errors"))
                .category(category)
                .vlabel("Errors / ${graph_period}")
                .args(ERROR_ARGS)
                .derive("corr", |m| m.source(field(modem::CORRECTED)).label("Corrected").min(0.0))
                .derive("uncr", |m| {
                    m.source(field(modem::UNCORRECTED))
                        .label("Uncorrectable")
                        .min(0.0)
                })
                .build(),
        );
    }

    graphs
}
