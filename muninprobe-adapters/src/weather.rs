//! Weather station adapter using the PWS "current conditions" JSON API.
//!
//! The API answers with an `observations` array whose first element is the
//! latest report. Unit-independent readings (humidity, wind direction, UV,
//! solar radiation) sit at the top level of that element; everything else
//! lives in a sub-object named after the requested unit system, e.g.
//! `imperial` or `metric`.
//!
//! ## Fields Collected
//!
//! - **Top level**: `humidity`, `winddir`, `uv`, `solarRadiation`
//! - **Unit block**: `temp`, `heatIndex`, `dewpt`, `windChill`, `windSpeed`,
//!   `windGust`, `pressure`, `precipRate`, `precipTotal`, `elev`
//!
//! A `null` reading becomes [`Sample::Unavailable`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use muninprobe_adapters::weather::WeatherAdapter;
//! use muninprobe_types::UnitSystem;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = WeatherAdapter::builder()
//!         .api_key("0123456789abcdef")
//!         .station_id("KCASANFR123")
//!         .units(UnitSystem::Metric)
//!         .build()?;
//!
//!     let observation = adapter.collect().await?;
//!     println!("humidity: {:?}", observation.get("humidity"));
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use muninprobe_types::layout::weather as fields;
use muninprobe_types::{Observation, Sample, UnitSystem};

use crate::AdapterError;

/// Default API endpoint for current observations.
pub const DEFAULT_ENDPOINT: &str = "https://api.weather.com/v2/pws/observations/current";

/// Weather adapter for one personal weather station.
#[derive(Debug, Clone)]
pub struct WeatherAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    station_id: String,
    units: UnitSystem,
}

impl WeatherAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> WeatherAdapterBuilder {
        WeatherAdapterBuilder::default()
    }

    /// The unit system requested from the API.
    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// The station being polled.
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Fetch and normalize the latest observation.
    pub async fn collect(&self) -> Result<Observation, AdapterError> {
        let body = self.fetch().await?;
        parse_observation(&body, self.units)
    }

    async fn fetch(&self) -> Result<Vec<u8>, AdapterError> {
        debug!(
            station = %self.station_id,
            units = %self.units,
            "requesting current observation from {}",
            self.endpoint
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("stationId", self.station_id.as_str()),
                ("format", "json"),
                ("units", self.units.query_code()),
                ("numericPrecision", "decimal"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Builder for WeatherAdapter.
#[derive(Debug, Default)]
pub struct WeatherAdapterBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    station_id: Option<String>,
    units: Option<UnitSystem>,
    timeout: Option<Duration>,
}

impl WeatherAdapterBuilder {
    /// Override the API endpoint (default: [`DEFAULT_ENDPOINT`]).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the station to poll.
    pub fn station_id(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    /// Set the unit system (default: imperial).
    pub fn units(mut self, units: UnitSystem) -> Self {
        self.units = Some(units);
        self
    }

    /// Set the connect and request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<WeatherAdapter, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(WeatherAdapter {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: self.api_key.unwrap_or_default(),
            station_id: self.station_id.unwrap_or_default(),
            units: self.units.unwrap_or_default(),
        })
    }
}

/// Normalize a response body into an observation.
///
/// Only the first element of `observations` is used. Unit-dependent fields
/// are read from the sub-object matching `units`; a response without that
/// sub-object is a parse error rather than a silent fallback to another
/// system.
pub fn parse_observation(body: &[u8], units: UnitSystem) -> Result<Observation, AdapterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AdapterError::Parse(
            "empty response (station offline?)".to_string(),
        ));
    }

    let response: CurrentConditions = serde_json::from_slice(body)?;
    let mut raw = response
        .observations
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::Parse("response has no observations".to_string()))?;

    let block = raw.unit_blocks.remove(units.response_key()).ok_or_else(|| {
        AdapterError::Parse(format!(
            "response has no '{}' block",
            units.response_key()
        ))
    })?;
    let block: UnitBlock = serde_json::from_value(block)?;

    let mut observation = Observation::new();
    let readings = [
        (fields::HUMIDITY, raw.humidity),
        (fields::WIND_DIR, raw.winddir),
        (fields::UV, raw.uv),
        (fields::SOLAR_RADIATION, raw.solar_radiation),
        (fields::TEMP, block.temp),
        (fields::HEAT_INDEX, block.heat_index),
        (fields::DEW_POINT, block.dewpt),
        (fields::WIND_CHILL, block.wind_chill),
        (fields::WIND_SPEED, block.wind_speed),
        (fields::WIND_GUST, block.wind_gust),
        (fields::PRESSURE, block.pressure),
        (fields::PRECIP_RATE, block.precip_rate),
        (fields::PRECIP_TOTAL, block.precip_total),
        (fields::ELEVATION, block.elev),
    ];
    for (field, value) in readings {
        observation.insert(field, Sample::from(value));
    }

    debug!(
        available = observation.available_count(),
        total = observation.len(),
        "parsed observation"
    );

    Ok(observation)
}

/// Response envelope of the current-conditions endpoint.
#[derive(Debug, Deserialize)]
struct CurrentConditions {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    humidity: Option<f64>,
    winddir: Option<f64>,
    uv: Option<f64>,
    #[serde(rename = "solarRadiation")]
    solar_radiation: Option<f64>,
    /// Everything else, including the per-unit-system sub-objects.
    #[serde(flatten)]
    unit_blocks: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnitBlock {
    temp: Option<f64>,
    heat_index: Option<f64>,
    dewpt: Option<f64>,
    wind_chill: Option<f64>,
    wind_speed: Option<f64>,
    wind_gust: Option<f64>,
    pressure: Option<f64>,
    precip_rate: Option<f64>,
    precip_total: Option<f64>,
    elev: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "observations": [{
            "stationID": "KCASANFR123",
            "obsTimeUtc": "2024-06-01T17:05:12Z",
            "neighborhood": "Inner Sunset",
            "humidity": 90.0,
            "winddir": 270,
            "uv": 1.0,
            "solarRadiation": 210.3,
            "imperial": {
                "temp": 58.3,
                "heatIndex": 58.3,
                "dewpt": 55.4,
                "windChill": 58.3,
                "windSpeed": 9.0,
                "windGust": 14.1,
                "pressure": 29.92,
                "precipRate": null,
                "precipTotal": 0.12,
                "elev": 259.0
            },
            "metric": {
                "temp": 14.6,
                "heatIndex": 14.6,
                "dewpt": 13.0,
                "windChill": 14.6,
                "windSpeed": 14.5,
                "windGust": 22.7,
                "pressure": 1013.2,
                "precipRate": 0.0,
                "precipTotal": 3.05,
                "elev": 79.0
            }
        }]
    }"#;

    #[test]
    fn test_builder_defaults() {
        let adapter = WeatherAdapter::builder().build().unwrap();
        assert_eq!(adapter.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(adapter.units(), UnitSystem::Imperial);
        assert_eq!(adapter.station_id(), "");
    }

    #[test]
    fn test_builder_custom() {
        let adapter = WeatherAdapter::builder()
            .endpoint("http://localhost:8080/current")
            .api_key("secret")
            .station_id("IBERLIN42")
            .units(UnitSystem::MetricSi)
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(adapter.endpoint, "http://localhost:8080/current");
        assert_eq!(adapter.api_key, "secret");
        assert_eq!(adapter.station_id(), "IBERLIN42");
        assert_eq!(adapter.units(), UnitSystem::MetricSi);
    }

    #[test]
    fn test_parse_imperial() {
        let obs = parse_observation(SAMPLE.as_bytes(), UnitSystem::Imperial).unwrap();

        assert_eq!(obs.get(fields::HUMIDITY), Sample::Gauge(90.0));
        assert_eq!(obs.get(fields::WIND_DIR), Sample::Gauge(270.0));
        assert_eq!(obs.get(fields::TEMP), Sample::Gauge(58.3));
        assert_eq!(obs.get(fields::PRESSURE), Sample::Gauge(29.92));
        assert_eq!(obs.get(fields::PRECIP_RATE), Sample::Unavailable);
        assert_eq!(obs.get(fields::PRECIP_TOTAL), Sample::Gauge(0.12));
        assert!(!obs.is_unavailable());
    }

    #[test]
    fn test_parse_selects_configured_block() {
        let obs = parse_observation(SAMPLE.as_bytes(), UnitSystem::Metric).unwrap();

        assert_eq!(obs.get(fields::TEMP), Sample::Gauge(14.6));
        assert_eq!(obs.get(fields::PRECIP_RATE), Sample::Gauge(0.0));
        assert_eq!(obs.get(fields::HUMIDITY), Sample::Gauge(90.0));
    }

    #[test]
    fn test_parse_missing_block_is_error() {
        let err = parse_observation(SAMPLE.as_bytes(), UnitSystem::UkHybrid).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("uk_hybrid"));
    }

    #[test]
    fn test_parse_empty_observations() {
        let err = parse_observation(br#"{"observations": []}"#, UnitSystem::Imperial).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_empty_body() {
        let err = parse_observation(b"  \n", UnitSystem::Imperial).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_observation(b"<html>oops</html>", UnitSystem::Imperial).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_missing_fields_are_unavailable() {
        let body = br#"{"observations": [{"imperial": {"temp": 70}}]}"#;
        let obs = parse_observation(body, UnitSystem::Imperial).unwrap();

        assert_eq!(obs.get(fields::TEMP), Sample::Gauge(70.0));
        assert_eq!(obs.get(fields::HUMIDITY), Sample::Unavailable);
        assert_eq!(obs.get(fields::WIND_GUST), Sample::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_error() {
        let adapter = WeatherAdapter::builder()
            .endpoint("http://127.0.0.1:9/current")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = adapter.collect().await.unwrap_err();
        assert!(err.is_fetch(), "unexpected error: {err}");
    }
}
