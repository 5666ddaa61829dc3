//! Report rendering: schema plus observation in, structured report out.

use tracing::debug;

use muninprobe_types::{
    Alert, GraphSpec, MetricSpec, Observation, Sample, Threshold, Unit, UnitTable,
    UNAVAILABLE_TOKEN,
};

use crate::report::{GraphBlock, Report};

/// What an invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Graph and series declarations only (`config`).
    Declaration,
    /// Current values only (no argument).
    #[default]
    Values,
    /// Declarations immediately followed by values under the same header.
    Combined,
}

impl RenderMode {
    pub fn declares(&self) -> bool {
        matches!(self, RenderMode::Declaration | RenderMode::Combined)
    }

    pub fn reports_values(&self) -> bool {
        matches!(self, RenderMode::Values | RenderMode::Combined)
    }
}

/// Rendering switches resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit `warning`/`critical` thresholds.
    pub alerting: bool,
    /// Register the graphs under a separate monitored host.
    pub host_name: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            alerting: true,
            host_name: None,
        }
    }
}

/// Render `graphs` in order.
///
/// A missing observation renders every value as unavailable. Every declared
/// key gets exactly one value line per graph regardless of what the
/// observation holds.
pub fn render(
    mode: RenderMode,
    graphs: &[GraphSpec],
    units: &UnitTable,
    observation: Option<&Observation>,
    options: &RenderOptions,
) -> Report {
    let mut builder = Report::builder();

    for graph in graphs {
        let mut block = GraphBlock::new(graph.id.clone());
        if mode.declares() {
            block = declare(block, graph, units, options);
        }
        if mode.reports_values() {
            block = values(block, graph, observation);
        }
        builder = builder.block(block);
    }

    let report = builder.build();
    debug!(?mode, graphs = report.len(), "rendered report");
    report
}

fn declare(
    mut block: GraphBlock,
    graph: &GraphSpec,
    units: &UnitTable,
    options: &RenderOptions,
) -> GraphBlock {
    if let Some(host) = &options.host_name {
        block = block.graph_attr("host_name", host.as_str());
    }

    block = block
        .graph_attr("graph_title", graph.title.as_str())
        .graph_attr("graph_category", graph.category.as_str());
    let vlabel = vlabel(graph, units);
    if !vlabel.is_empty() {
        block = block.graph_attr("graph_vlabel", vlabel);
    }
    if let Some(args) = &graph.args {
        block = block.graph_attr("graph_args", args.as_str());
    }
    if let Some(info) = &graph.info {
        block = block.graph_attr("graph_info", info.as_str());
    }
    block = block.graph_attr("graph_order", graph.keys().collect::<Vec<_>>().join(" "));

    for metric in &graph.metrics {
        block = declare_metric(block, metric, units, options);
    }
    block
}

fn declare_metric(
    mut block: GraphBlock,
    metric: &MetricSpec,
    units: &UnitTable,
    options: &RenderOptions,
) -> GraphBlock {
    let key = metric.key.as_str();

    let label = match &metric.unit {
        Some(unit) => format!("{} ({})", metric.label, resolve_unit(unit, units)),
        None => metric.label.clone(),
    };
    block = block
        .metric_attr(key, "label", label)
        .metric_attr(key, "type", metric.kind.to_string())
        .metric_attr(key, "draw", metric.draw.to_string());

    if let Some(min) = metric.min {
        block = block.metric_attr(key, "min", min.to_string());
    }
    if let Some(max) = metric.max {
        block = block.metric_attr(key, "max", max.to_string());
    }
    if options.alerting {
        if let Some((warning, critical)) = metric.alert.map(|a| thresholds(a, units)) {
            block = block
                .metric_attr(key, "warning", warning.to_string())
                .metric_attr(key, "critical", critical.to_string());
        }
    }
    if let Some(scale) = metric.scale {
        block = block.metric_attr(key, "cdef", scale.cdef(key));
    }
    if let Some(info) = &metric.info {
        block = block.metric_attr(key, "info", info.as_str());
    }
    block
}

fn values(mut block: GraphBlock, graph: &GraphSpec, observation: Option<&Observation>) -> GraphBlock {
    for metric in &graph.metrics {
        let sample = observation.map_or(Sample::Unavailable, |o| o.get(&metric.source));
        block = block.metric_attr(metric.key.as_str(), "value", format_value(metric, sample));
    }
    block
}

fn thresholds(alert: Alert, units: &UnitTable) -> (Threshold, Threshold) {
    match alert {
        Alert::WindChill => units.wind_chill_alert(),
        Alert::HeatIndex => units.heat_index_alert(),
    }
}

fn resolve_unit(unit: &Unit, units: &UnitTable) -> String {
    match unit {
        Unit::Quantity(q) => units.unit(*q),
        Unit::Fixed(s) => s.clone(),
    }
}

fn vlabel(graph: &GraphSpec, units: &UnitTable) -> String {
    match (&graph.vlabel_unit, graph.vlabel.is_empty()) {
        (Some(unit), true) => resolve_unit(unit, units),
        (Some(unit), false) => format!("{} ({})", graph.vlabel, resolve_unit(unit, units)),
        (None, _) => graph.vlabel.clone(),
    }
}

fn format_value(metric: &MetricSpec, sample: Sample) -> String {
    let value = match (metric.scale, sample) {
        (_, Sample::Unavailable) => None,
        (Some(scale), sample) => sample
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| scale.store(v).to_string()),
        (None, Sample::Counter(n)) => Some(n.to_string()),
        (None, Sample::Gauge(v)) => v.is_finite().then(|| format_gauge(v)),
    };

    value.unwrap_or_else(|| {
        if sample.is_available() {
            debug!(key = %metric.key, ?sample, "non-finite sample reported as unavailable");
        }
        UNAVAILABLE_TOKEN.to_string()
    })
}

/// Shortest round-trip decimal with at least one fractional digit.
///
/// ```
/// use muninprobe_report::format_gauge;
///
/// assert_eq!(format_gauge(90.0), "90.0");
/// assert_eq!(format_gauge(29.92), "29.92");
/// assert_eq!(format_gauge(-3.5), "-3.5");
/// ```
pub fn format_gauge(value: f64) -> String {
    let mut s = value.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graphs_for, PluginVariant};
    use muninprobe_types::{Draw, GraphId, Scale, UnitSystem};

    fn text(mode: RenderMode, variant: PluginVariant, obs: Option<&Observation>) -> String {
        render(
            mode,
            &graphs_for(variant),
            &UnitTable::default(),
            obs,
            &RenderOptions::default(),
        )
        .to_string()
    }

    fn weather_observation() -> Observation {
        Observation::builder()
            .gauge("temp", 71.2)
            .gauge("dewpt", 68.0)
            .gauge("heatIndex", 71.2)
            .gauge("windChill", 71.2)
            .gauge("humidity", 90.0)
            .gauge("windSpeed", 3.0)
            .gauge("windGust", 5.0)
            .gauge("winddir", 240.0)
            .gauge("pressure", 29.92)
            .unavailable("precipRate")
            .gauge("precipTotal", 0.13)
            .gauge("solarRadiation", 512.3)
            .gauge("uv", 4.0)
            .build()
    }

    #[test]
    fn test_one_header_per_graph() {
        for variant in PluginVariant::ALL {
            let graphs = graphs_for(variant);
            for mode in [RenderMode::Declaration, RenderMode::Values, RenderMode::Combined] {
                let out = text(mode, variant, None);
                let headers = out.lines().filter(|l| l.starts_with("multigraph ")).count();
                assert_eq!(headers, graphs.len(), "{variant} {mode:?}");
            }
        }
    }

    #[test]
    fn test_declared_keys_match_value_keys() {
        let observations = [None, Some(Observation::new()), Some(weather_observation())];
        for variant in PluginVariant::ALL {
            let graphs = graphs_for(variant);
            let units = UnitTable::default();
            let options = RenderOptions::default();
            let declared = render(RenderMode::Declaration, &graphs, &units, None, &options);

            for obs in &observations {
                let reported = render(RenderMode::Values, &graphs, &units, obs.as_ref(), &options);
                for (d, r) in declared.blocks.iter().zip(&reported.blocks) {
                    assert_eq!(d.id, r.id);
                    let labels = d.keys_with("label");
                    let values = r.keys_with("value");
                    assert_eq!(labels, values, "{}", d.id);

                    let mut unique = values.clone();
                    unique.sort_unstable();
                    unique.dedup();
                    assert_eq!(unique.len(), values.len(), "{}", d.id);
                }
            }
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let obs = weather_observation();
        for mode in [RenderMode::Declaration, RenderMode::Values, RenderMode::Combined] {
            assert_eq!(
                text(mode, PluginVariant::Weather, Some(&obs)),
                text(mode, PluginVariant::Weather, Some(&obs))
            );
        }
    }

    #[test]
    fn test_weather_values() {
        let obs = weather_observation();
        let out = text(RenderMode::Values, PluginVariant::Weather, Some(&obs));

        assert!(out.contains("multigraph wunderground.humidity\nhumidity.value 90.0\n"));
        assert!(out.contains("precipRate.value U\n"));
        assert!(out.contains("pressure.value 29.92\n"));
        assert!(out.contains("precipTotal.value 0.13\n"));
        // 0.13 stored in hundredths
        assert!(out.contains("precipAvg.value 13\n"));
        assert!(!out.contains(".label "));
    }

    #[test]
    fn test_missing_observation_is_all_unavailable() {
        for variant in PluginVariant::ALL {
            let out = text(RenderMode::Values, variant, None);
            for line in out.lines().filter(|l| l.contains(".value ")) {
                assert!(line.ends_with(".value U"), "{line}");
            }
        }
    }

    #[test]
    fn test_combined_declares_then_reports_under_one_header() {
        let obs = weather_observation();
        let report = render(
            RenderMode::Combined,
            &graphs_for(PluginVariant::Weather),
            &UnitTable::default(),
            Some(&obs),
            &RenderOptions::default(),
        );

        let block = report.block("wunderground.humidity").unwrap();
        let attributes: Vec<&str> = block.directives.iter().map(|d| d.attribute()).collect();
        let first_value = attributes.iter().position(|a| *a == "value").unwrap();
        assert!(attributes[..first_value].contains(&"label"));
        assert!(!attributes[first_value..].contains(&"label"));
        assert_eq!(block.metric_value("humidity", "value"), Some("90.0"));
    }

    #[test]
    fn test_declaration_directives() {
        let report = render(
            RenderMode::Declaration,
            &graphs_for(PluginVariant::Weather),
            &UnitTable::for_system(UnitSystem::Metric),
            None,
            &RenderOptions::default(),
        );

        let root = report.block("wunderground").unwrap();
        assert_eq!(root.graph_value("graph_title"), Some("Temperature"));
        assert_eq!(root.graph_value("graph_vlabel"), Some("Temperature (°C)"));
        assert_eq!(root.graph_value("graph_order"), Some("temp dewpt heatIndex windChill"));
        assert_eq!(root.metric_value("heatIndex", "warning"), Some(":32"));
        assert_eq!(root.metric_value("heatIndex", "critical"), Some(":39"));
        assert_eq!(root.metric_value("windChill", "warning"), Some("-28:"));
        assert_eq!(root.metric_value("windChill", "critical"), Some("-37:"));
        assert_eq!(root.metric_value("temp", "type"), Some("GAUGE"));
        assert_eq!(root.metric_value("temp", "draw"), Some("LINE2"));
        assert_eq!(root.metric_value("dewpt", "draw"), Some("LINE1"));
        assert_eq!(root.metric_value("temp", "warning"), None);
        assert!(root.metric_value("heatIndex", "value").is_none());

        let precip = report.block("wunderground.precipitation").unwrap();
        assert_eq!(precip.graph_value("graph_vlabel"), Some("Precipitation (mm)"));
        assert_eq!(precip.metric_value("precipRate", "label"), Some("Rate (mm/hr)"));
        assert_eq!(precip.metric_value("precipAvg", "type"), Some("DERIVE"));
        assert_eq!(precip.metric_value("precipAvg", "min"), Some("0"));
        assert_eq!(precip.metric_value("precipAvg", "cdef"), Some("precipAvg,100,/,3600,*"));

        let humidity = report.block("wunderground.humidity").unwrap();
        assert_eq!(humidity.metric_value("humidity", "max"), Some("100"));
        assert_eq!(humidity.graph_value("graph_args"), Some("--lower-limit 0 --upper-limit 100 --rigid"));
        assert_eq!(humidity.graph_value("host_name"), None);
    }

    #[test]
    fn test_thresholds_only_when_alerting() {
        let options = RenderOptions {
            alerting: false,
            host_name: None,
        };
        let out = render(
            RenderMode::Declaration,
            &graphs_for(PluginVariant::Weather),
            &UnitTable::default(),
            None,
            &options,
        )
        .to_string();
        assert!(!out.contains(".warning "));
        assert!(!out.contains(".critical "));

        let out = text(RenderMode::Declaration, PluginVariant::Weather, None);
        assert!(out.contains("heatIndex.warning :90\n"));
        assert!(out.contains("heatIndex.critical :103\n"));
        assert!(out.contains("windChill.warning -18:\n"));
    }

    #[test]
    fn test_host_name_follows_each_header() {
        let options = RenderOptions {
            alerting: true,
            host_name: Some("modem.lan".to_string()),
        };
        let out = render(
            RenderMode::Combined,
            &graphs_for(PluginVariant::Modem),
            &UnitTable::default(),
            None,
            &options,
        )
        .to_string();

        let lines: Vec<&str> = out.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.starts_with("multigraph ") {
                assert_eq!(lines[i + 1], "host_name modem.lan");
            }
        }
    }

    #[test]
    fn test_value_formatting() {
        let gauge = MetricSpec::gauge("g");
        let counter = MetricSpec::derive("c");
        let scaled = MetricSpec::derive("s").scale(Scale::HUNDREDTHS_PER_HOUR);

        assert_eq!(format_value(&gauge, Sample::Gauge(90.0)), "90.0");
        assert_eq!(format_value(&gauge, Sample::Gauge(-0.5)), "-0.5");
        assert_eq!(format_value(&gauge, Sample::Gauge(f64::NAN)), "U");
        assert_eq!(format_value(&gauge, Sample::Gauge(f64::INFINITY)), "U");
        assert_eq!(format_value(&gauge, Sample::Unavailable), "U");
        assert_eq!(format_value(&counter, Sample::Counter(4294967295)), "4294967295");
        assert_eq!(format_value(&scaled, Sample::Gauge(1.234)), "123");
        assert_eq!(format_value(&scaled, Sample::Gauge(0.005)), "1");
        assert_eq!(format_value(&scaled, Sample::Unavailable), "U");
    }

    #[test]
    fn test_modem_values() {
        let obs = Observation::builder()
            .counter("total.corrected", 150)
            .counter("total.uncorrected", 0)
            .gauge("down_01.power", 5.8)
            .gauge("down_01.snr", 40.9)
            .counter("down_01.corrected", 15)
            .gauge("up_02.power", 42.0)
            .build();
        let report = render(
            RenderMode::Values,
            &graphs_for(PluginVariant::Modem),
            &UnitTable::default(),
            Some(&obs),
            &RenderOptions::default(),
        );

        let root = report.block("arris").unwrap();
        assert_eq!(root.metric_value("corr", "value"), Some("150"));
        assert_eq!(root.metric_value("uncr", "value"), Some("0"));

        let power = report.block("arris.power").unwrap();
        assert_eq!(power.keys_with("value").len(), 20);
        assert_eq!(power.metric_value("down_01", "value"), Some("5.8"));
        assert_eq!(power.metric_value("down_02", "value"), Some("U"));
        assert_eq!(power.metric_value("up_02", "value"), Some("42.0"));

        let snr = report.block("arris.snr").unwrap();
        assert_eq!(snr.metric_value("down_01", "value"), Some("40.9"));

        let channel = report.block("arris.down_01").unwrap();
        assert_eq!(channel.metric_value("corr", "value"), Some("15"));
        assert_eq!(channel.metric_value("uncr", "value"), Some("U"));
    }

    #[test]
    fn test_render_custom_graph() {
        let graph = GraphSpec::builder(GraphId::sub("test", "chill"))
            .title("Chill")
            .gauge("x", |m| m.alert(Alert::WindChill).draw(Draw::Area))
            .build();
        let out = render(
            RenderMode::Declaration,
            &[graph],
            &UnitTable::default(),
            None,
            &RenderOptions::default(),
        )
        .to_string();

        assert_eq!(
            out,
            "multigraph test.chill\n\
             graph_title Chill\n\
             graph_category other\n\
             graph_order x\n\
             x.label x\n\
             x.type GAUGE\n\
             x.draw AREA\n\
             x.warning -18:\n\
             x.critical -35:\n"
        );
    }
}
