//! One invocation, start to finish.
//!
//! ```text
//! Settings ──▶ Probe::collect ──▶ Observation ──┐
//!                                               ├──▶ render ──▶ Report
//!          graphs_for(variant) ──▶ GraphSpec[] ─┘
//! ```
//!
//! Fetch and parse failures never surface here: they become an
//! all-unavailable observation, so every report keeps its full shape.

use anyhow::Result;
use tracing::{debug, warn};

use muninprobe_report::{graphs_for, render, RenderMode, Report};
use muninprobe_types::Observation;

use crate::config::Settings;
use crate::probe::{self, collect_or_unavailable, Autoconf, Probe};

/// What the daemon asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `config`: declarations, plus values when the daemon allows it.
    Config,
    /// No argument: values.
    Fetch,
    /// `autoconf`
    Autoconf,
}

impl Action {
    /// Render mode for a report action.
    pub fn render_mode(&self, settings: &Settings) -> Option<RenderMode> {
        match self {
            Action::Config if settings.dirty_config => Some(RenderMode::Combined),
            Action::Config => Some(RenderMode::Declaration),
            Action::Fetch => Some(RenderMode::Values),
            Action::Autoconf => None,
        }
    }
}

/// Run `action` and return the text to print on stdout.
pub async fn run(action: Action, settings: &Settings) -> Result<String> {
    match action.render_mode(settings) {
        Some(mode) => Ok(report(mode, settings).await?.to_string()),
        None => Ok(format!("{}\n", autoconf(settings).await)),
    }
}

/// Build the report for `mode`, polling the source at most once.
///
/// Missing credentials are an error only when values are the whole point
/// of the run; combined mode still has declarations worth printing.
pub async fn report(mode: RenderMode, settings: &Settings) -> Result<Report> {
    let probe = match mode {
        RenderMode::Declaration => None,
        RenderMode::Values => Some(probe::build(settings)?),
        RenderMode::Combined => match probe::build(settings) {
            Ok(probe) => Some(probe),
            Err(e) => {
                warn!("{e:#}; reporting all values as unavailable");
                None
            }
        },
    };

    let observation = match &probe {
        Some(probe) => Some(collect_or_unavailable(probe.as_ref()).await),
        None if mode.reports_values() => Some(Observation::unavailable()),
        None => None,
    };

    Ok(report_with(mode, settings, observation.as_ref()))
}

/// Render against an already collected observation.
pub fn report_with(mode: RenderMode, settings: &Settings, observation: Option<&Observation>) -> Report {
    let graphs = graphs_for(settings.variant);
    if let Some(observation) = observation {
        debug!(
            available = observation.available_count(),
            fields = observation.len(),
            "rendering observation"
        );
    }
    render(mode, &graphs, &settings.units, observation, &settings.render)
}

/// Answer `autoconf` for the configured variant.
pub async fn autoconf(settings: &Settings) -> Autoconf {
    if !settings.variant.supports_autoconf() {
        return Autoconf::No("autoconf is only supported by the modem plugin".to_string());
    }
    match probe::build(settings) {
        Ok(probe) => autoconf_with(probe.as_ref()).await,
        Err(e) => Autoconf::No(format!("{e:#}")),
    }
}

/// Answer `autoconf` through an existing probe.
pub async fn autoconf_with(probe: &dyn Probe) -> Autoconf {
    let answer = probe.autoconf().await;
    debug!(plugin = probe.variant().plugin_id(), source = %probe.description(), %answer, "autoconf");
    answer
}
