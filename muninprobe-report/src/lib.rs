//! # muninprobe-report
//!
//! Turns a plugin's fixed metric schema and one poll's [`Observation`] into
//! the line-oriented multigraph report the monitoring node reads.
//!
//! ## Overview
//!
//! - [`graphs_for`] returns the ordered graph declarations for a
//!   [`PluginVariant`]. They never depend on live data.
//! - [`render`] walks those graphs and builds a structured [`Report`], which
//!   is serialized through its `Display` impl.
//!
//! ## Example
//!
//! ```rust
//! use muninprobe_report::{graphs_for, render, PluginVariant, RenderMode, RenderOptions};
//! use muninprobe_types::{Observation, UnitTable};
//!
//! let graphs = graphs_for(PluginVariant::Weather);
//! let observation = Observation::builder().gauge("humidity", 90.0).build();
//!
//! let report = render(
//!     RenderMode::Values,
//!     &graphs,
//!     &UnitTable::default(),
//!     Some(&observation),
//!     &RenderOptions::default(),
//! );
//!
//! let text = report.to_string();
//! assert!(text.contains("multigraph wunderground.humidity\nhumidity.value 90.0\n"));
//! assert!(text.contains("precipRate.value U\n"));
//! ```
//!
//! [`Observation`]: muninprobe_types::Observation

mod registry;
mod render;
mod report;

pub use registry::{graphs_for, PluginVariant, UnknownVariant};
pub use render::{format_gauge, render, RenderMode, RenderOptions};
pub use report::{Directive, GraphBlock, Report, ReportBuilder};
