//! # muninprobe-types
//!
//! Core types shared by every muninprobe plugin. This crate defines the
//! normalized observation a poll produces, the declarative metric schema a
//! plugin exposes, and the unit tables that translate a configured unit
//! system into display labels and alert thresholds.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to dump observations or schemas
//! - **Unavailable is a value**: [`Sample::Unavailable`] is a first-class variant, never a
//!   string substituted after the fact
//! - **Stable cardinality**: [`ChannelSlots`] keeps per-channel series at a fixed size
//!
//! ## Example
//!
//! ```rust
//! use muninprobe_types::{GraphId, GraphSpec, Observation, Sample};
//!
//! let graph = GraphSpec::builder(GraphId::sub("wunderground", "humidity"))
//!     .title("Relative humidity")
//!     .category("weather")
//!     .vlabel("%")
//!     .gauge("humidity", |m| m.label("Humidity").min(0.0).max(100.0))
//!     .build();
//!
//! let observation = Observation::builder().gauge("humidity", 90.0).build();
//!
//! assert_eq!(graph.metrics.len(), 1);
//! assert_eq!(observation.get("humidity"), Sample::Gauge(90.0));
//! assert_eq!(observation.get("pressure"), Sample::Unavailable);
//! ```

mod channel;
pub mod layout;
mod observation;
mod schema;
mod units;

pub use channel::*;
pub use observation::*;
pub use schema::*;
pub use units::*;

/// The literal token the host daemon reads as "no value for this sample".
pub const UNAVAILABLE_TOKEN: &str = "U";
