//! # muninprobe-adapters
//!
//! Source adapters that poll one upstream device or API and normalize the
//! answer into a [`muninprobe_types::Observation`].
//!
//! ## Supported Sources
//!
//! - **Weather** (`weather` feature) - Personal weather station readings from
//!   the PWS current-conditions JSON API, in any of the four unit systems
//! - **Modem** (`modem` feature) - Per-channel power, SNR and error counters
//!   scraped from a cable modem's HTML status page
//!
//! Both adapters report failures as [`AdapterError`]. Callers are expected to
//! degrade a failed poll to [`Observation::unavailable`] so the report keeps
//! its full shape.
//!
//! ## Quick Start (Modem)
//!
//! ```rust,no_run
//! use muninprobe_adapters::modem::ModemAdapter;
//! use muninprobe_types::Observation;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = ModemAdapter::builder()
//!         .address("192.168.100.1")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let observation = adapter.collect().await.unwrap_or_else(|_| Observation::unavailable());
//!
//!     println!("Collected {} fields", observation.len());
//!     Ok(())
//! }
//! ```
//!
//! [`Observation::unavailable`]: muninprobe_types::Observation::unavailable

pub mod error;
pub mod reconcile;

#[cfg(feature = "weather")]
pub mod weather;

#[cfg(feature = "modem")]
pub mod modem;

pub use error::AdapterError;
pub use reconcile::{reconcile, unsigned_counter, ErrorTotals};

// Re-export types for convenience
pub use muninprobe_types::{ChannelSlots, Observation, Sample, UnitSystem};
