//! # muninprobe
//!
//! Munin multigraph plugins for a personal weather station and a cable
//! modem, as a library and a single binary.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌──────────────┐   ┌─────────────┐
//! │ invocation │──▶│  config  │──▶│    probe     │──▶│  pipeline   │──▶ stdout
//! │ (argv[0])  │   │(Settings)│   │ (adapters)   │   │  (render)   │
//! └────────────┘   └──────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! - **[`invocation`]**: plugin variant and target from the program name
//! - **[`config`]**: layered file and environment configuration, resolved
//!   once into [`Settings`]
//! - **[`probe`]**: the [`Probe`] trait over the weather and modem adapters
//! - **[`pipeline`]**: runs one action and renders the report
//!
//! ## Usage
//!
//! ```bash
//! # install as a station-specific weather plugin
//! ln -s /usr/local/bin/muninprobe /etc/munin/plugins/wunderground_KCASANFR123
//!
//! # or as the modem plugin
//! ln -s /usr/local/bin/muninprobe /etc/munin/plugins/arris
//!
//! munin-run wunderground_KCASANFR123 config
//! munin-run arris autoconf
//! ```
//!
//! ### As a library
//!
//! ```
//! use muninprobe::config::{ProbeConfig, Settings};
//! use muninprobe::invocation::Invocation;
//! use muninprobe::pipeline::{self, Action};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::resolve(
//!     ProbeConfig::default(),
//!     &Invocation::from_program("wunderground_KCASANFR123"),
//!     None,
//! )
//! .unwrap();
//!
//! let out = pipeline::run(Action::Config, &settings).await.unwrap();
//! assert!(out.starts_with("multigraph wunderground\n"));
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod invocation;
pub mod pipeline;
pub mod probe;

pub use config::{ProbeConfig, Settings};
pub use invocation::{IdentifierSource, Invocation};
pub use pipeline::{run, Action};
pub use probe::{Autoconf, Probe};
