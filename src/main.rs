use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, Level};

use muninprobe::config::{ProbeConfig, Settings};
use muninprobe::duration::format_duration;
use muninprobe::invocation::Invocation;
use muninprobe::pipeline::{self, Action};
use muninprobe_report::PluginVariant;

#[derive(Parser, Debug)]
#[command(name = "muninprobe")]
#[command(about = "Munin multigraph plugin for weather stations and cable modems")]
struct Args {
    /// What the node asks for; omit to print current values
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Optional TOML configuration file
    #[arg(long, env = "PROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Plugin variant when the program name does not identify one (weather, modem)
    #[arg(long)]
    variant: Option<PluginVariant>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Print graph declarations
    Config,
    /// Report whether the plugin can run here
    #[value(alias = "autoconfig")]
    Autoconf,
}

/// No mode argument means the node wants current values.
fn action(mode: Option<Mode>) -> Action {
    match mode {
        Some(Mode::Config) => Action::Config,
        Some(Mode::Autoconf) => Action::Autoconf,
        None => Action::Fetch,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let raw = ProbeConfig::load(args.config.as_deref())?;
    init_tracing(raw.log_level());

    let invocation = Invocation::current();
    let settings = Settings::resolve(raw, &invocation, args.variant)?;
    debug!(
        variant = %settings.variant,
        identifier = ?settings.identifier,
        units = %settings.units.system,
        timeout = %format_duration(settings.timeout),
        "resolved settings"
    );

    // single-threaded: one poll per process
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    let output = runtime.block_on(pipeline::run(action(args.mode), &settings))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Log to stderr only; stdout belongs to the report.
fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
