use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[("ms", 1.0), ("s", 1_000.0), ("m", 60_000.0)];

/// Parse timeouts like "10", "10s", "2.5s", "1500ms" or "1m".
///
/// A bare number counts seconds, which is how the host daemon's own
/// timeouts are written.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<f64>() {
        return from_millis(secs * 1_000.0, s);
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            return from_millis(val * multiplier, s);
        }
    }

    bail!("Unknown duration format: {}", s)
}

fn from_millis(millis: f64, original: &str) -> Result<Duration> {
    if !millis.is_finite() || millis <= 0.0 {
        bail!("Duration must be positive: {}", original);
    }
    Ok(Duration::from_micros((millis * 1_000.0) as u64))
}

/// Format a duration for log output
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
