//! Channel reconciliation: align scraped rows to fixed channel slots.
//!
//! Modem firmware reports only the channels it has locked, in whatever order
//! it likes. The graphs, however, declare a fixed number of channel series.
//! [`reconcile`] places each row at its channel index and leaves everything
//! else empty, so the report always carries the full set of series.
//!
//! Some firmware prints 32-bit counters as signed integers, so a large value
//! shows up negative. [`unsigned_counter`] undoes that once, at ingestion;
//! nothing downstream ever sees a signed counter.

use muninprobe_types::ChannelSlots;

use crate::AdapterError;

/// Place rows into `slot_count` slots by the 1-based index `key_fn` returns.
///
/// An index of 0, an index above `slot_count`, or two rows claiming the same
/// index is a parse error: it means the page layout no longer matches the
/// declared schema.
pub fn reconcile<R, I, F>(
    slot_count: usize,
    rows: I,
    key_fn: F,
) -> Result<ChannelSlots<R>, AdapterError>
where
    I: IntoIterator<Item = R>,
    F: Fn(&R) -> Result<u32, AdapterError>,
{
    let mut slots = ChannelSlots::new(slot_count);
    for row in rows {
        let index = key_fn(&row)?;
        slots.place(index, row)?;
    }
    Ok(slots)
}

/// Reinterpret a signed 32-bit value as the unsigned value it encodes.
pub fn reinterpret_unsigned(value: i32) -> u32 {
    value as u32
}

/// Parse an integer cell as an unsigned 32-bit counter.
///
/// Negative values within the signed 32-bit range are reinterpreted, so
/// `"-1"` becomes `4294967295`.
pub fn unsigned_counter(text: &str) -> Result<u32, AdapterError> {
    let text = text.trim();
    let value: i64 = text
        .parse()
        .map_err(|_| AdapterError::Parse(format!("'{text}' is not an integer")))?;

    if let Ok(unsigned) = u32::try_from(value) {
        Ok(unsigned)
    } else if let Ok(signed) = i32::try_from(value) {
        Ok(reinterpret_unsigned(signed))
    } else {
        Err(AdapterError::Parse(format!(
            "'{text}' does not fit in 32 bits"
        )))
    }
}

/// Running corrected/uncorrectable error counts across all channels.
///
/// Sums are kept in 64 bits so sixteen saturated 32-bit counters cannot wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorTotals {
    pub corrected: u64,
    pub uncorrected: u64,
}

impl ErrorTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one channel's counters. Unknown counters contribute nothing.
    pub fn add(&mut self, corrected: Option<u32>, uncorrected: Option<u32>) {
        self.corrected += corrected.map_or(0, u64::from);
        self.uncorrected += uncorrected.map_or(0, u64::from);
    }
}
