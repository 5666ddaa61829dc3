//! Fixed-size per-channel slot arrays.

use std::fmt;

/// A fixed-size, 1-indexed array of per-channel records.
///
/// The length is set at construction and never changes, no matter how many
/// channels the device actually reports. Slots nobody filled stay `None`,
/// which the report renders as unavailable, so historical series keep the
/// same cardinality from poll to poll.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSlots<T> {
    slots: Vec<Option<T>>,
}

impl<T> ChannelSlots<T> {
    /// Create `count` empty slots.
    pub fn new(count: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(count).collect(),
        }
    }

    /// Fixed number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a zero-slot array.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Place a record at its 1-based channel index.
    pub fn place(&mut self, index: u32, record: T) -> Result<(), SlotError> {
        let len = self.slots.len();
        let slot = (index as usize)
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(SlotError::OutOfRange { index, len })?;

        if slot.is_some() {
            return Err(SlotError::Duplicate(index));
        }
        *slot = Some(record);
        Ok(())
    }

    /// Record at a 1-based channel index.
    pub fn get(&self, index: usize) -> Option<&T> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    /// Iterate over `(index, record)` pairs in channel order, including
    /// empty slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&T>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (i + 1, slot.as_ref()))
    }

    /// Iterate over populated records only.
    pub fn populated(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// Number of slots holding a record.
    pub fn populated_count(&self) -> usize {
        self.populated().count()
    }
}

/// Why a record could not be placed into a [`ChannelSlots`] array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// The index is 0 or greater than the slot count.
    OutOfRange { index: u32, len: usize },

    /// Two records claimed the same channel.
    Duplicate(u32),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::OutOfRange { index, len } => {
                write!(f, "channel index {index} outside 1..={len}")
            }
            SlotError::Duplicate(index) => write!(f, "channel index {index} reported twice"),
        }
    }
}

impl std::error::Error for SlotError {}

/// Series key for a channel, e.g. `down_01`.
pub fn channel_key(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slots_are_empty() {
        let slots: ChannelSlots<u8> = ChannelSlots::new(16);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.populated_count(), 0);
        assert!(slots.iter().all(|(_, r)| r.is_none()));
    }

    #[test]
    fn place_is_one_based() {
        let mut slots = ChannelSlots::new(4);
        slots.place(1, "first").unwrap();
        slots.place(4, "last").unwrap();

        assert_eq!(slots.get(1), Some(&"first"));
        assert_eq!(slots.get(4), Some(&"last"));
        assert_eq!(slots.get(2), None);
        assert_eq!(slots.get(0), None);
    }

    #[test]
    fn place_rejects_out_of_range() {
        let mut slots = ChannelSlots::new(4);
        assert_eq!(
            slots.place(0, ()),
            Err(SlotError::OutOfRange { index: 0, len: 4 })
        );
        assert_eq!(
            slots.place(5, ()),
            Err(SlotError::OutOfRange { index: 5, len: 4 })
        );
    }

    #[test]
    fn place_rejects_duplicates() {
        let mut slots = ChannelSlots::new(2);
        slots.place(2, 'a').unwrap();
        assert_eq!(slots.place(2, 'b'), Err(SlotError::Duplicate(2)));
        assert_eq!(slots.get(2), Some(&'a'));
    }

    #[test]
    fn channel_key_pads() {
        assert_eq!(channel_key("down", 1), "down_01");
        assert_eq!(channel_key("up", 12), "up_12");
    }
}
