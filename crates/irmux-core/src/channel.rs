//! Channel indices of the multiplexer

use core::fmt;

use crate::config::{NUM_CHANNELS, SELECT_LINES};

/// One of the 16 multiplexer inputs
///
/// Values outside `0..16` cannot be constructed through [`Channel::new`], so
/// every channel maps to exactly one select-line pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Keep only the low four bits, the way the multiplexer sees any code
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Level of each select line, `[S0, S1, S2, S3]`, `true` meaning high
    pub const fn select_levels(self) -> [bool; SELECT_LINES] {
        [
            self.0 & 0x01 != 0,
            self.0 & 0x02 != 0,
            self.0 & 0x04 != 0,
            self.0 & 0x08 != 0,
        ]
    }

    /// All channels in scan order
    pub fn all() -> impl DoubleEndedIterator<Item = Channel> + ExactSizeIterator {
        (0..NUM_CHANNELS as u8).map(Channel)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Channel> for usize {
    fn from(channel: Channel) -> Self {
        channel.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_index() {
        assert!(Channel::new(15).is_some());
        assert!(Channel::new(16).is_none());
        assert!(Channel::new(u8::MAX).is_none());
    }

    #[test]
    fn channel_five_drives_alternating_pattern() {
        let ch = Channel::new(5).unwrap();
        assert_eq!(ch.select_levels(), [true, false, true, false]);
    }

    #[test]
    fn truncation_keeps_low_nibble() {
        assert_eq!(Channel::from_bits_truncate(0x15), Channel::new(5).unwrap());
        assert_eq!(Channel::from_bits_truncate(0xFF).index(), 15);
    }

    #[test]
    fn every_channel_has_a_distinct_pattern() {
        let mut seen = [false; NUM_CHANNELS];
        for ch in Channel::all() {
            let levels = ch.select_levels();
            let code = levels
                .iter()
                .enumerate()
                .fold(0usize, |acc, (bit, high)| acc | ((*high as usize) << bit));
            assert_eq!(code, ch.index());
            assert!(!seen[code]);
            seen[code] = true;
        }
        assert_eq!(Channel::all().len(), NUM_CHANNELS);
    }
}
