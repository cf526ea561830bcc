//! Per-channel calibration ranges and normalization
//!
//! During calibration every sample widens the observed `[min, max]` range of
//! its channel. Afterwards the ranges are frozen and raw samples are linearly
//! remapped from that range onto `[OUTPUT_MIN, OUTPUT_MAX]`.

use thiserror_no_std::Error;

use crate::channel::Channel;
use crate::config::{ADC_MAX, NUM_CHANNELS, OUTPUT_MAX, OUTPUT_MIN};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// No usable span: the channel never varied or was never sampled
    #[error("channel {channel} has a degenerate range (min {min}, max {max})")]
    DegenerateRange { channel: u8, min: u16, max: u16 },
}

/// Observed raw range of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub min: u16,
    pub max: u16,
}

impl ChannelRange {
    /// Sentinel range before any sample: min at the ceiling, max at the floor
    pub const UNSAMPLED: Self = Self {
        min: ADC_MAX,
        max: 0,
    };

    /// Widen the range so it includes `raw`
    pub fn observe(&mut self, raw: u16) {
        let raw = raw.min(ADC_MAX);
        if raw < self.min {
            self.min = raw;
        }
        if raw > self.max {
            self.max = raw;
        }
    }

    /// Midpoint of the range, truncated
    pub const fn median(&self) -> u16 {
        ((self.min as u32 + self.max as u32) / 2) as u16
    }

    /// A range normalization can divide by
    pub const fn is_usable(&self) -> bool {
        self.max > self.min
    }

    /// Remap `raw` from this range onto the output range and clamp.
    ///
    /// Uses integer arithmetic truncating toward zero:
    /// `(raw - min) * (OUTPUT_MAX - OUTPUT_MIN) / (max - min) + OUTPUT_MIN`.
    pub fn normalize(&self, channel: Channel, raw: u16) -> Result<u16, CalibrationError> {
        if !self.is_usable() {
            return Err(CalibrationError::DegenerateRange {
                channel: channel.bits(),
                min: self.min,
                max: self.max,
            });
        }

        let span_in = self.max as i32 - self.min as i32;
        let span_out = OUTPUT_MAX as i32 - OUTPUT_MIN as i32;
        let mapped = (raw as i32 - self.min as i32) * span_out / span_in + OUTPUT_MIN as i32;

        Ok(mapped.clamp(OUTPUT_MIN as i32, OUTPUT_MAX as i32) as u16)
    }
}

impl Default for ChannelRange {
    fn default() -> Self {
        Self::UNSAMPLED
    }
}

/// Calibration ranges of all channels, indexed by channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationTable {
    ranges: [ChannelRange; NUM_CHANNELS],
}

impl CalibrationTable {
    pub const fn new() -> Self {
        Self {
            ranges: [ChannelRange::UNSAMPLED; NUM_CHANNELS],
        }
    }

    /// Reset every channel to the unsampled sentinel
    pub fn reset(&mut self) {
        self.ranges = [ChannelRange::UNSAMPLED; NUM_CHANNELS];
    }

    pub fn observe(&mut self, channel: Channel, raw: u16) {
        self.ranges[channel.index()].observe(raw);
    }

    pub fn range(&self, channel: Channel) -> ChannelRange {
        self.ranges[channel.index()]
    }

    pub fn median(&self, channel: Channel) -> u16 {
        self.ranges[channel.index()].median()
    }

    pub fn normalize(&self, channel: Channel, raw: u16) -> Result<u16, CalibrationError> {
        self.ranges[channel.index()].normalize(channel, raw)
    }

    /// Channels paired with their ranges, in scan order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, ChannelRange)> + '_ {
        Channel::all().zip(self.ranges.iter().copied())
    }

    /// Channels whose range cannot be normalized
    pub fn degenerate_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.iter()
            .filter(|(_, range)| !range.is_usable())
            .map(|(channel, _)| channel)
    }

    /// Build a table from known ranges
    pub const fn from_ranges(ranges: [ChannelRange; NUM_CHANNELS]) -> Self {
        Self { ranges }
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::new()
    }
}
