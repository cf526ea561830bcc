//! One steady-state line of the serial stream
//!
//! A frame holds the 16 normalized values of a single scan. On the wire it is
//! the values separated by spaces, each followed by one space, then the line
//! terminator. The parser is what a host-side consumer uses to accept or
//! discard a received line.

use core::fmt;
use core::str::FromStr;

use thiserror_no_std::Error;

use crate::channel::Channel;
use crate::config::{NUM_CHANNELS, OUTPUT_MAX};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("expected {expected} values, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("value {index} is not an integer")]
    NotANumber { index: usize },
    #[error("value {index} ({value}) is outside 0..={max}")]
    OutOfRange { index: usize, value: u32, max: u16 },
}

/// Normalized values of all channels from one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadingFrame {
    values: [u16; NUM_CHANNELS],
}

impl ReadingFrame {
    pub const fn new(values: [u16; NUM_CHANNELS]) -> Self {
        Self { values }
    }

    pub fn get(&self, channel: Channel) -> u16 {
        self.values[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, value: u16) {
        self.values[channel.index()] = value.min(OUTPUT_MAX);
    }

    pub const fn values(&self) -> &[u16; NUM_CHANNELS] {
        &self.values
    }
}

impl fmt::Display for ReadingFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.values {
            write!(f, "{} ", value)?;
        }
        Ok(())
    }
}

impl FromStr for ReadingFrame {
    type Err = FrameError;

    /// Accepts a line with or without its terminator and trailing space.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut values = [0u16; NUM_CHANNELS];
        let mut found = 0;

        for (index, token) in line.split_whitespace().enumerate() {
            found += 1;
            if index >= NUM_CHANNELS {
                continue;
            }
            let value: u32 = token
                .parse()
                .map_err(|_| FrameError::NotANumber { index })?;
            if value > OUTPUT_MAX as u32 {
                return Err(FrameError::OutOfRange {
                    index,
                    value,
                    max: OUTPUT_MAX,
                });
            }
            values[index] = value as u16;
        }

        if found != NUM_CHANNELS {
            return Err(FrameError::WrongCount {
                expected: NUM_CHANNELS,
                found,
            });
        }

        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "0 64 128 192 256 320 384 448 512 576 640 704 768 832 896 1023 \r\n";

    #[test]
    fn display_has_trailing_space() {
        let mut values = [0u16; NUM_CHANNELS];
        values[15] = 1023;
        let text = ReadingFrame::new(values).to_string();
        assert!(text.starts_with("0 0 "));
        assert!(text.ends_with("1023 "));
        assert_eq!(text.split_whitespace().count(), NUM_CHANNELS);
    }

    #[test]
    fn parses_wire_line() {
        let frame: ReadingFrame = LINE.parse().unwrap();
        assert_eq!(frame.get(Channel::new(8).unwrap()), 512);
        assert_eq!(frame.get(Channel::new(15).unwrap()), 1023);
    }

    #[test]
    fn rejects_short_and_long_lines() {
        assert_eq!(
            "1 2 3".parse::<ReadingFrame>(),
            Err(FrameError::WrongCount {
                expected: 16,
                found: 3
            })
        );
        let long = "1 ".repeat(17);
        assert_eq!(
            long.parse::<ReadingFrame>(),
            Err(FrameError::WrongCount {
                expected: 16,
                found: 17
            })
        );
    }

    #[test]
    fn rejects_report_lines() {
        assert!("3\t200\t800\t500".parse::<ReadingFrame>().is_err());
        assert!("Setup complete. Starting readings...".parse::<ReadingFrame>().is_err());
    }

    #[test]
    fn rejects_values_above_output_range() {
        let line = LINE.replace("1023", "1024");
        assert_eq!(
            line.parse::<ReadingFrame>(),
            Err(FrameError::OutOfRange {
                index: 15,
                value: 1024,
                max: 1023
            })
        );
    }

    #[test]
    fn rejects_negative_values() {
        let line = LINE.replacen("0 ", "-1 ", 1);
        assert_eq!(
            line.parse::<ReadingFrame>(),
            Err(FrameError::NotANumber { index: 0 })
        );
    }
}
