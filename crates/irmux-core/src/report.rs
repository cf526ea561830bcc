//! Text written to the serial link
//!
//! Every line ends with [`LINE_ENDING`]. Lines are staged in a fixed
//! `heapless::String` and written in one call, so a UART sees whole lines.

use core::fmt::{self, Write};

use crate::calibration::CalibrationTable;
use crate::config::LINE_ENDING;
use crate::frame::ReadingFrame;

pub const BANNER: &str = "16 Channel IR Sensor Test with CD4067 Multiplexer";
pub const RULE: &str = "-------------------";
pub const CALIBRATION_START: &str = "Starting sensor calibration...";
pub const CALIBRATION_DONE: &str = "Calibration complete. Results:";
pub const TABLE_HEADER: &str = "Channel\tMin Value\tMax Value\tMedian Value";
pub const SETUP_COMPLETE: &str = "Setup complete. Starting readings...";

/// Longest line produced: 16 values of up to 4 digits plus separators
const LINE_CAPACITY: usize = 96;

type LineBuffer = heapless::String<LINE_CAPACITY>;

/// Formats the report stream onto any `core::fmt::Write` sink
pub struct SerialReport<W> {
    out: W,
}

impl<W: Write> SerialReport<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Write `text` followed by the line terminator
    pub fn line(&mut self, text: &str) -> fmt::Result {
        self.out.write_str(text)?;
        self.out.write_str(LINE_ENDING)
    }

    /// Format into the line buffer, then write it with the terminator
    fn formatted(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let mut buf = LineBuffer::new();
        buf.write_fmt(args)?;
        buf.write_str(LINE_ENDING)?;
        self.out.write_str(&buf)
    }

    pub fn banner(&mut self) -> fmt::Result {
        self.line(BANNER)
    }

    pub fn calibration_start(&mut self, rounds: u16) -> fmt::Result {
        self.line(CALIBRATION_START)?;
        self.formatted(format_args!("Taking {} samples across all channels...", rounds))
    }

    /// Result table: one `index\tmin\tmax\tmedian` line per channel
    pub fn calibration_table(&mut self, table: &CalibrationTable) -> fmt::Result {
        self.line(CALIBRATION_DONE)?;
        self.line(RULE)?;
        self.line(TABLE_HEADER)?;
        self.line(RULE)?;
        for (channel, range) in table.iter() {
            self.formatted(format_args!(
                "{}\t{}\t{}\t{}",
                channel,
                range.min,
                range.max,
                range.median()
            ))?;
        }
        Ok(())
    }

    pub fn setup_complete(&mut self) -> fmt::Result {
        self.line(RULE)?;
        self.line(SETUP_COMPLETE)
    }

    /// Steady-state line, values each followed by a space
    pub fn frame(&mut self, frame: &ReadingFrame) -> fmt::Result {
        self.formatted(format_args!("{}", frame))
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
