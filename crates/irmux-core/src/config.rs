//! Build-time configuration for the sensor pipeline
//!
//! Nothing here is read from a file or the environment. The firmware uses
//! [`PipelineConfig::DEFAULT`]; tests and the simulator may build a shorter
//! configuration to avoid hundreds of calibration rounds.

/// Number of inputs on the CD4067 multiplexer
pub const NUM_CHANNELS: usize = 16;

/// Number of select lines driving the multiplexer (S0..S3)
pub const SELECT_LINES: usize = 4;

/// Highest raw value the 10-bit converter can produce
pub const ADC_MAX: u16 = 1023;

/// Lower bound of the normalized output range
pub const OUTPUT_MIN: u16 = 0;

/// Upper bound of the normalized output range
pub const OUTPUT_MAX: u16 = 1023;

/// Baud rate of the serial report stream
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Line terminator of every serial line
pub const LINE_ENDING: &str = "\r\n";

/// Timing and sampling parameters of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Full passes over all channels during calibration
    pub calibration_rounds: u16,
    /// Wait after driving the select lines, in microseconds
    pub settle_delay_us: u32,
    /// Wait after each calibration sample, in milliseconds
    pub channel_delay_ms: u32,
    /// Wait after each calibration round, in milliseconds
    pub round_delay_ms: u32,
    /// Wait after each normalized frame, in milliseconds
    pub cycle_delay_ms: u32,
    /// Pause between the calibration announcement and the first sample
    pub calibration_pause_ms: u32,
    /// Pause after the setup-complete marker, before the first frame
    pub setup_pause_ms: u32,
}

impl PipelineConfig {
    pub const DEFAULT: Self = Self {
        calibration_rounds: 700,
        settle_delay_us: 100,
        channel_delay_ms: 1,
        round_delay_ms: 10,
        cycle_delay_ms: 50,
        calibration_pause_ms: 1000,
        setup_pause_ms: 1000,
    };

    /// Same timings with a different number of calibration rounds
    pub const fn with_calibration_rounds(self, calibration_rounds: u16) -> Self {
        Self {
            calibration_rounds,
            ..self
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
