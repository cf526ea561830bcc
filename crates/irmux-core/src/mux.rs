//! CD4067 16-channel analog multiplexer controller
//!
//! The controller only drives the four select lines. It does not remember
//! which channel is active: the caller selects a channel right before every
//! sample.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::error;
use thiserror_no_std::Error;

use crate::channel::Channel;
use crate::config::SELECT_LINES;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxError {
    #[error("failed to drive select line S{line}")]
    SelectLine { line: u8 },
}

/// Select lines `[S0, S1, S2, S3]` of a CD4067 plus the settling time.
pub struct Cd4067<P> {
    select: [P; SELECT_LINES],
    settle_us: u32,
}

impl<P: OutputPin> Cd4067<P> {
    pub const fn new(select: [P; SELECT_LINES], settle_us: u32) -> Self {
        Self { select, settle_us }
    }

    /// Route `channel` to the common output and wait for the switch to settle.
    pub fn select<D: DelayNs>(&mut self, channel: Channel, delay: &mut D) -> Result<(), MuxError> {
        for (line, (pin, high)) in self
            .select
            .iter_mut()
            .zip(channel.select_levels())
            .enumerate()
        {
            let result = if high { pin.set_high() } else { pin.set_low() };
            result.map_err(|e| {
                error!("S{} write failed while selecting channel {}: {:?}", line, channel, e);
                MuxError::SelectLine { line: line as u8 }
            })?;
        }

        delay.delay_us(self.settle_us);
        Ok(())
    }

    /// Give the select pins back
    pub fn release(self) -> [P; SELECT_LINES] {
        self.select
    }
}
