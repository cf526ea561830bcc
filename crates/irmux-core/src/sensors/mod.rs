//! Analog input abstraction shared by the firmware and the simulator

use core::fmt::Debug;

use thiserror_no_std::Error;

use crate::config::ADC_MAX;

/// Name of the multiplexer's common output in errors and logs
pub const SIGNAL_INPUT: &str = "CD4067 SIG";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: conversion failed during {operation}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: raw value {value} exceeds converter range")]
    OutOfRange { sensor: &'static str, value: u16 },
}

/// Single analog input sampled through the multiplexer's common pin.
///
/// Implementations return 10-bit values (`0..=ADC_MAX`). Converters with a
/// wider resolution scale down before returning, see [`scale_to_10_bit`].
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        (**self).read_raw()
    }
}

/// Drop the extra low bits of a `bits`-wide conversion result.
pub const fn scale_to_10_bit(raw: u16, bits: u8) -> u16 {
    if bits > 10 {
        raw >> (bits - 10)
    } else {
        raw << (10 - bits)
    }
}

/// Poll a non-blocking conversion until it finishes.
///
/// `WouldBlock` keeps polling. Any other error is logged and returned as
/// [`SensorError::ReadFailed`].
pub fn read_blocking<E: Debug>(
    sensor: &'static str,
    operation: &'static str,
    mut convert: impl FnMut() -> nb::Result<u16, E>,
) -> Result<u16, SensorError> {
    nb::block!(convert()).map_err(|e| {
        log::error!("{}: {} failed: {:?}", sensor, operation, e);
        SensorError::ReadFailed { sensor, operation }
    })
}

/// Reject values the converter could never have produced.
pub fn check_range(sensor: &'static str, value: u16) -> Result<u16, SensorError> {
    if value > ADC_MAX {
        log::error!("{}: raw value {} above {}", sensor, value, ADC_MAX);
        return Err(SensorError::OutOfRange { sensor, value });
    }
    Ok(value)
}
