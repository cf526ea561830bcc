//! ADC1 oneshot sampling of the multiplexer's common output

use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO1};
use irmux_core::sensors::{self, AnalogInput, SIGNAL_INPUT, SensorError};

/// Native resolution of the ESP32-S3 SAR ADC
const ADC_BITS: u8 = 12;

/// The CD4067 SIG pin wired to GPIO1 (ADC1 channel 0)
pub struct MuxSignalInput<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
}

impl<'d> MuxSignalInput<'d> {
    pub fn new(adc1: ADC1<'d>, sig: GPIO1<'d>) -> Self {
        let mut config = AdcConfig::new();
        // Full 0-3.3 V swing of the IR receivers
        let pin = config.enable_pin(sig, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);
        Self { adc, pin }
    }
}

impl AnalogInput for MuxSignalInput<'_> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let raw = sensors::read_blocking(SIGNAL_INPUT, "oneshot read", || {
            self.adc.read_oneshot(&mut self.pin)
        })?;
        Ok(sensors::scale_to_10_bit(raw, ADC_BITS))
    }
}
