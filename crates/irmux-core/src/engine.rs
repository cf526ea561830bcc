//! Calibration and normalization engine
//!
//! The engine owns everything the pipeline touches: the multiplexer select
//! lines, the shared analog input, the delay source, the serial sink and the
//! calibration table. It starts in [`Phase::Calibrating`], moves to
//! [`Phase::Normalizing`] once [`Engine::run_calibration`] finishes and stays
//! there until the device restarts.
//!
//! ```rust,ignore
//! let mut engine = Engine::new(select_pins, adc, delay, uart, PipelineConfig::DEFAULT);
//! engine.setup()?;
//! engine.run()?;
//! ```

use core::convert::Infallible;
use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::calibration::{CalibrationError, CalibrationTable};
use crate::channel::Channel;
use crate::config::{PipelineConfig, SELECT_LINES};
use crate::frame::ReadingFrame;
use crate::mux::{Cd4067, MuxError};
use crate::report::SerialReport;
use crate::sensors::{self, AnalogInput, SIGNAL_INPUT, SensorError};

/// Value written for a channel whose calibrated range cannot be normalized
pub const DEGENERATE_OUTPUT: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    Normalizing,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Multiplexer error: {0}")]
    Mux(MuxError),
    #[error("Sensor error: {0}")]
    Sensor(SensorError),
    #[error("Serial output write failed")]
    Output,
    #[error("Operation not allowed while {0:?}")]
    WrongPhase(Phase),
}

impl From<MuxError> for PipelineError {
    fn from(e: MuxError) -> Self {
        Self::Mux(e)
    }
}

impl From<SensorError> for PipelineError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<fmt::Error> for PipelineError {
    fn from(_: fmt::Error) -> Self {
        error!("Serial write failed");
        Self::Output
    }
}

pub struct Engine<P, A, D, W> {
    mux: Cd4067<P>,
    input: A,
    delay: D,
    report: SerialReport<W>,
    config: PipelineConfig,
    table: CalibrationTable,
    phase: Phase,
}

impl<P, A, D, W> Engine<P, A, D, W>
where
    P: OutputPin,
    A: AnalogInput,
    D: DelayNs,
    W: fmt::Write,
{
    pub fn new(
        select: [P; SELECT_LINES],
        input: A,
        delay: D,
        out: W,
        config: PipelineConfig,
    ) -> Self {
        Self {
            mux: Cd4067::new(select, config.settle_delay_us),
            input,
            delay,
            report: SerialReport::new(out),
            config,
            table: CalibrationTable::new(),
            phase: Phase::Calibrating,
        }
    }

    /// Startup sequence: banner, calibration, completion marker, pause
    pub fn setup(&mut self) -> Result<(), PipelineError> {
        self.report.banner()?;
        self.run_calibration()?;
        self.report.setup_complete()?;
        self.delay.delay_ms(self.config.setup_pause_ms);
        Ok(())
    }

    /// Sample every channel `calibration_rounds` times and freeze the ranges.
    ///
    /// Only allowed once. Degenerate channels are logged but not corrected.
    pub fn run_calibration(&mut self) -> Result<&CalibrationTable, PipelineError> {
        if self.phase != Phase::Calibrating {
            return Err(PipelineError::WrongPhase(self.phase));
        }

        let rounds = self.config.calibration_rounds;
        self.report.calibration_start(rounds)?;
        self.delay.delay_ms(self.config.calibration_pause_ms);

        self.table.reset();
        for _ in 0..rounds {
            for channel in Channel::all() {
                let raw = self.sample(channel)?;
                self.table.observe(channel, raw);
                self.delay.delay_ms(self.config.channel_delay_ms);
            }
            self.delay.delay_ms(self.config.round_delay_ms);
        }

        self.report.calibration_table(&self.table)?;

        let mut degenerate = 0;
        for channel in self.table.degenerate_channels() {
            let range = self.table.range(channel);
            warn!(
                "Channel {} has no usable range (min {}, max {}), it will read {}",
                channel, range.min, range.max, DEGENERATE_OUTPUT
            );
            degenerate += 1;
        }
        info!(
            "Calibration finished after {} rounds, {} degenerate channel(s)",
            rounds, degenerate
        );

        self.phase = Phase::Normalizing;
        Ok(&self.table)
    }

    /// Sample and normalize every channel once, without reporting or pacing.
    pub fn read_frame(&mut self) -> Result<ReadingFrame, PipelineError> {
        if self.phase != Phase::Normalizing {
            return Err(PipelineError::WrongPhase(self.phase));
        }

        let mut frame = ReadingFrame::default();
        for channel in Channel::all() {
            let raw = self.sample(channel)?;
            let value = match self.table.normalize(channel, raw) {
                Ok(value) => value,
                Err(e @ CalibrationError::DegenerateRange { .. }) => {
                    debug!("{}", e);
                    DEGENERATE_OUTPUT
                }
            };
            frame.set(channel, value);
        }
        Ok(frame)
    }

    /// One steady-state cycle: read all channels, emit the line, wait.
    pub fn read_and_report(&mut self) -> Result<ReadingFrame, PipelineError> {
        let frame = self.read_frame()?;
        self.report.frame(&frame)?;
        self.delay.delay_ms(self.config.cycle_delay_ms);
        Ok(frame)
    }

    /// Report frames until an error occurs
    pub fn run(&mut self) -> Result<Infallible, PipelineError> {
        loop {
            self.read_and_report()?;
        }
    }

    fn sample(&mut self, channel: Channel) -> Result<u16, PipelineError> {
        self.mux.select(channel, &mut self.delay)?;
        let raw = self.input.read_raw().map_err(|e| {
            error!("Failed to sample channel {}: {}", channel, e);
            e
        })?;
        Ok(sensors::check_range(SIGNAL_INPUT, raw)?)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    pub fn output(&self) -> &W {
        self.report.get_ref()
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    struct NullPin;

    impl ErrorType for NullPin {
        type Error = Infallible;
    }

    impl OutputPin for NullPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Select line whose driver can be disconnected
    struct LoosePin {
        connected: bool,
    }

    impl ErrorType for LoosePin {
        type Error = ErrorKind;
    }

    impl LoosePin {
        fn drive(&self) -> Result<(), ErrorKind> {
            if self.connected {
                Ok(())
            } else {
                Err(ErrorKind::Other)
            }
        }
    }

    impl OutputPin for LoosePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.drive()
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.drive()
        }
    }

    struct DeadConverter;

    impl AnalogInput for DeadConverter {
        fn read_raw(&mut self) -> Result<u16, SensorError> {
            sensors::read_blocking(SIGNAL_INPUT, "oneshot read", || {
                Err::<u16, _>(nb::Error::Other(()))
            })
        }
    }

    struct Constant(u16);

    impl AnalogInput for Constant {
        fn read_raw(&mut self) -> Result<u16, SensorError> {
            Ok(self.0)
        }
    }

    fn engine(raw: u16) -> Engine<NullPin, Constant, NoopDelay, String> {
        Engine::new(
            [NullPin, NullPin, NullPin, NullPin],
            Constant(raw),
            NoopDelay::new(),
            String::new(),
            PipelineConfig::DEFAULT.with_calibration_rounds(3),
        )
    }

    #[test]
    fn reading_before_calibration_is_rejected() {
        let mut e = engine(10);
        assert_eq!(
            e.read_and_report(),
            Err(PipelineError::WrongPhase(Phase::Calibrating))
        );
    }

    #[test]
    fn calibration_runs_once() {
        let mut e = engine(10);
        e.run_calibration().unwrap();
        assert_eq!(e.phase(), Phase::Normalizing);
        assert_eq!(
            e.run_calibration().err(),
            Some(PipelineError::WrongPhase(Phase::Normalizing))
        );
    }

    #[test]
    fn flat_inputs_read_as_degenerate_output() {
        let mut e = engine(600);
        e.run_calibration().unwrap();
        let frame = e.read_and_report().unwrap();
        assert!(frame.values().iter().all(|v| *v == DEGENERATE_OUTPUT));
        assert!(e.output().ends_with("0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 \r\n"));
    }

    #[test]
    fn impossible_raw_value_is_an_error() {
        let mut e = engine(2000);
        assert!(matches!(
            e.run_calibration(),
            Err(PipelineError::Sensor(SensorError::OutOfRange { value: 2000, .. }))
        ));
    }

    #[test]
    fn select_line_failure_stops_calibration() {
        let pins = [true, true, false, true].map(|connected| LoosePin { connected });
        let mut e = Engine::new(
            pins,
            Constant(10),
            NoopDelay::new(),
            String::new(),
            PipelineConfig::DEFAULT.with_calibration_rounds(3),
        );
        assert_eq!(
            e.run_calibration().err(),
            Some(PipelineError::Mux(MuxError::SelectLine { line: 2 }))
        );
        assert_eq!(e.phase(), Phase::Calibrating);
    }

    #[test]
    fn conversion_failure_stops_calibration() {
        let mut e = Engine::new(
            [NullPin, NullPin, NullPin, NullPin],
            DeadConverter,
            NoopDelay::new(),
            String::new(),
            PipelineConfig::DEFAULT.with_calibration_rounds(3),
        );
        assert_eq!(
            e.run_calibration().err(),
            Some(PipelineError::Sensor(SensorError::ReadFailed {
                sensor: SIGNAL_INPUT,
                operation: "oneshot read",
            }))
        );
    }
}
