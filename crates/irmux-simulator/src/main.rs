//! Desktop simulator for the irmux sensor pipeline.
//!
//! Runs the `irmux_core` engine against a simulated CD4067 with 16 synthetic
//! IR sensors and prints the serial stream to stdout, exactly as the board
//! would send it over UART. Diagnostics go to stderr through `env_logger`
//! (set `RUST_LOG=debug` for per-frame detail).
//!
//! Simulated time runs faster than wall-clock time, see [`TIME_DILATION`].
//! Channel [`DISCONNECTED_CHANNEL`] is left floating at a constant level so the
//! degenerate-range path is visible in the output.

use std::cell::Cell;
use std::convert::Infallible;
use std::fmt;
use std::io::{self, Write as _};
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{info, warn};

use irmux_core::config::{ADC_MAX, LINE_ENDING, NUM_CHANNELS};
use irmux_core::report::SETUP_COMPLETE;
use irmux_core::{AnalogInput, Engine, PipelineConfig, ReadingFrame, SensorError};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Wall-clock seconds slept per simulated second
const TIME_DILATION: f64 = 0.1;

/// Channel with no sensor attached
const DISCONNECTED_CHANNEL: usize = 12;

/// Raw level the floating input settles at
const FLOATING_LEVEL: u16 = 4;

// ---------------------------------------------------------------------------
// Simulated clock
// ---------------------------------------------------------------------------

/// Simulated seconds since power-on, shared by the delay and the sensors
#[derive(Clone, Default)]
struct SimClock(Rc<Cell<f64>>);

impl SimClock {
    fn now(&self) -> f64 {
        self.0.get()
    }

    fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }
}

/// Advances the simulated clock and sleeps a dilated amount of real time
struct SimDelay {
    clock: SimClock,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let secs = ns as f64 / 1e9;
        self.clock.advance(secs);

        let real = Duration::from_secs_f64(secs * TIME_DILATION);
        if real >= Duration::from_micros(50) {
            std::thread::sleep(real);
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated CD4067
// ---------------------------------------------------------------------------

/// Select code currently driven onto S0..S3
#[derive(Clone, Default)]
struct SelectBus(Rc<Cell<u8>>);

struct SelectLine {
    bus: SelectBus,
    bit: u8,
}

impl ErrorType for SelectLine {
    type Error = Infallible;
}

impl OutputPin for SelectLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let bus = &self.bus.0;
        bus.set(bus.get() & !(1 << self.bit));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let bus = &self.bus.0;
        bus.set(bus.get() | (1 << self.bit));
        Ok(())
    }
}

impl SelectBus {
    fn lines(&self) -> [SelectLine; 4] {
        [0, 1, 2, 3].map(|bit| SelectLine {
            bus: self.clone(),
            bit,
        })
    }
}

// ---------------------------------------------------------------------------
// Synthetic IR sensors
// ---------------------------------------------------------------------------

/// IR receivers behind the multiplexer, sampled through its common output
struct IrSensorBank {
    bus: SelectBus,
    clock: SimClock,
    /// Per-channel xorshift state for sample noise
    noise: [u32; NUM_CHANNELS],
}

impl IrSensorBank {
    fn new(bus: SelectBus, clock: SimClock) -> Self {
        let mut noise = [0u32; NUM_CHANNELS];
        for (i, state) in noise.iter_mut().enumerate() {
            *state = 0x9E37_79B9 ^ (i as u32 + 1).wrapping_mul(0x85EB_CA6B);
        }
        Self { bus, clock, noise }
    }

    /// Noise in `-8..8`
    fn jitter(&mut self, channel: usize) -> f64 {
        let mut x = self.noise[channel];
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise[channel] = x;
        (x % 16) as f64 - 8.0
    }

    /// Each receiver sees a reflector sweeping past at its own rate
    fn level(&mut self, channel: usize) -> u16 {
        if channel == DISCONNECTED_CHANNEL {
            return FLOATING_LEVEL;
        }

        let t = self.clock.now();
        let n = channel as f64;
        let centre = 380.0 + 25.0 * n;
        let swing = 180.0 + 12.0 * n;
        let period = 1.5 + 0.25 * n;
        let phase = n * 0.7;
        let value = centre + swing * (t / period * std::f64::consts::TAU + phase).sin();

        (value + self.jitter(channel)).clamp(0.0, ADC_MAX as f64) as u16
    }
}

impl AnalogInput for IrSensorBank {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let channel = self.bus.0.get() as usize & 0x0F;
        Ok(self.level(channel))
    }
}

// ---------------------------------------------------------------------------
// Serial sink
// ---------------------------------------------------------------------------

/// Forwards the stream to stdout and checks steady-state lines the way a
/// host-side consumer would
#[derive(Default)]
struct MonitoredStdout {
    pending: String,
    streaming: bool,
    frames: u64,
    rejected: u64,
}

impl MonitoredStdout {
    fn inspect(&mut self, line: &str) {
        if !self.streaming {
            self.streaming = line == SETUP_COMPLETE;
            return;
        }

        match line.parse::<ReadingFrame>() {
            Ok(frame) => {
                self.frames += 1;
                log::debug!("Frame {}: {:?}", self.frames, frame.values());
            }
            Err(e) => {
                self.rejected += 1;
                warn!("Malformed line {:?}: {}", line, e);
            }
        }
    }
}

impl fmt::Write for MonitoredStdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        io::stdout()
            .lock()
            .write_all(s.as_bytes())
            .map_err(|_| fmt::Error)?;

        self.pending.push_str(s);
        while let Some(end) = self.pending.find(LINE_ENDING) {
            let line: String = self.pending.drain(..end + LINE_ENDING.len()).collect();
            self.inspect(&line[..end]);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting irmux simulator");
    info!(
        "{} channels, channel {} disconnected, time dilation {}x",
        NUM_CHANNELS, DISCONNECTED_CHANNEL, TIME_DILATION
    );

    let clock = SimClock::default();
    let bus = SelectBus::default();

    let mut engine = Engine::new(
        bus.lines(),
        IrSensorBank::new(bus.clone(), clock.clone()),
        SimDelay {
            clock: clock.clone(),
        },
        MonitoredStdout::default(),
        PipelineConfig::DEFAULT,
    );

    if let Err(e) = engine.setup() {
        log::error!("Setup failed: {}", e);
        std::process::exit(1);
    }
    info!("Calibration took {:.1} simulated seconds", clock.now());

    loop {
        if let Err(e) = engine.read_and_report() {
            log::error!("Read loop stopped: {}", e);
            let out = engine.output();
            info!("{} frames streamed, {} rejected", out.frames, out.rejected);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn monitor_only_checks_lines_after_setup() {
        let mut out = MonitoredStdout::default();
        write!(out, "0\t1023\t0\t511\r\n").unwrap();
        write!(out, "{}\r\n", SETUP_COMPLETE).unwrap();
        write!(out, "{}\r\n", ReadingFrame::new([512; NUM_CHANNELS])).unwrap();
        write!(out, "1 2 3 \r\n").unwrap();

        assert!(out.streaming);
        assert_eq!(out.frames, 1);
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn monitor_reassembles_split_writes() {
        let mut out = MonitoredStdout {
            streaming: true,
            ..Default::default()
        };
        let line = ReadingFrame::new([7; NUM_CHANNELS]).to_string();
        let (head, tail) = line.split_at(10);
        out.write_str(head).unwrap();
        out.write_str(tail).unwrap();
        assert_eq!(out.frames, 0);
        out.write_str("\r").unwrap();
        out.write_str("\n").unwrap();
        assert_eq!(out.frames, 1);
    }

    #[test]
    fn sensor_bank_follows_select_bus() {
        let bus = SelectBus::default();
        let mut lines = bus.lines();
        let mut bank = IrSensorBank::new(bus.clone(), SimClock::default());

        for line in &mut lines {
            line.set_high().unwrap();
        }
        lines[0].set_low().unwrap();
        lines[1].set_low().unwrap();
        assert_eq!(bus.0.get() as usize, DISCONNECTED_CHANNEL);
        assert_eq!(bank.read_raw(), Ok(FLOATING_LEVEL));

        lines[2].set_low().unwrap();
        let raw = bank.read_raw().unwrap();
        assert!(raw <= ADC_MAX);
    }
}
