//! Hardware-independent core library for irmux
//!
//! Everything needed to turn a CD4067-multiplexed bank of 16 IR sensors into
//! a calibrated, normalized serial stream: the channel type, the multiplexer
//! controller, the calibration table, the engine state machine and the line
//! formats on both ends of the serial link.
//!
//! The crate is `#![no_std]` and generic over `embedded-hal` traits, so the
//! same code runs on the ESP32-S3 firmware, in the desktop simulator and in
//! host tests with an injected delay source.

#![cfg_attr(not(test), no_std)]

pub mod calibration;
pub mod channel;
pub mod config;
pub mod engine;
pub mod frame;
pub mod mux;
pub mod report;
pub mod sensors;

pub use calibration::{CalibrationError, CalibrationTable, ChannelRange};
pub use channel::Channel;
pub use config::PipelineConfig;
pub use engine::{Engine, Phase, PipelineError};
pub use frame::{FrameError, ReadingFrame};
pub use mux::{Cd4067, MuxError};
pub use sensors::{AnalogInput, SensorError};
