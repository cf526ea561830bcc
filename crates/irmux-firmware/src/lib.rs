//! ESP32-S3 firmware-specific modules for irmux
//!
//! Binds the hardware-independent pipeline in `irmux_core` to the board:
//! GPIO outputs for the CD4067 select lines, ADC1 for the multiplexer's
//! common output and UART0 for the report stream.

#![no_std]

pub mod analog;
pub mod board;
