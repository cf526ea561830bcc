//! Pin assignment of the sensor board
//!
//! | Signal     | GPIO | Notes                         |
//! |------------|------|-------------------------------|
//! | CD4067 S0  | 4    | select bit 0 (LSB)            |
//! | CD4067 S1  | 5    | select bit 1                  |
//! | CD4067 S2  | 6    | select bit 2                  |
//! | CD4067 S3  | 7    | select bit 3 (MSB)            |
//! | CD4067 SIG | 1    | ADC1 channel 0                |
//! | UART0 TX   | 43   | report stream, 115200 8N1     |
//! | UART0 RX   | 44   | unused, claimed with the UART |

use esp_hal::Blocking;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{GPIO4, GPIO5, GPIO6, GPIO7, GPIO43, GPIO44, UART0};
use esp_hal::uart::{Config as UartConfig, ConfigError, Uart};
use irmux_core::config::{SELECT_LINES, SERIAL_BAUD_RATE};

/// Select lines `[S0, S1, S2, S3]`, all driven low (channel 0)
pub fn select_lines<'d>(
    s0: GPIO4<'d>,
    s1: GPIO5<'d>,
    s2: GPIO6<'d>,
    s3: GPIO7<'d>,
) -> [Output<'d>; SELECT_LINES] {
    [
        Output::new(s0, Level::Low, OutputConfig::default()),
        Output::new(s1, Level::Low, OutputConfig::default()),
        Output::new(s2, Level::Low, OutputConfig::default()),
        Output::new(s3, Level::Low, OutputConfig::default()),
    ]
}

/// UART0 at the report baud rate
pub fn serial_port<'d>(
    uart0: UART0<'d>,
    tx: GPIO43<'d>,
    rx: GPIO44<'d>,
) -> Result<Uart<'d, Blocking>, ConfigError> {
    let config = UartConfig::default().with_baudrate(SERIAL_BAUD_RATE);
    Ok(Uart::new(uart0, config)?.with_tx(tx).with_rx(rx))
}
