#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use irmux_core::{Engine, PipelineConfig};
use irmux_firmware::analog::MuxSignalInput;
use irmux_firmware::board;
use log::{error, info};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal::main]
fn main() -> ! {
    // Diagnostics go to RTT so UART0 carries only the report stream
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let select = board::select_lines(
        peripherals.GPIO4,
        peripherals.GPIO5,
        peripherals.GPIO6,
        peripherals.GPIO7,
    );
    let signal = MuxSignalInput::new(peripherals.ADC1, peripherals.GPIO1);
    let serial = board::serial_port(peripherals.UART0, peripherals.GPIO43, peripherals.GPIO44)
        .expect("Failed to configure UART0");

    info!("Peripherals initialized");

    let mut engine = Engine::new(
        select,
        signal,
        Delay::new(),
        serial,
        PipelineConfig::DEFAULT,
    );

    match engine.setup() {
        Ok(()) => {
            info!("Setup complete, streaming frames");
            if let Err(e) = engine.run() {
                error!("Read loop stopped: {}", e);
            }
        }
        Err(e) => error!("Setup failed: {}", e),
    }

    // No recovery: wait for a reset
    loop {
        core::hint::spin_loop();
    }
}
