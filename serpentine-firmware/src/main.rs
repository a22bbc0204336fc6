//! Serpentine - Two-board Snake Firmware
//!
//! Main firmware binary for RP2040-based boards. Each board drives one
//! snake from its joystick, simulates the whole match locally and mirrors
//! the other player's snake from events sent over UART.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use serpentine_core::config::parse_config;
use serpentine_core::TickLoop;
use serpentine_drivers::{AnalogJoystick, St7735};

use crate::input::AdcAxes;
use crate::link::UartLink;
use crate::tasks::game::Uptime;

/// Embedded match configuration (compiled into firmware)
/// Edit game.toml or client.toml and rebuild to customize
#[cfg(not(feature = "client"))]
const EMBEDDED_CONFIG: &str = include_str!("../game.toml");
#[cfg(feature = "client")]
const EMBEDDED_CONFIG: &str = include_str!("../client.toml");

/// Display SPI clock
const SPI_FREQUENCY_HZ: u32 = 16_000_000;

mod input;
mod link;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Serpentine firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // build.rs validated the file; a failure here means the two checks
    // disagree, and a default config could give both boards the same role
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            halt().await
        }
    };
    info!(
        "Config: {}x{} board, {} ms frames, {:?} edges, {} snakes, role {:?}",
        config.width,
        config.height,
        config.frame_interval_ms,
        config.boundary,
        config.snakes.len(),
        config.link.role
    );

    // Setup UART0 for the peer link (GPIO0 TX, GPIO1 RX)
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.link.baud;
    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = BufferedUart::new(p.UART0, p.PIN_0, p.PIN_1, Irqs, tx_buf, rx_buf, uart_config);
    info!("UART initialized at {} baud", config.link.baud);

    // Setup SPI0 for the ST7735 (GPIO18 SCK, GPIO19 MOSI, GPIO17 CS, GPIO16 DC)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = SPI_FREQUENCY_HZ;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_16, Level::Low);
    // Panel reset is held released
    let _reset = Output::new(p.PIN_21, Level::High);

    let mut display = St7735::new(spi, dc, cs);
    if let Err(e) = display.init(&mut Delay) {
        error!("Display init failed: {:?}", e);
    }
    info!("Display initialized");

    // Setup ADC for the joystick (GPIO26 horizontal, GPIO27 vertical, GPIO9 button)
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let horizontal = Channel::new_pin(p.PIN_26, Pull::None);
    let vertical = Channel::new_pin(p.PIN_27, Pull::None);
    let button = Input::new(p.PIN_9, Pull::Up);

    let joystick = match AnalogJoystick::new(AdcAxes::new(adc, horizontal, vertical), button) {
        Ok(joystick) => joystick,
        Err(e) => {
            // Without a baseline there is nothing to steer with
            error!("Joystick baseline failed: {:?}", e);
            halt().await
        }
    };
    info!("Joystick baseline: {:?}", joystick.baseline());

    let game = match TickLoop::new(&config, Uptime::start(), joystick, display, UartLink::new(uart)) {
        Ok(game) => game,
        Err(e) => {
            error!("Match setup failed: {:?}", e);
            halt().await
        }
    };

    // Spawn tasks
    spawner.spawn(tasks::game_task(game)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Park forever after an unrecoverable setup error
async fn halt() -> ! {
    loop {
        embassy_time::Timer::after_secs(60).await;
    }
}
