//! ST7735 TFT Display Driver
//!
//! Driver for 128x160 ST7735 (red tab) panels over a 4-wire SPI bus.
//! Colours are RGB565; every board cell maps to one pixel, so the driver
//! writes single-pixel windows rather than keeping a frame buffer.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use serpentine_core::geometry::Point;
use serpentine_core::traits::{DisplayError, PixelSink};

/// Panel size in pixels
pub const WIDTH: u8 = 128;
pub const HEIGHT: u8 = 160;

/// ST7735 commands
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
}

/// Row/column order plus BGR panel
const MADCTL_RED_TAB: u8 = 0xC8;
/// 16 bits per pixel
const COLMOD_RGB565: u8 = 0x05;

/// Pixels pushed per SPI write during fills
const FILL_CHUNK: usize = 32;

/// ST7735 driver
pub struct St7735<SPI, DC, CS> {
    spi: SPI,
    /// Low for commands, high for data
    dc: DC,
    cs: CS,
    width: u8,
    height: u8,
}

impl<SPI, DC, CS> St7735<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create a driver for the full 128x160 panel
    pub fn new(spi: SPI, dc: DC, cs: CS) -> Self {
        Self {
            spi,
            dc,
            cs,
            width: WIDTH,
            height: HEIGHT,
        }
    }

    /// Initialize the panel
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.cs.set_high().map_err(|_| DisplayError::Pin)?;

        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(255);
        self.command(cmd::COLMOD, &[COLMOD_RGB565])?;
        delay.delay_ms(10);
        self.command(cmd::MADCTL, &[MADCTL_RED_TAB])?;
        self.command(cmd::INVOFF, &[])?;
        self.command(cmd::NORON, &[])?;
        delay.delay_ms(10);
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(100);
        Ok(())
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, CS) {
        (self.spi, self.dc, self.cs)
    }

    /// Send a command with optional parameters as one transaction
    fn command(&mut self, command: u8, args: &[u8]) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|_| DisplayError::Pin)?;
        let result = self.write_command(command, args);
        self.cs.set_high().map_err(|_| DisplayError::Pin)?;
        result
    }

    fn write_command(&mut self, command: u8, args: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|_| DisplayError::Pin)?;
        self.spi.write(&[command]).map_err(|_| DisplayError::Bus)?;
        if !args.is_empty() {
            self.dc.set_high().map_err(|_| DisplayError::Pin)?;
            self.spi.write(args).map_err(|_| DisplayError::Bus)?;
        }
        self.spi.flush().map_err(|_| DisplayError::Bus)
    }

    /// Set the drawing window (inclusive corners)
    fn window(&mut self, x0: u8, y0: u8, x1: u8, y1: u8) -> Result<(), DisplayError> {
        self.command(cmd::CASET, &[0, x0, 0, x1])?;
        self.command(cmd::RASET, &[0, y0, 0, y1])
    }

    /// Write `count` pixels of one colour into the current window
    fn fill(&mut self, colour: u16, count: u32) -> Result<(), DisplayError> {
        let [hi, lo] = colour.to_be_bytes();
        let mut chunk = [0u8; FILL_CHUNK * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair[0] = hi;
            pair[1] = lo;
        }

        self.cs.set_low().map_err(|_| DisplayError::Pin)?;
        let result = self.stream(&chunk, count);
        self.cs.set_high().map_err(|_| DisplayError::Pin)?;
        result
    }

    fn stream(&mut self, chunk: &[u8], count: u32) -> Result<(), DisplayError> {
        self.write_command(cmd::RAMWR, &[])?;
        self.dc.set_high().map_err(|_| DisplayError::Pin)?;

        let mut remaining = count as usize;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK);
            self.spi.write(&chunk[..n * 2]).map_err(|_| DisplayError::Bus)?;
            remaining -= n;
        }
        self.spi.flush().map_err(|_| DisplayError::Bus)
    }
}

impl<SPI, DC, CS> PixelSink for St7735<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    fn draw_pixel(&mut self, at: Point, colour: u16) -> Result<(), DisplayError> {
        if at.x >= self.width || at.y >= self.height {
            return Err(DisplayError::OutOfBounds);
        }
        self.window(at.x, at.y, at.x, at.y)?;
        self.fill(colour, 1)
    }

    fn clear(&mut self, colour: u16) -> Result<(), DisplayError> {
        self.window(0, 0, self.width - 1, self.height - 1)?;
        self.fill(colour, u32::from(self.width) * u32::from(self.height))
    }
}
