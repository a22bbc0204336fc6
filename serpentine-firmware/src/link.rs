//! Peer link over the buffered UART
//!
//! The game loop polls the port once per frame, so reads only happen when
//! the receive buffer already holds data and never block.

use embassy_rp::uart::BufferedUart;
use embedded_io::{Read, ReadReady, Write};

use serpentine_core::traits::{LinkError, SerialLink};

/// UART0 wired to the other board
pub struct UartLink {
    uart: BufferedUart,
}

impl UartLink {
    pub fn new(uart: BufferedUart) -> Self {
        Self { uart }
    }
}

impl SerialLink for UartLink {
    fn available(&mut self) -> Result<bool, LinkError> {
        self.uart.read_ready().map_err(|_| LinkError::Uart)
    }

    fn read(&mut self) -> Result<u8, LinkError> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(LinkError::Empty),
            Err(_) => Err(LinkError::Uart),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.uart.write_all(bytes).map_err(|_| LinkError::Overflow)
    }
}
