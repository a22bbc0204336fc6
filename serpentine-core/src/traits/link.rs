//! Serial link trait for the peer connection

/// Errors that can occur on the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// UART reported a framing, parity or overrun fault
    Uart,
    /// Transmit buffer could not take the bytes
    Overflow,
    /// Read attempted with nothing available
    Empty,
}

/// Byte duplex channel to the other board
pub trait SerialLink {
    /// Check whether a byte can be read without blocking
    fn available(&mut self) -> Result<bool, LinkError>;

    /// Read one byte
    ///
    /// Only call after [`available`](Self::available) returned `true`.
    fn read(&mut self) -> Result<u8, LinkError>;

    /// Write all bytes
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}
