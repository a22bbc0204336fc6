//! Pixel sink trait for the game screen

use crate::geometry::Point;

/// Errors that can occur while drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus write failed
    Bus,
    /// Control pin could not be driven
    Pin,
    /// Coordinates outside the panel
    OutOfBounds,
}

/// Anything that can colour single cells
///
/// One board cell maps to one pixel. Colours are RGB565.
pub trait PixelSink {
    /// Colour one pixel
    fn draw_pixel(&mut self, at: Point, colour: u16) -> Result<(), DisplayError>;

    /// Fill the whole screen
    fn clear(&mut self, colour: u16) -> Result<(), DisplayError>;
}
