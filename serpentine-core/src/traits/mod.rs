//! Hardware abstraction traits
//!
//! These traits define the interface between the game engine and the
//! board: a clock, a joystick, a screen and a serial port.

pub mod clock;
pub mod display;
pub mod input;
pub mod link;

pub use clock::Clock;
pub use display::{DisplayError, PixelSink};
pub use input::{InputError, Joystick, JoystickSample};
pub use link::{LinkError, SerialLink};
