//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in serpentine-core on top of `embedded-hal` 1.0:
//!
//! - Analog joystick (two ADC axes, active-low button)
//! - ST7735 colour TFT as a pixel sink

#![no_std]
#![deny(unsafe_code)]

pub mod joystick;
pub mod st7735;

pub use joystick::{AnalogJoystick, AxisPair};
pub use st7735::St7735;
