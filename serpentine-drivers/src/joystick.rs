//! Analog thumb joystick
//!
//! Two potentiometer axes read through an ADC plus a push button that pulls
//! its pin low. The rest position is captured once at construction and every
//! sample is reported as a deflection from it.

use embedded_hal::digital::InputPin;
use serpentine_core::traits::{InputError, Joystick, JoystickSample};

/// ADC access for both axes
pub trait AxisPair {
    /// Read raw `(horizontal, vertical)` conversions
    fn read_axes(&mut self) -> Result<(u16, u16), InputError>;
}

/// Joystick on two ADC channels and a GPIO button
pub struct AnalogJoystick<A, B> {
    axes: A,
    button: B,
    /// Rest position `(horizontal, vertical)`
    baseline: (u16, u16),
}

impl<A: AxisPair, B: InputPin> AnalogJoystick<A, B> {
    /// Create a joystick, sampling the rest position
    ///
    /// The stick must be untouched while this runs.
    pub fn new(mut axes: A, button: B) -> Result<Self, InputError> {
        let baseline = axes.read_axes()?;
        Ok(Self {
            axes,
            button,
            baseline,
        })
    }

    /// Rest position captured at start-up
    pub fn baseline(&self) -> (u16, u16) {
        self.baseline
    }
}

impl<A: AxisPair, B: InputPin> Joystick for AnalogJoystick<A, B> {
    fn sample(&mut self) -> Result<JoystickSample, InputError> {
        let (x, y) = self.axes.read_axes()?;
        // Active low
        let pressed = self.button.is_low().map_err(|_| InputError::Button)?;
        Ok(JoystickSample {
            dx: deflection(x, self.baseline.0),
            dy: deflection(y, self.baseline.1),
            pressed,
        })
    }
}

fn deflection(raw: u16, rest: u16) -> i16 {
    let delta = i32::from(raw) - i32::from(rest);
    delta.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
