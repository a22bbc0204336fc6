//! Joystick trait

/// Errors that can occur reading the joystick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// ADC conversion failed
    Conversion,
    /// Button pin could not be read
    Button,
}

/// One joystick reading
///
/// Axes are deflections from the rest position captured at start-up, in
/// raw ADC counts. Positive `dx` points right, positive `dy` points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickSample {
    pub dx: i16,
    pub dy: i16,
    /// Button held down
    pub pressed: bool,
}

/// Two analog axes and a push button
pub trait Joystick {
    /// Read both axes and the button
    ///
    /// Takes `&mut self` because ADC reads require mutable access.
    fn sample(&mut self) -> Result<JoystickSample, InputError>;
}
