//! Joystick axes on the RP2040 ADC

use embassy_rp::adc::{Adc, Blocking, Channel};

use serpentine_core::traits::InputError;
use serpentine_drivers::AxisPair;

/// Horizontal and vertical potentiometers on two ADC pins
pub struct AdcAxes {
    adc: Adc<'static, Blocking>,
    horizontal: Channel<'static>,
    vertical: Channel<'static>,
}

impl AdcAxes {
    pub fn new(adc: Adc<'static, Blocking>, horizontal: Channel<'static>, vertical: Channel<'static>) -> Self {
        Self {
            adc,
            horizontal,
            vertical,
        }
    }
}

impl AxisPair for AdcAxes {
    fn read_axes(&mut self) -> Result<(u16, u16), InputError> {
        let x = self
            .adc
            .blocking_read(&mut self.horizontal)
            .map_err(|_| InputError::Conversion)?;
        let y = self
            .adc
            .blocking_read(&mut self.vertical)
            .map_err(|_| InputError::Conversion)?;
        Ok((x, y))
    }
}
