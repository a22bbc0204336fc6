//! Joystick to command mapping

use serpentine_protocol::Direction;

use crate::traits::JoystickSample;

/// What the player asked for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Turn(Direction),
    ToggleLayer,
}

/// Turns raw joystick samples into commands
///
/// A deflection past the threshold on either axis picks a heading from the
/// dominant axis (ties go to the vertical one). Without a deflection, a
/// button press toggles the layer once; it must be released before it
/// toggles again.
#[derive(Debug, Clone)]
pub struct InputMapper {
    threshold: u16,
    latched: bool,
}

impl InputMapper {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            latched: false,
        }
    }

    /// Map one sample
    pub fn map(&mut self, sample: JoystickSample) -> Option<Command> {
        let dx = sample.dx.unsigned_abs();
        let dy = sample.dy.unsigned_abs();

        if dx > self.threshold || dy > self.threshold {
            let direction = if dx > dy {
                if sample.dx > 0 {
                    Direction::Right
                } else {
                    Direction::Left
                }
            } else if sample.dy > 0 {
                Direction::Down
            } else {
                Direction::Up
            };
            return Some(Command::Turn(direction));
        }

        if sample.pressed {
            if !self.latched {
                self.latched = true;
                return Some(Command::ToggleLayer);
            }
        } else {
            self.latched = false;
        }
        None
    }
}
