//! Configuration type definitions
//!
//! These types describe one match: the board, the timing, the link and the
//! snakes taking part. The firmware builds them from an embedded TOML file.

use heapless::Vec;
use serpentine_protocol::{Direction, Role, SnakeId};

use crate::geometry::{BoundaryMode, Bounds, Point};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum snakes per match
///
/// One per board: a snake is only collision-tested by the board that
/// drives it, so a third snake would be checked by neither.
pub const MAX_SNAKES: usize = 2;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    EmptyBoard,
    /// Frame interval is zero
    ZeroFrameInterval,
    /// Starting length is zero
    ZeroLength,
    /// No snakes configured
    NoSnakes,
    /// A spawn point lies outside the board
    SpawnOutside(SnakeId),
    /// Two snakes share an id
    DuplicateSnake(SnakeId),
    /// `local_snake` names no configured snake
    MissingLocalSnake,
}

/// Where and how a snake starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnakeSpawn {
    pub id: SnakeId,
    pub x: u8,
    pub y: u8,
    pub direction: Direction,
    /// RGB565
    pub colour: u16,
}

impl SnakeSpawn {
    pub fn start(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Peer link settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Which side of the handshake this board plays
    pub role: Role,
    /// UART baud rate
    pub baud: u32,
    /// Ack wait before the handshake restarts
    pub handshake_timeout_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            role: Role::Host,
            baud: 9600,
            handshake_timeout_ms: 1000,
        }
    }
}

/// Complete match configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameConfig {
    /// Board width in cells
    pub width: u8,
    /// Board height in cells
    pub height: u8,
    /// Tick period (33 ms is roughly 30 fps)
    pub frame_interval_ms: u32,
    pub boundary: BoundaryMode,
    /// Cells each snake grows to
    pub starting_length: u16,
    /// Joystick deflection (ADC counts) needed to register a turn
    pub joystick_threshold: u16,
    /// Screen background, RGB565
    pub background: u16,
    /// The snake driven by this board
    pub local_snake: SnakeId,
    pub link: LinkConfig,
    pub snakes: Vec<SnakeSpawn, MAX_SNAKES>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut snakes = Vec::new();
        for (id, x, y, direction, colour) in [
            (0, 20, 20, Direction::Down, 0xFF00),
            (1, 20, 100, Direction::Right, 0x0FF0),
        ] {
            if let Some(id) = SnakeId::new(id) {
                let _ = snakes.push(SnakeSpawn {
                    id,
                    x,
                    y,
                    direction,
                    colour,
                });
            }
        }

        Self {
            width: 128,
            height: 160,
            frame_interval_ms: 33,
            boundary: BoundaryMode::Kill,
            starting_length: 20,
            joystick_threshold: 450,
            background: 0x0000,
            local_snake: FIRST_SNAKE,
            link: LinkConfig::default(),
            snakes,
        }
    }
}

const FIRST_SNAKE: SnakeId = match SnakeId::new(0) {
    Some(id) => id,
    None => unreachable!(),
};

impl GameConfig {
    /// Play area
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Spawn for a snake id
    pub fn spawn(&self, id: SnakeId) -> Option<&SnakeSpawn> {
        self.snakes.iter().find(|s| s.id == id)
    }

    /// Check the configuration can start a match
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }
        if self.starting_length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.snakes.is_empty() {
            return Err(ConfigError::NoSnakes);
        }

        let bounds = self.bounds();
        for (i, spawn) in self.snakes.iter().enumerate() {
            if !bounds.contains(spawn.start()) {
                return Err(ConfigError::SpawnOutside(spawn.id));
            }
            if self.snakes[..i].iter().any(|s| s.id == spawn.id) {
                return Err(ConfigError::DuplicateSnake(spawn.id));
            }
        }

        if self.spawn(self.local_snake).is_none() {
            return Err(ConfigError::MissingLocalSnake);
        }
        Ok(())
    }
}
