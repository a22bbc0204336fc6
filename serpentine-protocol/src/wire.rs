//! Wire vocabulary shared by both peers
//!
//! Every byte on the link is printable ASCII so a capture from a serial
//! terminal can be read directly.

/// Connect request sent by the non-host peer
pub const CONNECT: u8 = b'C';

/// Acknowledgement (both directions of the handshake)
pub const ACK: u8 = b'A';

/// Message kind: direction change
pub const KIND_DIRECTION: u8 = b'D';

/// Message kind: layer change
pub const KIND_LAYER: u8 = b'L';

/// Message kind: snake killed
pub const KIND_KILL: u8 = b'K';

/// Every message is exactly three bytes: kind, snake id, payload
pub const MESSAGE_LEN: usize = 3;

/// Heading of a snake segment
///
/// Screen coordinates: `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All headings, clockwise from up
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Get the reverse heading
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// True for headings that move along the y axis
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Parse a heading from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'U' => Some(Direction::Up),
            b'R' => Some(Direction::Right),
            b'D' => Some(Direction::Down),
            b'L' => Some(Direction::Left),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Up => b'U',
            Direction::Right => b'R',
            Direction::Down => b'D',
            Direction::Left => b'L',
        }
    }
}

/// One of the two planes a snake can travel on
///
/// Segments on different layers never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layer {
    /// Layer 0, drawn on screen
    #[default]
    Upper,
    /// Layer 1, hidden under the board
    Lower,
}

impl Layer {
    /// Get the other layer
    pub fn other(self) -> Self {
        match self {
            Layer::Upper => Layer::Lower,
            Layer::Lower => Layer::Upper,
        }
    }

    /// Numeric layer (0 or 1)
    pub fn index(self) -> u8 {
        match self {
            Layer::Upper => 0,
            Layer::Lower => 1,
        }
    }

    /// Build a layer from its numeric value
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Layer::Upper),
            1 => Some(Layer::Lower),
            _ => None,
        }
    }

    /// Parse a layer from its wire byte (`'0'` or `'1'`)
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::from_index(byte.wrapping_sub(b'0'))
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        b'0' + self.index()
    }
}

/// Identifier of a snake, carried on the wire as one ASCII digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnakeId(u8);

impl SnakeId {
    /// Highest id that fits in one ASCII digit
    pub const MAX: u8 = 9;

    /// Create an id (0-9)
    pub const fn new(id: u8) -> Option<Self> {
        if id <= Self::MAX {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Numeric value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Parse an id from its ASCII digit
    pub fn from_byte(byte: u8) -> Option<Self> {
        if byte.is_ascii_digit() {
            Some(Self(byte - b'0'))
        } else {
            None
        }
    }

    /// Convert to ASCII digit
    pub fn to_byte(self) -> u8 {
        b'0' + self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_bytes() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_byte(dir.to_byte()), Some(dir));
        }
        assert_eq!(Direction::Up.to_byte(), b'U');
        assert_eq!(Direction::from_byte(b'X'), None);
        assert_eq!(Direction::from_byte(b'u'), None);
    }

    #[test]
    fn test_opposite() {
        for dir in Direction::ALL {
            assert_ne!(dir, dir.opposite());
            assert_eq!(dir, dir.opposite().opposite());
            assert_eq!(dir.is_vertical(), dir.opposite().is_vertical());
        }
    }

    #[test]
    fn test_layer_bytes() {
        assert_eq!(Layer::from_byte(b'0'), Some(Layer::Upper));
        assert_eq!(Layer::from_byte(b'1'), Some(Layer::Lower));
        assert_eq!(Layer::from_byte(b'2'), None);
        assert_eq!(Layer::from_byte(0), None);
        assert_eq!(Layer::Lower.to_byte(), b'1');
        assert_eq!(Layer::Upper.other(), Layer::Lower);
    }

    #[test]
    fn test_snake_id() {
        assert_eq!(SnakeId::new(10), None);
        let id = SnakeId::new(7).unwrap();
        assert_eq!(id.to_byte(), b'7');
        assert_eq!(SnakeId::from_byte(b'7'), Some(id));
        assert_eq!(SnakeId::from_byte(b'a'), None);
        assert_eq!(SnakeId::from_byte(7), None);
    }
}
