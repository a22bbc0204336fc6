//! Snake event messages
//!
//! Message layout (three bytes, no framing or checksum; the wired link is
//! in-order and lossless):
//! ```text
//! ┌──────┬──────────┬─────────┐
//! │ KIND │ SNAKE ID │ PAYLOAD │
//! │ 'D'  │ '0'-'9'  │ U/R/D/L │
//! │ 'L'  │ '0'-'9'  │ '0'/'1' │
//! │ 'K'  │ '0'-'9'  │ id      │
//! └──────┴──────────┴─────────┘
//! ```

use crate::wire::{
    Direction, Layer, SnakeId, KIND_DIRECTION, KIND_KILL, KIND_LAYER, MESSAGE_LEN,
};

/// Errors that can occur while decoding a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// First byte is not a known message kind
    UnknownKind(u8),
    /// Snake id byte is not an ASCII digit
    InvalidSnakeId(u8),
    /// Payload byte is not valid for this kind
    InvalidPayload(u8),
}

/// An event concerning one snake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Snake changed heading
    Direction { snake: SnakeId, direction: Direction },
    /// Snake changed layer
    Layer { snake: SnakeId, layer: Layer },
    /// Snake died on its owner's board
    Kill { snake: SnakeId },
}

impl Message {
    /// The snake this message concerns
    pub fn snake(&self) -> SnakeId {
        match *self {
            Message::Direction { snake, .. }
            | Message::Layer { snake, .. }
            | Message::Kill { snake } => snake,
        }
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        match *self {
            Message::Direction { snake, direction } => {
                [KIND_DIRECTION, snake.to_byte(), direction.to_byte()]
            }
            Message::Layer { snake, layer } => [KIND_LAYER, snake.to_byte(), layer.to_byte()],
            // The id is repeated in the payload slot
            Message::Kill { snake } => [KIND_KILL, snake.to_byte(), snake.to_byte()],
        }
    }

    /// Decode a complete three-byte message
    pub fn decode(bytes: [u8; MESSAGE_LEN]) -> Result<Self, DecodeError> {
        let [kind, id, payload] = bytes;

        if !is_kind(kind) {
            return Err(DecodeError::UnknownKind(kind));
        }
        let snake = SnakeId::from_byte(id).ok_or(DecodeError::InvalidSnakeId(id))?;

        match kind {
            KIND_DIRECTION => {
                let direction =
                    Direction::from_byte(payload).ok_or(DecodeError::InvalidPayload(payload))?;
                Ok(Message::Direction { snake, direction })
            }
            KIND_LAYER => {
                let layer = Layer::from_byte(payload).ok_or(DecodeError::InvalidPayload(payload))?;
                Ok(Message::Layer { snake, layer })
            }
            // Both id bytes are consumed; the first one names the snake
            _ => Ok(Message::Kill { snake }),
        }
    }
}

/// Check whether a byte starts a message
pub fn is_kind(byte: u8) -> bool {
    matches!(byte, KIND_DIRECTION | KIND_LAYER | KIND_KILL)
}
