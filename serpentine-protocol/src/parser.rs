//! Streaming message parser
//!
//! Bytes arrive from the UART one at a time and a message may straddle two
//! polls. The parser buffers partial messages and only yields complete,
//! well-formed ones.

use crate::message::{is_kind, DecodeError, Message};
use crate::wire::{ACK, CONNECT, MESSAGE_LEN};

/// State machine for parsing incoming messages
#[derive(Debug, Clone)]
pub struct MessageParser {
    state: ParseState,
    buffer: [u8; MESSAGE_LEN],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for a kind byte
    WaitingForKind,
    /// Got kind, waiting for snake id
    WaitingForId,
    /// Got id, waiting for payload
    WaitingForPayload,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageParser {
    /// Create a new message parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForKind,
            buffer: [0; MESSAGE_LEN],
        }
    }

    /// Reset the parser state, dropping any partial message
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForKind;
        self.buffer = [0; MESSAGE_LEN];
    }

    /// True while part of a message has been received
    pub fn is_partial(&self) -> bool {
        self.state != ParseState::WaitingForKind
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(message))` when a complete valid message is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when the byte stream
    /// is malformed. The parser resynchronises on the next kind byte.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Message>, DecodeError> {
        match self.state {
            ParseState::WaitingForKind => {
                if is_kind(byte) {
                    self.buffer[0] = byte;
                    self.state = ParseState::WaitingForId;
                    Ok(None)
                } else if byte == ACK || byte == CONNECT {
                    // Late handshake retries from the peer
                    Ok(None)
                } else {
                    Err(DecodeError::UnknownKind(byte))
                }
            }
            ParseState::WaitingForId => {
                self.buffer[1] = byte;
                self.state = ParseState::WaitingForPayload;
                Ok(None)
            }
            ParseState::WaitingForPayload => {
                self.buffer[2] = byte;
                let bytes = self.buffer;
                self.reset();
                Message::decode(bytes).map(Some)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete message found, if any.
    /// Remaining bytes after a complete message are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Message>, DecodeError> {
        for &byte in bytes {
            if let Some(message) = self.feed(byte)? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}
