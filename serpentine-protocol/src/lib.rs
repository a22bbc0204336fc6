//! Serpentine Peer Link Protocol
//!
//! This crate defines the UART protocol between the two boards of a
//! Serpentine match. Each board simulates every snake locally; the link only
//! carries the events that change a snake's course.
//!
//! # Protocol Overview
//!
//! A three-byte handshake opens the link (`'C'`, `'A'`, `'A'`). After that
//! every message is exactly three ASCII bytes:
//! ```text
//! ┌──────┬──────────┬─────────┐
//! │ KIND │ SNAKE ID │ PAYLOAD │
//! │ 1B   │ 1B       │ 1B      │
//! └──────┴──────────┴─────────┘
//! ```
//!
//! There is no framing or checksum. The link is a short wired UART, so bytes
//! arrive in order and are not lost; the parser still resynchronises on
//! garbage so a noisy cable cannot wedge it.

#![no_std]
#![deny(unsafe_code)]

pub mod handshake;
pub mod message;
pub mod parser;
pub mod wire;

pub use handshake::{Handshake, LinkEvent, LinkState, Role};
pub use message::{DecodeError, Message};
pub use parser::MessageParser;
pub use wire::{Direction, Layer, SnakeId, ACK, CONNECT, MESSAGE_LEN};
