//! Board-agnostic game engine for the Serpentine firmware
//!
//! This crate contains all game logic that does not depend on specific
//! hardware implementations:
//!
//! - Snake bodies as rings of axis-aligned segments
//! - A spatial index of committed segments for collision tests
//! - The per-match context and its tick
//! - Peer synchronisation over a serial link
//! - Hardware abstraction traits (clock, joystick, screen, serial)
//! - Configuration types and a `game.toml` reader

#![no_std]
#![deny(unsafe_code)]

pub mod collision;
pub mod config;
pub mod diagnostics;
pub mod game;
pub mod geometry;
pub mod index;
pub mod input;
pub mod ring;
pub mod snake;
pub mod sync;
pub mod tick;
pub mod traits;

pub use diagnostics::Diagnostics;
pub use game::{Death, DeathCause, Match, Move, TickReport};
pub use geometry::{BoundaryMode, Bounds, Point};
pub use tick::{Poll, RunError, TickLoop};
