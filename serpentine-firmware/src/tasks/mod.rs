//! Embassy async tasks

pub mod game;

pub use game::{game_task, Game};
