//! Collision detection
//!
//! A head is tested after every snake has moved for the tick. Open
//! segments (heads and tails) change every tick and are tested directly;
//! everything in between lives in the spatial index.

use serpentine_protocol::SnakeId;

use crate::index::Trails;
use crate::snake::Snake;

/// What a head ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Collision {
    /// Its own neck or tail
    OwnBody,
    /// Another snake's open head or tail segment
    Snake(SnakeId),
    /// A committed segment of any snake
    Trail,
}

/// Test the head of `snakes[mover]` against everything on its layer
///
/// Returns the first hit found.
pub fn detect(snakes: &[Snake], trails: &Trails, mover: usize) -> Option<Collision> {
    let snake = snakes.get(mover)?;
    let ring = snake.ring();
    let tip = snake.head();
    let layer = snake.layer();

    // A straight head segment cannot cross itself
    if let Some(neck) = ring.neck() {
        if neck.occupies(tip, layer) {
            return Some(Collision::OwnBody);
        }
        let tail = ring.tail();
        if tail.occupies(tip, layer) {
            return Some(Collision::OwnBody);
        }
    }

    for (i, other) in snakes.iter().enumerate() {
        if i == mover {
            continue;
        }
        let other_ring = other.ring();
        if other_ring.head().occupies(tip, layer) || other_ring.tail().occupies(tip, layer) {
            return Some(Collision::Snake(other.id()));
        }
    }

    trails.hits(tip, layer).then_some(Collision::Trail)
}
