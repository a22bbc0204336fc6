//! Board geometry
//!
//! The board is a grid of `width × height` cells addressed by `u8`
//! coordinates, `y` growing downwards. Snakes are built from axis-aligned
//! segments between two cells.

use serpentine_protocol::{Direction, Layer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell in `direction`, or `None` past the `u8` range
    pub fn offset(self, direction: Direction) -> Option<Self> {
        let Point { x, y } = self;
        let (x, y) = match direction {
            Direction::Up => (Some(x), y.checked_sub(1)),
            Direction::Right => (x.checked_add(1), Some(y)),
            Direction::Down => (Some(x), y.checked_add(1)),
            Direction::Left => (x.checked_sub(1), Some(y)),
        };
        Some(Self::new(x?, y?))
    }

    /// One cell closer to `target` along a shared row or column
    pub fn toward(self, target: Point) -> Self {
        fn closer(from: u8, to: u8) -> u8 {
            match from.cmp(&to) {
                core::cmp::Ordering::Less => from + 1,
                core::cmp::Ordering::Greater => from - 1,
                core::cmp::Ordering::Equal => from,
            }
        }
        Self::new(closer(self.x, target.x), closer(self.y, target.y))
    }
}

/// What happens when a head steps off the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundaryMode {
    /// Leaving the board is fatal
    #[default]
    Kill,
    /// Re-enter on the opposite edge
    Wrap,
}

/// Result of moving one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Ordinary move inside the board
    Inside(Point),
    /// Crossed an edge and re-entered opposite
    Wrapped(Point),
    /// Left the board (kill mode)
    Outside,
}

/// Play area dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounds {
    pub width: u8,
    pub height: u8,
}

impl Bounds {
    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    /// Check if a cell lies on the board
    pub fn contains(&self, p: Point) -> bool {
        p.x < self.width && p.y < self.height
    }

    /// Move one cell from `from` in `direction` under `mode`
    pub fn step(&self, from: Point, direction: Direction, mode: BoundaryMode) -> Step {
        let (dx, dy): (i16, i16) = match direction {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        };
        let x = i16::from(from.x) + dx;
        let y = i16::from(from.y) + dy;
        let w = i16::from(self.width);
        let h = i16::from(self.height);

        if (0..w).contains(&x) && (0..h).contains(&y) {
            // Both values are inside u8 range here
            return Step::Inside(Point::new(x as u8, y as u8));
        }

        match mode {
            BoundaryMode::Kill => Step::Outside,
            BoundaryMode::Wrap => {
                let x = x.rem_euclid(w.max(1));
                let y = y.rem_euclid(h.max(1));
                Step::Wrapped(Point::new(x as u8, y as u8))
            }
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(128, 160)
    }
}

/// Axis-aligned piece of a snake body
///
/// `start` is the tail-side endpoint and `end` the head-side one. Both
/// endpoints are occupied cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub layer: Layer,
    pub direction: Direction,
}

impl Segment {
    /// Create a single-cell segment
    pub fn at(start: Point, direction: Direction, layer: Layer) -> Self {
        Self {
            start,
            end: start,
            layer,
            direction,
        }
    }

    /// True when the segment runs along the y axis
    pub fn is_vertical(&self) -> bool {
        self.direction.is_vertical()
    }

    /// The coordinate shared by every cell (x for vertical, y for horizontal)
    pub fn pivot(&self) -> u8 {
        if self.is_vertical() {
            self.start.x
        } else {
            self.start.y
        }
    }

    /// Start and end coordinates along the moving axis
    pub fn span(&self) -> (u8, u8) {
        if self.is_vertical() {
            (self.start.y, self.end.y)
        } else {
            (self.start.x, self.end.x)
        }
    }

    /// True when start and end coincide
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Number of cells covered
    pub fn cells(&self) -> u16 {
        let (near, far) = self.span();
        u16::from(near.abs_diff(far)) + 1
    }

    /// Check if the segment covers `p` (layer not considered)
    pub fn contains(&self, p: Point) -> bool {
        let (near, far) = self.span();
        let (fixed, along) = if self.is_vertical() {
            (p.x, p.y)
        } else {
            (p.y, p.x)
        };
        fixed == self.pivot() && near.min(far) <= along && along <= near.max(far)
    }

    /// Check if the segment covers `p` on `layer`
    pub fn occupies(&self, p: Point, layer: Layer) -> bool {
        self.layer == layer && self.contains(p)
    }
}
