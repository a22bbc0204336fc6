//! Segment ring
//!
//! A snake body is a run of axis-aligned segments stored in a fixed-size
//! circular buffer. The head segment grows at its `end`, the tail segment
//! shrinks at its `start`, so a tick costs O(1) regardless of body length.
//!
//! ```text
//!  tail                           head
//!   ▼                              ▼
//!  [s─────e][s──────e][s──e][s────────e]
//!            └── committed ──┘
//! ```
//!
//! Consecutive segments share a corner cell (`next.start == prev.end`),
//! except across a wrap seam where the next segment starts on the far edge.

use serpentine_protocol::{Direction, Layer};

use crate::geometry::{BoundaryMode, Bounds, Point, Segment, Step};

/// Segments per snake
pub const RING_CAPACITY: usize = 128;

/// Errors from ring mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// No free slot for another segment
    Full,
    /// Requested heading is the reverse of the current one
    Reversal,
    /// Requested heading or layer is already current
    Unchanged,
}

/// A segment that stopped being the head and can be indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Committed {
    /// Ring slot holding the segment, for [`SegmentRing::mark_indexed`]
    pub slot: usize,
    pub segment: Segment,
}

/// Outcome of a turn or layer change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Push {
    /// The head had not moved yet and was rewritten
    InPlace,
    /// A new head segment was pushed at the old head's end
    Pushed {
        corner: Point,
        committed: Option<Committed>,
    },
}

/// Outcome of moving the head one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeadStep {
    /// Head moved inside the board
    Moved(Point),
    /// Head crossed an edge; `seam` is the last cell before the edge
    Wrapped {
        head: Point,
        seam: Point,
        committed: Option<Committed>,
    },
    /// Head would leave the board in kill mode; nothing changed
    Outside,
}

/// Outcome of moving the tail one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TailStep {
    /// Tail did not move (still growing)
    Held,
    /// Tail vacated a cell
    Moved {
        vacated: Point,
        layer: Layer,
        /// The tail segment was used up and dropped
        retired: bool,
        /// The new tail segment, if it had been indexed
        released: Option<Segment>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    segment: Segment,
    indexed: bool,
}

/// Fixed-capacity circular buffer of segments
///
/// `N` must be at least 2. The ring is full when `head + 1 == tail`
/// (mod `N`); growth is then refused rather than wrapped.
#[derive(Debug, Clone)]
pub struct SegmentRing<const N: usize> {
    slots: [Slot; N],
    head: usize,
    tail: usize,
    /// Tail moves still suspended
    pending: u16,
}

impl<const N: usize> SegmentRing<N> {
    /// Create a single-cell body that will grow by `pending` cells
    pub fn new(start: Point, direction: Direction, layer: Layer, pending: u16) -> Self {
        debug_assert!(N >= 2, "ring needs at least two slots");
        let seed = Slot {
            segment: Segment::at(start, direction, layer),
            indexed: false,
        };
        Self {
            slots: [seed; N],
            head: 0,
            tail: 0,
            pending,
        }
    }

    /// Number of live segments
    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N + 1
    }

    /// Always false; a ring holds at least one segment
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if no further segment can be pushed
    pub fn is_full(&self) -> bool {
        (self.head + 1) % N == self.tail
    }

    pub fn head(&self) -> &Segment {
        &self.slots[self.head].segment
    }

    pub fn tail(&self) -> &Segment {
        &self.slots[self.tail].segment
    }

    /// Segment just behind the head, if the body has one
    pub fn neck(&self) -> Option<&Segment> {
        (self.head != self.tail).then(|| &self.slots[(self.head + N - 1) % N].segment)
    }

    /// Current heading
    pub fn direction(&self) -> Direction {
        self.head().direction
    }

    /// Current layer
    pub fn layer(&self) -> Layer {
        self.head().layer
    }

    /// Remaining growth
    pub fn pending(&self) -> u16 {
        self.pending
    }

    /// Segments from tail to head
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        (0..self.len()).map(move |i| &self.slots[(self.tail + i) % N].segment)
    }

    /// Record that a committed segment made it into the spatial index
    pub fn mark_indexed(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.indexed = true;
        }
    }

    /// Change heading
    ///
    /// Rejected for the current heading, its reverse, or a full ring.
    pub fn turn(&mut self, direction: Direction) -> Result<Push, RingError> {
        let current = self.direction();
        if direction == current {
            return Err(RingError::Unchanged);
        }
        if direction == current.opposite() {
            return Err(RingError::Reversal);
        }
        self.push(direction, self.layer())
    }

    /// Change layer, keeping the heading
    pub fn set_layer(&mut self, layer: Layer) -> Result<Push, RingError> {
        if layer == self.layer() {
            return Err(RingError::Unchanged);
        }
        self.push(self.direction(), layer)
    }

    fn push(&mut self, direction: Direction, layer: Layer) -> Result<Push, RingError> {
        if self.is_full() {
            return Err(RingError::Full);
        }

        let head = &mut self.slots[self.head].segment;
        if head.is_point() {
            // Nothing drawn along the old heading yet
            head.direction = direction;
            head.layer = layer;
            return Ok(Push::InPlace);
        }

        let corner = head.end;
        let committed = self.push_segment(Segment::at(corner, direction, layer));
        Ok(Push::Pushed { corner, committed })
    }

    fn push_segment(&mut self, segment: Segment) -> Option<Committed> {
        let old = self.head;
        self.head = (self.head + 1) % N;
        self.slots[self.head] = Slot {
            segment,
            indexed: false,
        };

        (old != self.tail).then(|| Committed {
            slot: old,
            segment: self.slots[old].segment,
        })
    }

    /// Move the head one cell along its heading
    ///
    /// Crossing an edge in wrap mode pushes a seam segment, which fails with
    /// [`RingError::Full`] if the ring has no room.
    pub fn advance_head(&mut self, bounds: &Bounds, mode: BoundaryMode) -> Result<HeadStep, RingError> {
        let head = *self.head();
        match bounds.step(head.end, head.direction, mode) {
            Step::Inside(p) => {
                self.slots[self.head].segment.end = p;
                Ok(HeadStep::Moved(p))
            }
            Step::Outside => Ok(HeadStep::Outside),
            Step::Wrapped(p) => {
                if self.is_full() {
                    return Err(RingError::Full);
                }
                let committed = self.push_segment(Segment::at(p, head.direction, head.layer));
                Ok(HeadStep::Wrapped {
                    head: p,
                    seam: head.end,
                    committed,
                })
            }
        }
    }

    /// Move the tail one cell, or consume one tick of pending growth
    pub fn advance_tail(&mut self) -> TailStep {
        if self.pending > 0 {
            self.pending -= 1;
            return TailStep::Held;
        }

        let tail = *self.tail();

        if tail.is_point() {
            if self.tail == self.head {
                return TailStep::Held;
            }
            // Used-up segment before a seam: its last cell goes now
            let released = self.retire();
            return TailStep::Moved {
                vacated: tail.start,
                layer: tail.layer,
                retired: true,
                released,
            };
        }

        let start = tail.start.toward(tail.end);
        self.slots[self.tail].segment.start = start;

        let retired = start == tail.end
            && self.tail != self.head
            && self.slots[(self.tail + 1) % N].segment.start == tail.end;
        let released = if retired { self.retire() } else { None };

        TailStep::Moved {
            vacated: tail.start,
            layer: tail.layer,
            retired,
            released,
        }
    }

    fn retire(&mut self) -> Option<Segment> {
        self.tail = (self.tail + 1) % N;
        let slot = &mut self.slots[self.tail];
        core::mem::replace(&mut slot.indexed, false).then_some(slot.segment)
    }
}
