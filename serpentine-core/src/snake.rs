//! Snake aggregate
//!
//! A snake owns its segment ring plus the queue of waypoints that tell the
//! tail where the head changed course. Index bookkeeping is left to the
//! caller: every mutation reports the segment that became committed.

use heapless::Deque;
use serpentine_protocol::{Direction, Layer, SnakeId};

use crate::geometry::{BoundaryMode, Bounds, Point};
use crate::ring::{Committed, HeadStep, Push, RingError, SegmentRing, TailStep, RING_CAPACITY};

/// Who decides this snake's fate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    /// Driven by this board's joystick; collisions checked here
    Local,
    /// Mirror of the peer's snake; driven by link messages
    Remote,
}

/// Errors from steering a snake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnError {
    /// No snake with that id
    Unknown,
    /// Dead snakes do not move
    Dead,
    /// Refused by the ring
    Ring(RingError),
}

impl From<RingError> for TurnError {
    fn from(e: RingError) -> Self {
        TurnError::Ring(e)
    }
}

/// A course change the tail has not reached yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Waypoint {
    /// Last cell before the change
    pub at: Point,
    pub direction: Direction,
    pub layer: Layer,
}

/// One snake on the board
#[derive(Debug, Clone)]
pub struct Snake {
    id: SnakeId,
    colour: u16,
    control: Control,
    ring: SegmentRing<RING_CAPACITY>,
    waypoints: Deque<Waypoint, RING_CAPACITY>,
    dead: bool,
}

impl Snake {
    /// Spawn a snake that grows to `length` cells
    pub fn new(
        id: SnakeId,
        start: Point,
        direction: Direction,
        colour: u16,
        length: u16,
        control: Control,
    ) -> Self {
        Self {
            id,
            colour,
            control,
            ring: SegmentRing::new(start, direction, Layer::Upper, length.saturating_sub(1)),
            waypoints: Deque::new(),
            dead: false,
        }
    }

    pub fn id(&self) -> SnakeId {
        self.id
    }

    /// RGB565 colour
    pub fn colour(&self) -> u16 {
        self.colour
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn set_control(&mut self, control: Control) {
        self.control = control;
    }

    pub fn is_local(&self) -> bool {
        self.control == Control::Local
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn ring(&self) -> &SegmentRing<RING_CAPACITY> {
        &self.ring
    }

    /// See [`SegmentRing::mark_indexed`]
    pub fn mark_indexed(&mut self, slot: usize) {
        self.ring.mark_indexed(slot);
    }

    /// Cell the head occupies
    pub fn head(&self) -> Point {
        self.ring.head().end
    }

    pub fn direction(&self) -> Direction {
        self.ring.direction()
    }

    pub fn layer(&self) -> Layer {
        self.ring.layer()
    }

    /// Course changes between tail and head, oldest first
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> + '_ {
        self.waypoints.iter()
    }

    /// Heading and layer the tail is currently following
    pub fn tail_course(&self) -> (Direction, Layer) {
        let tail = self.ring.tail();
        (tail.direction, tail.layer)
    }

    /// Change heading
    pub fn turn(&mut self, direction: Direction) -> Result<Option<Committed>, TurnError> {
        if self.dead {
            return Err(TurnError::Dead);
        }
        let push = self.ring.turn(direction)?;
        Ok(self.record(push))
    }

    /// Move to another layer
    pub fn set_layer(&mut self, layer: Layer) -> Result<Option<Committed>, TurnError> {
        if self.dead {
            return Err(TurnError::Dead);
        }
        let push = self.ring.set_layer(layer)?;
        Ok(self.record(push))
    }

    fn record(&mut self, push: Push) -> Option<Committed> {
        let waypoint = Waypoint {
            at: self.ring.head().start,
            direction: self.ring.direction(),
            layer: self.ring.layer(),
        };
        match push {
            Push::InPlace => {
                // A rewritten head keeps its waypoint, if it has one
                if self.ring.len() > 1 {
                    if let Some(last) = self.waypoints.back_mut() {
                        last.direction = waypoint.direction;
                        last.layer = waypoint.layer;
                    }
                }
                None
            }
            Push::Pushed { corner, committed } => {
                self.queue(Waypoint {
                    at: corner,
                    ..waypoint
                });
                committed
            }
        }
    }

    fn queue(&mut self, waypoint: Waypoint) {
        // The ring refuses pushes before the queue can fill
        let pushed = self.waypoints.push_back(waypoint);
        debug_assert!(pushed.is_ok(), "waypoint queue overflow");
    }

    /// Mark dead; returns false if it already was
    pub fn kill(&mut self) -> bool {
        !core::mem::replace(&mut self.dead, true)
    }

    /// Move the head one cell
    pub fn advance_head(&mut self, bounds: &Bounds, mode: BoundaryMode) -> Result<HeadStep, RingError> {
        let step = self.ring.advance_head(bounds, mode)?;
        if let HeadStep::Wrapped { seam, .. } = step {
            self.queue(Waypoint {
                at: seam,
                direction: self.ring.direction(),
                layer: self.ring.layer(),
            });
        }
        Ok(step)
    }

    /// Move the tail one cell, consuming a waypoint when a segment retires
    pub fn advance_tail(&mut self) -> TailStep {
        let step = self.ring.advance_tail();
        if let TailStep::Moved { retired: true, .. } = step {
            let waypoint = self.waypoints.pop_front();
            debug_assert!(
                waypoint.is_some_and(|w| (w.direction, w.layer) == self.tail_course()),
                "tail left its course without a waypoint"
            );
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snake(length: u16) -> Snake {
        Snake::new(
            SnakeId::new(0).unwrap(),
            Point::new(20, 20),
            Direction::Down,
            0xFF00,
            length,
            Control::Local,
        )
    }

    fn tick(s: &mut Snake) -> TailStep {
        s.advance_head(&Bounds::default(), BoundaryMode::Kill).unwrap();
        s.advance_tail()
    }

    #[test]
    fn test_spawn() {
        let s = snake(20);
        assert_eq!(s.head(), Point::new(20, 20));
        assert_eq!(s.ring().pending(), 19);
        assert_eq!(s.layer(), Layer::Upper);
        assert!(!s.is_dead());
        assert_eq!(s.waypoints().count(), 0);
    }

    #[test]
    fn test_turn_records_waypoint() {
        let mut s = snake(20);
        for _ in 0..10 {
            tick(&mut s);
        }
        s.turn(Direction::Right).unwrap();
        let wp: heapless::Vec<Waypoint, 4> = s.waypoints().copied().collect();
        assert_eq!(
            wp.as_slice(),
            &[Waypoint {
                at: Point::new(20, 30),
                direction: Direction::Right,
                layer: Layer::Upper
            }]
        );
    }

    #[test]
    fn test_double_turn_in_one_tick_rewrites_waypoint() {
        let mut s = snake(20);
        tick(&mut s);
        s.turn(Direction::Right).unwrap();
        s.set_layer(Layer::Lower).unwrap();
        assert_eq!(s.ring().len(), 2);
        let last = s.waypoints().last().copied();
        assert_eq!(
            last,
            Some(Waypoint {
                at: Point::new(20, 21),
                direction: Direction::Right,
                layer: Layer::Lower
            })
        );
    }

    #[test]
    fn test_tail_consumes_waypoints() {
        let mut s = snake(3);
        tick(&mut s);
        tick(&mut s);
        s.turn(Direction::Left).unwrap();
        assert_eq!(s.waypoints().count(), 1);
        // Tail walks (20,20)->(20,22) then reaches the corner
        tick(&mut s);
        tick(&mut s);
        assert_eq!(s.waypoints().count(), 0);
        assert_eq!(s.tail_course(), (Direction::Left, Layer::Upper));
    }

    #[test]
    fn test_dead_snake_refuses_turns() {
        let mut s = snake(5);
        assert!(s.kill());
        assert!(!s.kill());
        assert_eq!(s.turn(Direction::Left), Err(TurnError::Dead));
        assert_eq!(s.set_layer(Layer::Lower), Err(TurnError::Dead));
    }

    #[test]
    fn test_reversal_rejected() {
        let mut s = snake(5);
        assert_eq!(
            s.turn(Direction::Up),
            Err(TurnError::Ring(RingError::Reversal))
        );
        assert_eq!(
            s.turn(Direction::Down),
            Err(TurnError::Ring(RingError::Unchanged))
        );
    }

    #[test]
    fn test_seam_waypoint() {
        let mut s = Snake::new(
            SnakeId::new(1).unwrap(),
            Point::new(126, 5),
            Direction::Right,
            0,
            4,
            Control::Remote,
        );
        let bounds = Bounds::default();
        s.advance_head(&bounds, BoundaryMode::Wrap).unwrap();
        let step = s.advance_head(&bounds, BoundaryMode::Wrap).unwrap();
        assert!(matches!(step, HeadStep::Wrapped { .. }));
        assert_eq!(s.head(), Point::new(0, 5));
        assert_eq!(
            s.waypoints().next().map(|w| w.at),
            Some(Point::new(127, 5))
        );
    }
}
