//! Match state
//!
//! One [`Match`] owns every snake and the spatial index for a game. All
//! mutation goes through it so the index always mirrors the rings.
//!
//! A tick runs in three phases:
//! 1. every live snake moves head then tail, updating the index
//! 2. every live local snake's head is tested for collisions
//! 3. deaths are applied
//!
//! Testing only after everyone has moved means two heads entering the same
//! cell kill each other, whatever order the snakes are stored in.

use heapless::Vec;
use serpentine_protocol::{Direction, Layer, SnakeId};

use crate::collision::{self, Collision};
use crate::config::{ConfigError, GameConfig, MAX_SNAKES};
use crate::diagnostics::{bump, Diagnostics};
use crate::geometry::{BoundaryMode, Bounds, Point, Segment};
use crate::index::{IndexError, Trails};
use crate::ring::{Committed, HeadStep, RingError, TailStep};
use crate::snake::{Control, Snake, TurnError};

/// Why a snake died
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeathCause {
    /// Its head hit something
    Collision(Collision),
    /// It left the board in kill mode
    Boundary,
    /// It crossed a seam with a full ring
    Capacity,
}

/// A death during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Death {
    pub snake: SnakeId,
    pub cause: DeathCause,
    /// Local deaths must be announced to the peer
    pub local: bool,
}

/// Cells that changed for one snake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Move {
    pub snake: SnakeId,
    pub colour: u16,
    /// New head cell
    pub head: Option<(Point, Layer)>,
    /// Cell given up by the tail
    pub vacated: Option<(Point, Layer)>,
}

/// Everything a tick changed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub tick: u32,
    pub moves: Vec<Move, MAX_SNAKES>,
    pub deaths: Vec<Death, MAX_SNAKES>,
}

/// Per-match context
#[derive(Debug, Clone)]
pub struct Match {
    bounds: Bounds,
    mode: BoundaryMode,
    snakes: Vec<Snake, MAX_SNAKES>,
    trails: Trails,
    diagnostics: Diagnostics,
    ticks: u32,
}

impl Match {
    /// Set up a match from a configuration
    ///
    /// The snake named by `local_snake` is local; every other one is a
    /// remote mirror.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut snakes = Vec::new();
        for spawn in &config.snakes {
            let control = if spawn.id == config.local_snake {
                Control::Local
            } else {
                Control::Remote
            };
            let snake = Snake::new(
                spawn.id,
                spawn.start(),
                spawn.direction,
                spawn.colour,
                config.starting_length,
                control,
            );
            // Capacity matches the config type
            let _ = snakes.push(snake);
        }

        Ok(Self {
            bounds: config.bounds(),
            mode: config.boundary,
            snakes,
            trails: Trails::new(),
            diagnostics: Diagnostics::new(),
            ticks: 0,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.mode
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.iter().find(|s| s.id() == id)
    }

    pub fn trails(&self) -> &Trails {
        &self.trails
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// The match ends once every snake is dead
    pub fn is_over(&self) -> bool {
        self.snakes.iter().all(Snake::is_dead)
    }

    fn position(&self, id: SnakeId) -> Option<usize> {
        self.snakes.iter().position(|s| s.id() == id)
    }

    /// Change who drives a snake; returns false for an unknown id
    pub fn set_control(&mut self, id: SnakeId, control: Control) -> bool {
        match self.position(id) {
            Some(i) => {
                self.snakes[i].set_control(control);
                true
            }
            None => false,
        }
    }

    /// Steer a snake
    pub fn turn(&mut self, id: SnakeId, direction: Direction) -> Result<(), TurnError> {
        let i = self.position(id).ok_or(TurnError::Unknown)?;
        let result = self.snakes[i].turn(direction);
        self.settle(i, result)
    }

    /// Move a snake to another layer
    pub fn set_layer(&mut self, id: SnakeId, layer: Layer) -> Result<(), TurnError> {
        let i = self.position(id).ok_or(TurnError::Unknown)?;
        let result = self.snakes[i].set_layer(layer);
        self.settle(i, result)
    }

    /// Kill a snake; `Ok(false)` if it was already dead
    pub fn kill(&mut self, id: SnakeId) -> Result<bool, TurnError> {
        let i = self.position(id).ok_or(TurnError::Unknown)?;
        Ok(self.snakes[i].kill())
    }

    fn settle(&mut self, i: usize, result: Result<Option<Committed>, TurnError>) -> Result<(), TurnError> {
        match result {
            Ok(Some(committed)) => {
                self.commit(i, committed);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                if e == TurnError::Ring(RingError::Full) {
                    bump(&mut self.diagnostics.ring_full);
                }
                Err(e)
            }
        }
    }

    fn commit(&mut self, i: usize, committed: Committed) {
        match self.trails.insert(&committed.segment) {
            Ok(()) => self.snakes[i].mark_indexed(committed.slot),
            Err(_) => bump(&mut self.diagnostics.index_full),
        }
    }

    fn release(&mut self, segment: &Segment) {
        if let Err(e) = self.trails.remove(segment) {
            debug_assert!(e != IndexError::NotFound, "released segment was not indexed");
            bump(&mut self.diagnostics.index_missing);
        }
    }

    /// Advance the world by one frame
    pub fn tick(&mut self) -> TickReport {
        self.ticks = self.ticks.wrapping_add(1);
        let mut moves = Vec::new();
        let mut doomed: Vec<(usize, DeathCause), MAX_SNAKES> = Vec::new();

        // Move
        for i in 0..self.snakes.len() {
            if self.snakes[i].is_dead() {
                continue;
            }
            let snake = &self.snakes[i];
            let mut change = Move {
                snake: snake.id(),
                colour: snake.colour(),
                head: None,
                vacated: None,
            };
            let layer = snake.layer();

            match self.snakes[i].advance_head(&self.bounds, self.mode) {
                Ok(HeadStep::Moved(p)) => change.head = Some((p, layer)),
                Ok(HeadStep::Wrapped {
                    head, committed, ..
                }) => {
                    if let Some(c) = committed {
                        self.commit(i, c);
                    }
                    change.head = Some((head, layer));
                }
                Ok(HeadStep::Outside) => {
                    let _ = doomed.push((i, DeathCause::Boundary));
                }
                Err(_) => {
                    bump(&mut self.diagnostics.ring_full);
                    let _ = doomed.push((i, DeathCause::Capacity));
                }
            }

            if change.head.is_some() {
                if let TailStep::Moved {
                    vacated,
                    layer,
                    released,
                    ..
                } = self.snakes[i].advance_tail()
                {
                    change.vacated = Some((vacated, layer));
                    if let Some(segment) = released {
                        self.release(&segment);
                    }
                }
            }
            let _ = moves.push(change);
        }

        // Test local heads
        for i in 0..self.snakes.len() {
            let snake = &self.snakes[i];
            if snake.is_dead() || !snake.is_local() || doomed.iter().any(|&(j, _)| j == i) {
                continue;
            }
            if let Some(hit) = collision::detect(&self.snakes, &self.trails, i) {
                let _ = doomed.push((i, DeathCause::Collision(hit)));
            }
        }

        // Apply deaths
        let mut deaths = Vec::new();
        for (i, cause) in doomed {
            let snake = &mut self.snakes[i];
            snake.kill();
            let _ = deaths.push(Death {
                snake: snake.id(),
                cause,
                local: snake.is_local(),
            });
        }

        TickReport {
            tick: self.ticks,
            moves,
            deaths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnakeSpawn;

    fn id(n: u8) -> SnakeId {
        SnakeId::new(n).unwrap()
    }

    fn config(spawns: &[(u8, u8, u8, Direction)]) -> GameConfig {
        let mut config = GameConfig::default();
        config.snakes.clear();
        for &(n, x, y, direction) in spawns {
            config
                .snakes
                .push(SnakeSpawn {
                    id: id(n),
                    x,
                    y,
                    direction,
                    colour: 0xFFFF,
                })
                .unwrap();
        }
        config.local_snake = id(spawns[0].0);
        config
    }

    fn all_local(game: &mut Match) {
        let ids: heapless::Vec<SnakeId, MAX_SNAKES> = game.snakes().iter().map(|s| s.id()).collect();
        for id in ids {
            game.set_control(id, Control::Local);
        }
    }

    #[test]
    fn test_default_match() {
        let game = Match::new(&GameConfig::default()).unwrap();
        assert_eq!(game.snakes().len(), MAX_SNAKES);
        assert!(game.snake(id(0)).unwrap().is_local());
        assert!(!game.snake(id(1)).unwrap().is_local());
        assert!(!game.is_over());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GameConfig::default();
        config.frame_interval_ms = 0;
        assert_eq!(
            Match::new(&config).err(),
            Some(ConfigError::ZeroFrameInterval)
        );
    }

    #[test]
    fn test_turn_at_tick_ten() {
        let mut game = Match::new(&GameConfig::default()).unwrap();
        for _ in 0..10 {
            game.tick();
        }
        game.turn(id(0), Direction::Right).unwrap();

        let snake = game.snake(id(0)).unwrap();
        assert_eq!(snake.ring().len(), 2);
        assert_eq!(snake.ring().head().start, Point::new(20, 30));
        let old = *snake.ring().neck().unwrap();
        assert_eq!(old.start, Point::new(20, 20));
        assert_eq!(old.end, Point::new(20, 30));

        game.tick();
        game.tick();
        let snake = game.snake(id(0)).unwrap();
        assert_eq!(snake.head(), Point::new(22, 30));
        // The old segment no longer grows
        assert_eq!(snake.ring().neck().map(|s| s.end), Some(Point::new(20, 30)));

        // A further turn commits the middle segment to the index
        game.turn(id(0), Direction::Up).unwrap();
        assert_eq!(game.trails().len(), 1);
        assert!(game.trails().hits(Point::new(21, 30), Layer::Upper));
    }

    #[test]
    fn test_head_on_same_cell_kills_both() {
        let mut game = Match::new(&config(&[
            (0, 10, 10, Direction::Right),
            (1, 12, 10, Direction::Left),
        ]))
        .unwrap();
        all_local(&mut game);

        let report = game.tick();
        assert_eq!(report.deaths.len(), 2);
        assert!(game.is_over());
    }

    #[test]
    fn test_head_on_kills_both_across_boards() {
        let spawns = [(0, 10, 20, Direction::Right), (1, 14, 20, Direction::Left)];
        let mut host = Match::new(&config(&spawns)).unwrap();
        let mut peer_config = config(&spawns);
        peer_config.local_snake = id(1);
        let mut client = Match::new(&peer_config).unwrap();

        assert!(host.tick().deaths.is_empty());
        assert!(client.tick().deaths.is_empty());

        // Both heads enter (12,20); each board sees its own snake die
        let on_host = host.tick();
        let on_client = client.tick();
        assert_eq!(on_host.deaths.len(), 1);
        assert_eq!(on_host.deaths[0].snake, id(0));
        assert!(on_host.deaths[0].local);
        assert_eq!(on_client.deaths.len(), 1);
        assert_eq!(on_client.deaths[0].snake, id(1));
        assert!(on_client.deaths[0].local);

        // The announced kills leave both boards agreeing
        assert_eq!(host.kill(id(1)), Ok(true));
        assert_eq!(client.kill(id(0)), Ok(true));
        assert!(host.is_over());
        assert!(client.is_over());
    }

    #[test]
    fn test_remote_snake_not_collision_checked() {
        let mut game = Match::new(&config(&[
            (0, 10, 10, Direction::Right),
            (1, 12, 10, Direction::Left),
        ]))
        .unwrap();

        let report = game.tick();
        assert_eq!(report.deaths.len(), 1);
        assert_eq!(report.deaths[0].snake, id(0));
        assert!(report.deaths[0].local);
        assert!(!game.snake(id(1)).unwrap().is_dead());
    }

    #[test]
    fn test_boundary_kill_mode() {
        let mut game = Match::new(&config(&[(0, 127, 5, Direction::Right)])).unwrap();
        let report = game.tick();
        assert_eq!(
            report.deaths.as_slice(),
            &[Death {
                snake: id(0),
                cause: DeathCause::Boundary,
                local: true
            }]
        );
        assert_eq!(game.snake(id(0)).unwrap().head(), Point::new(127, 5));
        assert!(report.moves[0].head.is_none());
    }

    #[test]
    fn test_remote_dies_at_boundary_too() {
        let mut game = Match::new(&config(&[
            (0, 50, 50, Direction::Right),
            (1, 0, 5, Direction::Left),
        ]))
        .unwrap();
        let report = game.tick();
        assert_eq!(report.deaths.len(), 1);
        assert_eq!(report.deaths[0].snake, id(1));
        assert!(!report.deaths[0].local);
    }

    #[test]
    fn test_wrap_mode_crosses_edge() {
        let mut config = config(&[(0, 126, 5, Direction::Right)]);
        config.boundary = BoundaryMode::Wrap;
        let mut game = Match::new(&config).unwrap();
        game.tick();
        let report = game.tick();
        assert!(report.deaths.is_empty());
        assert_eq!(report.moves[0].head, Some((Point::new(0, 5), Layer::Upper)));
    }

    #[test]
    fn test_dead_snake_stays_as_obstacle() {
        let mut game = Match::new(&config(&[
            (0, 5, 20, Direction::Right),
            (1, 10, 17, Direction::Down),
        ]))
        .unwrap();
        for _ in 0..3 {
            assert!(game.tick().deaths.is_empty());
        }
        // Snake 1 now covers (10,17)-(10,20)
        assert_eq!(game.kill(id(1)), Ok(true));
        assert!(game.tick().deaths.is_empty());

        let report = game.tick();
        assert_eq!(
            report.deaths.as_slice(),
            &[Death {
                snake: id(0),
                cause: DeathCause::Collision(Collision::Snake(id(1))),
                local: true
            }]
        );
        assert_eq!(game.snake(id(1)).unwrap().head(), Point::new(10, 20));
    }

    #[test]
    fn test_layer_isolation_in_match() {
        let mut game = Match::new(&config(&[
            (0, 10, 10, Direction::Right),
            (1, 12, 10, Direction::Left),
        ]))
        .unwrap();
        all_local(&mut game);
        game.set_layer(id(1), Layer::Lower).unwrap();
        let report = game.tick();
        assert!(report.deaths.is_empty());
        let report = game.tick();
        assert!(report.deaths.is_empty());
    }

    #[test]
    fn test_unknown_snake() {
        let mut game = Match::new(&GameConfig::default()).unwrap();
        assert_eq!(game.turn(id(9), Direction::Up), Err(TurnError::Unknown));
        assert_eq!(game.kill(id(9)), Err(TurnError::Unknown));
        assert!(!game.set_control(id(9), Control::Local));
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut game = Match::new(&GameConfig::default()).unwrap();
        assert_eq!(game.kill(id(1)), Ok(true));
        assert_eq!(game.kill(id(1)), Ok(false));
    }

    #[test]
    fn test_full_ring_counts() {
        let mut config = config(&[(0, 10, 10, Direction::Right)]);
        config.starting_length = 400;
        let mut game = Match::new(&config).unwrap();
        // Staircase until the ring runs out of segments
        let mut refused = None;
        for n in 0..200u32 {
            game.tick();
            let dir = if n % 2 == 0 { Direction::Down } else { Direction::Right };
            if game.turn(id(0), dir) == Err(TurnError::Ring(RingError::Full)) {
                refused = Some(n);
                break;
            }
        }
        assert_eq!(refused, Some(127));
        assert_eq!(game.diagnostics().ring_full, 1);
        assert_eq!(game.diagnostics().index_full, 0);
        assert_eq!(game.trails().len(), 126);
        assert!(!game.snake(id(0)).unwrap().is_dead());
    }

    #[test]
    fn test_index_mirrors_rings() {
        let mut game = Match::new(&config(&[(0, 20, 20, Direction::Right)])).unwrap();
        // Walk a square loop; the index should hold every committed
        // segment and nothing else
        let turns = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
        for n in 0..120u32 {
            if n % 6 == 5 {
                let dir = turns[(n / 6 % 4) as usize];
                let _ = game.turn(id(0), dir);
            }
            game.tick();
            let ring = game.snake(id(0)).unwrap().ring();
            let committed = ring.len().saturating_sub(2);
            assert_eq!(game.trails().len(), committed, "tick {}", n);
        }
        assert_eq!(game.diagnostics().index_missing, 0);
    }
}
