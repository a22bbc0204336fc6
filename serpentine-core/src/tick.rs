//! Frame loop
//!
//! [`TickLoop`] ties the match to its collaborators. The firmware calls
//! [`TickLoop::poll`] as often as it likes; the loop connects to the peer,
//! then runs one frame whenever the frame interval has elapsed:
//!
//! 1. retry messages the port refused last frame
//! 2. read the joystick and steer the local snake, telling the peer
//! 3. apply every message that has fully arrived
//! 4. tick the match
//! 5. announce local deaths
//! 6. redraw changed cells
//!
//! A due frame always ticks. Serial faults during play are counted in
//! [`Diagnostics::link_errors`] instead of ending the frame, so both boards
//! run the same number of ticks.

use serpentine_protocol::{Layer, LinkState, Message, SnakeId};

use crate::config::{ConfigError, GameConfig};
use crate::diagnostics::{bump, Diagnostics};
use crate::game::{Match, TickReport};
use crate::input::{Command, InputMapper};
use crate::sync::PeerLink;
use crate::traits::{Clock, DisplayError, Joystick, LinkError, PixelSink, SerialLink};

/// Errors that stop the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    Link(LinkError),
    Display(DisplayError),
}

impl From<LinkError> for RunError {
    fn from(e: LinkError) -> Self {
        RunError::Link(e)
    }
}

impl From<DisplayError> for RunError {
    fn from(e: DisplayError) -> Self {
        RunError::Display(e)
    }
}

/// Result of one [`TickLoop::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Poll {
    /// Handshake still running
    Connecting(LinkState),
    /// Nothing due yet
    Idle,
    /// A frame ran
    Ticked(TickReport),
    /// Every snake is dead
    Over,
}

/// Fixed-interval gate on a wrapping millisecond clock
#[derive(Debug, Clone, Copy)]
pub struct FrameTimer {
    interval: u32,
    last: u32,
}

impl FrameTimer {
    pub fn new(interval_ms: u32, now: u32) -> Self {
        Self {
            interval: interval_ms,
            last: now,
        }
    }

    /// Check if a frame is due, restarting the interval if so
    pub fn due(&mut self, now: u32) -> bool {
        if now.wrapping_sub(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Connecting,
    Playing,
    Over,
}

/// One board's game loop
pub struct TickLoop<C, J, D, L> {
    clock: C,
    joystick: J,
    display: D,
    peer: PeerLink<L>,
    game: Match,
    input: InputMapper,
    timer: FrameTimer,
    local: SnakeId,
    background: u16,
    phase: Phase,
}

impl<C, J, D, L> TickLoop<C, J, D, L>
where
    C: Clock,
    J: Joystick,
    D: PixelSink,
    L: SerialLink,
{
    /// Build a loop from a validated configuration
    pub fn new(config: &GameConfig, clock: C, joystick: J, display: D, link: L) -> Result<Self, ConfigError> {
        let game = Match::new(config)?;
        let now = clock.now_ms();
        Ok(Self {
            clock,
            joystick,
            display,
            peer: PeerLink::new(link, config.link.role, config.link.handshake_timeout_ms),
            game,
            input: InputMapper::new(config.joystick_threshold),
            timer: FrameTimer::new(config.frame_interval_ms, now),
            local: config.local_snake,
            background: config.background,
            phase: Phase::Start,
        })
    }

    pub fn game(&self) -> &Match {
        &self.game
    }

    pub fn peer(&self) -> &PeerLink<L> {
        &self.peer
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.game.diagnostics()
    }

    /// The snake this board drives
    pub fn local_snake(&self) -> SnakeId {
        self.local
    }

    /// Do whatever is due now
    pub fn poll(&mut self) -> Result<Poll, RunError> {
        let now = self.clock.now_ms();
        match self.phase {
            Phase::Start => {
                self.peer.begin(now)?;
                self.phase = Phase::Connecting;
                self.connect(now)
            }
            Phase::Connecting => self.connect(now),
            Phase::Playing => self.frame(now),
            // Hold off until every queued kill has gone out
            Phase::Over => {
                self.flush();
                if self.peer.pending() == 0 {
                    Ok(Poll::Over)
                } else {
                    Ok(Poll::Idle)
                }
            }
        }
    }

    fn connect(&mut self, now: u32) -> Result<Poll, RunError> {
        let state = self.peer.poll_handshake(now, self.game.diagnostics_mut())?;
        if !state.is_connected() {
            return Ok(Poll::Connecting(state));
        }

        self.display.clear(self.background)?;
        for snake in self.game.snakes() {
            if snake.layer() == Layer::Upper {
                self.display.draw_pixel(snake.head(), snake.colour())?;
            }
        }
        self.timer = FrameTimer::new(self.timer.interval, now);
        self.phase = Phase::Playing;
        Ok(Poll::Idle)
    }

    fn frame(&mut self, now: u32) -> Result<Poll, RunError> {
        if !self.timer.due(now) {
            return Ok(Poll::Idle);
        }

        self.flush();
        self.steer();
        self.pump();

        let report = self.game.tick();
        for death in report.deaths.iter().filter(|d| d.local) {
            self.send(Message::Kill { snake: death.snake });
        }
        if self.game.is_over() {
            self.phase = Phase::Over;
        }

        self.render(&report)?;
        Ok(Poll::Ticked(report))
    }

    fn send(&mut self, message: Message) {
        if self.peer.send(message).is_err() {
            bump(&mut self.game.diagnostics_mut().link_errors);
        }
    }

    fn flush(&mut self) {
        if self.peer.flush().is_err() {
            bump(&mut self.game.diagnostics_mut().link_errors);
        }
    }

    /// Apply every message that has fully arrived
    fn pump(&mut self) {
        loop {
            match self.peer.receive(self.game.diagnostics_mut()) {
                Ok(Some(message)) => {
                    if self.game.apply(message).is_err() {
                        bump(&mut self.game.diagnostics_mut().rejected_messages);
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    bump(&mut self.game.diagnostics_mut().link_errors);
                    break;
                }
            }
        }
    }

    /// Apply joystick input to the local snake
    fn steer(&mut self) {
        let alive = self.game.snake(self.local).is_some_and(|s| !s.is_dead());
        if !alive {
            return;
        }

        let sample = match self.joystick.sample() {
            Ok(sample) => sample,
            Err(_) => {
                bump(&mut self.game.diagnostics_mut().input_errors);
                return;
            }
        };

        let message = match self.input.map(sample) {
            Some(Command::Turn(direction)) => self
                .game
                .turn(self.local, direction)
                .ok()
                .map(|()| Message::Direction {
                    snake: self.local,
                    direction,
                }),
            Some(Command::ToggleLayer) => {
                let layer = self
                    .game
                    .snake(self.local)
                    .map_or(Layer::Upper, |s| s.layer().other());
                self.game
                    .set_layer(self.local, layer)
                    .ok()
                    .map(|()| Message::Layer {
                        snake: self.local,
                        layer,
                    })
            }
            None => None,
        };

        if let Some(message) = message {
            self.send(message);
        }
    }

    /// Erase vacated cells first so a head entering one stays drawn
    fn render(&mut self, report: &TickReport) -> Result<(), RunError> {
        for change in &report.moves {
            if let Some((cell, Layer::Upper)) = change.vacated {
                self.display.draw_pixel(cell, self.background)?;
            }
        }
        for change in &report.moves {
            if let Some((cell, Layer::Upper)) = change.head {
                self.display.draw_pixel(cell, change.colour)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::traits::{InputError, JoystickSample};
    use core::cell::Cell;
    use heapless::{Deque, Vec};
    use serpentine_protocol::{Direction, Role, ACK, CONNECT};

    struct FakeClock<'a>(&'a Cell<u32>);

    impl Clock for FakeClock<'_> {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
    }

    struct Stick(Option<JoystickSample>);

    impl Joystick for Stick {
        fn sample(&mut self) -> Result<JoystickSample, InputError> {
            self.0.take().ok_or(InputError::Conversion)
        }
    }

    #[derive(Default)]
    struct Screen {
        cleared: u8,
        pixels: Vec<(Point, u16), 256>,
    }

    impl PixelSink for Screen {
        fn draw_pixel(&mut self, at: Point, colour: u16) -> Result<(), DisplayError> {
            self.pixels.push((at, colour)).map_err(|_| DisplayError::OutOfBounds)
        }

        fn clear(&mut self, _colour: u16) -> Result<(), DisplayError> {
            self.cleared += 1;
            self.pixels.clear();
            Ok(())
        }
    }

    /// Port faults to inject, shared with the test body
    #[derive(Default)]
    struct Faults {
        reads: Cell<u8>,
        writes: Cell<u8>,
    }

    fn take(fault: &Cell<u8>) -> bool {
        let left = fault.get();
        fault.set(left.saturating_sub(1));
        left > 0
    }

    #[derive(Default)]
    struct Wire<'a> {
        inbound: Deque<u8, 64>,
        outbound: Vec<u8, 64>,
        faults: Option<&'a Faults>,
    }

    impl SerialLink for Wire<'_> {
        fn available(&mut self) -> Result<bool, LinkError> {
            if self.faults.is_some_and(|f| take(&f.reads)) {
                return Err(LinkError::Uart);
            }
            Ok(!self.inbound.is_empty())
        }

        fn read(&mut self) -> Result<u8, LinkError> {
            self.inbound.pop_front().ok_or(LinkError::Empty)
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
            if self.faults.is_some_and(|f| take(&f.writes)) {
                return Err(LinkError::Uart);
            }
            self.outbound
                .extend_from_slice(bytes)
                .map_err(|_| LinkError::Overflow)
        }
    }

    fn host_wire<'a>() -> Wire<'a> {
        let mut wire = Wire::default();
        wire.inbound.push_back(CONNECT).unwrap();
        wire.inbound.push_back(ACK).unwrap();
        wire
    }

    #[test]
    fn test_frame_timer() {
        let mut timer = FrameTimer::new(33, 0);
        assert!(!timer.due(32));
        assert!(timer.due(33));
        assert!(!timer.due(40));
        assert!(timer.due(70));
    }

    #[test]
    fn test_frame_timer_wraps() {
        let mut timer = FrameTimer::new(33, u32::MAX - 5);
        assert!(!timer.due(10));
        assert!(timer.due(27));
    }

    #[test]
    fn test_connects_then_ticks() {
        let now = Cell::new(0);
        let config = GameConfig::default();
        let mut game = TickLoop::new(
            &config,
            FakeClock(&now),
            Stick(None),
            Screen::default(),
            host_wire(),
        )
        .unwrap();

        assert_eq!(game.poll(), Ok(Poll::Idle));
        assert_eq!(game.peer().state(), LinkState::Data);
        assert_eq!(game.display().cleared, 1);
        assert_eq!(game.display().pixels.len(), 2);

        now.set(10);
        assert_eq!(game.poll(), Ok(Poll::Idle));

        now.set(33);
        match game.poll() {
            Ok(Poll::Ticked(report)) => {
                assert_eq!(report.tick, 1);
                assert_eq!(report.moves.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            game.game().snake(game.local_snake()).unwrap().head(),
            Point::new(20, 21)
        );
        // Joystick read failed every frame
        assert_eq!(game.diagnostics().input_errors, 1);
    }

    #[test]
    fn test_waits_for_handshake() {
        let now = Cell::new(0);
        let mut config = GameConfig::default();
        config.link.role = Role::Client;
        let mut game = TickLoop::new(
            &config,
            FakeClock(&now),
            Stick(None),
            Screen::default(),
            Wire::default(),
        )
        .unwrap();

        assert_eq!(game.poll(), Ok(Poll::Connecting(LinkState::AwaitAck)));
        now.set(500);
        assert_eq!(game.poll(), Ok(Poll::Connecting(LinkState::AwaitAck)));
        assert_eq!(game.display().cleared, 0);
    }

    #[test]
    fn test_local_turn_is_sent() {
        let now = Cell::new(0);
        let config = GameConfig::default();
        let stick = Stick(Some(JoystickSample {
            dx: 800,
            dy: 0,
            pressed: false,
        }));
        let mut game = TickLoop::new(&config, FakeClock(&now), stick, Screen::default(), host_wire()).unwrap();
        game.poll().unwrap();

        now.set(40);
        game.poll().unwrap();
        assert_eq!(
            game.game().snake(game.local_snake()).unwrap().direction(),
            Direction::Right
        );
        // Handshake ack, then the turn
        assert_eq!(game.peer.into_inner().outbound.as_slice(), b"AD0R");
    }

    #[test]
    fn test_remote_message_applied() {
        let now = Cell::new(0);
        let config = GameConfig::default();
        let mut wire = host_wire();
        for &b in b"D1UL1X" {
            wire.inbound.push_back(b).unwrap();
        }
        let mut game = TickLoop::new(&config, FakeClock(&now), Stick(None), Screen::default(), wire).unwrap();
        game.poll().unwrap();

        now.set(33);
        game.poll().unwrap();
        let one = game.game().snake(SnakeId::new(1).unwrap()).unwrap();
        assert_eq!(one.direction(), Direction::Up);
        // "L1X" has an invalid payload
        assert_eq!(one.layer(), Layer::Upper);
        assert_eq!(game.diagnostics().malformed_messages, 1);
    }

    #[test]
    fn test_rejected_message_counted() {
        let now = Cell::new(0);
        let config = GameConfig::default();
        let mut wire = host_wire();
        for &b in b"K00" {
            wire.inbound.push_back(b).unwrap();
        }
        let mut game = TickLoop::new(&config, FakeClock(&now), Stick(None), Screen::default(), wire).unwrap();
        game.poll().unwrap();
        now.set(33);
        game.poll().unwrap();
        assert_eq!(game.diagnostics().rejected_messages, 1);
        assert!(!game.game().snake(game.local_snake()).unwrap().is_dead());
    }

    #[test]
    fn test_local_death_announced_and_match_ends() {
        let now = Cell::new(0);
        let mut config = GameConfig::default();
        config.snakes.truncate(1);
        config.snakes[0].x = 0;
        config.snakes[0].y = 0;
        config.snakes[0].direction = Direction::Up;
        let mut game = TickLoop::new(&config, FakeClock(&now), Stick(None), Screen::default(), host_wire()).unwrap();
        game.poll().unwrap();

        now.set(33);
        match game.poll() {
            Ok(Poll::Ticked(report)) => assert_eq!(report.deaths.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        now.set(66);
        assert_eq!(game.poll(), Ok(Poll::Over));
        assert_eq!(game.peer.into_inner().outbound.as_slice(), b"AK00");
    }

    #[test]
    fn test_read_fault_does_not_skip_tick() {
        let now = Cell::new(0);
        let faults = Faults::default();
        let mut wire = host_wire();
        wire.faults = Some(&faults);
        let config = GameConfig::default();
        let mut game = TickLoop::new(&config, FakeClock(&now), Stick(None), Screen::default(), wire).unwrap();
        game.poll().unwrap();

        faults.reads.set(1);
        for frame in 1..=5 {
            now.set(frame * 33);
            assert!(matches!(game.poll(), Ok(Poll::Ticked(_))));
        }
        assert_eq!(game.game().ticks(), 5);
        assert_eq!(game.diagnostics().link_errors, 1);
    }

    #[test]
    fn test_refused_turn_is_resent() {
        let now = Cell::new(0);
        let faults = Faults::default();
        let mut wire = host_wire();
        wire.faults = Some(&faults);
        let stick = Stick(Some(JoystickSample {
            dx: 800,
            dy: 0,
            pressed: false,
        }));
        let config = GameConfig::default();
        let mut game = TickLoop::new(&config, FakeClock(&now), stick, Screen::default(), wire).unwrap();
        game.poll().unwrap();

        faults.writes.set(1);
        now.set(33);
        assert!(matches!(game.poll(), Ok(Poll::Ticked(_))));
        assert_eq!(
            game.game().snake(game.local_snake()).unwrap().direction(),
            Direction::Right
        );
        assert_eq!(game.peer().pending(), 1);
        assert_eq!(game.diagnostics().link_errors, 1);

        now.set(66);
        game.poll().unwrap();
        assert_eq!(game.peer().pending(), 0);
        assert_eq!(game.peer.into_inner().outbound.as_slice(), b"AD0R");
    }

    #[test]
    fn test_match_over_waits_for_kill_to_send() {
        let now = Cell::new(0);
        let faults = Faults::default();
        let mut wire = host_wire();
        wire.faults = Some(&faults);
        let mut config = GameConfig::default();
        config.snakes.truncate(1);
        config.snakes[0].x = 0;
        config.snakes[0].y = 0;
        config.snakes[0].direction = Direction::Up;
        let mut game = TickLoop::new(&config, FakeClock(&now), Stick(None), Screen::default(), wire).unwrap();
        game.poll().unwrap();

        faults.writes.set(2);
        now.set(33);
        assert!(matches!(game.poll(), Ok(Poll::Ticked(_))));
        assert_eq!(game.poll(), Ok(Poll::Idle));
        assert_eq!(game.poll(), Ok(Poll::Over));
        assert_eq!(game.diagnostics().link_errors, 2);
        assert_eq!(game.peer.into_inner().outbound.as_slice(), b"AK00");
    }
}
