//! Peer synchronisation
//!
//! [`PeerLink`] owns the serial port: it runs the connect handshake, then
//! frames outgoing messages and reassembles incoming ones. Decoded messages
//! are applied to the match with [`Match::apply`], which only ever touches
//! remote mirrors.

use heapless::Deque;
use serpentine_protocol::{Handshake, LinkEvent, LinkState, Message, MessageParser, Role};

use crate::diagnostics::{bump, Diagnostics};
use crate::game::Match;
use crate::snake::TurnError;
use crate::traits::{LinkError, SerialLink};

/// What a received message did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Applied {
    Turned,
    LayerChanged,
    Killed,
    /// Kill for a snake that was already dead
    AlreadyDead,
}

/// Why a received message was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApplyError {
    /// No snake with that id in this match
    UnknownSnake,
    /// The named snake is driven by this board
    LocalSnake,
    /// The snake refused the change
    Rejected(TurnError),
}

impl Match {
    /// Apply a message from the peer to a remote mirror
    ///
    /// Goes through the same checks as local input, so a duplicate heading
    /// is refused and a second kill is harmless.
    pub fn apply(&mut self, message: Message) -> Result<Applied, ApplyError> {
        let snake = self
            .snake(message.snake())
            .ok_or(ApplyError::UnknownSnake)?;
        if snake.is_local() {
            return Err(ApplyError::LocalSnake);
        }

        match message {
            Message::Direction { snake, direction } => self
                .turn(snake, direction)
                .map(|()| Applied::Turned)
                .map_err(ApplyError::Rejected),
            Message::Layer { snake, layer } => self
                .set_layer(snake, layer)
                .map(|()| Applied::LayerChanged)
                .map_err(ApplyError::Rejected),
            Message::Kill { snake } => self
                .kill(snake)
                .map(|killed| if killed { Applied::Killed } else { Applied::AlreadyDead })
                .map_err(ApplyError::Rejected),
        }
    }
}

/// Messages held while the port refuses writes
pub const OUTBOX_LEN: usize = 8;

/// Serial session with the other board
pub struct PeerLink<L> {
    link: L,
    handshake: Handshake,
    parser: MessageParser,
    outbox: Deque<Message, OUTBOX_LEN>,
    timeout_ms: u32,
    deadline: Option<u32>,
}

impl<L: SerialLink> PeerLink<L> {
    pub fn new(link: L, role: Role, timeout_ms: u32) -> Self {
        Self {
            link,
            handshake: Handshake::new(role),
            parser: MessageParser::new(),
            outbox: Deque::new(),
            timeout_ms,
            deadline: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.handshake.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn role(&self) -> Role {
        self.handshake.role()
    }

    /// Give back the port
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Start the handshake
    pub fn begin(&mut self, now: u32) -> Result<(), LinkError> {
        let reply = self.handshake.handle(LinkEvent::Begin);
        self.emit(reply)?;
        self.arm(now);
        Ok(())
    }

    /// Feed handshake bytes and enforce the ack timeout
    ///
    /// Stops reading as soon as the link is up; anything behind the final
    /// ack is game traffic and stays queued for [`receive`](Self::receive).
    pub fn poll_handshake(
        &mut self,
        now: u32,
        diagnostics: &mut Diagnostics,
    ) -> Result<LinkState, LinkError> {
        while !self.is_connected() && self.link.available()? {
            let byte = self.link.read()?;
            let before = self.state();
            let reply = self.handshake.handle(LinkEvent::Received(byte));
            if reply.is_some() || self.state() != before {
                self.arm(now);
            }
            self.emit(reply)?;
        }

        if let Some(deadline) = self.deadline {
            if !self.is_connected() && elapsed(now, deadline) {
                bump(&mut diagnostics.handshake_restarts);
                let reply = self.handshake.handle(LinkEvent::TimedOut);
                self.arm(now);
                self.emit(reply)?;
            }
        }

        Ok(self.state())
    }

    fn arm(&mut self, now: u32) {
        self.deadline = self
            .state()
            .is_waiting_for_ack()
            .then(|| now.wrapping_add(self.timeout_ms));
    }

    fn emit(&mut self, byte: Option<u8>) -> Result<(), LinkError> {
        match byte {
            Some(b) => self.link.write(&[b]),
            None => Ok(()),
        }
    }

    /// Queue one message and write everything pending
    ///
    /// A failed write keeps the message queued for the next
    /// [`flush`](Self::flush). Fails with [`LinkError::Overflow`] and drops
    /// the message when the outbox is already full.
    pub fn send(&mut self, message: Message) -> Result<(), LinkError> {
        self.outbox
            .push_back(message)
            .map_err(|_| LinkError::Overflow)?;
        self.flush()
    }

    /// Write queued messages in order, stopping at the first failure
    pub fn flush(&mut self) -> Result<(), LinkError> {
        while let Some(message) = self.outbox.front() {
            self.link.write(&message.encode())?;
            self.outbox.pop_front();
        }
        Ok(())
    }

    /// Messages still waiting for the port
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Next complete message, if one has fully arrived
    ///
    /// Malformed input is counted and skipped. A partial triple stays
    /// buffered until the rest arrives.
    pub fn receive(&mut self, diagnostics: &mut Diagnostics) -> Result<Option<Message>, LinkError> {
        while self.link.available()? {
            let byte = self.link.read()?;
            match self.parser.feed(byte) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(_) => bump(&mut diagnostics.malformed_messages),
            }
        }
        Ok(None)
    }
}

/// True once `now` has reached `deadline` on a wrapping clock
fn elapsed(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}
