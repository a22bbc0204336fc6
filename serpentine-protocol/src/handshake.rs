//! Connection handshake
//!
//! ```text
//! client            host
//!   │ ──── 'C' ────▶ │   Listen → AwaitAck
//!   │ ◀─── 'A' ───── │
//!   │ ──── 'A' ────▶ │   AwaitAck → Data
//! Data               Data
//! ```
//!
//! The client repeats its connect byte each time the ack timeout expires.
//! The host falls back to listening if the final ack never arrives. Timing
//! is owned by the caller; this module only knows which byte to send next.

use crate::wire::{ACK, CONNECT};

/// Which side of the handshake this peer plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Waits for a connect byte
    #[default]
    Host,
    /// Sends the connect byte
    Client,
}

/// Handshake states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not started
    Start,
    /// Host waiting for a connect byte
    Listen,
    /// Waiting for the peer's ack (bounded by a timeout)
    AwaitAck,
    /// Handshake complete, game messages flow
    Data,
}

/// Inputs to the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Begin connecting
    Begin,
    /// A byte arrived from the peer
    Received(u8),
    /// The ack timeout expired
    TimedOut,
}

impl LinkState {
    /// True once game messages may be exchanged
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Data)
    }

    /// True while a timeout should be armed
    pub fn is_waiting_for_ack(&self) -> bool {
        matches!(self, LinkState::AwaitAck)
    }

    /// Process an event and return the next state plus the byte to send
    pub fn transition(self, role: Role, event: LinkEvent) -> (Self, Option<u8>) {
        use LinkEvent::*;
        use LinkState::*;

        match (role, self, event) {
            // Start
            (Role::Host, Start, Begin) => (Listen, None),
            (Role::Client, Start, Begin) => (AwaitAck, Some(CONNECT)),

            // Host side
            (Role::Host, Listen, Received(CONNECT)) => (AwaitAck, Some(ACK)),
            // Client retried before our ack reached it
            (Role::Host, AwaitAck, Received(CONNECT)) => (AwaitAck, Some(ACK)),
            (Role::Host, AwaitAck, Received(ACK)) => (Data, None),
            (Role::Host, AwaitAck, TimedOut) => (Listen, None),

            // Client side
            (Role::Client, AwaitAck, Received(ACK)) => (Data, Some(ACK)),
            (Role::Client, AwaitAck, TimedOut) => (AwaitAck, Some(CONNECT)),

            // Default: stay in current state, send nothing
            _ => (self, None),
        }
    }
}

/// Handshake driver holding the role and current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handshake {
    role: Role,
    state: LinkState,
}

impl Handshake {
    /// Create an idle handshake for the given role
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: LinkState::Start,
        }
    }

    /// Role of this peer
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Feed an event, returning the byte to write to the peer, if any
    pub fn handle(&mut self, event: LinkEvent) -> Option<u8> {
        let (next, send) = self.state.transition(self.role, event);
        self.state = next;
        send
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_happy_path() {
        let mut hs = Handshake::new(Role::Client);
        assert_eq!(hs.handle(LinkEvent::Begin), Some(CONNECT));
        assert!(hs.state().is_waiting_for_ack());
        assert_eq!(hs.handle(LinkEvent::Received(ACK)), Some(ACK));
        assert!(hs.state().is_connected());
    }

    #[test]
    fn test_host_happy_path() {
        let mut hs = Handshake::new(Role::Host);
        assert_eq!(hs.handle(LinkEvent::Begin), None);
        assert_eq!(hs.state(), LinkState::Listen);
        assert_eq!(hs.handle(LinkEvent::Received(CONNECT)), Some(ACK));
        assert_eq!(hs.state(), LinkState::AwaitAck);
        assert_eq!(hs.handle(LinkEvent::Received(ACK)), None);
        assert!(hs.state().is_connected());
    }

    #[test]
    fn test_client_timeout_resends_connect() {
        let mut hs = Handshake::new(Role::Client);
        hs.handle(LinkEvent::Begin);
        assert_eq!(hs.handle(LinkEvent::TimedOut), Some(CONNECT));
        assert_eq!(hs.state(), LinkState::AwaitAck);
    }

    #[test]
    fn test_host_timeout_returns_to_listen() {
        let mut hs = Handshake::new(Role::Host);
        hs.handle(LinkEvent::Begin);
        hs.handle(LinkEvent::Received(CONNECT));
        assert_eq!(hs.handle(LinkEvent::TimedOut), None);
        assert_eq!(hs.state(), LinkState::Listen);
    }

    #[test]
    fn test_host_reacks_repeated_connect() {
        let mut hs = Handshake::new(Role::Host);
        hs.handle(LinkEvent::Begin);
        hs.handle(LinkEvent::Received(CONNECT));
        assert_eq!(hs.handle(LinkEvent::Received(CONNECT)), Some(ACK));
        assert_eq!(hs.state(), LinkState::AwaitAck);
    }

    #[test]
    fn test_noise_is_ignored() {
        let mut host = Handshake::new(Role::Host);
        host.handle(LinkEvent::Begin);
        assert_eq!(host.handle(LinkEvent::Received(b'x')), None);
        assert_eq!(host.handle(LinkEvent::Received(ACK)), None);
        assert_eq!(host.state(), LinkState::Listen);

        let mut client = Handshake::new(Role::Client);
        client.handle(LinkEvent::Begin);
        assert_eq!(client.handle(LinkEvent::Received(CONNECT)), None);
        assert_eq!(client.state(), LinkState::AwaitAck);
    }

    #[test]
    fn test_data_is_terminal() {
        let mut hs = Handshake::new(Role::Client);
        hs.handle(LinkEvent::Begin);
        hs.handle(LinkEvent::Received(ACK));
        for event in [
            LinkEvent::Begin,
            LinkEvent::TimedOut,
            LinkEvent::Received(CONNECT),
            LinkEvent::Received(ACK),
        ] {
            assert_eq!(hs.handle(event), None);
            assert!(hs.state().is_connected());
        }
    }

    #[test]
    fn test_bytes_before_begin_are_ignored() {
        let mut hs = Handshake::new(Role::Host);
        assert_eq!(hs.handle(LinkEvent::Received(CONNECT)), None);
        assert_eq!(hs.state(), LinkState::Start);
    }

    #[test]
    fn test_two_peers_connect() {
        let mut host = Handshake::new(Role::Host);
        let mut client = Handshake::new(Role::Client);
        host.handle(LinkEvent::Begin);

        let mut to_host = client.handle(LinkEvent::Begin);
        for _ in 0..4 {
            let to_client = to_host.and_then(|b| host.handle(LinkEvent::Received(b)));
            to_host = to_client.and_then(|b| client.handle(LinkEvent::Received(b)));
        }

        assert!(host.state().is_connected());
        assert!(client.state().is_connected());
    }
}
