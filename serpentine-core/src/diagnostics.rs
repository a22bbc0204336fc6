//! Runtime counters
//!
//! Capacity and protocol problems are never fatal. They are counted here
//! and the firmware dumps the counters periodically.

/// Saturating event counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Turns, layer changes or seams refused by a full ring
    pub ring_full: u16,
    /// Committed segments that did not fit in the spatial index
    pub index_full: u16,
    /// Removals that found no matching segment
    pub index_missing: u16,
    /// Bytes or triples that failed to decode
    pub malformed_messages: u16,
    /// Well-formed messages the game refused
    pub rejected_messages: u16,
    /// Serial reads or writes that failed during play
    pub link_errors: u16,
    /// Handshake timeouts
    pub handshake_restarts: u16,
    /// Joystick read failures
    pub input_errors: u16,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing has gone wrong
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Increment a counter without wrapping
pub(crate) fn bump(counter: &mut u16) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_saturates() {
        let mut d = Diagnostics::new();
        assert!(d.is_clean());
        d.ring_full = u16::MAX - 1;
        bump(&mut d.ring_full);
        bump(&mut d.ring_full);
        assert_eq!(d.ring_full, u16::MAX);
        assert!(!d.is_clean());
    }
}
