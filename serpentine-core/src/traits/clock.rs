//! Monotonic time source

/// Millisecond counter
///
/// May wrap; callers compare with `wrapping_sub`.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u32;
}
