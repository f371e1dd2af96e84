use super::direction::Direction;

/// Single-slot latch for the next direction the snake should take.
///
/// Reversal checks run against the committed direction (the one the last
/// tick actually applied), so any number of key presses between two ticks
/// are all judged against the same baseline. Pressing Left then Down while
/// heading Up can therefore never fold the snake back onto itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBuffer {
    pending: Direction,
}

impl InputBuffer {
    pub fn new(initial: Direction) -> Self {
        Self { pending: initial }
    }

    /// Latch `requested` unless it would reverse `committed`.
    ///
    /// Returns whether the request was accepted.
    pub fn set_intent(&mut self, requested: Direction, committed: Direction) -> bool {
        if requested.is_opposite(committed) {
            return false;
        }
        self.pending = requested;
        true
    }

    /// Take the direction for this tick. The slot keeps the same value,
    /// which is now also the committed direction.
    pub fn consume(&mut self) -> Direction {
        self.pending
    }

    pub fn pending(&self) -> Direction {
        self.pending
    }

    /// Drop any buffered intent and start from `direction`
    pub fn reset(&mut self, direction: Direction) {
        self.pending = direction;
    }
}
