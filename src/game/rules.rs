//! Pure movement rules: what a proposed head position means for the snake.

use super::grid::{Grid, Position};
use super::state::{CollisionType, Snake};

/// Decide whether moving the head to `head` kills the snake.
///
/// When the move does not grow the snake its tail cell is vacated in the
/// same tick, so the tail does not count as occupied. When it grows the
/// whole body stays put and every segment counts.
pub fn collision(grid: &Grid, snake: &Snake, head: Position, growing: bool) -> Option<CollisionType> {
    if !grid.in_bounds(head) {
        return Some(CollisionType::Wall);
    }

    let occupied = if growing {
        snake.segments()
    } else {
        snake.segments_without_tail()
    };

    if occupied.contains(&head) {
        return Some(CollisionType::SelfCollision);
    }

    None
}

/// True when the head lands on the food cell
pub fn eats(head: Position, food: Position) -> bool {
    head == food
}

/// Tick interval after eating: one decrement faster, never below `min_ms`
pub fn next_speed(speed_ms: u64, decrement_ms: u64, min_ms: u64) -> u64 {
    speed_ms.saturating_sub(decrement_ms).max(min_ms)
}
