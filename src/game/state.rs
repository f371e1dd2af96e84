use std::time::Duration;

use super::direction::Direction;
use super::grid::Position;

/// The snake in the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Body segments, with head at index 0
    body: Vec<Position>,
}

impl Snake {
    /// Create a straight snake whose head leads in `direction`
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let (dx, dy) = direction.delta();
        let body = (0..length.max(1) as i32)
            .map(|i| head.moved_by(-dx * i, -dy * i))
            .collect();

        Self { body }
    }

    /// Build a snake from explicit segments, head first.
    ///
    /// Returns `None` for an empty body; a snake always has a head.
    pub fn from_segments(body: Vec<Position>) -> Option<Self> {
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Last segment, the one vacated by a non-growing move
    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    /// All segments, head first
    pub fn segments(&self) -> &[Position] {
        &self.body
    }

    /// Segments that stay occupied while the snake moves without growing
    pub fn segments_without_tail(&self) -> &[Position] {
        &self.body[..self.body.len() - 1]
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Prepend a new head; the tail is dropped unless `grow` is set
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.insert(0, new_head);

        if !grow {
            self.body.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Lifecycle of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first start after launch
    NotStarted,
    Running,
    Paused,
    /// Terminal until the next reset; snake and food are frozen
    GameOver,
}

/// Type of collision that ended a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake left the grid
    Wall,
    /// Snake ran into its own body
    SelfCollision,
}

/// Complete game state, owned by the game loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    /// Direction applied by the most recent tick
    pub direction: Direction,
    pub score: u32,
    /// Tick interval in milliseconds; lower is faster
    pub speed_ms: u64,
    pub phase: Phase,
}

impl GameState {
    pub fn new(snake: Snake, food: Position, direction: Direction, speed_ms: u64) -> Self {
        Self {
            snake,
            food,
            direction,
            score: 0,
            speed_ms,
            phase: Phase::NotStarted,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// True once the first round has been started
    pub fn game_started(&self) -> bool {
        self.phase != Phase::NotStarted
    }

    /// Read-only view handed to the renderer
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            snake: self.snake.segments(),
            food: self.food,
            direction: self.direction,
        }
    }
}

/// What a redraw needs to know about the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<'a> {
    pub snake: &'a [Position],
    pub food: Position,
    pub direction: Direction,
}
