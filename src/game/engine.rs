use anyhow::{Context, Result};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

use super::{
    config::GameConfig,
    direction::Direction,
    grid::{Grid, Position},
    input_buffer::InputBuffer,
    rules,
    state::{CollisionType, GameState, Phase, Snake},
};

/// Side signals raised by state transitions.
///
/// The engine only records them; whoever owns the loop drains them after
/// each operation and forwards them to audio, the clock and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A new round began
    Start,
    /// Food was eaten; carries the new score
    Eat { score: u32 },
    /// The snake died
    Crash(CollisionType),
    /// The round ended. `new_high_score` is set when `score` beat the
    /// stored best and should be persisted.
    GameOver { score: u32, new_high_score: bool },
    /// The tick interval changed and the clock must be re-armed
    SpeedChanged(Duration),
    /// Pause was toggled
    Paused(bool),
}

/// Information about a tick
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
}

/// Result of a processed tick
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Whether the round has ended
    pub terminated: bool,
    pub info: StepInfo,
}

/// The game state machine: owns the board and applies one tick at a time
pub struct GameEngine {
    config: GameConfig,
    grid: Grid,
    initial_snake: Snake,
    rng: StdRng,
    state: GameState,
    input: InputBuffer,
    high_score: u32,
    events: Vec<GameEvent>,
}

impl GameEngine {
    /// Create an engine in the `NotStarted` phase.
    ///
    /// `high_score` is the persisted best score read at startup.
    pub fn new(config: GameConfig, high_score: u32) -> Result<Self> {
        Self::with_rng(config, high_score, StdRng::from_entropy())
    }

    /// Same as `new` with a caller-provided random source
    pub fn with_rng(config: GameConfig, high_score: u32, mut rng: StdRng) -> Result<Self> {
        config.validate().context("Invalid game configuration")?;

        let grid = config.grid();
        let initial_snake = Snake::from_segments(config.initial_snake.clone())
            .context("initial_snake must not be empty")?;
        let food = grid
            .random_free_cell(&mut rng, initial_snake.segments())
            .context("No free cell for food")?;
        let state = GameState::new(
            initial_snake.clone(),
            food,
            config.initial_direction,
            config.initial_speed_ms,
        );

        Ok(Self {
            input: InputBuffer::new(config.initial_direction),
            config,
            grid,
            initial_snake,
            rng,
            state,
            high_score,
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Start a fresh round from the configured starting position
    pub fn reset(&mut self) {
        let direction = self.config.initial_direction;

        self.state.snake = self.initial_snake.clone();
        self.state.direction = direction;
        self.state.score = 0;
        self.state.speed_ms = self.config.initial_speed_ms;
        self.state.phase = Phase::Running;
        self.input.reset(direction);

        if let Some(food) = self.spawn_food() {
            self.state.food = food;
        }

        self.events.push(GameEvent::Start);
    }

    /// Buffer a direction change for the next tick.
    ///
    /// 180-degree turns relative to the committed direction are dropped.
    pub fn steer(&mut self, requested: Direction) -> bool {
        self.input.set_intent(requested, self.state.direction)
    }

    /// Pause or resume a running round.
    ///
    /// Ignored before the first start and after game over. Returns whether
    /// the phase changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let next = match (self.state.phase, paused) {
            (Phase::Running, true) => Phase::Paused,
            (Phase::Paused, false) => Phase::Running,
            _ => return false,
        };

        self.state.phase = next;
        self.events.push(GameEvent::Paused(paused));
        true
    }

    /// Advance the round by one cell.
    ///
    /// Returns `None` when the round is not running.
    pub fn tick(&mut self) -> Option<StepResult> {
        if !self.state.is_running() {
            return None;
        }

        let direction = self.input.consume();
        self.state.direction = direction;

        let new_head = self.state.snake.head().moved_in_direction(direction);
        let ate_food = rules::eats(new_head, self.state.food);

        if let Some(collision) = rules::collision(&self.grid, &self.state.snake, new_head, ate_food) {
            self.events.push(GameEvent::Crash(collision));
            self.finish_round();

            return Some(StepResult {
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    collision_type: Some(collision),
                },
            });
        }

        self.state.snake.advance(new_head, ate_food);

        if ate_food {
            self.state.score += 1;
            self.events.push(GameEvent::Eat {
                score: self.state.score,
            });

            let speed = rules::next_speed(
                self.state.speed_ms,
                self.config.speed_decrement_ms,
                self.config.min_speed_ms,
            );
            if speed != self.state.speed_ms {
                self.state.speed_ms = speed;
                self.events
                    .push(GameEvent::SpeedChanged(self.state.tick_interval()));
            }

            match self.spawn_food() {
                Some(food) => self.state.food = food,
                None => {
                    // Board is full: nothing left to eat
                    self.finish_round();
                    return Some(StepResult {
                        terminated: true,
                        info: StepInfo {
                            ate_food,
                            collision_type: None,
                        },
                    });
                }
            }
        }

        Some(StepResult {
            terminated: false,
            info: StepInfo {
                ate_food,
                collision_type: None,
            },
        })
    }

    /// Take all side signals raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn finish_round(&mut self) {
        self.state.phase = Phase::GameOver;

        let score = self.state.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
        }

        debug!("round over: score {score}, best {}", self.high_score);
        self.events.push(GameEvent::GameOver {
            score,
            new_high_score,
        });
    }

    fn spawn_food(&mut self) -> Option<Position> {
        self.grid
            .random_free_cell(&mut self.rng, self.state.snake.segments())
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}
