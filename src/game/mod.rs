//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering
//! dependencies: the grid, the movement rules, the input latch, the state
//! machine that applies one tick at a time and the clock that drives it.

pub mod clock;
pub mod config;
pub mod direction;
pub mod engine;
pub mod grid;
pub mod input_buffer;
pub mod rules;
pub mod state;

// Re-export commonly used types
pub use clock::GameClock;
pub use config::{GameConfig, MAX_GRID_SIZE};
pub use direction::Direction;
pub use engine::{GameEngine, GameEvent, StepInfo, StepResult};
pub use grid::{Grid, Position};
pub use input_buffer::InputBuffer;
pub use state::{CollisionType, GameState, Phase, Snake, Snapshot};
