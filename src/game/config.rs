use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::direction::Direction;
use super::grid::{Grid, Position};

/// Largest board side accepted by `validate`; keeps the drawn board within
/// a terminal's `u16` width
pub const MAX_GRID_SIZE: usize = 200;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Cells per side of the square grid
    pub grid_size: usize,
    /// Starting body, head first
    pub initial_snake: Vec<Position>,
    /// Heading at the start of every round
    pub initial_direction: Direction,
    /// Tick interval at the start of every round
    pub initial_speed_ms: u64,
    /// How much faster each eaten food makes the game
    pub speed_decrement_ms: u64,
    /// Fastest allowed tick interval
    pub min_speed_ms: u64,
    /// Ask the coach for a tip every time the score hits a multiple of this
    pub tip_every: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 30,
            initial_snake: vec![
                Position::new(10, 10),
                Position::new(10, 11),
                Position::new(10, 12),
            ],
            initial_direction: Direction::Up,
            initial_speed_ms: 140,
            speed_decrement_ms: 2,
            min_speed_ms: 60,
            tip_every: 5,
        }
    }
}

impl GameConfig {
    /// Default configuration on a grid of custom size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_size)
    }

    /// Check that a round can actually be started with these settings
    pub fn validate(&self) -> Result<()> {
        ensure!(self.grid_size > 0, "grid_size must be positive");
        ensure!(
            self.grid_size <= MAX_GRID_SIZE,
            "grid_size ({}) must not exceed {}",
            self.grid_size,
            MAX_GRID_SIZE
        );
        ensure!(!self.initial_snake.is_empty(), "initial_snake must not be empty");
        ensure!(self.min_speed_ms > 0, "min_speed_ms must be positive");
        ensure!(
            self.min_speed_ms <= self.initial_speed_ms,
            "min_speed_ms ({}) must not exceed initial_speed_ms ({})",
            self.min_speed_ms,
            self.initial_speed_ms
        );
        ensure!(self.tip_every > 0, "tip_every must be positive");

        let grid = self.grid();
        ensure!(
            self.initial_snake.len() < grid.capacity(),
            "initial_snake leaves no room for food"
        );

        for (i, segment) in self.initial_snake.iter().enumerate() {
            if !grid.in_bounds(*segment) {
                bail!("initial_snake segment {:?} is outside the grid", segment);
            }
            if self.initial_snake[..i].contains(segment) {
                bail!("initial_snake segment {:?} overlaps the body", segment);
            }
            if i > 0 && segment.manhattan_distance(self.initial_snake[i - 1]) != 1 {
                bail!("initial_snake is not contiguous at {:?}", segment);
            }
        }

        if let [head, neck, ..] = self.initial_snake.as_slice() {
            ensure!(
                head.moved_in_direction(self.initial_direction) != *neck,
                "initial_direction points back into the body"
            );
        }

        Ok(())
    }
}
