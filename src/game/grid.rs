use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position one cell in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }

    pub fn manhattan_distance(&self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Square playfield of `size` x `size` cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: usize,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Cells per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, saturating at `usize::MAX`
    pub fn capacity(&self) -> usize {
        self.size.checked_mul(self.size).unwrap_or(usize::MAX)
    }

    /// Side length as a coordinate, saturating at `i32::MAX`
    fn side(&self) -> i32 {
        i32::try_from(self.size).unwrap_or(i32::MAX)
    }

    /// Check if a position is within the grid bounds
    pub fn in_bounds(&self, pos: Position) -> bool {
        let n = self.side();
        pos.x >= 0 && pos.x < n && pos.y >= 0 && pos.y < n
    }

    /// Every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        let n = self.side();
        (0..n).flat_map(move |y| (0..n).map(move |x| Position::new(x, y)))
    }

    /// Pick a uniformly random cell that is not in `excluding`.
    ///
    /// Rejection sampling is tried first since the snake normally covers a
    /// small fraction of the board. After `capacity()` misses the free
    /// cells are enumerated and one is chosen directly, so the search always
    /// terminates. Returns `None` only when no free cell exists.
    pub fn random_free_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        excluding: &[Position],
    ) -> Option<Position> {
        if self.size == 0 {
            return None;
        }

        let n = self.side();
        for _ in 0..self.capacity() {
            let pos = Position::new(rng.gen_range(0..n), rng.gen_range(0..n));
            if !excluding.contains(&pos) {
                return Some(pos);
            }
        }

        let free: Vec<Position> = self
            .cells()
            .filter(|pos| !excluding.contains(pos))
            .collect();
        free.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_in_direction(Direction::Right), Position::new(6, 5));
        assert_eq!(pos.moved_in_direction(Direction::Left), Position::new(4, 5));
        assert_eq!(pos.moved_in_direction(Direction::Down), Position::new(5, 6));
        assert_eq!(pos.moved_in_direction(Direction::Up), Position::new(5, 4));
        assert_eq!(pos.manhattan_distance(Position::new(2, 9)), 7);
    }

    #[test]
    fn test_bounds_checking() {
        let grid = Grid::new(30);

        assert!(grid.in_bounds(Position::new(0, 0)));
        assert!(grid.in_bounds(Position::new(29, 29)));
        assert!(!grid.in_bounds(Position::new(-1, 0)));
        assert!(!grid.in_bounds(Position::new(0, -1)));
        assert!(!grid.in_bounds(Position::new(30, 0)));
        assert!(!grid.in_bounds(Position::new(0, 30)));
    }

    #[test]
    fn test_huge_grid_saturates() {
        let grid = Grid::new(usize::MAX);
        assert_eq!(grid.capacity(), usize::MAX);
        assert!(grid.in_bounds(Position::new(i32::MAX - 1, 0)));
        assert!(!grid.in_bounds(Position::new(-1, 0)));
    }

    #[test]
    fn test_random_free_cell_avoids_excluded() {
        let grid = Grid::new(4);
        let mut rng = StdRng::seed_from_u64(7);
        let excluded: Vec<Position> = grid.cells().take(12).collect();

        for _ in 0..200 {
            let pos = grid.random_free_cell(&mut rng, &excluded).unwrap();
            assert!(grid.in_bounds(pos));
            assert!(!excluded.contains(&pos));
        }
    }

    #[test]
    fn test_random_free_cell_finds_last_cell() {
        let grid = Grid::new(5);
        let mut rng = StdRng::seed_from_u64(1);
        let last = Position::new(3, 4);
        let excluded: Vec<Position> = grid.cells().filter(|p| *p != last).collect();

        assert_eq!(grid.random_free_cell(&mut rng, &excluded), Some(last));
    }

    #[test]
    fn test_random_free_cell_full_grid() {
        let grid = Grid::new(3);
        let mut rng = StdRng::seed_from_u64(3);
        let everything: Vec<Position> = grid.cells().collect();

        assert_eq!(grid.random_free_cell(&mut rng, &everything), None);
        assert_eq!(Grid::new(0).random_free_cell(&mut rng, &[]), None);
    }
}
