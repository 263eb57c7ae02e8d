//! Grid geometry: movement, collision and food placement
//!
//! All functions here are pure. Coordinates are signed so a move off the
//! edge is representable and can be rejected by `is_collision`.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A cell on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid center, where every fresh snake spawns
    pub const fn center() -> Self {
        Self::new(GRID_WIDTH / 2, GRID_HEIGHT / 2)
    }

    /// Whether this cell lies inside the grid
    #[inline]
    pub fn in_bounds(&self) -> bool {
        self.x >= 0 && self.x < GRID_WIDTH && self.y >= 0 && self.y < GRID_HEIGHT
    }

    /// The neighbouring cell one step in `direction`
    #[inline]
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Heading of the snake. Screen coordinates: y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector for this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Snake body, head first
pub type Snake = VecDeque<Position>;

/// Move the snake one cell: prepend the new head and drop the tail.
///
/// The input must be non-empty.
pub fn move_head(snake: &Snake, direction: Direction) -> Snake {
    let mut moved = snake.clone();
    if let Some(head) = snake.front() {
        moved.push_front(head.step(direction));
        moved.pop_back();
    }
    moved
}

/// True if `head` left the grid or landed on one of `body`'s cells
pub fn is_collision<'a, I>(head: Position, body: I) -> bool
where
    I: IntoIterator<Item = &'a Position>,
{
    // Wall check first, it needs no scan
    if !head.in_bounds() {
        return true;
    }
    body.into_iter().any(|segment| *segment == head)
}

/// Pick a uniformly random free cell for the next food.
///
/// Rejection-samples up to `MAX_FOOD_ATTEMPTS` times, then falls back to
/// choosing among the enumerated free cells. Returns `None` only when the
/// snake covers the whole grid.
pub fn place_food<R: Rng + ?Sized>(snake: &Snake, rng: &mut R) -> Option<Position> {
    for _ in 0..MAX_FOOD_ATTEMPTS {
        let candidate = Position::new(
            rng.random_range(0..GRID_WIDTH),
            rng.random_range(0..GRID_HEIGHT),
        );
        if !snake.contains(&candidate) {
            return Some(candidate);
        }
    }

    let free: Vec<Position> = (0..GRID_HEIGHT)
        .flat_map(|y| (0..GRID_WIDTH).map(move |x| Position::new(x, y)))
        .filter(|cell| !snake.contains(cell))
        .collect();
    if free.is_empty() {
        log::warn!("No free cell left for food ({} segments)", snake.len());
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}
