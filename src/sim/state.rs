//! Session state and lifecycle transitions
//!
//! The session is the single owner of the snake, food, heading and score.
//! Presentation only ever sees it through a [`Snapshot`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Position, Snake, is_collision, place_food};

/// Current phase of the game lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Title screen, nothing simulated
    Menu,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for restart or continuation
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Menu => "menu",
            GamePhase::Playing => "playing",
            GamePhase::GameOver => "gameOver",
        }
    }
}

/// Read-only view handed to renderers each frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snake: Vec<Position>,
    pub food: Option<Position>,
    pub phase: GamePhase,
    pub score: u32,
    pub high_score: u32,
}

/// One game session (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Body, head first
    pub snake: Snake,
    pub food: Option<Position>,
    /// Heading requested for the next tick
    pub direction: Direction,
    /// Heading the snake moved on in the last tick
    pub heading: Direction,
    pub phase: GamePhase,
    pub score: u32,
    /// Best score seen, never decreases
    pub high_score: u32,
    rng: Pcg32,
}

impl GameSession {
    /// Create a session in the menu, seeded with a previously persisted high score
    pub fn new(seed: u64, high_score: u32) -> Self {
        let mut snake = Snake::with_capacity(16);
        snake.push_back(Position::center());
        Self {
            seed,
            snake,
            food: None,
            direction: Direction::Right,
            heading: Direction::Right,
            phase: GamePhase::Menu,
            score: 0,
            high_score,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Begin a fresh run from any phase
    pub fn start(&mut self) {
        self.snake.clear();
        self.snake.push_back(Position::center());
        self.direction = Direction::Right;
        self.heading = Direction::Right;
        self.score = 0;
        self.food = self.spawn_food();
        self.phase = GamePhase::Playing;
    }

    /// Queue a heading for the next tick. Returns whether it was accepted.
    ///
    /// Ignored outside `Playing` and when it would reverse the snake onto itself.
    /// Only one intent is held between ticks and it is checked against the
    /// heading actually moved on, so two quick turns cannot fold the snake back.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if self.phase != GamePhase::Playing || direction == self.heading.opposite() {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Back to the title screen. Score and snake are left for the next `start`.
    pub fn reset_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
    }

    /// Whether a game over can be continued without dying on the very next tick
    pub fn can_resume(&self) -> bool {
        self.phase == GamePhase::GameOver && self.safe_heading().is_some()
    }

    /// Continue a finished run, keeping score and body.
    ///
    /// The snake still sits where it was before the fatal move, so the
    /// heading is turned toward the first cell that will not kill it.
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        let Some(heading) = self.safe_heading() else {
            return false;
        };
        self.direction = heading;
        self.heading = heading;
        if self.food.is_none() {
            self.food = self.spawn_food();
        }
        self.phase = GamePhase::Playing;
        true
    }

    /// End the run and fold the score into the high score
    pub(crate) fn finish(&mut self) {
        self.phase = GamePhase::GameOver;
        self.high_score = self.high_score.max(self.score);
    }

    pub(crate) fn spawn_food(&mut self) -> Option<Position> {
        place_food(&self.snake, &mut self.rng)
    }

    /// Current heading if it is safe, otherwise a perpendicular one
    fn safe_heading(&self) -> Option<Direction> {
        let head = *self.snake.front()?;
        let current = self.heading;
        let candidates = Direction::ALL
            .into_iter()
            .filter(|d| *d != current.opposite() && *d != current);
        std::iter::once(current).chain(candidates).find(|d| {
            let next = head.step(*d);
            // The tail moves away on the same tick, so it does not block
            let body_len = self.snake.len().saturating_sub(1);
            !is_collision(next, self.snake.iter().take(body_len))
        })
    }

    /// Capture the render contract
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake: self.snake.iter().copied().collect(),
            food: self.food,
            phase: self.phase,
            score: self.score,
            high_score: self.high_score,
        }
    }
}
