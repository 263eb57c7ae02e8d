//! Fixed timestep simulation tick
//!
//! Advances the session by exactly one cell.

use serde::{Deserialize, Serialize};

use super::grid::{is_collision, move_head};
use super::state::{GamePhase, GameSession};
use crate::consts::*;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Not playing, nothing simulated
    Idle,
    /// Moved one cell
    Continue,
    /// Moved onto food and grew by one segment
    AteFood,
    /// Hit a wall or itself
    GameOver,
    /// Grew to cover every cell, no room for more food
    BoardFull,
}

impl TickOutcome {
    /// True when this tick ended the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::GameOver | TickOutcome::BoardFull)
    }
}

/// Advance the session by one fixed step
pub fn tick(state: &mut GameSession) -> TickOutcome {
    if state.phase != GamePhase::Playing {
        return TickOutcome::Idle;
    }

    state.heading = state.direction;
    let moved = move_head(&state.snake, state.heading);
    let head = moved[0];

    if is_collision(head, moved.iter().skip(1)) {
        state.finish();
        log::info!(
            "Game over at ({}, {}): score={}, high score={}",
            head.x,
            head.y,
            state.score,
            state.high_score
        );
        return TickOutcome::GameOver;
    }

    if state.food == Some(head) {
        // Re-attach the tail move_head dropped
        let tail = state.snake.back().copied();
        state.snake = moved;
        state.snake.extend(tail);
        state.score += FOOD_SCORE;
        state.food = state.spawn_food();
        if state.food.is_none() {
            state.finish();
            log::info!("Board full with score {}", state.score);
            return TickOutcome::BoardFull;
        }
        log::debug!("Ate food, length={} score={}", state.snake.len(), state.score);
        return TickOutcome::AteFood;
    }

    state.snake = moved;
    TickOutcome::Continue
}
