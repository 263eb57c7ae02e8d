//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, storage or platform dependencies

pub mod grid;
pub mod state;
pub mod tick;

pub use grid::{Direction, Position, Snake, is_collision, move_head, place_food};
pub use state::{GamePhase, GameSession, Snapshot};
pub use tick::{TickOutcome, tick};
