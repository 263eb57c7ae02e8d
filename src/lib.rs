//! Retro Snake - A grid arcade game engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, session state)
//! - `achievements`: Achievement catalog and unlock evaluation
//! - `extra_lives`: Continuation credits and purchase crediting
//! - `game`: Controller owning the session and its collaborators
//! - `persistence`: Key/value storage port
//! - `leaderboard`: Ranked score board
//! - `platform`: Clock, input mapping and browser bindings

pub mod achievements;
pub mod ads;
pub mod extra_lives;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod sim;
pub mod theme;

pub use game::Game;
pub use leaderboard::Leaderboard;
pub use theme::Theme;

/// Game configuration constants
pub mod consts {
    /// Grid dimensions (cells)
    pub const GRID_WIDTH: i32 = 25;
    pub const GRID_HEIGHT: i32 = 20;

    /// Fixed simulation period in milliseconds
    pub const TICK_MS: u32 = 150;
    /// Maximum ticks per update call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Points awarded per food eaten
    pub const FOOD_SCORE: u32 = 10;

    /// Random draws before food placement falls back to scanning free cells
    pub const MAX_FOOD_ATTEMPTS: u32 = 1000;

    /// Extra lives credited per confirmed purchase
    pub const LIVES_PER_PURCHASE: u32 = 3;

    /// Leaderboard limits
    pub const MAX_PLAYER_NAME_LEN: usize = 20;
    pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
}
