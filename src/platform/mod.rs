//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall clock time
//! - Keyboard input mapping
//! - Browser bindings (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::{Direction, GamePhase};

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Discrete player command produced by an input adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
    Turn(Direction),
    ContinueWithExtraLife,
}

/// Map a `KeyboardEvent.code` to a command for the current phase
pub fn command_for_key(code: &str, phase: GamePhase) -> Option<Command> {
    match (code, phase) {
        ("Space" | "Enter", GamePhase::Menu) => Some(Command::Start),
        ("Space" | "Enter", GamePhase::GameOver) => Some(Command::Restart),
        ("KeyC", GamePhase::GameOver) => Some(Command::ContinueWithExtraLife),
        (_, GamePhase::Playing) => direction_for_key(code).map(Command::Turn),
        _ => None,
    }
}

fn direction_for_key(code: &str) -> Option<Direction> {
    match code {
        "ArrowUp" | "KeyW" => Some(Direction::Up),
        "ArrowDown" | "KeyS" => Some(Direction::Down),
        "ArrowLeft" | "KeyA" => Some(Direction::Left),
        "ArrowRight" | "KeyD" => Some(Direction::Right),
        _ => None,
    }
}
