//! Retro Snake entry point
//!
//! The browser build starts from `platform::web`. Natively this runs a short
//! scripted session headlessly so the engine can be watched through the log.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use retro_snake::consts::TICK_MS;
    use retro_snake::persistence::MemoryStore;
    use retro_snake::sim::{Direction, GamePhase};
    use retro_snake::{Game, Leaderboard};

    env_logger::init();
    log::info!("Retro Snake (native) starting...");

    let seed = retro_snake::platform::now_ms();
    let mut game = Game::new(Box::new(MemoryStore::new()), seed)
        .with_leaderboard(Box::new(Leaderboard::new()));
    game.subscribe(Box::new(|snap: &retro_snake::sim::Snapshot| {
        log::debug!("head={:?} food={:?} score={}", snap.snake[0], snap.food, snap.score);
    }));

    // Turn on these tick numbers, then run straight into a wall
    let script = [(3, Direction::Down), (7, Direction::Right)];

    game.start();
    let mut ticks = 0u32;
    while game.phase() == GamePhase::Playing && ticks < 1000 {
        if let Some((_, direction)) = script.iter().find(|(at, _)| *at == ticks) {
            game.change_direction(*direction);
        }
        ticks += game.update(TICK_MS).len() as u32;
    }

    let snap = game.snapshot();
    println!(
        "Game over after {ticks} ticks: score {}, high score {}, length {}",
        snap.score,
        snap.high_score,
        snap.snake.len()
    );
    if let Some(entry) = game.submit_score("demo") {
        println!("Leaderboard entry #{} ({} points)", entry.id, entry.score);
    }
    while let Some(achievement) = game.next_notification() {
        println!("Unlocked {} {}", achievement.def.icon, achievement.def.name);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main, this is just to satisfy the compiler
}
