//! Browser bindings
//!
//! The page owns the canvas and the animation loop; it feeds elapsed time and
//! key codes in and draws the JSON snapshot it gets back.

use wasm_bindgen::prelude::*;

use super::{command_for_key, now_ms};
use crate::Game;
use crate::ads::TrackingPermission;
use crate::extra_lives::PurchaseEvent;
use crate::leaderboard::Leaderboard;
use crate::persistence::{KeyValueStore, LocalStore, MemoryStore};
use crate::sim::Direction;
use crate::theme::Theme;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Retro Snake starting...");
}

/// Game handle exported to JavaScript
#[wasm_bindgen]
pub struct WebGame {
    game: Game,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let store: Box<dyn KeyValueStore> = match LocalStore::open() {
            Some(store) => Box::new(store),
            None => {
                log::warn!("LocalStorage unavailable, progress will not be saved");
                Box::new(MemoryStore::new())
            }
        };
        let game = Game::new(store, now_ms()).with_leaderboard(Box::new(Leaderboard::new()));
        WebGame { game }
    }

    pub fn start(&mut self) -> bool {
        self.game.start()
    }

    pub fn restart(&mut self) -> bool {
        self.game.restart()
    }

    #[wasm_bindgen(js_name = resetToMenu)]
    pub fn reset_to_menu(&mut self) {
        self.game.reset_to_menu();
    }

    /// Direction by name ("up", "down", "left", "right")
    #[wasm_bindgen(js_name = changeDirection)]
    pub fn change_direction(&mut self, direction: &str) -> bool {
        Direction::from_str(direction)
            .map(|d| self.game.change_direction(d))
            .unwrap_or(false)
    }

    /// Handle a `KeyboardEvent.code`. Returns whether it did anything.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, code: &str) -> bool {
        command_for_key(code, self.game.phase())
            .map(|command| self.game.apply(command))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = useExtraLifeContinue)]
    pub fn use_extra_life_continue(&mut self) -> bool {
        self.game.continue_with_extra_life().is_ok()
    }

    /// Advance by elapsed milliseconds. Returns the last tick outcome, if any.
    pub fn update(&mut self, elapsed_ms: u32) -> Option<String> {
        self.game
            .update(elapsed_ms)
            .last()
            .and_then(|outcome| serde_json::to_value(outcome).ok())
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// Render snapshot as JSON
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.game.snapshot()).unwrap_or_default()
    }

    /// Next achievement notification as JSON (`{"id","name","icon"}`)
    #[wasm_bindgen(js_name = nextNotification)]
    pub fn next_notification(&mut self) -> Option<String> {
        self.game.next_notification().map(|a| {
            serde_json::json!({
                "id": a.def.id,
                "name": a.def.name,
                "icon": a.def.icon,
            })
            .to_string()
        })
    }

    #[wasm_bindgen(js_name = takeInterstitial)]
    pub fn take_interstitial(&mut self) -> bool {
        self.game.take_interstitial()
    }

    #[wasm_bindgen(js_name = setTrackingPermission)]
    pub fn set_tracking_permission(&mut self, status: &str) {
        let permission = TrackingPermission::from_str(status).unwrap_or_default();
        self.game.set_tracking_permission(permission);
    }

    #[wasm_bindgen(js_name = selectTheme)]
    pub fn select_theme(&mut self, theme: &str) -> bool {
        Theme::from_str(theme)
            .map(|t| self.game.select_theme(t))
            .unwrap_or(false)
    }

    /// Record a confirmed premium theme purchase by id
    #[wasm_bindgen(js_name = purchaseTheme)]
    pub fn purchase_theme(&mut self, theme: &str) -> bool {
        Theme::from_str(theme)
            .map(|t| self.game.grant_theme(t))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = extraLives)]
    pub fn extra_lives(&self) -> u32 {
        self.game.extra_lives().balance()
    }

    #[wasm_bindgen(js_name = beginPurchase)]
    pub fn begin_purchase(&mut self) -> bool {
        self.game.begin_purchase()
    }

    /// Feed a store event JSON, e.g. `{"status":"purchased","product_id":..,"transaction_id":..}`.
    /// Returns whether lives were credited.
    #[wasm_bindgen(js_name = purchaseEvent)]
    pub fn purchase_event(&mut self, json: &str) -> bool {
        match serde_json::from_str::<PurchaseEvent>(json) {
            Ok(event) => matches!(
                self.game.handle_purchase_event(&event),
                crate::extra_lives::CreditOutcome::Credited(_)
            ),
            Err(e) => {
                log::warn!("Malformed purchase event: {e}");
                false
            }
        }
    }

    #[wasm_bindgen(js_name = submitScore)]
    pub fn submit_score(&mut self, player_name: &str) -> Option<String> {
        self.game
            .submit_score(player_name)
            .and_then(|entry| serde_json::to_string(&entry).ok())
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
