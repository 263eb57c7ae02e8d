//! Visual themes and their unlock rules
//!
//! The selected theme is persisted separately from scores. Colors and
//! shapes belong to the presentation layer; only identity and unlock rules
//! live here.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore, keys};

/// Selectable theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Retro,
    Modern,
    Halloween,
    Christmas,
    Football,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Retro,
        Theme::Modern,
        Theme::Halloween,
        Theme::Christmas,
        Theme::Football,
    ];

    /// Stable id, also used in storage and leaderboard entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Retro => "retro",
            Theme::Modern => "modern",
            Theme::Halloween => "halloween",
            Theme::Christmas => "christmas",
            Theme::Football => "football",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "retro" => Some(Theme::Retro),
            "modern" => Some(Theme::Modern),
            "halloween" => Some(Theme::Halloween),
            "christmas" => Some(Theme::Christmas),
            "football" => Some(Theme::Football),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Retro => "Retro Classic",
            Theme::Modern => "Modern UI",
            Theme::Halloween => "Halloween Spooky",
            Theme::Christmas => "Christmas Festive",
            Theme::Football => "Fall Football",
        }
    }

    /// High score needed to unlock (None = always available)
    pub fn unlock_requirement(&self) -> Option<u32> {
        match self {
            Theme::Retro => None,
            Theme::Modern => Some(100),
            Theme::Halloween => Some(200),
            Theme::Christmas => Some(300),
            Theme::Football => Some(700),
        }
    }

    /// Premium themes can also be bought outright
    pub fn is_premium(&self) -> bool {
        matches!(self, Theme::Football)
    }

    pub fn is_unlocked(&self, high_score: u32, purchased: bool) -> bool {
        if self.is_premium() && purchased {
            return true;
        }
        self.unlock_requirement()
            .map(|required| high_score >= required)
            .unwrap_or(true)
    }

    /// Themes available for a high score, in display order
    pub fn available(high_score: u32, purchased: &[Theme]) -> Vec<Theme> {
        Theme::ALL
            .into_iter()
            .filter(|t| t.is_unlocked(high_score, purchased.contains(t)))
            .collect()
    }

    /// Load the selected theme (defaults to Retro)
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw: String = persistence::load_or(store, keys::THEME, String::new());
        Theme::from_str(&raw).unwrap_or_default()
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        if persistence::save(store, keys::THEME, self.as_str()) {
            log::info!("Theme set to {}", self.name());
        }
    }

    /// Premium themes bought outright, stored as a JSON array of ids
    pub fn load_purchased(store: &dyn KeyValueStore) -> Vec<Theme> {
        let raw: String = persistence::load_or(store, keys::PURCHASED_THEMES, String::new());
        if raw.is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<Theme>>(&raw) {
            Ok(themes) => themes.into_iter().filter(Theme::is_premium).collect(),
            Err(e) => {
                log::warn!("Ignoring malformed purchased themes: {e}");
                Vec::new()
            }
        }
    }

    pub fn save_purchased(store: &dyn KeyValueStore, themes: &[Theme]) -> bool {
        match serde_json::to_string(themes) {
            Ok(json) => persistence::save(store, keys::PURCHASED_THEMES, json),
            Err(e) => {
                log::warn!("Failed to encode purchased themes: {e}");
                false
            }
        }
    }
}
