//! Achievement catalog and unlock evaluation
//!
//! Unlocks are one-way: once an entry is unlocked it is skipped by every
//! later evaluation, so checking the same inputs twice never unlocks twice.
//! Flags and timestamps are persisted per achievement id.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore, keys};
use crate::theme::Theme;

/// Grouping used by the achievement panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Score,
    Theme,
    Gameplay,
    Special,
}

/// Special one-off predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRule {
    /// Finish with a score of exactly 100
    Exact100,
}

/// Unlock predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Requirement {
    Score(u32),
    ThemeUnlock(Theme),
    GamesPlayed(u32),
    Special(SpecialRule),
}

impl Requirement {
    /// Test the predicate against the current progress
    pub fn is_met(&self, progress: &Progress<'_>) -> bool {
        match *self {
            Requirement::Score(threshold) => progress.score >= threshold,
            Requirement::ThemeUnlock(theme) => progress.unlocked_themes.contains(&theme),
            Requirement::GamesPlayed(threshold) => progress.games_played >= threshold,
            Requirement::Special(SpecialRule::Exact100) => progress.score == 100,
        }
    }
}

/// Static catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub requirement: Requirement,
}

/// The catalog, in display order
pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first_score",
        name: "First Bite",
        description: "Score your first 10 points",
        icon: "🍎",
        category: Category::Score,
        requirement: Requirement::Score(10),
    },
    AchievementDef {
        id: "century",
        name: "Century Club",
        description: "Reach 100 points in a single game",
        icon: "💯",
        category: Category::Score,
        requirement: Requirement::Score(100),
    },
    AchievementDef {
        id: "double_century",
        name: "Double Century",
        description: "Reach 200 points and unlock Halloween theme",
        icon: "🎃",
        category: Category::Score,
        requirement: Requirement::Score(200),
    },
    AchievementDef {
        id: "high_roller",
        name: "High Roller",
        description: "Reach 500 points in a single game",
        icon: "🔥",
        category: Category::Score,
        requirement: Requirement::Score(500),
    },
    AchievementDef {
        id: "style_conscious",
        name: "Style Conscious",
        description: "Unlock the Modern UI theme",
        icon: "💎",
        category: Category::Theme,
        requirement: Requirement::ThemeUnlock(Theme::Modern),
    },
    AchievementDef {
        id: "spooky_season",
        name: "Spooky Season",
        description: "Unlock the Halloween theme",
        icon: "👻",
        category: Category::Theme,
        requirement: Requirement::ThemeUnlock(Theme::Halloween),
    },
    AchievementDef {
        id: "persistent",
        name: "Persistent Player",
        description: "Play 10 games",
        icon: "🎮",
        category: Category::Gameplay,
        requirement: Requirement::GamesPlayed(10),
    },
    AchievementDef {
        id: "dedicated",
        name: "Dedicated Gamer",
        description: "Play 50 games",
        icon: "🏆",
        category: Category::Gameplay,
        requirement: Requirement::GamesPlayed(50),
    },
    AchievementDef {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Score exactly 100 points",
        icon: "✨",
        category: Category::Special,
        requirement: Requirement::Special(SpecialRule::Exact100),
    },
];

/// Inputs to one evaluation pass
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub score: u32,
    pub high_score: u32,
    pub unlocked_themes: &'a [Theme],
    pub games_played: u32,
}

/// Catalog entry plus its unlock state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub def: &'static AchievementDef,
    pub unlocked: bool,
    /// Unix timestamp (ms), set once on unlock
    pub unlocked_at: Option<u64>,
}

impl Achievement {
    pub fn id(&self) -> &'static str {
        self.def.id
    }
}

/// Ids of catalog entries whose predicate now holds and that are not yet unlocked.
///
/// `score` and `Special` entries are independent, so a score of exactly 100
/// can satisfy both `century` and `perfectionist` in one pass.
pub fn evaluate(progress: &Progress<'_>, achievements: &[Achievement]) -> Vec<&'static str> {
    achievements
        .iter()
        .filter(|a| !a.unlocked && a.def.requirement.is_met(progress))
        .map(|a| a.def.id)
        .collect()
}

/// Unlock summary for the achievement panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub unlocked: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent
    pub percentage: u32,
}

/// Live achievement state backed by storage
#[derive(Debug, Clone)]
pub struct AchievementBook {
    achievements: Vec<Achievement>,
    games_played: u32,
}

impl AchievementBook {
    /// Build from the catalog, restoring persisted unlocks
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let achievements = CATALOG
            .iter()
            .map(|def| {
                let unlocked = store
                    .get(&keys::achievement(def.id))
                    .ok()
                    .flatten()
                    .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
                    .unwrap_or(false);
                let unlocked_at = unlocked
                    .then(|| persistence::load_or(store, &keys::achievement_date(def.id), 0u64))
                    .filter(|ts| *ts > 0);
                Achievement {
                    def,
                    unlocked,
                    unlocked_at,
                }
            })
            .collect();
        let games_played = persistence::load_or(store, keys::GAMES_PLAYED, 0u32);

        let book = Self {
            achievements,
            games_played,
        };
        log::info!(
            "Loaded achievements: {}/{} unlocked, {} games played",
            book.summary().unlocked,
            CATALOG.len(),
            games_played
        );
        book
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.def.id == id)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.get(id).is_some_and(|a| a.unlocked)
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    /// Count one more game and persist the counter
    pub fn increment_games_played(&mut self, store: &dyn KeyValueStore) {
        self.games_played = self.games_played.saturating_add(1);
        persistence::save(store, keys::GAMES_PLAYED, self.games_played);
    }

    /// Evaluate, unlock and persist. Returns the newly unlocked entries in catalog order.
    pub fn check(
        &mut self,
        store: &dyn KeyValueStore,
        score: u32,
        high_score: u32,
        unlocked_themes: &[Theme],
        now_ms: u64,
    ) -> Vec<Achievement> {
        let progress = Progress {
            score,
            high_score,
            unlocked_themes,
            games_played: self.games_played,
        };
        evaluate(&progress, &self.achievements)
            .into_iter()
            .filter_map(|id| self.unlock(store, id, now_ms))
            .collect()
    }

    /// Flip an entry to unlocked. `None` if unknown or already unlocked.
    pub fn unlock(
        &mut self,
        store: &dyn KeyValueStore,
        id: &str,
        now_ms: u64,
    ) -> Option<Achievement> {
        let entry = self
            .achievements
            .iter_mut()
            .find(|a| a.def.id == id && !a.unlocked)?;
        entry.unlocked = true;
        entry.unlocked_at = Some(now_ms);

        persistence::save(store, &keys::achievement(id), true);
        persistence::save(store, &keys::achievement_date(id), now_ms);
        log::info!("Achievement unlocked: {} ({})", entry.def.name, id);
        Some(entry.clone())
    }

    pub fn summary(&self) -> ProgressSummary {
        let unlocked = self.achievements.iter().filter(|a| a.unlocked).count();
        let total = self.achievements.len();
        let percentage = if total == 0 {
            0
        } else {
            ((unlocked as f64 / total as f64) * 100.0).round() as u32
        };
        ProgressSummary {
            unlocked,
            total,
            percentage,
        }
    }
}

/// Text for sharing an unlock on social media
pub fn share_text(def: &AchievementDef, play_url: &str) -> String {
    format!(
        "🎉 I just unlocked \"{}\" in Snake Game! {}\n\n{}\n\nPlay now: {}",
        def.name, def.icon, def.description, play_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{BrokenStore, MemoryStore};

    fn check(book: &mut AchievementBook, store: &MemoryStore, score: u32) -> Vec<&'static str> {
        book.check(store, score, score, &[Theme::Retro], 1_000)
            .iter()
            .map(|a| a.id())
            .collect()
    }

    #[test]
    fn test_fresh_book_has_nothing_unlocked() {
        let store = MemoryStore::new();
        let book = AchievementBook::load(&store);
        assert_eq!(book.achievements().len(), CATALOG.len());
        assert_eq!(book.summary().unlocked, 0);
        assert_eq!(book.games_played(), 0);
    }

    #[test]
    fn test_century_unlocks_once() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        assert_eq!(check(&mut book, &store, 90), vec!["first_score"]);
        assert_eq!(check(&mut book, &store, 110), vec!["century"]);
        assert!(check(&mut book, &store, 110).is_empty());
        assert!(check(&mut book, &store, 150).is_empty());
    }

    #[test]
    fn test_exact_100_unlocks_two_at_once() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        let unlocked = check(&mut book, &store, 100);
        assert_eq!(unlocked, vec!["first_score", "century", "perfectionist"]);
    }

    #[test]
    fn test_perfectionist_needs_exact_score() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        check(&mut book, &store, 90);
        check(&mut book, &store, 110);
        assert!(!book.is_unlocked("perfectionist"));
        check(&mut book, &store, 100);
        assert!(book.is_unlocked("perfectionist"));
    }

    #[test]
    fn test_theme_and_games_played_requirements() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        for _ in 0..10 {
            book.increment_games_played(&store);
        }
        let unlocked: Vec<_> = book
            .check(&store, 0, 150, &[Theme::Retro, Theme::Modern], 5)
            .iter()
            .map(|a| a.id())
            .collect();
        assert_eq!(unlocked, vec!["style_conscious", "persistent"]);
        assert_eq!(persistence::load_or(&store, keys::GAMES_PLAYED, 0u32), 10);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let store = MemoryStore::new();
        let book = AchievementBook::load(&store);
        let progress = Progress {
            score: 500,
            high_score: 500,
            unlocked_themes: &[],
            games_played: 0,
        };
        let first = evaluate(&progress, book.achievements());
        let second = evaluate(&progress, book.achievements());
        assert_eq!(first, second);
        assert_eq!(first, vec!["first_score", "century", "double_century", "high_roller"]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unlocks_survive_reload() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        book.check(&store, 10, 10, &[], 42);

        let reloaded = AchievementBook::load(&store);
        let first = reloaded.get("first_score").unwrap();
        assert!(first.unlocked);
        assert_eq!(first.unlocked_at, Some(42));
        assert!(!reloaded.is_unlocked("century"));
    }

    #[test]
    fn test_unlock_timestamp_is_immutable() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        assert!(book.unlock(&store, "century", 10).is_some());
        assert!(book.unlock(&store, "century", 20).is_none());
        assert_eq!(book.get("century").unwrap().unlocked_at, Some(10));
        assert!(book.unlock(&store, "no_such_id", 10).is_none());
    }

    #[test]
    fn test_storage_failure_keeps_in_memory_unlocks() {
        let mut book = AchievementBook::load(&BrokenStore);
        let unlocked = book.check(&BrokenStore, 10, 10, &[], 1);
        assert_eq!(unlocked.len(), 1);
        assert!(book.is_unlocked("first_score"));
    }

    #[test]
    fn test_summary_rounds_percentage() {
        let store = MemoryStore::new();
        let mut book = AchievementBook::load(&store);
        book.unlock(&store, "first_score", 1);
        book.unlock(&store, "century", 1);
        let summary = book.summary();
        assert_eq!(summary.unlocked, 2);
        assert_eq!(summary.total, 9);
        assert_eq!(summary.percentage, 22);
    }

    #[test]
    fn test_share_text() {
        let def = &CATALOG[1];
        let text = share_text(def, "https://example.com");
        assert!(text.contains("Century Club"));
        assert!(text.ends_with("Play now: https://example.com"));
    }
}
