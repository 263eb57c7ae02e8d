//! Global score leaderboard
//!
//! Entries are kept sorted by score (descending, earlier submissions first on
//! ties). Weekly and daily views are scoped to the current ISO week and UTC
//! calendar day of the query time, and only list submissions that raised the
//! player's best within that window.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_LEADERBOARD_LIMIT, MAX_PLAYER_NAME_LEN};
use crate::theme::Theme;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Errors raised when submitting a score
#[derive(Debug, Error, PartialEq)]
pub enum LeaderboardError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player name is {len} characters, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },
    #[error("theme must not be empty")]
    EmptyTheme,
    #[error("leaderboard rejected the submission: {0}")]
    Rejected(String),
}

fn default_theme() -> String {
    Theme::Retro.as_str().to_string()
}

/// Submission body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScore {
    pub player_name: String,
    pub score: u32,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl NewScore {
    pub fn new(player_name: impl Into<String>, score: u32, theme: Theme) -> Self {
        Self {
            player_name: player_name.into(),
            score,
            theme: theme.as_str().to_string(),
        }
    }

    /// Trim and check the submission
    pub fn validate(mut self) -> Result<Self, LeaderboardError> {
        self.player_name = self.player_name.trim().to_string();
        let len = self.player_name.chars().count();
        if len == 0 {
            return Err(LeaderboardError::EmptyName);
        }
        if len > MAX_PLAYER_NAME_LEN {
            return Err(LeaderboardError::NameTooLong {
                len,
                max: MAX_PLAYER_NAME_LEN,
            });
        }
        self.theme = self.theme.trim().to_string();
        if self.theme.is_empty() {
            return Err(LeaderboardError::EmptyTheme);
        }
        Ok(self)
    }
}

/// A stored leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: u64,
    pub player_name: String,
    pub score: u32,
    pub theme: String,
    /// Unix timestamp (ms) when submitted
    pub created_at: u64,
}

/// Time window of a ranking query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    AllTime,
    Weekly,
    Daily,
}

impl Period {
    /// Route segment, e.g. `all-time`
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::AllTime => "all-time",
            Period::Weekly => "weekly",
            Period::Daily => "daily",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all-time" => Some(Period::AllTime),
            "weekly" => Some(Period::Weekly),
            "daily" => Some(Period::Daily),
            _ => None,
        }
    }

    /// Whether a submission time falls in the same window as `now_ms`
    pub fn contains(&self, created_at: u64, now_ms: u64) -> bool {
        match self {
            Period::AllTime => true,
            Period::Weekly => iso_week_start(created_at) == iso_week_start(now_ms),
            Period::Daily => day_index(created_at) == day_index(now_ms),
        }
    }
}

/// Days since the Unix epoch (UTC)
pub fn day_index(ms: u64) -> u64 {
    ms / MS_PER_DAY
}

/// Day index of the Monday starting the ISO week containing `ms`
pub fn iso_week_start(ms: u64) -> u64 {
    let day = day_index(ms);
    // 1970-01-01 was a Thursday, so Monday is (day + 3) % 7 == 0
    day.saturating_sub((day + 3) % 7)
}

/// Destination for finalized scores
pub trait ScoreSink {
    fn submit(&mut self, score: NewScore) -> Result<LeaderboardEntry, LeaderboardError>;
}

/// In-memory ranked leaderboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    next_id: u64,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and store a score
    pub fn add(&mut self, score: NewScore, now_ms: u64) -> Result<LeaderboardEntry, LeaderboardError> {
        let score = score.validate()?;
        let entry = LeaderboardEntry {
            id: self.next_id.max(1),
            player_name: score.player_name,
            score: score.score,
            theme: score.theme,
            created_at: now_ms,
        };
        self.next_id = entry.id + 1;

        // Insert after every entry with an equal or higher score
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry.clone());
        log::info!(
            "Leaderboard entry #{} for {}: {} (rank {})",
            entry.id,
            entry.player_name,
            entry.score,
            pos + 1
        );
        Ok(entry)
    }

    /// Top entries of a period, best first
    pub fn top(&self, period: Period, limit: Option<usize>, now_ms: u64) -> Vec<LeaderboardEntry> {
        let in_window: Vec<&LeaderboardEntry> = self
            .entries
            .iter()
            .filter(|e| period.contains(e.created_at, now_ms))
            .collect();
        let ranked = match period {
            Period::AllTime => in_window,
            Period::Weekly | Period::Daily => improvements_only(in_window),
        };
        ranked
            .into_iter()
            .take(limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT))
            .cloned()
            .collect()
    }

    /// Rank a score would get on the all-time board (1-indexed)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Best all-time score of a player (0 if none)
    pub fn personal_best(&self, player_name: &str) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.player_name == player_name)
            .map(|e| e.score)
            .max()
            .unwrap_or(0)
    }

    /// Top score on the board (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }
}

/// Keep entries that beat the same player's earlier best, preserving rank order
fn improvements_only(ranked: Vec<&LeaderboardEntry>) -> Vec<&LeaderboardEntry> {
    let mut by_submission = ranked.clone();
    by_submission.sort_by_key(|e| e.id);

    let mut best: HashMap<&str, u32> = HashMap::new();
    let mut kept = HashSet::new();
    for entry in by_submission {
        let previous = best.entry(entry.player_name.as_str()).or_insert(0);
        if entry.score > *previous {
            *previous = entry.score;
            kept.insert(entry.id);
        }
    }
    ranked.into_iter().filter(|e| kept.contains(&e.id)).collect()
}

impl ScoreSink for Leaderboard {
    fn submit(&mut self, score: NewScore) -> Result<LeaderboardEntry, LeaderboardError> {
        self.add(score, crate::platform::now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-03 12:00 UTC, a Wednesday
    const WED: u64 = 1_704_283_200_000;

    fn add(board: &mut Leaderboard, name: &str, score: u32, at: u64) {
        board.add(NewScore::new(name, score, Theme::Retro), at).unwrap();
    }

    #[test]
    fn test_entries_sorted_descending() {
        let mut board = Leaderboard::new();
        add(&mut board, "ann", 50, WED);
        add(&mut board, "bob", 120, WED);
        add(&mut board, "cat", 80, WED);
        let scores: Vec<u32> = board.top(Period::AllTime, None, WED).iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![120, 80, 50]);
        assert_eq!(board.top_score(), Some(120));
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let mut board = Leaderboard::new();
        add(&mut board, "first", 70, WED);
        add(&mut board, "second", 70, WED);
        let names: Vec<String> = board
            .top(Period::AllTime, None, WED)
            .into_iter()
            .map(|e| e.player_name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_limit() {
        let mut board = Leaderboard::new();
        for i in 0..15 {
            add(&mut board, "p", i * 10, WED);
        }
        assert_eq!(board.top(Period::AllTime, None, WED).len(), 10);
        assert_eq!(board.top(Period::AllTime, Some(3), WED).len(), 3);
    }

    #[test]
    fn test_weekly_and_daily_scoping() {
        let mut board = Leaderboard::new();
        let monday = WED - 2 * MS_PER_DAY;
        let last_sunday = monday - MS_PER_DAY;
        add(&mut board, "old", 500, last_sunday);
        add(&mut board, "mon", 300, monday);
        add(&mut board, "wed", 100, WED);

        let weekly: Vec<u32> = board.top(Period::Weekly, None, WED).iter().map(|e| e.score).collect();
        assert_eq!(weekly, vec![300, 100]);
        let daily: Vec<u32> = board.top(Period::Daily, None, WED).iter().map(|e| e.score).collect();
        assert_eq!(daily, vec![100]);
        assert_eq!(board.top(Period::AllTime, None, WED).len(), 3);
    }

    #[test]
    fn test_period_views_list_only_improvements() {
        let mut board = Leaderboard::new();
        add(&mut board, "ann", 80, WED);
        add(&mut board, "ann", 60, WED);
        add(&mut board, "bob", 70, WED);
        add(&mut board, "ann", 90, WED);
        add(&mut board, "cat", 0, WED);

        let daily: Vec<(String, u32)> = board
            .top(Period::Daily, None, WED)
            .into_iter()
            .map(|e| (e.player_name, e.score))
            .collect();
        assert_eq!(
            daily,
            vec![
                ("ann".to_string(), 90),
                ("ann".to_string(), 80),
                ("bob".to_string(), 70),
            ]
        );
        assert_eq!(board.top(Period::Weekly, None, WED).len(), 3);
        assert_eq!(board.top(Period::AllTime, None, WED).len(), 5);
    }

    #[test]
    fn test_period_best_resets_with_window() {
        let mut board = Leaderboard::new();
        let yesterday = WED - MS_PER_DAY;
        add(&mut board, "ann", 90, yesterday);
        add(&mut board, "ann", 40, WED);

        let daily: Vec<u32> = board.top(Period::Daily, None, WED).iter().map(|e| e.score).collect();
        assert_eq!(daily, vec![40]);
        let weekly: Vec<u32> = board.top(Period::Weekly, None, WED).iter().map(|e| e.score).collect();
        assert_eq!(weekly, vec![90]);
    }

    #[test]
    fn test_iso_week_starts_monday() {
        // 1970-01-05 was the first Monday
        assert_eq!(iso_week_start(4 * MS_PER_DAY), 4);
        assert_eq!(iso_week_start(10 * MS_PER_DAY), 4);
        assert_eq!(iso_week_start(11 * MS_PER_DAY), 11);
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            NewScore::new("   ", 10, Theme::Retro).validate(),
            Err(LeaderboardError::EmptyName)
        );
        assert_eq!(
            NewScore::new("x".repeat(21), 10, Theme::Retro).validate(),
            Err(LeaderboardError::NameTooLong { len: 21, max: 20 })
        );
        let ok = NewScore::new("  neo  ", 10, Theme::Modern).validate().unwrap();
        assert_eq!(ok.player_name, "neo");
        assert_eq!(ok.theme, "modern");
    }

    #[test]
    fn test_wire_format() {
        let body: NewScore = serde_json::from_str(r#"{"playerName":"ann","score":40}"#).unwrap();
        assert_eq!(body.theme, "retro");

        let mut board = Leaderboard::new();
        let entry = board.add(body, WED).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"playerName\":\"ann\""));
        assert!(json.contains("\"createdAt\":1704283200000"));
        assert_eq!(entry.id, 1);
    }

    #[test]
    fn test_rank_and_personal_best() {
        let mut board = Leaderboard::new();
        assert_eq!(board.potential_rank(0), None);
        assert_eq!(board.potential_rank(10), Some(1));
        add(&mut board, "ann", 50, WED);
        add(&mut board, "ann", 90, WED);
        add(&mut board, "bob", 70, WED);
        assert_eq!(board.potential_rank(80), Some(2));
        assert_eq!(board.potential_rank(10), Some(4));
        assert_eq!(board.personal_best("ann"), 90);
        assert_eq!(board.personal_best("zed"), 0);
    }

    #[test]
    fn test_period_routes() {
        for period in [Period::AllTime, Period::Weekly, Period::Daily] {
            assert_eq!(Period::from_str(period.as_str()), Some(period));
        }
        assert_eq!(Period::from_str("monthly"), None);
    }
}
