//! Game controller
//!
//! Owns the session and every collaborator that reacts to it. Presentation
//! issues commands and receives [`Snapshot`]s through subscriptions; it never
//! touches session state directly.

use std::collections::VecDeque;

use crate::achievements::{Achievement, AchievementBook};
use crate::ads::{AdGate, TrackingPermission};
use crate::consts::*;
use crate::extra_lives::{CreditOutcome, ExtraLives, PurchaseEvent, SpendOutcome};
use crate::leaderboard::{LeaderboardEntry, NewScore, ScoreSink};
use crate::persistence::{self, KeyValueStore, keys};
use crate::platform::{self, Command};
use crate::sim::{Direction, GamePhase, GameSession, Snapshot, TickOutcome, tick};
use crate::theme::Theme;

/// Snapshot callback
pub type Subscriber = Box<dyn FnMut(&Snapshot)>;

/// Why a continuation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueError {
    /// Not in game over, or every heading is blocked
    NotResumable,
    /// Balance is zero
    NoLives,
    /// Stored balance disagreed with memory; retry after resync
    BalanceResynced,
}

/// Game instance holding all state
pub struct Game {
    session: GameSession,
    store: Box<dyn KeyValueStore>,
    achievements: AchievementBook,
    extra_lives: ExtraLives,
    ads: AdGate,
    theme: Theme,
    purchased_themes: Vec<Theme>,
    leaderboard: Option<Box<dyn ScoreSink>>,
    notifications: VecDeque<Achievement>,
    subscribers: Vec<Subscriber>,
    accumulator_ms: u32,
    show_interstitial: bool,
    /// The current run has already been sent to the leaderboard
    submitted: bool,
}

impl Game {
    /// Seed in-memory state from storage
    pub fn new(store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let high_score = persistence::load_or(store.as_ref(), keys::HIGH_SCORE, 0u32);
        let achievements = AchievementBook::load(store.as_ref());
        let extra_lives = ExtraLives::load(store.as_ref());
        let ads = AdGate::load(store.as_ref());
        let theme = Theme::load(store.as_ref());
        let purchased_themes = Theme::load_purchased(store.as_ref());
        log::info!("Game ready (seed {seed}, high score {high_score}, theme {})", theme.as_str());

        Self {
            session: GameSession::new(seed, high_score),
            store,
            achievements,
            extra_lives,
            ads,
            theme,
            purchased_themes,
            leaderboard: None,
            notifications: VecDeque::new(),
            subscribers: Vec::new(),
            accumulator_ms: 0,
            show_interstitial: false,
            submitted: false,
        }
    }

    /// Attach a leaderboard for finalized scores
    pub fn with_leaderboard(mut self, sink: Box<dyn ScoreSink>) -> Self {
        self.leaderboard = Some(sink);
        self
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    pub fn extra_lives(&self) -> &ExtraLives {
        &self.extra_lives
    }

    pub fn ads(&self) -> &AdGate {
        &self.ads
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn notify(&mut self) {
        let snapshot = self.session.snapshot();
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }

    /// Dispatch an input-adapter command
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Start => self.start(),
            Command::Restart => self.restart(),
            Command::Turn(direction) => self.change_direction(direction),
            Command::ContinueWithExtraLife => self.continue_with_extra_life().is_ok(),
        }
    }

    /// Start a fresh run. Ignored while a run is in progress.
    pub fn start(&mut self) -> bool {
        if self.session.phase == GamePhase::Playing {
            log::warn!("Start ignored: a game is already running");
            return false;
        }
        self.session.start();
        self.accumulator_ms = 0;
        self.show_interstitial = false;
        self.submitted = false;
        self.achievements.increment_games_played(self.store.as_ref());
        self.check_achievements();
        log::info!("Game {} started", self.achievements.games_played());
        self.notify();
        true
    }

    /// Fresh run after a game over
    pub fn restart(&mut self) -> bool {
        if self.session.phase != GamePhase::GameOver {
            return false;
        }
        self.start()
    }

    pub fn change_direction(&mut self, direction: Direction) -> bool {
        self.session.change_direction(direction)
    }

    pub fn reset_to_menu(&mut self) {
        self.session.reset_to_menu();
        self.accumulator_ms = 0;
        self.notify();
    }

    /// Spend an extra life to keep playing with the current score
    pub fn continue_with_extra_life(&mut self) -> Result<(), ContinueError> {
        if !self.session.can_resume() {
            return Err(ContinueError::NotResumable);
        }
        match self.extra_lives.spend(self.store.as_ref()) {
            SpendOutcome::Spent => {}
            SpendOutcome::Empty => return Err(ContinueError::NoLives),
            SpendOutcome::Resynced { .. } => return Err(ContinueError::BalanceResynced),
        }
        self.session.resume();
        self.accumulator_ms = 0;
        self.show_interstitial = false;
        self.submitted = false;
        log::info!("Continuing with score {}", self.session.score);
        self.notify();
        Ok(())
    }

    /// Advance wall-clock time; runs one tick per `TICK_MS` while playing
    pub fn update(&mut self, elapsed_ms: u32) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        if self.session.phase != GamePhase::Playing {
            self.accumulator_ms = 0;
            return outcomes;
        }

        self.accumulator_ms = self
            .accumulator_ms
            .saturating_add(elapsed_ms)
            .min(TICK_MS * MAX_SUBSTEPS);
        while self.accumulator_ms >= TICK_MS {
            self.accumulator_ms -= TICK_MS;
            outcomes.push(self.step());
            if self.session.phase != GamePhase::Playing {
                // Timer teardown happens with the transition
                self.accumulator_ms = 0;
                break;
            }
        }
        outcomes
    }

    /// Run exactly one tick and its consequences
    pub fn step(&mut self) -> TickOutcome {
        let outcome = tick(&mut self.session);
        match outcome {
            TickOutcome::Idle => return outcome,
            TickOutcome::Continue => {}
            TickOutcome::AteFood => self.check_achievements(),
            TickOutcome::GameOver | TickOutcome::BoardFull => self.on_game_over(),
        }
        self.notify();
        outcome
    }

    fn on_game_over(&mut self) {
        persistence::save(self.store.as_ref(), keys::HIGH_SCORE, self.session.high_score);
        self.check_achievements();
        self.show_interstitial = self.ads.on_game_over();
    }

    fn check_achievements(&mut self) {
        let themes = self.unlocked_themes();
        let unlocked = self.achievements.check(
            self.store.as_ref(),
            self.session.score,
            self.session.high_score,
            &themes,
            platform::now_ms(),
        );
        self.notifications.extend(unlocked);
    }

    /// Themes unlocked by the high score or bought outright
    pub fn unlocked_themes(&self) -> Vec<Theme> {
        Theme::available(self.session.high_score, &self.purchased_themes)
    }

    /// Record a confirmed premium theme purchase. Non-premium themes cannot be bought.
    pub fn grant_theme(&mut self, theme: Theme) -> bool {
        if !theme.is_premium() {
            log::warn!("Theme {} is not for sale", theme.as_str());
            return false;
        }
        if !self.purchased_themes.contains(&theme) {
            self.purchased_themes.push(theme);
            Theme::save_purchased(self.store.as_ref(), &self.purchased_themes);
            log::info!("Theme {} purchased", theme.name());
        }
        self.check_achievements();
        true
    }

    /// Switch theme if it is unlocked
    pub fn select_theme(&mut self, theme: Theme) -> bool {
        let purchased = self.purchased_themes.contains(&theme);
        if !theme.is_unlocked(self.session.high_score, purchased) {
            log::info!("Theme {} is locked", theme.as_str());
            return false;
        }
        self.theme = theme;
        theme.save(self.store.as_ref());
        true
    }

    /// Oldest pending unlock notification
    pub fn next_notification(&mut self) -> Option<Achievement> {
        self.notifications.pop_front()
    }

    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Whether the last game over asked for an interstitial; clears the request
    pub fn take_interstitial(&mut self) -> bool {
        std::mem::take(&mut self.show_interstitial)
    }

    pub fn set_tracking_permission(&mut self, permission: TrackingPermission) {
        self.ads.set_permission(self.store.as_ref(), permission);
    }

    pub fn set_ads_enabled(&mut self, enabled: bool) {
        self.ads.enabled = enabled;
    }

    pub fn begin_purchase(&mut self) -> bool {
        self.extra_lives.begin_purchase()
    }

    pub fn handle_purchase_event(&mut self, event: &PurchaseEvent) -> CreditOutcome {
        self.extra_lives.handle_event(self.store.as_ref(), event)
    }

    /// Submit the finished run's score, at most once per run.
    /// Failures are logged and swallowed, and leave the run submittable.
    pub fn submit_score(&mut self, player_name: &str) -> Option<LeaderboardEntry> {
        if self.session.phase != GamePhase::GameOver {
            return None;
        }
        if self.submitted {
            log::info!("Score {} was already submitted", self.session.score);
            return None;
        }
        let sink = self.leaderboard.as_mut()?;
        let score = NewScore::new(player_name, self.session.score, self.theme);
        match sink.submit(score) {
            Ok(entry) => {
                self.submitted = true;
                Some(entry)
            }
            Err(e) => {
                log::warn!("Score submission failed: {e}");
                None
            }
        }
    }
}
