//! Ad gating
//!
//! Ads wait for the tracking permission decision instead of polling a
//! nullable flag. The decision is persisted so the prompt is only shown once.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore, keys};

/// Tracking permission decision reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackingPermission {
    /// Not asked yet, or the prompt is still open
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl TrackingPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingPermission::Unknown => "unknown",
            TrackingPermission::Granted => "granted",
            TrackingPermission::Denied => "denied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Some(TrackingPermission::Unknown),
            "granted" | "authorized" => Some(TrackingPermission::Granted),
            "denied" | "restricted" => Some(TrackingPermission::Denied),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        *self != TrackingPermission::Unknown
    }
}

/// Decides when the ad collaborator may load or show ads
#[derive(Debug, Clone)]
pub struct AdGate {
    pub enabled: bool,
    permission: TrackingPermission,
    game_over_count: u32,
}

impl AdGate {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw: String = persistence::load_or(store, keys::TRACKING_PERMISSION, String::new());
        let permission = TrackingPermission::from_str(&raw).unwrap_or_default();
        Self {
            enabled: true,
            permission,
            game_over_count: 0,
        }
    }

    pub fn permission(&self) -> TrackingPermission {
        self.permission
    }

    /// Record the platform's answer. `Unknown` is not persisted.
    pub fn set_permission(&mut self, store: &dyn KeyValueStore, permission: TrackingPermission) {
        self.permission = permission;
        if permission.is_resolved() {
            persistence::save(store, keys::TRACKING_PERMISSION, permission.as_str());
            log::info!("Tracking permission: {}", permission.as_str());
        }
    }

    /// Ads may be requested once the tracking decision is known
    pub fn can_load_ads(&self) -> bool {
        self.enabled && self.permission.is_resolved()
    }

    /// Personalized ads only with explicit consent
    pub fn personalized(&self) -> bool {
        self.permission == TrackingPermission::Granted
    }

    /// Count a game over. Returns whether an interstitial should be shown
    /// (every other game over: 2nd, 4th, ...).
    pub fn on_game_over(&mut self) -> bool {
        self.game_over_count += 1;
        self.can_load_ads() && self.game_over_count % 2 == 0
    }

    pub fn game_over_count(&self) -> u32 {
        self.game_over_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_unknown_permission_blocks_ads() {
        let store = MemoryStore::new();
        let mut gate = AdGate::load(&store);
        assert_eq!(gate.permission(), TrackingPermission::Unknown);
        assert!(!gate.can_load_ads());
        assert!(!gate.on_game_over());
        assert!(!gate.on_game_over());
    }

    #[test]
    fn test_interstitial_every_other_game_over() {
        let store = MemoryStore::new();
        let mut gate = AdGate::load(&store);
        gate.set_permission(&store, TrackingPermission::Denied);
        assert!(gate.can_load_ads());
        assert!(!gate.personalized());
        let shown: Vec<bool> = (0..4).map(|_| gate.on_game_over()).collect();
        assert_eq!(shown, vec![false, true, false, true]);
    }

    #[test]
    fn test_disabled_gate_never_shows() {
        let store = MemoryStore::new();
        let mut gate = AdGate::load(&store);
        gate.set_permission(&store, TrackingPermission::Granted);
        gate.enabled = false;
        gate.on_game_over();
        assert!(!gate.on_game_over());
    }

    #[test]
    fn test_decision_persists() {
        let store = MemoryStore::new();
        let mut gate = AdGate::load(&store);
        gate.set_permission(&store, TrackingPermission::Granted);
        let reloaded = AdGate::load(&store);
        assert_eq!(reloaded.permission(), TrackingPermission::Granted);
        assert!(reloaded.personalized());
    }
}
