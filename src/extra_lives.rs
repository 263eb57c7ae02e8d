//! Extra-life credits and the consumable purchase flow
//!
//! The persisted balance is the source of truth. Before spending or crediting,
//! the in-memory balance is compared with storage; on disagreement memory is
//! resynced and the operation is refused, so neither value is trusted blindly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::consts::LIVES_PER_PURCHASE;
use crate::persistence::{self, KeyValueStore, keys};

/// Store product id of the extra lives pack
pub const EXTRA_LIVES_PRODUCT_ID: &str = "ExtraLives";

/// Result reported by the native store for a purchase or restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurchaseEvent {
    Purchased {
        product_id: String,
        transaction_id: String,
    },
    Failed {
        product_id: String,
        reason: String,
    },
    Restored {
        product_id: String,
        transaction_id: String,
    },
}

impl PurchaseEvent {
    pub fn product_id(&self) -> &str {
        match self {
            PurchaseEvent::Purchased { product_id, .. }
            | PurchaseEvent::Failed { product_id, .. }
            | PurchaseEvent::Restored { product_id, .. } => product_id,
        }
    }
}

/// Purchase attempt lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseState {
    Idle,
    /// Waiting for the store to confirm or fail
    Purchasing,
}

/// What handling a purchase event did to the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// Lives added; carries the new balance
    Credited(u32),
    /// Store reported failure
    Failed,
    /// Consumables are not restorable
    RestoredIgnored,
    /// Missing or already-used transaction id
    Rejected,
    /// Memory and storage disagreed; memory resynced, nothing credited
    TamperDetected,
    /// Event for another product
    Unrelated,
}

/// Result of trying to spend a life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendOutcome {
    /// One life consumed
    Spent,
    /// Balance is zero
    Empty,
    /// Memory disagreed with storage and was resynced; nothing spent
    Resynced { available: bool },
}

/// Credit balance plus the pending purchase state
#[derive(Debug, Clone)]
pub struct ExtraLives {
    balance: u32,
    state: PurchaseState,
    credited: HashSet<String>,
}

impl ExtraLives {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let balance = persistence::load_or(store, keys::EXTRA_LIVES, 0u32);
        log::info!("Extra lives balance: {balance}");
        Self {
            balance,
            state: PurchaseState::Idle,
            credited: HashSet::new(),
        }
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn state(&self) -> PurchaseState {
        self.state
    }

    /// Re-read storage; on mismatch resync memory and return the stored value as `Err`
    fn verify(&mut self, store: &dyn KeyValueStore) -> Result<(), u32> {
        let stored = persistence::load_or(store, keys::EXTRA_LIVES, 0u32);
        if stored != self.balance {
            log::warn!(
                "Extra lives mismatch (memory={}, stored={stored}), resyncing",
                self.balance
            );
            self.balance = stored;
            return Err(stored);
        }
        Ok(())
    }

    /// Spend one life, reporting why when nothing was spent
    pub fn spend(&mut self, store: &dyn KeyValueStore) -> SpendOutcome {
        if let Err(stored) = self.verify(store) {
            return SpendOutcome::Resynced { available: stored > 0 };
        }
        if self.balance == 0 {
            log::info!("No extra lives available");
            return SpendOutcome::Empty;
        }
        self.balance -= 1;
        persistence::save(store, keys::EXTRA_LIVES, self.balance);
        log::info!("Used extra life, {} remaining", self.balance);
        SpendOutcome::Spent
    }

    /// Spend one life. On a detected mismatch nothing is spent and the answer
    /// is whether the stored balance is positive, so the caller can retry.
    pub fn use_extra_life(&mut self, store: &dyn KeyValueStore) -> bool {
        match self.spend(store) {
            SpendOutcome::Spent => true,
            SpendOutcome::Empty => false,
            SpendOutcome::Resynced { available } => available,
        }
    }

    /// Begin a purchase. Refused while another one is pending.
    pub fn begin_purchase(&mut self) -> bool {
        if self.state == PurchaseState::Purchasing {
            log::info!("Purchase already in progress");
            return false;
        }
        self.state = PurchaseState::Purchasing;
        true
    }

    /// Apply a store event. Only a confirmed, unseen transaction credits lives.
    pub fn handle_event(&mut self, store: &dyn KeyValueStore, event: &PurchaseEvent) -> CreditOutcome {
        if event.product_id() != EXTRA_LIVES_PRODUCT_ID {
            return CreditOutcome::Unrelated;
        }
        self.state = PurchaseState::Idle;

        match event {
            PurchaseEvent::Purchased { transaction_id, .. } => {
                if transaction_id.trim().is_empty() {
                    log::warn!("Purchase without transaction id, not crediting");
                    return CreditOutcome::Rejected;
                }
                if self.credited.contains(transaction_id) {
                    log::warn!("Transaction {transaction_id} already credited");
                    return CreditOutcome::Rejected;
                }
                if self.verify(store).is_err() {
                    return CreditOutcome::TamperDetected;
                }
                self.balance += LIVES_PER_PURCHASE;
                persistence::save(store, keys::EXTRA_LIVES, self.balance);
                self.credited.insert(transaction_id.clone());
                log::info!(
                    "Purchase {transaction_id} confirmed, added {LIVES_PER_PURCHASE} lives (total {})",
                    self.balance
                );
                CreditOutcome::Credited(self.balance)
            }
            PurchaseEvent::Failed { reason, .. } => {
                log::info!("Purchase failed: {reason}");
                CreditOutcome::Failed
            }
            PurchaseEvent::Restored { transaction_id, .. } => {
                log::info!("Restored transaction {transaction_id} ignored (consumable)");
                CreditOutcome::RestoredIgnored
            }
        }
    }

    /// External balance changes are only allowed to zero it
    pub fn reset(&mut self, store: &dyn KeyValueStore, lives: u32) -> bool {
        if lives != 0 {
            log::warn!("Refusing external extra lives change to {lives}");
            return false;
        }
        self.balance = 0;
        persistence::save(store, keys::EXTRA_LIVES, 0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn purchased(id: &str) -> PurchaseEvent {
        PurchaseEvent::Purchased {
            product_id: EXTRA_LIVES_PRODUCT_ID.to_string(),
            transaction_id: id.to_string(),
        }
    }

    fn with_balance(n: u32) -> (MemoryStore, ExtraLives) {
        let store = MemoryStore::new();
        store.set(keys::EXTRA_LIVES, &n.to_string()).unwrap();
        let lives = ExtraLives::load(&store);
        (store, lives)
    }

    #[test]
    fn test_three_lives_then_none() {
        let (store, mut lives) = with_balance(3);
        assert!(lives.use_extra_life(&store));
        assert!(lives.use_extra_life(&store));
        assert!(lives.use_extra_life(&store));
        assert!(!lives.use_extra_life(&store));
        assert_eq!(persistence::load_or(&store, keys::EXTRA_LIVES, 99u32), 0);
    }

    #[test]
    fn test_purchase_restores_availability() {
        let (store, mut lives) = with_balance(0);
        assert!(!lives.use_extra_life(&store));
        assert!(lives.begin_purchase());
        assert_eq!(lives.state(), PurchaseState::Purchasing);
        assert_eq!(lives.handle_event(&store, &purchased("tx-1")), CreditOutcome::Credited(3));
        assert_eq!(lives.state(), PurchaseState::Idle);
        assert!(lives.use_extra_life(&store));
        assert_eq!(lives.balance(), 2);
    }

    #[test]
    fn test_missing_transaction_id_never_credits() {
        let (store, mut lives) = with_balance(1);
        lives.begin_purchase();
        assert_eq!(lives.handle_event(&store, &purchased("")), CreditOutcome::Rejected);
        assert_eq!(lives.balance(), 1);
        assert_eq!(lives.state(), PurchaseState::Idle);
    }

    #[test]
    fn test_duplicate_transaction_credits_once() {
        let (store, mut lives) = with_balance(0);
        assert_eq!(lives.handle_event(&store, &purchased("tx-9")), CreditOutcome::Credited(3));
        assert_eq!(lives.handle_event(&store, &purchased("tx-9")), CreditOutcome::Rejected);
        assert_eq!(lives.balance(), 3);
    }

    #[test]
    fn test_failed_and_restored_do_not_credit() {
        let (store, mut lives) = with_balance(0);
        let failed = PurchaseEvent::Failed {
            product_id: EXTRA_LIVES_PRODUCT_ID.to_string(),
            reason: "cancelled".to_string(),
        };
        let restored = PurchaseEvent::Restored {
            product_id: EXTRA_LIVES_PRODUCT_ID.to_string(),
            transaction_id: "old".to_string(),
        };
        assert_eq!(lives.handle_event(&store, &failed), CreditOutcome::Failed);
        assert_eq!(lives.handle_event(&store, &restored), CreditOutcome::RestoredIgnored);
        assert_eq!(lives.balance(), 0);
    }

    #[test]
    fn test_pending_purchase_blocks_new_attempt() {
        let (store, mut lives) = with_balance(0);
        assert!(lives.begin_purchase());
        assert!(!lives.begin_purchase());
        lives.handle_event(&store, &purchased("tx-2"));
        assert!(lives.begin_purchase());
    }

    #[test]
    fn test_other_product_is_unrelated() {
        let (store, mut lives) = with_balance(0);
        lives.begin_purchase();
        let event = PurchaseEvent::Purchased {
            product_id: "FootballTheme".to_string(),
            transaction_id: "tx-3".to_string(),
        };
        assert_eq!(lives.handle_event(&store, &event), CreditOutcome::Unrelated);
        assert_eq!(lives.state(), PurchaseState::Purchasing);
    }

    #[test]
    fn test_tamper_on_use_resyncs_without_spending() {
        let (store, mut lives) = with_balance(1);
        // Another writer bumps the stored balance
        store.set(keys::EXTRA_LIVES, "5").unwrap();
        assert!(lives.use_extra_life(&store));
        assert_eq!(lives.balance(), 5);
        // Second call agrees with storage and spends
        assert!(lives.use_extra_life(&store));
        assert_eq!(lives.balance(), 4);
    }

    #[test]
    fn test_spend_reports_resync() {
        let (store, mut lives) = with_balance(2);
        store.set(keys::EXTRA_LIVES, "3").unwrap();
        assert_eq!(lives.spend(&store), SpendOutcome::Resynced { available: true });
        assert_eq!(lives.spend(&store), SpendOutcome::Spent);
        assert_eq!(lives.balance(), 2);
    }

    #[test]
    fn test_tamper_to_zero_denies_life() {
        let (store, mut lives) = with_balance(2);
        store.set(keys::EXTRA_LIVES, "0").unwrap();
        assert!(!lives.use_extra_life(&store));
        assert_eq!(lives.balance(), 0);
    }

    #[test]
    fn test_tamper_on_credit_refuses() {
        let (store, mut lives) = with_balance(0);
        store.set(keys::EXTRA_LIVES, "7").unwrap();
        assert_eq!(lives.handle_event(&store, &purchased("tx-4")), CreditOutcome::TamperDetected);
        assert_eq!(lives.balance(), 7);
        assert_eq!(persistence::load_or(&store, keys::EXTRA_LIVES, 0u32), 7);
    }

    #[test]
    fn test_reset_only_to_zero() {
        let (store, mut lives) = with_balance(4);
        assert!(!lives.reset(&store, 10));
        assert_eq!(lives.balance(), 4);
        assert!(lives.reset(&store, 0));
        assert_eq!(lives.balance(), 0);
    }

    #[test]
    fn test_event_wire_format() {
        let json = r#"{"status":"purchased","product_id":"ExtraLives","transaction_id":"123"}"#;
        let event: PurchaseEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, purchased("123"));
    }
}
