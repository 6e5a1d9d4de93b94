//! Player balance and free-spin ledger

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::GameLimits;
use crate::error::SlotResult;

/// Balance and free spins of the active user
pub trait UserAccount: Send + Sync {
    fn user_id(&self) -> String;

    fn balance(&self) -> f64;

    /// Take `amount` from the balance; false (and no change) if it is short
    fn debit(&self, amount: f64) -> bool;

    fn credit(&self, amount: f64);

    fn free_spins(&self) -> u32;

    fn set_free_spins(&self, count: u32);
}

/// Serializable account state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: f64,
    pub free_spins: u32,
}

/// In-process account
#[derive(Debug)]
pub struct MemoryAccount {
    user_id: String,
    state: Mutex<AccountState>,
}

impl MemoryAccount {
    /// Balance granted to a newly created player
    pub const WELCOME_BALANCE: f64 = 100.0;
    /// Free spins granted to a newly created player
    pub const WELCOME_FREE_SPINS: u32 = 5;

    pub fn new(user_id: impl Into<String>, balance: f64, free_spins: u32) -> Self {
        Self {
            user_id: user_id.into(),
            state: Mutex::new(AccountState {
                balance,
                free_spins,
            }),
        }
    }

    /// New player with the welcome package
    pub fn welcome(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Self::WELCOME_BALANCE, Self::WELCOME_FREE_SPINS)
    }

    /// Add funds, validated against the deposit limit
    pub fn deposit(&self, amount: f64, limits: &GameLimits) -> SlotResult<f64> {
        limits.validate_deposit(amount)?;
        let mut state = self.state.lock();
        state.balance += amount;
        log::info!(
            "Deposit {amount:.2} for {}, balance {:.2}",
            self.user_id,
            state.balance
        );
        Ok(state.balance)
    }

    pub fn state(&self) -> AccountState {
        *self.state.lock()
    }
}

impl UserAccount for MemoryAccount {
    fn user_id(&self) -> String {
        self.user_id.clone()
    }

    fn balance(&self) -> f64 {
        self.state.lock().balance
    }

    fn debit(&self, amount: f64) -> bool {
        let mut state = self.state.lock();
        if state.balance < amount {
            return false;
        }
        state.balance -= amount;
        true
    }

    fn credit(&self, amount: f64) {
        self.state.lock().balance += amount;
    }

    fn free_spins(&self) -> u32 {
        self.state.lock().free_spins
    }

    fn set_free_spins(&self, count: u32) {
        self.state.lock().free_spins = count;
    }
}
