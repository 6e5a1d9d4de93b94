//! Immutable per-spin record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paytable::LineResult;

/// One resolved spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    /// Nominal bet, also on free spins
    pub bet: f64,
    pub win: f64,
    /// Symbol names per reel
    pub symbols: Vec<Vec<String>>,
    pub is_win: bool,
    pub is_bonus: bool,
    pub free_spins_used: u32,
    pub free_spins_awarded: u32,
    pub winning_lines: Vec<LineResult>,
    pub balance_before: f64,
    pub balance_after: f64,
    pub session_id: String,
}

impl SpinRecord {
    /// New record stamped now, with a fresh id
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        bet: f64,
        win: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            bet,
            win,
            symbols: Vec::new(),
            is_win: win > 0.0,
            is_bonus: false,
            free_spins_used: 0,
            free_spins_awarded: 0,
            winning_lines: Vec::new(),
            balance_before: 0.0,
            balance_after: 0.0,
            session_id: session_id.into(),
        }
    }

    pub fn with_symbols(mut self, symbols: Vec<Vec<String>>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_lines(mut self, lines: Vec<LineResult>) -> Self {
        self.winning_lines = lines;
        self
    }

    pub fn with_free_spin_used(mut self, used: bool) -> Self {
        self.free_spins_used = u32::from(used);
        self
    }

    /// Marks the record as a bonus trigger when `awarded > 0`
    pub fn with_bonus(mut self, awarded: u32) -> Self {
        self.is_bonus = awarded > 0;
        self.free_spins_awarded = awarded;
        self
    }

    pub fn with_balances(mut self, before: f64, after: f64) -> Self {
        self.balance_before = before;
        self.balance_after = after;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
