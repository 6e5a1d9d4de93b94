//! Aggregate play statistics

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::SpinRecord;

/// Lifetime statistics of a ledger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_spins: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_win_amount: f64,
    pub total_bet_amount: f64,
    pub biggest_win: f64,
    pub longest_win_streak: u64,
    pub longest_lose_streak: u64,
    pub current_win_streak: u64,
    pub current_lose_streak: u64,
    pub total_bonuses: u64,
    pub total_free_spins: u64,
    pub average_win_amount: f64,
    pub win_ratio: f64,
    /// Return to player: total win / total bet
    pub rtp: f64,
    pub last_played: Option<DateTime<Utc>>,
    pub sessions_count: u64,
    pub favorite_symbol: Option<String>,
    /// Appearances per symbol name across all recorded grids
    pub symbol_stats: BTreeMap<String, u64>,
}

impl Statistics {
    /// Fold one record into the aggregates
    ///
    /// `symbol_order` is the symbol table's declaration order, used to break
    /// favorite-symbol ties.
    pub fn apply(&mut self, record: &SpinRecord, symbol_order: &[String]) {
        self.total_spins += 1;
        self.total_bet_amount += record.bet;
        self.last_played = Some(record.timestamp);

        if record.is_win {
            self.total_wins += 1;
            self.total_win_amount += record.win;
            self.current_win_streak += 1;
            self.current_lose_streak = 0;
            self.longest_win_streak = self.longest_win_streak.max(self.current_win_streak);
            self.biggest_win = self.biggest_win.max(record.win);
        } else {
            self.total_losses += 1;
            self.current_lose_streak += 1;
            self.current_win_streak = 0;
            self.longest_lose_streak = self.longest_lose_streak.max(self.current_lose_streak);
        }

        if record.is_bonus {
            self.total_bonuses += 1;
        }
        self.total_free_spins += u64::from(record.free_spins_used);

        self.average_win_amount = ratio(self.total_win_amount, self.total_wins as f64);
        self.win_ratio = ratio(self.total_wins as f64, self.total_spins as f64);
        self.rtp = ratio(self.total_win_amount, self.total_bet_amount);

        if !record.symbols.is_empty() {
            for name in record.symbols.iter().flatten() {
                *self.symbol_stats.entry(name.clone()).or_insert(0) += 1;
            }
            self.favorite_symbol = self.favorite(symbol_order);
        }
    }

    /// Most frequent symbol; ties go to the earliest table entry, unknown
    /// names rank after table entries by name
    fn favorite(&self, symbol_order: &[String]) -> Option<String> {
        let rank = |name: &str| {
            symbol_order
                .iter()
                .position(|s| s == name)
                .unwrap_or(usize::MAX)
        };

        self.symbol_stats
            .iter()
            .filter(|&(_, &count)| count > 0)
            .min_by(|(a, count_a), (b, count_b)| {
                count_b
                    .cmp(count_a)
                    .then_with(|| rank(a).cmp(&rank(b)))
                    .then_with(|| a.cmp(b))
            })
            .map(|(name, _)| name.clone())
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
