//! Presentation hooks fired during a spin

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::ledger::Achievement;
use crate::paytable::SpinResult;
use crate::reels::Position;

/// Receives spin events; every hook defaults to a no-op
pub trait NotificationSink: Send + Sync {
    fn on_spin_start(&self, _bet: f64, _free_spin: bool) {}

    fn on_win(&self, _amount: f64, _positions: &BTreeSet<Position>) {}

    fn on_spin_resolved(&self, _result: &SpinResult) {}

    fn on_bonus_triggered(&self, _free_spins: u32) {}

    fn on_achievement_unlocked(&self, _achievement: &Achievement) {}

    fn on_error(&self, _message: &str) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {}

/// Writes events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn on_spin_start(&self, bet: f64, free_spin: bool) {
        if free_spin {
            log::debug!("Spin started (free spin, bet {bet:.2})");
        } else {
            log::debug!("Spin started (bet {bet:.2})");
        }
    }

    fn on_win(&self, amount: f64, positions: &BTreeSet<Position>) {
        log::info!("Win {amount:.2} on {} cells", positions.len());
    }

    fn on_spin_resolved(&self, result: &SpinResult) {
        log::debug!(
            "Spin resolved: win {:.2}, {} lines, {} scatters",
            result.total_win,
            result.line_wins.len(),
            result.scatter_count
        );
    }

    fn on_bonus_triggered(&self, free_spins: u32) {
        log::info!("Bonus triggered: {free_spins} free spins");
    }

    fn on_achievement_unlocked(&self, achievement: &Achievement) {
        log::info!("Achievement unlocked: {}", achievement.name);
    }

    fn on_error(&self, message: &str) {
        log::error!("Spin error: {message}");
    }
}

/// A captured event
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SpinStart { bet: f64, free_spin: bool },
    Win { amount: f64, positions: BTreeSet<Position> },
    SpinResolved { total_win: f64, scatter_count: u8 },
    BonusTriggered { free_spins: u32 },
    AchievementUnlocked { id: String },
    Error { message: String },
}

/// Captures events in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events so far
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Notification::Error { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Notification) {
        self.events.lock().push(event);
    }
}

impl NotificationSink for RecordingNotifier {
    fn on_spin_start(&self, bet: f64, free_spin: bool) {
        self.push(Notification::SpinStart { bet, free_spin });
    }

    fn on_win(&self, amount: f64, positions: &BTreeSet<Position>) {
        self.push(Notification::Win {
            amount,
            positions: positions.clone(),
        });
    }

    fn on_spin_resolved(&self, result: &SpinResult) {
        self.push(Notification::SpinResolved {
            total_win: result.total_win,
            scatter_count: result.scatter_count,
        });
    }

    fn on_bonus_triggered(&self, free_spins: u32) {
        self.push(Notification::BonusTriggered { free_spins });
    }

    fn on_achievement_unlocked(&self, achievement: &Achievement) {
        self.push(Notification::AchievementUnlocked {
            id: achievement.id.clone(),
        });
    }

    fn on_error(&self, message: &str) {
        self.push(Notification::Error {
            message: message.to_string(),
        });
    }
}
