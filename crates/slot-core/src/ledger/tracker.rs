//! Statistics tracker: history log, aggregates and achievements

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::SpinRecorder;
use super::achievements::{self, Achievement};
use super::export::{self, ExportDocument, PeriodSummary};
use super::record::SpinRecord;
use super::stats::Statistics;
use super::store::{MemoryStore, StatisticsStore};
use crate::config::LedgerConfig;
use crate::error::SlotResult;
use crate::symbols::SymbolTable;

struct TrackerState {
    store: Box<dyn StatisticsStore>,
    /// Newest first
    history: VecDeque<SpinRecord>,
    statistics: Statistics,
    achievements: Vec<Achievement>,
    /// Records appended to the store since its history was last rewritten
    appended: usize,
}

impl TrackerState {
    fn persist_statistics(&mut self) {
        if let Err(e) = self.store.persist_statistics(&self.statistics) {
            log::warn!("Failed to persist statistics: {}", e);
        }
    }

    fn persist_achievements(&mut self) {
        if let Err(e) = self.store.persist_achievements(&self.achievements) {
            log::warn!("Failed to persist achievements: {}", e);
        }
    }

    fn persist_history(&mut self) {
        let history: Vec<SpinRecord> = self.history.iter().cloned().collect();
        match self.store.persist_history(&history) {
            Ok(()) => self.appended = 0,
            Err(e) => log::warn!("Failed to persist history: {}", e),
        }
    }
}

/// Consumes spin records and maintains the ledger
///
/// Every record is persisted as it arrives. Store failures are logged and
/// never fail the spin that produced the record.
pub struct StatisticsTracker {
    state: Mutex<TrackerState>,
    config: LedgerConfig,
    symbol_order: Vec<String>,
    session_id: String,
}

impl StatisticsTracker {
    /// Load the ledger from `store` without starting a session
    pub fn load(
        store: impl StatisticsStore + 'static,
        config: LedgerConfig,
        table: &SymbolTable,
    ) -> Self {
        let mut history: VecDeque<SpinRecord> = store
            .load_history()
            .unwrap_or_else(|e| {
                log::warn!("Failed to load history: {}", e);
                Vec::new()
            })
            .into();
        let statistics = store
            .load_statistics()
            .unwrap_or_else(|e| {
                log::warn!("Failed to load statistics: {}", e);
                None
            })
            .unwrap_or_default();
        let achievements = store.load_achievements().unwrap_or_else(|e| {
            log::warn!("Failed to load achievements: {}", e);
            Vec::new()
        });

        let stored = history.len();
        history.truncate(config.history_limit);

        let mut state = TrackerState {
            store: Box::new(store),
            history,
            statistics,
            achievements,
            appended: stored,
        };
        if stored > config.history_limit {
            state.persist_history();
        }

        Self {
            state: Mutex::new(state),
            config,
            symbol_order: table.names(),
            session_id: format!("session_{}", Uuid::new_v4().simple()),
        }
    }

    /// Load the ledger from `store` and start a new session
    pub fn open(
        store: impl StatisticsStore + 'static,
        config: LedgerConfig,
        table: &SymbolTable,
    ) -> Self {
        let tracker = Self::load(store, config, table);
        {
            let mut state = tracker.state.lock();
            state.statistics.sessions_count += 1;
            state.persist_statistics();
            log::info!(
                "Statistics session {} opened ({} records, {} sessions)",
                tracker.session_id,
                state.history.len(),
                state.statistics.sessions_count
            );
        }
        tracker
    }

    /// Tracker over a fresh [`MemoryStore`]
    pub fn in_memory(config: LedgerConfig, table: &SymbolTable) -> Self {
        Self::open(MemoryStore::new(), config, table)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Fold a spin into the ledger, returning achievements it unlocked
    pub fn record(&self, record: SpinRecord) -> Vec<Achievement> {
        let mut state = self.state.lock();

        if let Err(e) = state.store.append_record(&record) {
            log::warn!("Failed to append spin record {}: {}", record.id, e);
        } else {
            state.appended += 1;
        }

        state.statistics.apply(&record, &self.symbol_order);
        let unlocked = achievements::evaluate(
            &self.config.achievements,
            &state.achievements,
            &record,
            &state.statistics,
        );
        state.history.push_front(record);

        if state.history.len() > self.config.history_limit {
            state.history.truncate(self.config.history_limit);
            // Keep the append log from growing past twice the limit
            if state.appended >= self.config.history_limit {
                state.persist_history();
            }
        }

        state.persist_statistics();

        if !unlocked.is_empty() {
            for achievement in &unlocked {
                log::info!("Achievement unlocked: {} ({})", achievement.name, achievement.user_id);
            }
            state.achievements.extend(unlocked.iter().cloned());
            state.persist_achievements();
        }

        unlocked
    }

    pub fn statistics(&self) -> Statistics {
        self.state.lock().statistics.clone()
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        self.state.lock().achievements.clone()
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.state.lock().achievements.iter().any(|a| a.id == id)
    }

    /// Whole history, newest first
    pub fn history(&self) -> Vec<SpinRecord> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Newest-first records of one user
    pub fn user_history(&self, user_id: &str, limit: usize) -> Vec<SpinRecord> {
        self.state
            .lock()
            .history
            .iter()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Totals for one user over the `days` before `now`
    pub fn statistics_by_period(
        &self,
        user_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> PeriodSummary {
        let start = now - Duration::days(i64::from(days));
        let state = self.state.lock();
        PeriodSummary::from_records(
            days,
            state
                .history
                .iter()
                .filter(|r| r.user_id == user_id && r.timestamp >= start),
        )
    }

    /// Statistics, achievements and the user's history as pretty JSON
    pub fn export_json(&self, user_id: &str, now: DateTime<Utc>) -> SlotResult<String> {
        let document = {
            let state = self.state.lock();
            ExportDocument {
                user_id: user_id.to_string(),
                statistics: state.statistics.clone(),
                achievements: state.achievements.clone(),
                history: state
                    .history
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .cloned()
                    .collect(),
                export_date: now,
            }
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// The user's history as quoted CSV
    pub fn export_csv(&self, user_id: &str) -> String {
        export::to_csv(&self.user_history(user_id, usize::MAX))
    }

    /// Drop records older than `days` before `now`, returning how many went
    pub fn clear_older_than(&self, days: u32, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(i64::from(days));
        let mut state = self.state.lock();

        let before = state.history.len();
        state.history.retain(|r| r.timestamp >= cutoff);
        let removed = before - state.history.len();

        if removed > 0 {
            state.persist_history();
            log::info!("Removed {} history records older than {} days", removed, days);
        }
        removed
    }

    /// Clear history, statistics and achievements
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.history.clear();
        state.statistics = Statistics::default();
        state.achievements.clear();

        state.persist_history();
        state.persist_statistics();
        state.persist_achievements();
        log::info!("Statistics ledger reset");
    }
}

impl SpinRecorder for StatisticsTracker {
    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn record(&self, record: SpinRecord) -> Vec<Achievement> {
        StatisticsTracker::record(self, record)
    }
}
