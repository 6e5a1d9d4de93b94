//! Spin engine: debit, reveal, evaluate, pay, bonus, record

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::account::UserAccount;
use crate::config::{BonusConfig, GameLimits, SlotConfig};
use crate::error::{SlotError, SlotResult};
use crate::ledger::{Achievement, SpinRecord, SpinRecorder};
use crate::notify::{NotificationSink, NullNotifier};
use crate::paytable::{PaylineEvaluator, SpinResult};
use crate::reels::ReelGenerator;
use crate::rng::RandomSource;
use crate::symbols::SymbolTable;
use crate::timing::TimingConfig;

/// Collaborators of a spin
#[derive(Clone)]
pub struct SpinContext {
    /// Active user, `None` when nobody is logged in
    pub account: Option<Arc<dyn UserAccount>>,
    pub notifier: Arc<dyn NotificationSink>,
    pub recorder: Arc<dyn SpinRecorder>,
}

impl SpinContext {
    pub fn new(account: Arc<dyn UserAccount>, recorder: Arc<dyn SpinRecorder>) -> Self {
        Self {
            account: Some(account),
            notifier: Arc::new(NullNotifier),
            recorder,
        }
    }

    /// Context with no logged-in user
    pub fn anonymous(recorder: Arc<dyn SpinRecorder>) -> Self {
        Self {
            account: None,
            notifier: Arc::new(NullNotifier),
            recorder,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpinPhase {
    Idle = 0,
    Debiting = 1,
    Resolving = 2,
    Paying = 3,
    Bonus = 4,
}

impl SpinPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Debiting,
            2 => Self::Resolving,
            3 => Self::Paying,
            4 => Self::Bonus,
            _ => Self::Idle,
        }
    }
}

/// Exclusive claim on the engine for one spin; drops back to Idle
struct PhaseGuard<'a> {
    phase: &'a AtomicU8,
}

impl<'a> PhaseGuard<'a> {
    fn acquire(phase: &'a AtomicU8) -> Option<Self> {
        phase
            .compare_exchange(
                SpinPhase::Idle as u8,
                SpinPhase::Debiting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()
            .map(|_| Self { phase })
    }

    fn set(&self, phase: SpinPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.store(SpinPhase::Idle as u8, Ordering::SeqCst);
    }
}

/// Everything one resolved spin produced
#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub result: SpinResult,
    pub bet: f64,
    pub used_free_spin: bool,
    pub free_spins_awarded: u32,
    pub balance_before: f64,
    pub balance_after: f64,
    /// Achievements unlocked by this spin
    pub achievements: Vec<Achievement>,
    pub record_id: String,
}

/// Resolves spins one at a time
///
/// A spin claims the engine with a compare-exchange on the phase flag; a
/// spin requested while another is in flight is ignored. The stake is taken
/// before the reels are drawn and is not returned if resolution fails.
pub struct SpinEngine {
    limits: GameLimits,
    bonus: BonusConfig,
    timing: Mutex<TimingConfig>,
    evaluator: PaylineEvaluator,
    reels: Mutex<ReelGenerator>,
    phase: AtomicU8,
    current_bet: Mutex<f64>,
    shutdown_tx: broadcast::Sender<()>,
    spin_count: AtomicU64,
}

impl SpinEngine {
    /// Engine drawing from `source`
    pub fn new(config: &SlotConfig, source: impl RandomSource + 'static) -> SlotResult<Self> {
        config.validate()?;

        let table = Arc::new(config.symbols.clone());
        let evaluator = PaylineEvaluator::new(
            Arc::clone(&table),
            config.paylines.clone(),
            config.multipliers.clone(),
        )?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            limits: config.game.clone(),
            bonus: config.bonus.clone(),
            timing: Mutex::new(config.timing.clone()),
            evaluator,
            reels: Mutex::new(ReelGenerator::new(table, source)),
            phase: AtomicU8::new(SpinPhase::Idle as u8),
            current_bet: Mutex::new(config.game.default_bet),
            shutdown_tx,
            spin_count: AtomicU64::new(0),
        })
    }

    /// Engine seeded from the OS
    pub fn from_entropy(config: &SlotConfig) -> SlotResult<Self> {
        Self::new(config, StdRng::from_os_rng())
    }

    /// Reproducible engine
    pub fn seeded(config: &SlotConfig, seed: u64) -> SlotResult<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn phase(&self) -> SpinPhase {
        SpinPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn is_spinning(&self) -> bool {
        self.phase() != SpinPhase::Idle
    }

    /// Spins resolved since creation
    pub fn spin_count(&self) -> u64 {
        self.spin_count.load(Ordering::Relaxed)
    }

    pub fn limits(&self) -> &GameLimits {
        &self.limits
    }

    pub fn table(&self) -> &SymbolTable {
        self.evaluator.table()
    }

    pub fn timing(&self) -> TimingConfig {
        self.timing.lock().clone()
    }

    pub fn set_timing(&self, timing: TimingConfig) {
        log::debug!("Timing profile set to {:?}", timing.profile);
        *self.timing.lock() = timing;
    }

    /// Replace the random source used for subsequent draws
    pub fn set_source(&self, source: impl RandomSource + 'static) {
        self.reels.lock().set_source(source);
    }

    // ============ Bet Selection ============

    /// Currently selected bet
    pub fn bet(&self) -> f64 {
        *self.current_bet.lock()
    }

    /// Select a bet, clamped to the limits; ignored while spinning
    pub fn set_bet(&self, bet: f64) -> f64 {
        let mut current = self.current_bet.lock();
        if self.is_spinning() {
            log::debug!("Bet change ignored while spinning");
            return *current;
        }
        *current = self.limits.clamp_bet(bet);
        *current
    }

    /// Step the selected bet by `delta`
    pub fn adjust_bet(&self, delta: f64) -> f64 {
        let bet = self.bet();
        self.set_bet(bet + delta)
    }

    // ============ Spin ============

    /// Abort the reel animation of an in-flight spin
    ///
    /// The aborted spin fails with [`SlotError::InternalResolution`]; its
    /// stake is not returned.
    pub fn cancel_in_flight(&self) {
        if self.shutdown_tx.send(()).is_ok() {
            log::info!("In-flight spin cancelled");
        }
    }

    /// Spin at the selected bet
    pub async fn spin_current(&self, context: &SpinContext) -> SlotResult<Option<SpinOutcome>> {
        self.spin(self.bet(), context).await
    }

    /// Resolve one spin
    ///
    /// Returns `Ok(None)` without side effects when a spin is already in
    /// flight. Errors are also reported to the context's notifier.
    pub async fn spin(&self, bet: f64, context: &SpinContext) -> SlotResult<Option<SpinOutcome>> {
        let Some(guard) = PhaseGuard::acquire(&self.phase) else {
            log::debug!("Spin ignored, engine busy ({:?})", self.phase());
            return Ok(None);
        };

        match self.run_spin(&guard, bet, context).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                if e.is_rejection() {
                    log::warn!("Spin rejected: {}", e);
                } else {
                    log::error!("Spin failed: {}", e);
                }
                context.notifier.on_error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn run_spin(
        &self,
        guard: &PhaseGuard<'_>,
        bet: f64,
        context: &SpinContext,
    ) -> SlotResult<SpinOutcome> {
        let account = context.account.as_ref().ok_or(SlotError::NoActiveUser)?;
        self.limits.validate_bet(bet)?;

        // Stake: a free spin if any are left, else the bet from the balance
        let balance_before = account.balance();
        let free_spins = account.free_spins();
        let used_free_spin = if free_spins > 0 {
            account.set_free_spins(free_spins - 1);
            true
        } else if account.debit(bet) {
            false
        } else {
            return Err(SlotError::InsufficientFunds {
                balance: balance_before,
                bet,
            });
        };

        context.notifier.on_spin_start(bet, used_free_spin);
        guard.set(SpinPhase::Resolving);

        self.reveal_delay().await?;
        let result = self.resolve(bet)?;

        guard.set(SpinPhase::Paying);
        if result.is_win() {
            account.credit(result.total_win);
            context
                .notifier
                .on_win(result.total_win, &result.winning_positions);
        }

        let awarded = self.bonus.award_for(result.scatter_count);
        if awarded > 0 {
            guard.set(SpinPhase::Bonus);
            account.set_free_spins(account.free_spins().saturating_add(awarded));
            log::info!(
                "Bonus: {} scatters, {} free spins for {}",
                result.scatter_count,
                awarded,
                account.user_id()
            );
            context.notifier.on_bonus_triggered(awarded);
        }

        let balance_after = account.balance();
        let record = SpinRecord::new(
            account.user_id(),
            context.recorder.session_id(),
            bet,
            result.total_win,
        )
        .with_symbols(result.grid.snapshot(self.evaluator.table()))
        .with_lines(result.line_wins.clone())
        .with_free_spin_used(used_free_spin)
        .with_bonus(awarded)
        .with_balances(balance_before, balance_after);
        let record_id = record.id.clone();

        let achievements = context.recorder.record(record);
        for achievement in &achievements {
            context.notifier.on_achievement_unlocked(achievement);
        }
        context.notifier.on_spin_resolved(&result);
        self.spin_count.fetch_add(1, Ordering::Relaxed);

        Ok(SpinOutcome {
            result,
            bet,
            used_free_spin,
            free_spins_awarded: awarded,
            balance_before,
            balance_after,
            achievements,
            record_id,
        })
    }

    /// Wait out the reel animation unless the spin is cancelled
    async fn reveal_delay(&self) -> SlotResult<()> {
        let delay = self.timing.lock().spin_delay();
        if delay.is_zero() {
            return Ok(());
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = shutdown_rx.recv() => Err(SlotError::InternalResolution(
                "spin cancelled during reel animation".into(),
            )),
        }
    }

    fn resolve(&self, bet: f64) -> SlotResult<SpinResult> {
        let grid = self
            .reels
            .lock()
            .draw()
            .map_err(|e| SlotError::InternalResolution(e.to_string()))?;
        Ok(self.evaluator.evaluate(&grid, bet))
    }
}
