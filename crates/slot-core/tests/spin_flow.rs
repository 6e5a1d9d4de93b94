//! End-to-end spin flow: engine, auto-spin and ledger working together

use std::sync::Arc;

use approx::assert_relative_eq;
use slot_core::{
    AutoSpinController, AutoSpinStatus, Grid, JsonFileStore, LedgerConfig, MemoryAccount,
    Notification, REEL_COUNT, ROW_COUNT, RecordingNotifier, ScriptedSource, SlotConfig,
    SpinContext, SpinEngine, StatisticsTracker, TimingConfig, UserAccount,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

type Layout = [[&'static str; ROW_COUNT]; REEL_COUNT];

/// symbol-a on reels 0-2 of the middle row, then two different symbols
const THREE_A_MIDDLE: Layout = [
    ["symbol-k", "symbol-a", "symbol-q"],
    ["symbol-j", "symbol-a", "symbol-q"],
    ["symbol-k", "symbol-a", "symbol-j"],
    ["symbol-j", "symbol-10", "symbol-k"],
    ["symbol-q", "symbol-dog1", "symbol-j"],
];

const FOUR_A_MIDDLE: Layout = [
    ["symbol-k", "symbol-a", "symbol-q"],
    ["symbol-j", "symbol-a", "symbol-q"],
    ["symbol-k", "symbol-a", "symbol-j"],
    ["symbol-j", "symbol-a", "symbol-k"],
    ["symbol-q", "symbol-dog1", "symbol-j"],
];

const FIVE_SCATTERS: Layout = [
    ["symbol-bone", "symbol-a", "symbol-q"],
    ["symbol-j", "symbol-bone", "symbol-k"],
    ["symbol-k", "symbol-a", "symbol-bone"],
    ["symbol-bone", "symbol-10", "symbol-k"],
    ["symbol-q", "symbol-dog1", "symbol-bone"],
];

fn studio_config() -> SlotConfig {
    SlotConfig::standard().with_timing(TimingConfig::studio())
}

fn scripted_engine(config: &SlotConfig, layouts: &[Layout]) -> SpinEngine {
    let values: Vec<f64> = layouts
        .iter()
        .flat_map(|layout| {
            let grid = Grid::from_names(&config.symbols, *layout).unwrap();
            let mut source = ScriptedSource::replaying(&config.symbols, &grid);
            std::iter::from_fn(move || slot_core::RandomSource::next_unit(&mut source))
        })
        .collect();
    SpinEngine::new(config, ScriptedSource::new(values)).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_reference_scenarios_in_sequence() {
    let config = studio_config();
    let engine = scripted_engine(&config, &[THREE_A_MIDDLE, FOUR_A_MIDDLE, FIVE_SCATTERS]);

    let account = Arc::new(MemoryAccount::new("player", 100.0, 0));
    let tracker = Arc::new(StatisticsTracker::in_memory(
        LedgerConfig::default(),
        &config.symbols,
    ));
    let notifier = Arc::new(RecordingNotifier::new());
    let context =
        SpinContext::new(account.clone(), tracker.clone()).with_notifier(notifier.clone());

    let first = engine.spin(1.0, &context).await.unwrap().unwrap();
    assert_relative_eq!(first.result.total_win, 5.0);
    assert_eq!(first.result.line_wins[0].match_count, 3);

    let second = engine.spin(2.0, &context).await.unwrap().unwrap();
    assert_relative_eq!(second.result.total_win, 50.0);

    let third = engine.spin(1.0, &context).await.unwrap().unwrap();
    assert_eq!(third.free_spins_awarded, 20);
    assert_eq!(account.free_spins(), 20);

    // 100 - 1 + 5 - 2 + 50 - 1
    assert_relative_eq!(account.balance(), 151.0);

    let stats = tracker.statistics();
    assert_eq!(stats.total_spins, 3);
    assert_eq!(stats.total_wins, 2);
    assert_eq!(stats.current_lose_streak, 1);
    assert_eq!(stats.longest_win_streak, 2);
    assert_eq!(stats.total_bonuses, 1);
    assert_relative_eq!(stats.rtp, 55.0 / 4.0);

    let history = tracker.history();
    assert!(history[0].is_bonus);
    assert_eq!(history[2].win, 5.0);

    let bonus_events = notifier
        .events()
        .into_iter()
        .filter(|e| matches!(e, Notification::BonusTriggered { .. }))
        .count();
    assert_eq!(bonus_events, 1);
}

#[tokio::test]
async fn test_seeded_session_keeps_balances_consistent() {
    let config = studio_config();
    let engine = SpinEngine::seeded(&config, 42).unwrap();
    let account = Arc::new(MemoryAccount::new("player", 10_000.0, 0));
    let tracker = Arc::new(StatisticsTracker::in_memory(
        LedgerConfig::default(),
        &config.symbols,
    ));
    let context = SpinContext::new(account.clone(), tracker.clone());

    for _ in 0..300 {
        let outcome = engine.spin(2.0, &context).await.unwrap().unwrap();
        let result = &outcome.result;

        assert!(result.winning_positions.len() <= 15);
        let line_total: f64 = result.line_wins.iter().map(|l| l.payout).sum();
        assert_relative_eq!(result.total_win, line_total);

        let stake = if outcome.used_free_spin { 0.0 } else { outcome.bet };
        assert_relative_eq!(
            outcome.balance_after,
            outcome.balance_before - stake + result.total_win,
            epsilon = 1e-9
        );
    }

    let stats = tracker.statistics();
    assert_eq!(stats.total_spins, 300);
    assert_eq!(stats.total_wins + stats.total_losses, 300);
    assert!(stats.longest_win_streak >= stats.current_win_streak);
    let symbol_total: u64 = stats.symbol_stats.values().sum();
    assert_eq!(symbol_total, 300 * 15);
}

#[tokio::test]
async fn test_same_seed_same_session() {
    let config = studio_config();
    let mut totals = Vec::new();

    for _ in 0..2 {
        let engine = SpinEngine::seeded(&config, 7).unwrap();
        let account = Arc::new(MemoryAccount::new("player", 1_000.0, 0));
        let tracker = Arc::new(StatisticsTracker::in_memory(
            LedgerConfig::default(),
            &config.symbols,
        ));
        let context = SpinContext::new(account.clone(), tracker.clone());

        for _ in 0..50 {
            engine.spin(1.0, &context).await.unwrap();
        }
        totals.push((account.balance(), tracker.statistics().symbol_stats));
    }

    assert_eq!(totals[0], totals[1]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUTO-SPIN WITH PERSISTED LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_auto_spin_session_persists_and_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let config = SlotConfig::standard();
    let engine = Arc::new(SpinEngine::seeded(&config, 2024).unwrap());
    let account = Arc::new(MemoryAccount::welcome("player"));

    let tracker = Arc::new(StatisticsTracker::open(
        JsonFileStore::new(dir.path()).unwrap(),
        config.ledger.clone(),
        &config.symbols,
    ));
    let context = SpinContext::new(account.clone(), tracker.clone());
    let controller = AutoSpinController::new(engine.clone(), context);

    controller.start(8, 1.0).await.unwrap();
    controller.join().await;
    assert_eq!(controller.status(), AutoSpinStatus::Stopped);

    // The welcome free spins pay for the first five
    let history = tracker.history();
    let free: u32 = history.iter().map(|r| r.free_spins_used).sum();
    assert!(free >= 5);
    let completed = controller.completed();
    assert_eq!(history.len(), completed as usize);
    drop(controller);

    let reopened = StatisticsTracker::open(
        JsonFileStore::new(dir.path()).unwrap(),
        config.ledger.clone(),
        &config.symbols,
    );
    assert_eq!(reopened.history(), history);
    assert_eq!(reopened.statistics().sessions_count, 2);
    assert_eq!(reopened.statistics().total_spins, completed as u64);
}
