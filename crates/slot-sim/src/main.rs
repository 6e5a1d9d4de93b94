//! Slot Simulator CLI
//!
//! Usage:
//!   slot-sim run --count 200 --seed 7    - Auto-spin session
//!   slot-sim stats --ledger ./ledger     - Print persisted statistics
//!   slot-sim export --format csv         - Export a user's history
//!   slot-sim prune --days 30             - Drop old history records
//!   slot-sim reset                       - Clear the ledger
//!   slot-sim validate game.yaml          - Check a game configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slot_core::{
    AutoSpinController, JsonFileStore, LogNotifier, MemoryAccount, SlotConfig, SpinContext,
    SpinEngine, StatisticsTracker, TimingConfig, TimingProfile, UserAccount,
};

#[derive(Parser)]
#[command(name = "slot-sim", about = "Slot spin simulator")]
struct Cli {
    /// Game configuration (.json, .yaml, .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an auto-spin session
    Run {
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 100)]
        count: u32,
        /// Bet per spin (configured default when omitted)
        #[arg(short, long)]
        bet: Option<f64>,
        /// Starting balance
        #[arg(long, default_value_t = MemoryAccount::WELCOME_BALANCE)]
        balance: f64,
        /// Starting free spins
        #[arg(long, default_value_t = MemoryAccount::WELCOME_FREE_SPINS)]
        free_spins: u32,
        /// Player id recorded in the ledger
        #[arg(short, long, default_value = "player")]
        user: String,
        /// Seed for a reproducible session
        #[arg(short, long)]
        seed: Option<u64>,
        /// Timing profile (normal, turbo, studio)
        #[arg(short, long, default_value = "studio")]
        timing: String,
        /// Ledger directory; in-memory when omitted
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Print persisted statistics and achievements
    Stats {
        #[arg(short, long, default_value = "ledger")]
        ledger: PathBuf,
        /// Also summarize this user's last N days
        #[arg(long, requires = "user")]
        days: Option<u32>,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Export a user's history
    Export {
        #[arg(short, long, default_value = "ledger")]
        ledger: PathBuf,
        #[arg(short, long, default_value = "player")]
        user: String,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drop history records older than N days
    Prune {
        #[arg(short, long, default_value = "ledger")]
        ledger: PathBuf,
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Clear history, statistics and achievements
    Reset {
        #[arg(short, long, default_value = "ledger")]
        ledger: PathBuf,
    },
    /// Load and validate a configuration file
    Validate {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            count,
            bet,
            balance,
            free_spins,
            user,
            seed,
            timing,
            ledger,
        } => {
            let session = Session {
                count,
                bet: bet.unwrap_or(config.game.default_bet),
                balance,
                free_spins,
                user,
                seed,
                timing: timing.parse::<TimingProfile>()?,
                ledger,
            };
            run_session(config, session).await
        }
        Commands::Stats { ledger, days, user } => print_stats(&config, &ledger, days, user),
        Commands::Export {
            ledger,
            user,
            format,
            output,
        } => export_history(&config, &ledger, &user, format, output.as_deref()),
        Commands::Prune { ledger, days } => {
            let tracker = load_tracker(&config, &ledger)?;
            let removed = tracker.clear_older_than(days, chrono::Utc::now());
            println!("Removed {removed} records older than {days} days");
            Ok(())
        }
        Commands::Reset { ledger } => {
            load_tracker(&config, &ledger)?.reset();
            println!("Ledger {} cleared", ledger.display());
            Ok(())
        }
        Commands::Validate { path } => validate_config(&path),
    }
}

fn load_config(path: Option<&Path>) -> Result<SlotConfig> {
    match path {
        Some(path) => {
            let config = SlotConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            log::info!("Loaded game configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(SlotConfig::standard()),
    }
}

fn load_tracker(config: &SlotConfig, ledger: &Path) -> Result<StatisticsTracker> {
    if !ledger.exists() {
        bail!("Ledger directory {} does not exist", ledger.display());
    }
    let store = JsonFileStore::new(ledger)
        .with_context(|| format!("Failed to open ledger {}", ledger.display()))?;
    Ok(StatisticsTracker::load(
        store,
        config.ledger.clone(),
        &config.symbols,
    ))
}

struct Session {
    count: u32,
    bet: f64,
    balance: f64,
    free_spins: u32,
    user: String,
    seed: Option<u64>,
    timing: TimingProfile,
    ledger: Option<PathBuf>,
}

async fn run_session(config: SlotConfig, session: Session) -> Result<()> {
    let config = config.with_timing(TimingConfig::from_profile(session.timing));

    let rng = match session.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };
    let engine = Arc::new(SpinEngine::new(&config, rng).context("Invalid game configuration")?);

    let tracker = Arc::new(match &session.ledger {
        Some(dir) => {
            let store = JsonFileStore::new(dir)
                .with_context(|| format!("Failed to open ledger {}", dir.display()))?;
            StatisticsTracker::open(store, config.ledger.clone(), &config.symbols)
        }
        None => StatisticsTracker::in_memory(config.ledger.clone(), &config.symbols),
    });

    let account = Arc::new(MemoryAccount::new(
        session.user.clone(),
        session.balance,
        session.free_spins,
    ));
    let context = SpinContext::new(account.clone(), tracker.clone())
        .with_notifier(Arc::new(LogNotifier));

    println!(
        "🎰 Session {} | {} spins at {:.2} | balance {:.2}, {} free spins\n",
        tracker.session_id(),
        session.count,
        session.bet,
        session.balance,
        session.free_spins
    );

    let controller = AutoSpinController::new(engine, context);
    controller
        .start(session.count, session.bet)
        .await
        .context("Failed to start auto-spin")?;
    controller.join().await;

    let stats = tracker.statistics();
    let session_spins = tracker
        .user_history(&session.user, usize::MAX)
        .iter()
        .filter(|r| r.session_id == tracker.session_id())
        .count();

    println!("Spins:        {} of {}", controller.completed(), session.count);
    println!("Recorded:     {session_spins}");
    println!(
        "Balance:      {:.2} ({} free spins left)",
        account.balance(),
        account.free_spins()
    );
    println!("Win ratio:    {:.1}%", stats.win_ratio * 100.0);
    println!("RTP:          {:.1}%", stats.rtp * 100.0);
    println!("Biggest win:  {:.2}", stats.biggest_win);
    println!("Bonuses:      {}", stats.total_bonuses);
    if let Some(favorite) = &stats.favorite_symbol {
        println!("Favorite:     {favorite}");
    }
    for achievement in tracker.achievements() {
        println!("🏆 {} - {}", achievement.name, achievement.description);
    }
    if let Some(error) = controller.last_error() {
        println!("\n⚠️  Stopped early: {error}");
    }

    Ok(())
}

fn print_stats(
    config: &SlotConfig,
    ledger: &Path,
    days: Option<u32>,
    user: Option<String>,
) -> Result<()> {
    let tracker = load_tracker(config, ledger)?;

    let stats = serde_json::to_string_pretty(&tracker.statistics())?;
    println!("{stats}");

    let achievements = tracker.achievements();
    if achievements.is_empty() {
        println!("\nNo achievements unlocked");
    } else {
        println!("\nAchievements:");
        for achievement in achievements {
            println!(
                "  🏆 {} ({}) - {}",
                achievement.name,
                achievement.unlocked_at.format("%Y-%m-%d %H:%M"),
                achievement.description
            );
        }
    }

    if let (Some(days), Some(user)) = (days, user) {
        let summary = tracker.statistics_by_period(&user, days, chrono::Utc::now());
        println!("\nLast {days} days for {user}:");
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn export_history(
    config: &SlotConfig,
    ledger: &Path,
    user: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let tracker = load_tracker(config, ledger)?;
    let contents = match format {
        ExportFormat::Json => tracker
            .export_json(user, chrono::Utc::now())
            .context("Failed to serialize export")?,
        ExportFormat::Csv => tracker.export_csv(user),
    };

    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Exported history of {user} to {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn validate_config(path: &Path) -> Result<()> {
    let config = SlotConfig::load(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    println!("✅ {} is valid", path.display());
    println!("  Symbols:     {}", config.symbols.len());
    println!("  Paylines:    {}", config.paylines.len());
    println!(
        "  Bets:        {:.2} - {:.2} (default {:.2})",
        config.game.min_bet, config.game.max_bet, config.game.default_bet
    );
    println!("  Timing:      {:?}", config.timing.profile);
    println!("  Achievements: {}", config.ledger.achievements.len());
    Ok(())
}
